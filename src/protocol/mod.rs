//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (RESP-style, line oriented)
//!
//! ### Request Format
//! A request is an array of bulk strings, the first being the verb:
//! ```text
//! *3\r\n$4\r\nXLEN\r\n$6\r\nevents\r\n
//! ```
//! Plain-text clients may send the same command inline instead:
//! ```text
//! XLEN events\r\n
//! ```
//!
//! ### Reply Types
//! - `+` simple string: acknowledgements (`+PONG`, `+OK`)
//! - `-` error: `-ERR <message>`
//! - `:` integer: lengths and counts
//! - `$` bulk string: ids, echoed text (`$-1` when absent)
//! - `*` array: range and read results (nested)

mod codec;
mod command;
mod value;

pub use codec::{
    decode_value, encode_into, encode_value, read_value, write_value, MAX_ARRAY_LEN,
    MAX_BULK_LEN, MAX_DEPTH, MAX_LINE_LEN,
};
pub use command::{Command, CommandType};
pub use value::Value;
