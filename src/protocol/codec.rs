//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! The first byte of every value selects its type:
//!
//! ```text
//! +<text>\r\n                    simple string
//! -<text>\r\n                    error
//! :<i64>\r\n                     integer
//! $<len>\r\n<len bytes>\r\n      bulk string   ($-1\r\n when absent)
//! *<count>\r\n<count values>     array         (*-1\r\n accepted when absent)
//! PING hello\r\n                 inline command (leading uppercase letter)
//! ```
//!
//! Lines end with `\r\n`; a bare `\n` is accepted too. A `\r` that is not
//! followed by `\n` is ordinary content.

use std::io::{BufRead, Cursor, ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::Value;
use crate::error::{Result, StreamError};

/// Maximum bulk string length (512 MB)
pub const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Maximum number of elements in one array
pub const MAX_ARRAY_LEN: i64 = 1024 * 1024;

/// Maximum array nesting depth
pub const MAX_DEPTH: usize = 32;

/// Maximum length of a single protocol line (64 KB)
pub const MAX_LINE_LEN: usize = 64 * 1024;

const CRLF: &[u8] = b"\r\n";

// =============================================================================
// Encoding
// =============================================================================

/// Encode a value to bytes
pub fn encode_value(value: &Value) -> Bytes {
    let mut buf = BytesMut::new();
    encode_into(value, &mut buf);
    buf.freeze()
}

/// Append the encoding of `value` to `buf`
pub fn encode_into(value: &Value, buf: &mut BytesMut) {
    match value {
        Value::SimpleString(text) => put_line(buf, b'+', text),
        Value::Error(text) => put_line(buf, b'-', text),
        Value::Integer(n) => {
            buf.put_u8(b':');
            buf.put_slice(n.to_string().as_bytes());
            buf.put_slice(CRLF);
        }
        Value::BulkString(Some(data)) => {
            buf.put_u8(b'$');
            buf.put_slice(data.len().to_string().as_bytes());
            buf.put_slice(CRLF);
            buf.put_slice(data);
            buf.put_slice(CRLF);
        }
        Value::Array(Some(items)) => {
            buf.put_u8(b'*');
            buf.put_slice(items.len().to_string().as_bytes());
            buf.put_slice(CRLF);
            for item in items {
                encode_into(item, buf);
            }
        }
        // Both absent forms share the bulk null sentinel on the wire
        Value::BulkString(None) | Value::Array(None) => buf.put_slice(b"$-1\r\n"),
    }
}

/// Single-line payloads cannot carry `\n`
///
/// A `\r` stays: the decoder strips only one `\r` before the terminator, so
/// even a trailing one survives.
fn put_line(buf: &mut BytesMut, prefix: u8, text: &str) {
    buf.put_u8(prefix);
    for byte in text.bytes() {
        buf.put_u8(if byte == b'\n' { b' ' } else { byte });
    }
    buf.put_slice(CRLF);
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a single value from a byte slice
///
/// Bytes after the first complete value are ignored.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    let mut cursor = Cursor::new(bytes);
    read_value(&mut cursor)
}

/// Read one complete value from a buffered reader
///
/// A clean end of stream before the first byte is reported as an
/// `UnexpectedEof` I/O error so callers can tell a disconnect apart from a
/// value cut off midway, which is a protocol error.
pub fn read_value<R: BufRead>(reader: &mut R) -> Result<Value> {
    match read_byte(reader)? {
        Some(tag) => read_tagged(reader, tag, 0),
        None => Err(StreamError::Io(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "end of stream",
        ))),
    }
}

/// Write a value to a stream and flush
pub fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    let bytes = encode_value(value);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

fn read_nested<R: BufRead>(reader: &mut R, depth: usize) -> Result<Value> {
    match read_byte(reader)? {
        Some(tag) => read_tagged(reader, tag, depth),
        None => Err(truncated()),
    }
}

fn read_tagged<R: BufRead>(reader: &mut R, tag: u8, depth: usize) -> Result<Value> {
    match tag {
        b'+' => Ok(Value::SimpleString(lossy(&read_line(reader)?))),
        b'-' => Ok(Value::Error(lossy(&read_line(reader)?))),
        b':' => Ok(Value::Integer(parse_integer(&read_line(reader)?)?)),
        b'$' => read_bulk(reader),
        b'*' => read_array(reader, depth),
        b'A'..=b'Z' => read_inline(reader, tag),
        other => Err(StreamError::Protocol(format!(
            "unknown type: 0x{:02x}",
            other
        ))),
    }
}

fn read_bulk<R: BufRead>(reader: &mut R) -> Result<Value> {
    let len = parse_integer(&read_line(reader)?)?;
    if len == -1 {
        return Ok(Value::BulkString(None));
    }
    if len < 0 {
        return Err(StreamError::Protocol(format!("invalid bulk length: {}", len)));
    }
    if len > MAX_BULK_LEN {
        return Err(StreamError::Protocol(format!(
            "bulk length {} exceeds limit of {}",
            len, MAX_BULK_LEN
        )));
    }

    // Grow with the bytes that actually arrive, not with the announced length
    let len = len as u64;
    let mut payload = Vec::with_capacity(len.min(64 * 1024) as usize);
    reader.by_ref().take(len).read_to_end(&mut payload)?;
    if (payload.len() as u64) < len {
        return Err(truncated());
    }

    // The payload is followed by an empty line
    if !read_line(reader)?.is_empty() {
        return Err(StreamError::Protocol("malformed bulk string".to_string()));
    }

    Ok(Value::BulkString(Some(Bytes::from(payload))))
}

fn read_array<R: BufRead>(reader: &mut R, depth: usize) -> Result<Value> {
    let count = parse_integer(&read_line(reader)?)?;
    if count == -1 {
        return Ok(Value::Array(None));
    }
    if count < 0 {
        return Err(StreamError::Protocol(format!("invalid array length: {}", count)));
    }
    if count > MAX_ARRAY_LEN {
        return Err(StreamError::Protocol(format!(
            "array length {} exceeds limit of {}",
            count, MAX_ARRAY_LEN
        )));
    }
    if depth >= MAX_DEPTH {
        return Err(StreamError::Protocol("arrays nested too deeply".to_string()));
    }

    let count = count as usize;
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        items.push(read_nested(reader, depth + 1)?);
    }
    Ok(Value::Array(Some(items)))
}

/// Plain-text command: the rest of the line, split on whitespace
fn read_inline<R: BufRead>(reader: &mut R, first: u8) -> Result<Value> {
    let mut line = vec![first];
    line.extend_from_slice(&read_line(reader)?);

    let tokens = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| Value::BulkString(Some(Bytes::copy_from_slice(token))))
        .collect();

    Ok(Value::Array(Some(tokens)))
}

// =============================================================================
// Low-level helpers
// =============================================================================

fn read_byte<R: BufRead>(reader: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamError::Io(e)),
        }
    }
}

/// Read up to and excluding the line terminator
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let limit = (MAX_LINE_LEN + 2) as u64;
    reader.by_ref().take(limit).read_until(b'\n', &mut line)?;

    if line.last() != Some(&b'\n') {
        if line.len() as u64 >= limit {
            return Err(StreamError::Protocol(format!(
                "line exceeds {} bytes",
                MAX_LINE_LEN
            )));
        }
        return Err(truncated());
    }

    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(line)
}

fn parse_integer(line: &[u8]) -> Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|text| text.parse::<i64>().ok())
        .ok_or_else(|| StreamError::Protocol(format!("invalid integer: '{}'", lossy(line))))
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn truncated() -> StreamError {
    StreamError::Protocol("truncated".to_string())
}
