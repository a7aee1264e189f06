//! Protocol values
//!
//! The structured form of everything that travels over the wire, in both
//! directions.

use bytes::Bytes;

/// A decoded (or to-be-encoded) protocol value
///
/// Absence is tracked per variant: `BulkString(None)` and `Array(None)` are
/// distinct in memory even though both encode to the same null sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `+<text>\r\n`
    SimpleString(String),

    /// `-<text>\r\n`
    Error(String),

    /// `:<integer>\r\n`
    Integer(i64),

    /// `$<len>\r\n<bytes>\r\n`, or `$-1\r\n` when absent
    BulkString(Option<Bytes>),

    /// `*<count>\r\n<values...>`, or the null sentinel when absent
    Array(Option<Vec<Value>>),
}

impl Value {
    /// `+OK`
    pub fn ok() -> Self {
        Value::SimpleString("OK".to_string())
    }

    /// A simple (status) string reply
    pub fn simple(text: impl Into<String>) -> Self {
        Value::SimpleString(text.into())
    }

    /// An error reply
    pub fn error(text: impl Into<String>) -> Self {
        Value::Error(text.into())
    }

    /// A present bulk string
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Value::BulkString(Some(data.into()))
    }

    /// A present array
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Some(items))
    }

    /// The absent bulk string
    pub fn null_bulk() -> Self {
        Value::BulkString(None)
    }

    /// The absent array
    pub fn null_array() -> Self {
        Value::Array(None)
    }

    /// Payload of a present bulk string
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            Value::BulkString(Some(data)) => Some(data),
            _ => None,
        }
    }

    /// Elements of a present array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(Some(items)) => Some(items),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::bulk(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::bulk(Bytes::from(text))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}
