use std::collections::BTreeMap;

use crate::error::ReplyError;

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Bytes(Vec<u8>),
    Str(String),
    Int(i64),
    Float(f64),
}

impl Arg {
    /// Wire form of the argument, as the store receives it.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Arg::Bytes(bytes) => bytes.clone(),
            Arg::Str(s) => s.as_bytes().to_vec(),
            Arg::Int(i) => i.to_string().into_bytes(),
            Arg::Float(f) => f.to_string().into_bytes(),
        }
    }
}

impl From<&str> for Arg {
    fn from(val: &str) -> Self {
        Arg::Str(val.to_string())
    }
}

impl From<String> for Arg {
    fn from(val: String) -> Self {
        Arg::Str(val)
    }
}

impl From<&[u8]> for Arg {
    fn from(val: &[u8]) -> Self {
        Arg::Bytes(val.to_vec())
    }
}

impl From<Vec<u8>> for Arg {
    fn from(val: Vec<u8>) -> Self {
        Arg::Bytes(val)
    }
}

impl From<i64> for Arg {
    fn from(val: i64) -> Self {
        Arg::Int(val)
    }
}

impl From<i32> for Arg {
    fn from(val: i32) -> Self {
        Arg::Int(val.into())
    }
}

impl From<usize> for Arg {
    fn from(val: usize) -> Self {
        Arg::Int(val as i64)
    }
}

impl From<f64> for Arg {
    fn from(val: f64) -> Self {
        Arg::Float(val)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Vec<Arg>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Shorthand for [`Command::new`].
pub fn cmd(name: impl Into<String>) -> Command {
    Command::new(name)
}

/// Reply shapes a backend can hand back.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    Int(i64),
    Double(f64),
    Status(String),
    Bytes(Vec<u8>),
    Array(Vec<Reply>),
    Map(BTreeMap<String, String>),
}

impl Reply {
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Nil => "nil",
            Reply::Int(_) => "integer",
            Reply::Double(_) => "double",
            Reply::Status(_) => "status",
            Reply::Bytes(_) => "bytes",
            Reply::Array(_) => "array",
            Reply::Map(_) => "map",
        }
    }

    fn unexpected(&self, expected: &'static str) -> ReplyError {
        ReplyError::UnexpectedShape {
            expected,
            found: self.kind(),
        }
    }
}

impl From<Vec<u8>> for Reply {
    fn from(val: Vec<u8>) -> Self {
        Reply::Bytes(val)
    }
}

impl From<&str> for Reply {
    fn from(val: &str) -> Self {
        Reply::Bytes(val.as_bytes().to_vec())
    }
}

impl From<i64> for Reply {
    fn from(val: i64) -> Self {
        Reply::Int(val)
    }
}

impl From<BTreeMap<String, String>> for Reply {
    fn from(val: BTreeMap<String, String>) -> Self {
        Reply::Map(val)
    }
}

impl From<Vec<Reply>> for Reply {
    fn from(val: Vec<Reply>) -> Self {
        Reply::Array(val)
    }
}

impl TryFrom<Reply> for i64 {
    type Error = ReplyError;

    fn try_from(reply: Reply) -> Result<Self, Self::Error> {
        match reply {
            Reply::Int(value) => Ok(value),
            Reply::Bytes(ref bytes) => std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| reply.unexpected("integer")),
            other => Err(other.unexpected("integer")),
        }
    }
}

impl TryFrom<Reply> for String {
    type Error = ReplyError;

    fn try_from(reply: Reply) -> Result<Self, Self::Error> {
        match reply {
            Reply::Status(s) => Ok(s),
            Reply::Bytes(bytes) => String::from_utf8(bytes).map_err(|_| ReplyError::InvalidUtf8),
            other => Err(other.unexpected("string")),
        }
    }
}

impl TryFrom<Reply> for Vec<u8> {
    type Error = ReplyError;

    fn try_from(reply: Reply) -> Result<Self, Self::Error> {
        match reply {
            Reply::Bytes(bytes) => Ok(bytes),
            Reply::Status(s) => Ok(s.into_bytes()),
            other => Err(other.unexpected("bytes")),
        }
    }
}

impl TryFrom<Reply> for Option<Vec<u8>> {
    type Error = ReplyError;

    fn try_from(reply: Reply) -> Result<Self, Self::Error> {
        match reply {
            Reply::Nil => Ok(None),
            other => Vec::<u8>::try_from(other).map(Some),
        }
    }
}

impl TryFrom<Reply> for Vec<Vec<u8>> {
    type Error = ReplyError;

    fn try_from(reply: Reply) -> Result<Self, Self::Error> {
        match reply {
            Reply::Array(items) => items.into_iter().map(Vec::<u8>::try_from).collect(),
            Reply::Nil => Ok(Vec::new()),
            other => Err(other.unexpected("array")),
        }
    }
}

impl TryFrom<Reply> for BTreeMap<String, String> {
    type Error = ReplyError;

    fn try_from(reply: Reply) -> Result<Self, Self::Error> {
        match reply {
            Reply::Map(map) => Ok(map),
            // RESP2 stores hand maps back as flat key/value arrays.
            Reply::Array(items) => {
                if items.len() % 2 != 0 {
                    return Err(ReplyError::OddPairs(items.len()));
                }

                let mut map = BTreeMap::new();
                let mut items = items.into_iter();
                while let (Some(key), Some(value)) = (items.next(), items.next()) {
                    map.insert(String::try_from(key)?, String::try_from(value)?);
                }
                Ok(map)
            }
            other => Err(other.unexpected("map")),
        }
    }
}
