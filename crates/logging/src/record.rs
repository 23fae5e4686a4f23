//! crates/logging/src/record.rs
//! The unit handed to a [`RecordSink`](crate::RecordSink).

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::frame::Frame;
use crate::level::Level;

/// Attribute value carried by a [`Field`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Text.
    Str(String),
    /// Signed integer.
    I64(i64),
    /// Unsigned integer.
    U64(u64),
    /// Floating point number.
    F64(f64),
    /// Boolean.
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            Self::I64(value) => write!(f, "{value}"),
            Self::U64(value) => write!(f, "{value}"),
            Self::F64(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )+
    };
}

value_from!(Str: String, &str);
value_from!(I64: i64, i32, i16, i8);
value_from!(U64: u64, u32, u16, u8);
value_from!(F64: f64, f32);
value_from!(Bool: bool);

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::U64(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

/// A key/value attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Attribute name.
    pub key: String,
    /// Attribute value.
    pub value: Value,
}

impl Field {
    /// Creates a field.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An admitted log event.
#[derive(Clone, Debug)]
pub struct Record {
    /// Severity.
    pub level: Level,
    /// Rendered message.
    pub message: String,
    /// Context fields of the logger followed by the call's own fields.
    pub fields: Vec<Field>,
    /// First application frame, when attribution succeeded.
    pub caller: Option<Frame>,
    /// Name of the emitting logger.
    pub logger: Option<Arc<str>>,
    /// Time the record was created.
    pub timestamp: SystemTime,
}

impl Record {
    /// Creates a record stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            fields: Vec::new(),
            caller: None,
            logger: None,
            timestamp: SystemTime::now(),
        }
    }

    /// Reports whether caller metadata is present.
    pub fn caller_defined(&self) -> bool {
        self.caller.is_some()
    }

    /// Looks up a field by key, preferring the most recently added one.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .rev()
            .find(|field| field.key == key)
            .map(|field| &field.value)
    }
}
