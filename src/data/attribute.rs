//! Attribute values.

use std::fmt;

/// Value of a node attribute.
///
/// Text is always held as a `String`: byte-encoded strings are decoded once,
/// when the store is read, so lookups never compare bytes against text.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Text value.
    Text(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value. Persisted as the ODIM strings `True`/`False`.
    Bool(bool),
    /// Integer sequence.
    Ints(Vec<i64>),
    /// Floating point sequence.
    Floats(Vec<f64>),
    /// Text sequence.
    Texts(Vec<String>),
}

impl AttrValue {
    /// Decode a byte string into text, dropping trailing NUL padding.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Self::Text(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar numeric content. Integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Scalar integer content. Floats with no fractional part are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Whether this is a text value (stored as a string rather than a number).
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Loose equality used by attribute lookups: numbers compare by value
    /// regardless of integer/float storage, everything else must match exactly.
    pub fn matches(&self, other: &AttrValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Parse a command-line value: integer, then float, then text.
    pub fn parse_loose(raw: &str) -> Self {
        if let Ok(v) = raw.parse::<i64>() {
            Self::Int(v)
        } else if let Ok(v) = raw.parse::<f64>() {
            Self::Float(v)
        } else {
            Self::Text(raw.to_string())
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Ints(v) => write!(f, "{:?}", v),
            Self::Floats(v) => write!(f, "{:?}", v),
            Self::Texts(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Floats(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        Self::Ints(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        Self::Texts(v)
    }
}
