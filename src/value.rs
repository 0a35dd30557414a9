//! The value flowing through a filter pipeline.

use std::fmt;

/// Either text or raw bytes. The kind is never changed implicitly; only
/// named boundary filters convert between the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Bytes(Vec<u8>),
}

/// Which variant a [`FilterValue`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Bytes,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Text => write!(f, "text"),
            ValueKind::Bytes => write!(f, "binary data"),
        }
    }
}

impl FilterValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FilterValue::Text(_) => ValueKind::Text,
            FilterValue::Bytes(_) => ValueKind::Bytes,
        }
    }

    /// Byte view used by byte-consuming filters. Text is taken as UTF-8.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FilterValue::Text(s) => s.as_bytes(),
            FilterValue::Bytes(b) => b,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FilterValue::Text(s) => s.into_bytes(),
            FilterValue::Bytes(b) => b,
        }
    }

    /// Returns the text, or `None` if the value holds bytes.
    pub fn into_text(self) -> Option<String> {
        match self {
            FilterValue::Text(s) => Some(s),
            FilterValue::Bytes(_) => None,
        }
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<Vec<u8>> for FilterValue {
    fn from(value: Vec<u8>) -> Self {
        FilterValue::Bytes(value)
    }
}
