use std::fmt::{self, Display};

/// Errors produced by model parsing and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    UnknownUpdateFrequency(String),
    UnknownCacheKind(String),
    UnknownRequest(String),
    MalformedRequest(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownUpdateFrequency(raw) => {
                write!(f, "unknown update frequency: {raw}")
            }
            ModelError::UnknownCacheKind(raw) => {
                write!(f, "unknown cache kind: {raw}")
            }
            ModelError::UnknownRequest(kind) => {
                write!(f, "Unknown request type: {kind}")
            }
            ModelError::MalformedRequest(msg) => {
                write!(f, "malformed request: {msg}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
