//! Errors raised to scripts by the `uos` module.

use thiserror::Error;

use crate::errno::{Errno, FatResult};
use crate::fs::FsError;

/// Result type for module operations
pub type Result<T> = std::result::Result<T, OsError>;

/// Exceptions surfaced to the scripting runtime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OsError {
    #[error("OSError: {0}")]
    Os(Errno),

    #[error("AttributeError: '{type_name}' object has no attribute '{attr}'")]
    Attribute { type_name: String, attr: String },

    #[error("TypeError: {0}")]
    Type(String),

    #[error("ValueError: {0}")]
    Value(String),
}

impl OsError {
    pub fn errno(&self) -> Option<Errno> {
        match self {
            OsError::Os(errno) => Some(*errno),
            _ => None,
        }
    }
}

impl From<Errno> for OsError {
    fn from(errno: Errno) -> Self {
        OsError::Os(errno)
    }
}

impl From<FatResult> for OsError {
    fn from(result: FatResult) -> Self {
        OsError::Os(result.to_errno())
    }
}

impl From<FsError> for OsError {
    fn from(err: FsError) -> Self {
        log::debug!("{}", err);
        OsError::Os(err.errno())
    }
}
