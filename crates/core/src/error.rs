//! Error taxonomy for the core boundary.

use thiserror::Error;

use crate::cursor::CursorError;
use crate::lifecycle::Lifecycle;

/// Stable numeric result codes handed to host shells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResultCode {
    Ok = 0,
    InvalidArgument = 1,
    Unsupported = 2,
    BufferTooSmall = 3,
    Internal = 4,
    Io = 5,
    BadState = 6,
    ParseFailed = 7,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Malformed caller input: unknown enum value, non-finite float,
    /// undersized struct, or a save blob failing bounds/checksum checks.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Lifecycle precondition violated.
    #[error("{op} requires lifecycle {required}, core is {actual}")]
    BadState {
        op: &'static str,
        required: &'static str,
        actual: Lifecycle,
    },

    /// Forward-incompatible input (unknown struct version, ABI major mismatch).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Output buffer too small; `required` is the size the call needs.
    #[error("buffer too small: need {required} bytes, got {capacity}")]
    BufferTooSmall { required: usize, capacity: usize },

    #[error("internal error: {0}")]
    Internal(String),

    /// Reserved for content sources.
    #[error("content parse failed: {0}")]
    ParseFailed(String),

    /// Reserved for content sources.
    #[error("content io error: {0}")]
    Io(String),
}

impl CoreError {
    pub fn invalid_arg(msg: impl Into<String>) -> Self {
        CoreError::InvalidArg(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        CoreError::Unsupported(msg.into())
    }

    pub fn code(&self) -> ResultCode {
        match self {
            CoreError::InvalidArg(_) => ResultCode::InvalidArgument,
            CoreError::BadState { .. } => ResultCode::BadState,
            CoreError::Unsupported(_) => ResultCode::Unsupported,
            CoreError::BufferTooSmall { .. } => ResultCode::BufferTooSmall,
            CoreError::Internal(_) => ResultCode::Internal,
            CoreError::ParseFailed(_) => ResultCode::ParseFailed,
            CoreError::Io(_) => ResultCode::Io,
        }
    }
}

impl From<CursorError> for CoreError {
    fn from(err: CursorError) -> Self {
        CoreError::InvalidArg(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
