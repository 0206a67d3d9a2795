//! Stage outcomes.
//!
//! Remote failures collapse into one small taxonomy before they reach
//! pipeline fields or view panels. The display layer decides what a user
//! sees; the tagged kind stays available for anything smarter.

use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// How a stage failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network-level failure (connect, timeout).
    Transport,
    /// The collaborator answered with a non-success status.
    Status,
    /// The response body could not be decoded.
    Decode,
}

/// A failed stage, with the collaborator's detail preserved for logs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{detail}")]
pub struct StageError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl From<ApiError> for StageError {
    fn from(e: ApiError) -> Self {
        let kind = match &e {
            ApiError::ConnectionFailed(_) | ApiError::Timeout(_) => ErrorKind::Transport,
            ApiError::Status { .. } => ErrorKind::Status,
            ApiError::Parse(_) => ErrorKind::Decode,
        };
        Self {
            kind,
            detail: e.to_string(),
        }
    }
}

/// Outcome of one stage attempt
pub type StageResult<T> = Result<T, StageError>;
