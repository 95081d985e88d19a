//! Error types for heat generation and result recording.

use thiserror::Error;

use crate::models::PlacementError;

pub type MeetResult<T> = Result<T, MeetError>;

/// Errors surfaced by the engine, the recorder and the store.
///
/// `NotFound` and `PreconditionFailed` are caller-correctable and safe to show
/// to an operator verbatim. The remaining variants are internal failures.
#[derive(Error, Debug)]
pub enum MeetError {
    /// A round, event, heat, athlete or athlete-heat pair is missing
    #[error("{0} not found")]
    NotFound(String),

    /// The request is well-formed but the current data does not allow it
    #[error("{0}")]
    PreconditionFailed(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Database(#[from] rusqlite::Error),

    /// Placement snapshot (de)serialization error
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MeetError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }
}

impl From<PlacementError> for MeetError {
    fn from(err: PlacementError) -> Self {
        MeetError::Internal(err.to_string())
    }
}
