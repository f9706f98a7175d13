//! Error taxonomy for attendance operations.

use serde::Serialize;
use thiserror::Error;

use crate::dates::InvalidRange;
use crate::types::{ParticipantId, SessionId};

/// Boxed error from a collaborator implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the reconciler and the statistics aggregator.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// A session's date range is inverted.
    #[error(transparent)]
    InvalidRange(#[from] InvalidRange),

    /// The session id does not resolve in the session directory.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The participant id does not resolve in the participant directory.
    #[error("participant {0} not found")]
    ParticipantNotFound(ParticipantId),

    /// One or more entries of a bulk submission are invalid. Nothing was written.
    #[error("attendance batch rejected: {}", invalid_entries(.0.len()))]
    ValidationFailed(Vec<EntryError>),

    /// The bulk upsert did not commit. Nothing was written.
    #[error("attendance transaction failed: {0}")]
    TransactionFailed(#[source] BoxError),

    /// A directory or store read failed.
    #[error("storage error: {0}")]
    Storage(#[source] BoxError),
}

impl AttendanceError {
    pub(crate) fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }

    pub(crate) fn transaction<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::TransactionFailed(Box::new(err))
    }

    /// Stable machine-readable name of the error kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRange(_) => "invalid_range",
            Self::SessionNotFound(_) => "session_not_found",
            Self::ParticipantNotFound(_) => "participant_not_found",
            Self::ValidationFailed(_) => "validation_failed",
            Self::TransactionFailed(_) => "transaction_failed",
            Self::Storage(_) => "storage",
        }
    }

    /// HTTP status an API layer should answer with.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::SessionNotFound(_) | Self::ParticipantNotFound(_) => 404,
            Self::ValidationFailed(_) => 422,
            Self::TransactionFailed(_) => 503,
            Self::InvalidRange(_) | Self::Storage(_) => 500,
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionFailed(_))
    }

    /// Per-entry errors of a rejected batch; empty for other kinds.
    pub fn entry_errors(&self) -> &[EntryError] {
        match self {
            Self::ValidationFailed(errors) => errors,
            _ => &[],
        }
    }
}

fn invalid_entries(count: usize) -> String {
    if count == 1 {
        "1 invalid entry".to_string()
    } else {
        format!("{count} invalid entries")
    }
}

/// One invalid field of one bulk submission entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryError {
    /// Zero-based position of the entry in the submitted batch.
    pub index: usize,
    pub field: &'static str,
    pub message: String,
}

impl EntryError {
    pub(crate) fn new(index: usize, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            index,
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_counts_entries() {
        let one = AttendanceError::ValidationFailed(vec![EntryError::new(2, "status", "bad")]);
        assert_eq!(one.to_string(), "attendance batch rejected: 1 invalid entry");

        let two = AttendanceError::ValidationFailed(vec![
            EntryError::new(0, "status", "bad"),
            EntryError::new(4, "participant_id", "missing"),
        ]);
        assert_eq!(two.to_string(), "attendance batch rejected: 2 invalid entries");
        assert_eq!(two.entry_errors().len(), 2);
    }

    #[test]
    fn status_codes_by_kind() {
        assert_eq!(AttendanceError::SessionNotFound(SessionId(3)).status_code(), 404);
        assert_eq!(
            AttendanceError::ParticipantNotFound(ParticipantId(3)).status_code(),
            404
        );
        assert_eq!(AttendanceError::ValidationFailed(Vec::new()).status_code(), 422);

        let tx = AttendanceError::transaction(std::io::Error::other("disk full"));
        assert_eq!(tx.status_code(), 503);
        assert!(tx.is_retryable());
        assert_eq!(tx.kind(), "transaction_failed");
        assert_eq!(tx.to_string(), "attendance transaction failed: disk full");
    }

    #[test]
    fn only_transaction_failures_are_retryable() {
        assert!(!AttendanceError::SessionNotFound(SessionId(1)).is_retryable());
        assert!(!AttendanceError::storage(std::io::Error::other("locked")).is_retryable());
        assert!(!AttendanceError::ValidationFailed(Vec::new()).is_retryable());
    }
}
