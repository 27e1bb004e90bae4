//! Error types for the Procura marketplace.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProcuraError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("User doesn't exist or is incorrect: {username}")]
    UnknownUser { username: String },

    #[error("Version not found: {entity} {id} has no version {version}")]
    VersionNotFound {
        entity: String,
        id: String,
        version: u32,
    },

    #[error("Not enough permissions: {reason}")]
    Forbidden { reason: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Tender {tender_id} has already been closed")]
    TenderClosed { tender_id: Uuid },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by the transport layer to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidInput,
    Conflict,
    Internal,
}

impl ProcuraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcuraError::NotFound { .. }
            | ProcuraError::UnknownUser { .. }
            | ProcuraError::VersionNotFound { .. } => ErrorKind::NotFound,
            ProcuraError::Forbidden { .. } => ErrorKind::Forbidden,
            ProcuraError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ProcuraError::Conflict { .. } | ProcuraError::TenderClosed { .. } => {
                ErrorKind::Conflict
            }
            ProcuraError::Database(_) | ProcuraError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// A conflict raised by the store when two transactions touched the
    /// same record. The caller may resubmit the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProcuraError::Conflict { reason } if reason.starts_with(RETRYABLE_PREFIX))
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        ProcuraError::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ProcuraError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        ProcuraError::Conflict {
            reason: reason.into(),
        }
    }

    pub fn retryable_conflict(detail: impl std::fmt::Display) -> Self {
        ProcuraError::Conflict {
            reason: format!("{RETRYABLE_PREFIX}{detail}"),
        }
    }
}

const RETRYABLE_PREFIX: &str = "concurrent update, retry: ";

pub type ProcuraResult<T> = Result<T, ProcuraError>;
