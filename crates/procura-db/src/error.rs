//! Database-specific error types and conversions.

use procura_core::error::ProcuraError;
use uuid::Uuid;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Version not found: {entity} {id} v{version}")]
    VersionNotFound {
        entity: String,
        id: String,
        version: u32,
    },

    #[error("Tender {0} has already been closed")]
    TenderClosed(Uuid),

    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Transaction conflict: {0}")]
    TxConflict(String),
}

impl From<DbError> for ProcuraError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ProcuraError::NotFound { entity, id },
            DbError::VersionNotFound {
                entity,
                id,
                version,
            } => ProcuraError::VersionNotFound {
                entity,
                id,
                version,
            },
            DbError::TenderClosed(tender_id) => ProcuraError::TenderClosed { tender_id },
            DbError::StateConflict(reason) => ProcuraError::Conflict { reason },
            DbError::TxConflict(detail) => ProcuraError::retryable_conflict(detail),
            other => ProcuraError::Database(other.to_string()),
        }
    }
}

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}
