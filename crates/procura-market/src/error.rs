//! Marketplace error types.

use procura_core::error::ProcuraError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("not enough permissions")]
    NotEnoughPermissions,

    #[error("user has no organization")]
    NoOrganization,

    #[error("status cannot be changed")]
    StatusCannotBeChanged,

    #[error("incorrect status: {0}")]
    IncorrectStatus(String),

    #[error("nothing to change")]
    NothingToChange,

    #[error("pass feedback")]
    EmptyFeedback,

    #[error("tender {0} has already been closed")]
    TenderClosed(Uuid),
}

impl From<MarketError> for ProcuraError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::NotEnoughPermissions | MarketError::NoOrganization => {
                ProcuraError::Forbidden {
                    reason: err.to_string(),
                }
            }
            MarketError::StatusCannotBeChanged => ProcuraError::Conflict {
                reason: err.to_string(),
            },
            MarketError::IncorrectStatus(_)
            | MarketError::NothingToChange
            | MarketError::EmptyFeedback => ProcuraError::InvalidInput {
                message: err.to_string(),
            },
            MarketError::TenderClosed(tender_id) => ProcuraError::TenderClosed { tender_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procura_core::error::ErrorKind;

    #[test]
    fn maps_onto_shared_taxonomy() {
        let cases = [
            (MarketError::NotEnoughPermissions, ErrorKind::Forbidden),
            (MarketError::NoOrganization, ErrorKind::Forbidden),
            (MarketError::StatusCannotBeChanged, ErrorKind::Conflict),
            (MarketError::NothingToChange, ErrorKind::InvalidInput),
            (MarketError::EmptyFeedback, ErrorKind::InvalidInput),
            (MarketError::TenderClosed(Uuid::nil()), ErrorKind::Conflict),
        ];
        for (err, kind) in cases {
            assert_eq!(ProcuraError::from(err).kind(), kind);
        }
    }
}
