//! Failure classification for guarded SurrealQL transactions.
//!
//! Mutations that must observe the current row (terminal-state checks,
//! snapshot lookups, quorum evaluation) run as one `BEGIN ... COMMIT`
//! block. A failed precondition `THROW`s a `guard:<name>` marker, which
//! cancels the whole transaction and surfaces here as a [`TxFailure`].

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::DbError;

/// A precondition thrown from inside a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Guard {
    Missing,
    TenderMissing,
    TenderClosed,
    BidTerminal,
    BidNotPublished,
    VersionMissing,
}

impl Guard {
    const ALL: [Guard; 6] = [
        Guard::Missing,
        Guard::TenderMissing,
        Guard::TenderClosed,
        Guard::BidTerminal,
        Guard::BidNotPublished,
        Guard::VersionMissing,
    ];

    pub(crate) fn marker(self) -> &'static str {
        match self {
            Guard::Missing => "guard:missing",
            Guard::TenderMissing => "guard:tender_missing",
            Guard::TenderClosed => "guard:tender_closed",
            Guard::BidTerminal => "guard:bid_terminal",
            Guard::BidNotPublished => "guard:bid_not_published",
            Guard::VersionMissing => "guard:version_missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TxFailure {
    /// `subject` is the record id appended to the marker, if any
    /// (`guard:tender_closed:<uuid>`).
    Guard {
        guard: Guard,
        subject: Option<Uuid>,
    },
    /// The store aborted the commit because another transaction wrote
    /// the same records.
    Conflict(String),
    Other(String),
}

const CONFLICT_MARKERS: [&str; 3] = ["read or write conflict", "can be retried", "Transaction conflict"];

/// Classify the error messages of a failed transaction. A thrown guard
/// wins over the generic "not executed due to a failed transaction"
/// errors reported for the sibling statements.
pub(crate) fn classify<S: AsRef<str>>(messages: &[S]) -> Option<TxFailure> {
    if messages.is_empty() {
        return None;
    }
    for guard in Guard::ALL {
        for m in messages {
            let m = m.as_ref();
            if let Some(pos) = m.find(guard.marker()) {
                let rest = &m[pos + guard.marker().len()..];
                let subject = rest
                    .strip_prefix(':')
                    .and_then(|r| r.get(..36))
                    .and_then(|r| Uuid::parse_str(r).ok());
                return Some(TxFailure::Guard { guard, subject });
            }
        }
    }
    if let Some(m) = messages
        .iter()
        .find(|m| CONFLICT_MARKERS.iter().any(|c| m.as_ref().contains(c)))
    {
        return Some(TxFailure::Conflict(m.as_ref().to_string()));
    }
    Some(TxFailure::Other(messages[0].as_ref().to_string()))
}

/// Inspect the per-statement errors taken from a query response.
pub(crate) fn outcome(errors: HashMap<usize, surrealdb::Error>) -> Result<(), TxFailure> {
    let mut indexed: Vec<(usize, String)> = errors
        .into_iter()
        .map(|(idx, e)| (idx, e.to_string()))
        .collect();
    indexed.sort_by_key(|(idx, _)| *idx);
    let messages: Vec<String> = indexed.into_iter().map(|(_, m)| m).collect();
    match classify(&messages) {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}

/// Map a transaction failure on `entity` `id` onto a [`DbError`].
pub(crate) fn into_db_error(
    failure: TxFailure,
    entity: &str,
    id: Uuid,
    version: Option<u32>,
) -> DbError {
    match failure {
        TxFailure::Guard { guard, subject } => match guard {
            Guard::Missing => DbError::NotFound {
                entity: entity.to_string(),
                id: subject.unwrap_or(id).to_string(),
            },
            Guard::TenderMissing => DbError::NotFound {
                entity: "tender".into(),
                id: subject.unwrap_or(id).to_string(),
            },
            Guard::TenderClosed => DbError::TenderClosed(subject.unwrap_or(id)),
            Guard::BidTerminal => {
                DbError::StateConflict(format!("bid {id} can no longer be changed"))
            }
            Guard::BidNotPublished => {
                DbError::StateConflict(format!("bid {id} is not published"))
            }
            Guard::VersionMissing => DbError::VersionNotFound {
                entity: entity.to_string(),
                id: id.to_string(),
                version: version.unwrap_or_default(),
            },
        },
        TxFailure::Conflict(detail) => DbError::TxConflict(detail),
        TxFailure::Other(detail) => DbError::Query(detail),
    }
}

/// Errors raised while sending the query rather than per statement.
pub(crate) fn from_send_error(err: surrealdb::Error) -> TxFailure {
    let message = err.to_string();
    classify(&[message.as_str()]).unwrap_or(TxFailure::Other(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_means_success() {
        assert_eq!(classify::<&str>(&[]), None);
    }

    #[test]
    fn thrown_guard_beats_sibling_errors() {
        let msgs = [
            "The query was not executed due to a failed transaction",
            "An error occurred: guard:tender_closed",
            "The query was not executed due to a failed transaction",
        ];
        assert_eq!(
            classify(&msgs),
            Some(TxFailure::Guard {
                guard: Guard::TenderClosed,
                subject: None
            })
        );
    }

    #[test]
    fn guard_subject_is_parsed() {
        let id = Uuid::new_v4();
        let msg = format!("An error occurred: guard:tender_closed:{id}");
        assert_eq!(
            classify(&[msg]),
            Some(TxFailure::Guard {
                guard: Guard::TenderClosed,
                subject: Some(id)
            })
        );
    }

    #[test]
    fn missing_version_maps_to_typed_error() {
        let id = Uuid::new_v4();
        let failure = TxFailure::Guard {
            guard: Guard::VersionMissing,
            subject: None,
        };
        assert!(matches!(
            into_db_error(failure, "tender", id, Some(7)),
            DbError::VersionNotFound { version: 7, .. }
        ));
    }

    #[test]
    fn missing_tender_is_reported_as_tender() {
        let bid_id = Uuid::new_v4();
        let tender_id = Uuid::new_v4();
        let msg = format!("An error occurred: guard:tender_missing:{tender_id}");
        let failure = classify(&[msg]).unwrap();
        match into_db_error(failure, "bid", bid_id, None) {
            DbError::NotFound { entity, id } => {
                assert_eq!(entity, "tender");
                assert_eq!(id, tender_id.to_string());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn commit_conflicts_are_recognised() {
        let msgs = ["Failed to commit transaction due to a read or write conflict. This transaction can be retried"];
        assert!(matches!(classify(&msgs), Some(TxFailure::Conflict(_))));
    }

    #[test]
    fn unknown_errors_are_passed_through() {
        let msgs = ["Found 'x' for field `version`, but expected a int"];
        assert!(matches!(classify(&msgs), Some(TxFailure::Other(m)) if m.contains("version")));
    }
}
