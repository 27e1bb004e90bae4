//! SurrealDB repository implementations.

mod bid;
mod decision;
mod feedback;
mod membership;
mod tender;

pub use bid::SurrealBidRepository;
pub use decision::SurrealDecisionRepository;
pub use feedback::SurrealFeedbackRepository;
pub use membership::SurrealMembershipRepository;
pub use tender::SurrealTenderRepository;

use surrealdb_types::SurrealValue;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}
