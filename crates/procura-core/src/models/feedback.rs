//! Reviewer feedback on bids (append-only).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub bid_id: Uuid,
    /// Responsible of the tender's organization who left the review.
    pub user_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeedback {
    pub tender_id: Uuid,
    pub bid_id: Uuid,
    pub user_id: Uuid,
    pub description: String,
}
