//! Bid domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProcuraError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BidStatus {
    Created,
    Published,
    Canceled,
    Approved,
    Rejected,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Created => "Created",
            BidStatus::Published => "Published",
            BidStatus::Canceled => "Canceled",
            BidStatus::Approved => "Approved",
            BidStatus::Rejected => "Rejected",
        }
    }

    /// Canceled, approved and rejected bids are frozen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BidStatus::Canceled | BidStatus::Approved | BidStatus::Rejected
        )
    }

    /// Statuses the authoring side may set directly. `Approved` and
    /// `Rejected` are only reachable through a decision.
    pub fn is_author_settable(&self) -> bool {
        matches!(
            self,
            BidStatus::Created | BidStatus::Published | BidStatus::Canceled
        )
    }
}

impl FromStr for BidStatus {
    type Err = ProcuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(BidStatus::Created),
            "Published" => Ok(BidStatus::Published),
            "Canceled" => Ok(BidStatus::Canceled),
            "Approved" => Ok(BidStatus::Approved),
            "Rejected" => Ok(BidStatus::Rejected),
            other => Err(ProcuraError::invalid(format!("incorrect bid status: {other}"))),
        }
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AuthorType {
    User,
    Organization,
}

impl AuthorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorType::User => "User",
            AuthorType::Organization => "Organization",
        }
    }
}

impl FromStr for AuthorType {
    type Err = ProcuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(AuthorType::User),
            "Organization" => Ok(AuthorType::Organization),
            other => Err(ProcuraError::invalid(format!("incorrect author type: {other}"))),
        }
    }
}

impl fmt::Display for AuthorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome submitted by a responsible of the tender's organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl FromStr for Decision {
    type Err = ProcuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Approved" => Ok(Decision::Approved),
            "Rejected" => Ok(Decision::Rejected),
            other => Err(ProcuraError::invalid(format!("incorrect decision: {other}"))),
        }
    }
}

impl From<Decision> for BidStatus {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Approved => BidStatus::Approved,
            Decision::Rejected => BidStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    /// Employee who authored the bid. The authoring organization is the
    /// one this employee acts for.
    pub author_id: Uuid,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBid {
    pub tender_id: Uuid,
    pub name: String,
    pub description: String,
    pub author_type: AuthorType,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BidPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl BidPatch {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.filter(|s| !s.trim().is_empty()),
            description: self.description.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Archived copy of a bid's mutable fields at `version`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BidSnapshot {
    pub bid_id: Uuid,
    pub version: u32,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub archived_at: DateTime<Utc>,
}

/// Result of recording an approve vote.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub bid: Bid,
    /// Distinct approving responsibles after this vote.
    pub votes: u64,
    pub quorum: u64,
    /// `true` when this vote completed the quorum, approving the bid and
    /// closing its tender.
    pub finalized: bool,
}
