//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Version-bumping mutations are
//! expected to run as a single atomic unit against the store: the
//! pre-mutation row is archived and the row is rewritten together, or
//! not at all.

use uuid::Uuid;

use crate::error::{ProcuraError, ProcuraResult};
use crate::models::{
    bid::{Bid, BidPatch, BidSnapshot, BidStatus, CreateBid, VoteOutcome},
    employee::{CreateEmployee, Employee},
    feedback::{CreateFeedback, Feedback},
    organization::{CreateOrganization, Organization},
    tender::{CreateTender, ServiceTypeFilter, Tender, TenderPatch, TenderSnapshot, TenderStatus},
};

pub const DEFAULT_PAGE_LIMIT: u64 = 5;

/// Largest `limit`/`offset` the store accepts; it binds them as signed
/// 64-bit integers.
pub const MAX_PAGE_VALUE: u64 = i64::MAX as u64;

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    /// Parse raw `limit`/`offset` query values. Missing, non-numeric,
    /// negative or out-of-range values fall back to `default_limit` and 0
    /// without an error.
    pub fn from_query(limit: Option<&str>, offset: Option<&str>, default_limit: u64) -> Self {
        Self {
            offset: parse_page_value(offset).unwrap_or(0),
            limit: parse_page_value(limit).unwrap_or(default_limit),
        }
    }

    /// Cap `limit` at `max` and keep both values within [`MAX_PAGE_VALUE`].
    pub fn clamp_limit(self, max: u64) -> Self {
        Self {
            offset: self.offset.min(MAX_PAGE_VALUE),
            limit: self.limit.min(max).min(MAX_PAGE_VALUE),
        }
    }
}

fn parse_page_value(raw: Option<&str>) -> Option<u64> {
    let value = raw?.trim().parse::<i64>().ok()?;
    u64::try_from(value).ok()
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Caller-supplied identity. Missing or blank usernames are rejected
/// before any lookup.
pub fn require_username(username: Option<&str>) -> ProcuraResult<&str> {
    match username.map(str::trim) {
        Some(u) if !u.is_empty() => Ok(u),
        _ => Err(ProcuraError::forbidden("pass username")),
    }
}

// ---------------------------------------------------------------------------
// Employees, organizations and membership
// ---------------------------------------------------------------------------

pub trait MembershipRepository: Send + Sync {
    fn create_employee(
        &self,
        input: CreateEmployee,
    ) -> impl Future<Output = ProcuraResult<Employee>> + Send;
    fn get_employee(&self, id: Uuid) -> impl Future<Output = ProcuraResult<Employee>> + Send;
    fn get_employee_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = ProcuraResult<Employee>> + Send;

    fn create_organization(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = ProcuraResult<Organization>> + Send;
    fn get_organization(
        &self,
        id: Uuid,
    ) -> impl Future<Output = ProcuraResult<Organization>> + Send;

    /// Make an employee a responsible of an organization (creates a
    /// `responsible_for` edge). Adding an existing member is a no-op.
    fn add_responsible(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = ProcuraResult<()>> + Send;

    fn is_responsible_for(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> impl Future<Output = ProcuraResult<bool>> + Send;

    /// The organization an employee controls: the earliest membership,
    /// or `None` for an employee without any.
    fn organization_of(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = ProcuraResult<Option<Uuid>>> + Send;

    fn responsible_count(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = ProcuraResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Tenders
// ---------------------------------------------------------------------------

pub trait TenderRepository: Send + Sync {
    fn create(&self, input: CreateTender) -> impl Future<Output = ProcuraResult<Tender>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ProcuraResult<Tender>> + Send;

    /// Published tenders only, ordered by name.
    fn list_published(
        &self,
        filter: &ServiceTypeFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ProcuraResult<PaginatedResult<Tender>>> + Send;

    /// All tenders of an organization regardless of status, ordered by name.
    fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ProcuraResult<PaginatedResult<Tender>>> + Send;

    /// Fails with `TenderClosed` if the tender is closed at write time.
    fn update_status(
        &self,
        id: Uuid,
        status: TenderStatus,
    ) -> impl Future<Output = ProcuraResult<Tender>> + Send;

    /// Applies the provided fields; always bumps the version.
    fn update(
        &self,
        id: Uuid,
        patch: TenderPatch,
    ) -> impl Future<Output = ProcuraResult<Tender>> + Send;

    /// Restore the fields archived at `version` as a new version.
    fn rollback(
        &self,
        id: Uuid,
        version: u32,
    ) -> impl Future<Output = ProcuraResult<Tender>> + Send;

    fn get_version(
        &self,
        id: Uuid,
        version: u32,
    ) -> impl Future<Output = ProcuraResult<TenderSnapshot>> + Send;

    /// Archived snapshots in ascending version order.
    fn list_versions(
        &self,
        id: Uuid,
    ) -> impl Future<Output = ProcuraResult<Vec<TenderSnapshot>>> + Send;
}

// ---------------------------------------------------------------------------
// Bids
// ---------------------------------------------------------------------------

/// Which bids of a tender a viewing organization may list.
///
/// Two independent grants: bids authored by the viewer's own members
/// (any status), and published bids when the viewer owns the tender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidAudience {
    pub organization_id: Uuid,
    pub owns_tender: bool,
}

pub trait BidRepository: Send + Sync {
    fn create(&self, input: CreateBid) -> impl Future<Output = ProcuraResult<Bid>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ProcuraResult<Bid>> + Send;

    fn list_by_author(
        &self,
        author_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ProcuraResult<PaginatedResult<Bid>>> + Send;

    fn list_for_tender(
        &self,
        tender_id: Uuid,
        audience: BidAudience,
        pagination: Pagination,
    ) -> impl Future<Output = ProcuraResult<PaginatedResult<Bid>>> + Send;

    /// Fails with `Conflict` if the bid is in a terminal status at write time.
    fn update_status(
        &self,
        id: Uuid,
        status: BidStatus,
    ) -> impl Future<Output = ProcuraResult<Bid>> + Send;

    fn update(&self, id: Uuid, patch: BidPatch)
    -> impl Future<Output = ProcuraResult<Bid>> + Send;

    fn rollback(&self, id: Uuid, version: u32)
    -> impl Future<Output = ProcuraResult<Bid>> + Send;

    fn get_version(
        &self,
        id: Uuid,
        version: u32,
    ) -> impl Future<Output = ProcuraResult<BidSnapshot>> + Send;

    fn list_versions(
        &self,
        id: Uuid,
    ) -> impl Future<Output = ProcuraResult<Vec<BidSnapshot>>> + Send;
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

pub trait DecisionRepository: Send + Sync {
    /// Move a published bid to `Rejected`. The tender is left untouched.
    fn reject(&self, bid_id: Uuid) -> impl Future<Output = ProcuraResult<Bid>> + Send;

    /// Record an approve vote and evaluate the quorum in one serialized
    /// transaction. Quorum is `min(max_quorum, responsible count)` of the
    /// tender's organization; reaching it approves the bid and closes the
    /// tender together. Repeated votes by the same voter count once.
    fn record_approval(
        &self,
        bid_id: Uuid,
        voter_id: Uuid,
        max_quorum: u64,
    ) -> impl Future<Output = ProcuraResult<VoteOutcome>> + Send;

    fn approval_count(&self, bid_id: Uuid) -> impl Future<Output = ProcuraResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Feedback (append-only)
// ---------------------------------------------------------------------------

pub trait FeedbackRepository: Send + Sync {
    /// Append a review. No update or delete operations exist.
    fn append(
        &self,
        input: CreateFeedback,
    ) -> impl Future<Output = ProcuraResult<Feedback>> + Send;

    /// Reviews left on `tender_id` bids authored by `author_id`, oldest first.
    fn list_for_author(
        &self,
        tender_id: Uuid,
        author_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ProcuraResult<PaginatedResult<Feedback>>> + Send;
}
