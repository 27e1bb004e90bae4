//! Bid lifecycle.

use procura_core::error::ProcuraResult;
use procura_core::models::bid::{Bid, BidPatch, BidSnapshot, BidStatus, CreateBid};
use procura_core::models::tender::TenderStatus;
use procura_core::repository::{
    BidRepository, MembershipRepository, PaginatedResult, Pagination, TenderRepository,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MarketConfig;
use crate::error::MarketError;
use crate::membership::MembershipResolver;
use crate::visibility::{self, BidRelation};

/// Bid lifecycle service.
///
/// Authorization on an existing bid belongs to its author side: the
/// author, or a responsible of the author's organization.
pub struct BidService<M: MembershipRepository, T: TenderRepository, B: BidRepository> {
    members: MembershipResolver<M>,
    tenders: T,
    bids: B,
    config: MarketConfig,
}

impl<M, T, B> BidService<M, T, B>
where
    M: MembershipRepository,
    T: TenderRepository,
    B: BidRepository,
{
    pub fn new(members: M, tenders: T, bids: B, config: MarketConfig) -> Self {
        Self {
            members: MembershipResolver::new(members),
            tenders,
            bids,
            config,
        }
    }

    /// Submit a bid. Unpublished tenders only accept bids from their own
    /// organization.
    pub async fn create(&self, input: CreateBid) -> ProcuraResult<Bid> {
        let author = self.members.require_employee(input.author_id).await?;
        let tender = self.tenders.get_by_id(input.tender_id).await?;

        if tender.status != TenderStatus::Published
            && !self
                .members
                .is_responsible_for(author.id, tender.organization_id)
                .await?
        {
            warn!(
                tender_id = %tender.id,
                author_id = %author.id,
                tender_status = %tender.status,
                "Outsider bid on an unpublished tender"
            );
            return Err(MarketError::NotEnoughPermissions.into());
        }

        let bid = self.bids.create(input).await?;
        info!(
            bid_id = %bid.id,
            tender_id = %bid.tender_id,
            author_id = %bid.author_id,
            author_type = %bid.author_type,
            "Bid created"
        );
        Ok(bid)
    }

    /// Bids authored by the caller, ordered by name.
    pub async fn list_mine(
        &self,
        username: Option<&str>,
        pagination: Pagination,
    ) -> ProcuraResult<PaginatedResult<Bid>> {
        let user = self.members.resolve_user(username).await?;
        self.bids
            .list_by_author(user.id, self.config.clamp(pagination))
            .await
    }

    /// Bids on a tender as seen by the caller's organization.
    pub async fn list_for_tender(
        &self,
        tender_id: Uuid,
        username: Option<&str>,
        pagination: Pagination,
    ) -> ProcuraResult<PaginatedResult<Bid>> {
        let tender = self.tenders.get_by_id(tender_id).await?;
        let user = self.members.resolve_user(username).await?;
        let organization_id = self.members.require_organization(user.id).await?;

        let audience = visibility::audience(organization_id, &tender);
        let page = self
            .bids
            .list_for_tender(tender_id, audience, self.config.clamp(pagination))
            .await?;
        debug!(
            tender_id = %tender_id,
            organization_id = %organization_id,
            owns_tender = audience.owns_tender,
            total = page.total,
            "Listed bids for tender"
        );
        Ok(page)
    }

    pub async fn read_status(&self, bid_id: Uuid, username: Option<&str>) -> ProcuraResult<BidStatus> {
        let user = self.members.resolve_user(username).await?;
        let bid = self.bids.get_by_id(bid_id).await?;
        let tender = self.tenders.get_by_id(bid.tender_id).await?;

        let relation = BidRelation {
            author_side: self.members.acts_for_author(user.id, bid.author_id).await?,
            owns_tender: self
                .members
                .is_responsible_for(user.id, tender.organization_id)
                .await?,
        };
        if !relation.can_read_status(bid.status) {
            warn!(
                bid_id = %bid.id,
                user_id = %user.id,
                status = %bid.status,
                "Bid status hidden from caller"
            );
            return Err(MarketError::NotEnoughPermissions.into());
        }
        Ok(bid.status)
    }

    /// Author-side status change. Only `Created`, `Published` and
    /// `Canceled` can be set here; decisions go through the
    /// [`DecisionEngine`](crate::DecisionEngine).
    pub async fn update_status(
        &self,
        bid_id: Uuid,
        username: Option<&str>,
        status: BidStatus,
    ) -> ProcuraResult<Bid> {
        if !status.is_author_settable() {
            return Err(MarketError::IncorrectStatus(status.to_string()).into());
        }
        self.authorize_mutation(bid_id, username).await?;

        let bid = self.bids.update_status(bid_id, status).await?;
        info!(
            bid_id = %bid.id,
            status = %bid.status,
            version = bid.version,
            "Bid status updated"
        );
        Ok(bid)
    }

    pub async fn edit(
        &self,
        bid_id: Uuid,
        username: Option<&str>,
        patch: BidPatch,
    ) -> ProcuraResult<Bid> {
        let patch = patch.normalized();
        if patch.is_empty() {
            return Err(MarketError::NothingToChange.into());
        }
        self.authorize_mutation(bid_id, username).await?;

        let bid = self.bids.update(bid_id, patch).await?;
        info!(bid_id = %bid.id, version = bid.version, "Bid edited");
        Ok(bid)
    }

    pub async fn rollback(
        &self,
        bid_id: Uuid,
        username: Option<&str>,
        version: u32,
    ) -> ProcuraResult<Bid> {
        self.authorize_mutation(bid_id, username).await?;

        let bid = self.bids.rollback(bid_id, version).await?;
        info!(
            bid_id = %bid.id,
            restored_from = version,
            version = bid.version,
            "Bid rolled back"
        );
        Ok(bid)
    }

    /// Archived snapshots of a bid, visible to its author side.
    pub async fn history(
        &self,
        bid_id: Uuid,
        username: Option<&str>,
    ) -> ProcuraResult<Vec<BidSnapshot>> {
        let bid = self.bids.get_by_id(bid_id).await?;
        let user = self.members.resolve_user(username).await?;
        self.members.require_author_side(user.id, bid.author_id).await?;
        self.bids.list_versions(bid_id).await
    }

    async fn authorize_mutation(&self, bid_id: Uuid, username: Option<&str>) -> ProcuraResult<Bid> {
        let bid = self.bids.get_by_id(bid_id).await?;
        let user = self.members.resolve_user(username).await?;
        self.members.require_author_side(user.id, bid.author_id).await?;

        if bid.status.is_terminal() {
            return Err(MarketError::StatusCannotBeChanged.into());
        }
        Ok(bid)
    }
}
