//! Tender lifecycle: creation, listings, status changes, edits and
//! rollback.
//!
//! Every mutation resolves the tender first, then the caller. A closed
//! tender is refused before membership is checked. The store re-checks
//! the closed state inside the write transaction.

use procura_core::error::ProcuraResult;
use procura_core::models::tender::{
    CreateTender, ServiceTypeFilter, Tender, TenderPatch, TenderSnapshot, TenderStatus,
};
use procura_core::repository::{MembershipRepository, PaginatedResult, Pagination, TenderRepository};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::MarketConfig;
use crate::error::MarketError;
use crate::membership::MembershipResolver;

/// Tender lifecycle service.
///
/// Generic over repository implementations so that the lifecycle rules
/// have no dependency on the database crate.
pub struct TenderService<M: MembershipRepository, T: TenderRepository> {
    members: MembershipResolver<M>,
    tenders: T,
    config: MarketConfig,
}

impl<M: MembershipRepository, T: TenderRepository> TenderService<M, T> {
    pub fn new(members: M, tenders: T, config: MarketConfig) -> Self {
        Self {
            members: MembershipResolver::new(members),
            tenders,
            config,
        }
    }

    /// Create a tender on behalf of `username`, who must be a
    /// responsible of the target organization.
    pub async fn create(&self, input: CreateTender, username: Option<&str>) -> ProcuraResult<Tender> {
        let user = self.members.resolve_user(username).await?;
        self.members
            .require_responsible(user.id, input.organization_id)
            .await?;

        let tender = self.tenders.create(input).await?;
        info!(
            tender_id = %tender.id,
            organization_id = %tender.organization_id,
            service_type = %tender.service_type,
            creator = %user.username,
            "Tender created"
        );
        Ok(tender)
    }

    /// Published tenders, optionally restricted to a set of service types.
    pub async fn list_published(
        &self,
        filter: &ServiceTypeFilter,
        pagination: Pagination,
    ) -> ProcuraResult<PaginatedResult<Tender>> {
        self.tenders
            .list_published(filter, self.config.clamp(pagination))
            .await
    }

    /// Every tender of the caller's organization, regardless of status.
    pub async fn list_owned(
        &self,
        username: Option<&str>,
        pagination: Pagination,
    ) -> ProcuraResult<PaginatedResult<Tender>> {
        let user = self.members.resolve_user(username).await?;
        let organization_id = self.members.require_organization(user.id).await?;

        let page = self
            .tenders
            .list_by_organization(organization_id, self.config.clamp(pagination))
            .await?;
        debug!(
            organization_id = %organization_id,
            total = page.total,
            "Listed organization tenders"
        );
        Ok(page)
    }

    /// Published tenders are public. Any other status is only visible to
    /// responsibles of the owning organization.
    pub async fn read_status(
        &self,
        tender_id: Uuid,
        username: Option<&str>,
    ) -> ProcuraResult<TenderStatus> {
        let tender = self.tenders.get_by_id(tender_id).await?;
        if tender.status == TenderStatus::Published {
            return Ok(tender.status);
        }

        let user = self.members.resolve_user(username).await?;
        self.members
            .require_responsible(user.id, tender.organization_id)
            .await?;
        Ok(tender.status)
    }

    pub async fn update_status(
        &self,
        tender_id: Uuid,
        username: Option<&str>,
        status: TenderStatus,
    ) -> ProcuraResult<Tender> {
        self.authorize_mutation(tender_id, username).await?;

        let tender = self.tenders.update_status(tender_id, status).await?;
        info!(
            tender_id = %tender.id,
            status = %tender.status,
            version = tender.version,
            "Tender status updated"
        );
        Ok(tender)
    }

    /// Apply the provided fields. Blank fields count as absent; a patch
    /// with nothing left is rejected before any lookup.
    pub async fn edit(
        &self,
        tender_id: Uuid,
        username: Option<&str>,
        patch: TenderPatch,
    ) -> ProcuraResult<Tender> {
        let patch = patch.normalized();
        if patch.is_empty() {
            return Err(MarketError::NothingToChange.into());
        }
        self.authorize_mutation(tender_id, username).await?;

        let tender = self.tenders.update(tender_id, patch).await?;
        info!(
            tender_id = %tender.id,
            version = tender.version,
            "Tender edited"
        );
        Ok(tender)
    }

    /// Restore the fields archived at `version`. The result is a new
    /// version, never `version` itself.
    pub async fn rollback(
        &self,
        tender_id: Uuid,
        username: Option<&str>,
        version: u32,
    ) -> ProcuraResult<Tender> {
        self.authorize_mutation(tender_id, username).await?;

        let tender = self.tenders.rollback(tender_id, version).await?;
        info!(
            tender_id = %tender.id,
            restored_from = version,
            version = tender.version,
            "Tender rolled back"
        );
        Ok(tender)
    }

    /// Archived snapshots of a tender, visible to its organization.
    pub async fn history(
        &self,
        tender_id: Uuid,
        username: Option<&str>,
    ) -> ProcuraResult<Vec<TenderSnapshot>> {
        let tender = self.tenders.get_by_id(tender_id).await?;
        let user = self.members.resolve_user(username).await?;
        self.members
            .require_responsible(user.id, tender.organization_id)
            .await?;
        self.tenders.list_versions(tender_id).await
    }

    /// A closed tender refuses every mutation, members or not.
    async fn authorize_mutation(&self, tender_id: Uuid, username: Option<&str>) -> ProcuraResult<Tender> {
        let tender = self.tenders.get_by_id(tender_id).await?;
        let user = self.members.resolve_user(username).await?;
        if tender.status.is_terminal() {
            return Err(MarketError::TenderClosed(tender.id).into());
        }
        self.members
            .require_responsible(user.id, tender.organization_id)
            .await?;
        Ok(tender)
    }
}
