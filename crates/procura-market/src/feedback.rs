//! Append-only reviews left by the tender owner on bids.

use procura_core::error::ProcuraResult;
use procura_core::models::bid::{Bid, BidStatus};
use procura_core::models::feedback::{CreateFeedback, Feedback};
use procura_core::repository::{
    BidRepository, FeedbackRepository, MembershipRepository, PaginatedResult, Pagination,
    TenderRepository,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::MarketConfig;
use crate::error::MarketError;
use crate::membership::MembershipResolver;

pub struct FeedbackLedger<M, T, B, F>
where
    M: MembershipRepository,
    T: TenderRepository,
    B: BidRepository,
    F: FeedbackRepository,
{
    members: MembershipResolver<M>,
    tenders: T,
    bids: B,
    feedback: F,
    config: MarketConfig,
}

impl<M, T, B, F> FeedbackLedger<M, T, B, F>
where
    M: MembershipRepository,
    T: TenderRepository,
    B: BidRepository,
    F: FeedbackRepository,
{
    pub fn new(members: M, tenders: T, bids: B, feedback: F, config: MarketConfig) -> Self {
        Self {
            members: MembershipResolver::new(members),
            tenders,
            bids,
            feedback,
            config,
        }
    }

    /// Leave a review on a bid. Returns the bid unchanged.
    pub async fn submit(
        &self,
        bid_id: Uuid,
        text: &str,
        username: Option<&str>,
    ) -> ProcuraResult<Bid> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MarketError::EmptyFeedback.into());
        }

        let bid = self.bids.get_by_id(bid_id).await?;
        let user = self.members.resolve_user(username).await?;
        let tender = self.tenders.get_by_id(bid.tender_id).await?;
        self.members
            .require_responsible(user.id, tender.organization_id)
            .await?;

        if matches!(bid.status, BidStatus::Created | BidStatus::Canceled) {
            warn!(
                bid_id = %bid.id,
                status = %bid.status,
                "Feedback on a bid that is not visible to the tender owner"
            );
            return Err(MarketError::NotEnoughPermissions.into());
        }

        let entry = self
            .feedback
            .append(CreateFeedback {
                tender_id: tender.id,
                bid_id: bid.id,
                user_id: user.id,
                description: text.to_string(),
            })
            .await?;
        info!(
            feedback_id = %entry.id,
            bid_id = %bid.id,
            reviewer = %user.username,
            "Feedback recorded"
        );
        Ok(bid)
    }

    /// Reviews on `tender_id` bids written by `author_username`, oldest
    /// first. Only the tender's organization may read them.
    pub async fn list_reviews(
        &self,
        tender_id: Uuid,
        author_username: Option<&str>,
        requester_username: Option<&str>,
        pagination: Pagination,
    ) -> ProcuraResult<PaginatedResult<Feedback>> {
        let tender = self.tenders.get_by_id(tender_id).await?;
        let author = self.members.resolve_user(author_username).await?;
        let requester = self.members.resolve_user(requester_username).await?;
        self.members
            .require_responsible(requester.id, tender.organization_id)
            .await?;

        self.feedback
            .list_for_author(tender_id, author.id, self.config.clamp(pagination))
            .await
    }
}
