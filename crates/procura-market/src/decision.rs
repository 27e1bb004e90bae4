//! Approval decisions on published bids.
//!
//! A rejection is final immediately. Approvals are votes: once
//! `min(max_quorum, responsible count)` distinct responsibles of the
//! tender's organization have approved, the bid is approved and its
//! tender closed in one store transaction.

use procura_core::error::ProcuraResult;
use procura_core::models::bid::{Bid, BidStatus, Decision};
use procura_core::repository::{
    BidRepository, DecisionRepository, MembershipRepository, TenderRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::config::MarketConfig;
use crate::error::MarketError;
use crate::membership::MembershipResolver;

/// Vote tally of a bid against its current quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumStatus {
    pub votes: u64,
    pub quorum: u64,
}

impl QuorumStatus {
    pub fn reached(&self) -> bool {
        self.votes >= self.quorum
    }
}

pub struct DecisionEngine<M, T, B, D>
where
    M: MembershipRepository,
    T: TenderRepository,
    B: BidRepository,
    D: DecisionRepository,
{
    members: MembershipResolver<M>,
    tenders: T,
    bids: B,
    decisions: D,
    config: MarketConfig,
}

impl<M, T, B, D> DecisionEngine<M, T, B, D>
where
    M: MembershipRepository,
    T: TenderRepository,
    B: BidRepository,
    D: DecisionRepository,
{
    pub fn new(members: M, tenders: T, bids: B, decisions: D, config: MarketConfig) -> Self {
        Self {
            members: MembershipResolver::new(members),
            tenders,
            bids,
            decisions,
            config,
        }
    }

    /// Submit a decision on a bid.
    ///
    /// Returns the bid as it stands afterwards: `Rejected`, `Approved`
    /// when this vote completed the quorum, or unchanged and still
    /// `Published` while votes are missing.
    pub async fn submit_decision(
        &self,
        bid_id: Uuid,
        decision: Decision,
        username: Option<&str>,
    ) -> ProcuraResult<Bid> {
        let bid = self.bids.get_by_id(bid_id).await?;
        let user = self.members.resolve_user(username).await?;
        let tender = self.tenders.get_by_id(bid.tender_id).await?;
        self.members
            .require_responsible(user.id, tender.organization_id)
            .await?;

        if bid.status != BidStatus::Published {
            return Err(MarketError::StatusCannotBeChanged.into());
        }
        if tender.status.is_terminal() {
            return Err(MarketError::TenderClosed(tender.id).into());
        }

        match decision {
            Decision::Rejected => {
                let bid = self.decisions.reject(bid_id).await?;
                info!(
                    bid_id = %bid.id,
                    tender_id = %bid.tender_id,
                    voter = %user.username,
                    "Bid rejected"
                );
                Ok(bid)
            }
            Decision::Approved => {
                let outcome = self
                    .decisions
                    .record_approval(bid_id, user.id, self.config.max_quorum)
                    .await?;
                info!(
                    bid_id = %bid_id,
                    voter = %user.username,
                    votes = outcome.votes,
                    quorum = outcome.quorum,
                    finalized = outcome.finalized,
                    "Approval recorded"
                );
                Ok(outcome.bid)
            }
        }
    }

    /// Current approvals of a bid against the quorum its tender's
    /// organization would need right now.
    pub async fn quorum_status(&self, bid_id: Uuid) -> ProcuraResult<QuorumStatus> {
        let bid = self.bids.get_by_id(bid_id).await?;
        let tender = self.tenders.get_by_id(bid.tender_id).await?;
        let responsibles = self
            .members
            .repository()
            .responsible_count(tender.organization_id)
            .await?;
        let votes = self.decisions.approval_count(bid_id).await?;

        Ok(QuorumStatus {
            votes,
            quorum: self.config.quorum_for(responsibles),
        })
    }
}
