//! The marketplace components wired over one set of repositories.

use procura_core::repository::{
    BidRepository, DecisionRepository, FeedbackRepository, MembershipRepository,
    TenderRepository,
};

use crate::bid::BidService;
use crate::config::MarketConfig;
use crate::decision::DecisionEngine;
use crate::feedback::FeedbackLedger;
use crate::tender::TenderService;

/// Every lifecycle component, each holding its own clone of the
/// repositories it reads.
pub struct Marketplace<M, T, B, D, F>
where
    M: MembershipRepository + Clone,
    T: TenderRepository + Clone,
    B: BidRepository + Clone,
    D: DecisionRepository,
    F: FeedbackRepository,
{
    pub tenders: TenderService<M, T>,
    pub bids: BidService<M, T, B>,
    pub decisions: DecisionEngine<M, T, B, D>,
    pub feedback: FeedbackLedger<M, T, B, F>,
}

impl<M, T, B, D, F> Marketplace<M, T, B, D, F>
where
    M: MembershipRepository + Clone,
    T: TenderRepository + Clone,
    B: BidRepository + Clone,
    D: DecisionRepository,
    F: FeedbackRepository,
{
    pub fn new(members: M, tenders: T, bids: B, decisions: D, feedback: F, config: MarketConfig) -> Self {
        Self {
            tenders: TenderService::new(members.clone(), tenders.clone(), config.clone()),
            bids: BidService::new(
                members.clone(),
                tenders.clone(),
                bids.clone(),
                config.clone(),
            ),
            decisions: DecisionEngine::new(
                members.clone(),
                tenders.clone(),
                bids.clone(),
                decisions,
                config.clone(),
            ),
            feedback: FeedbackLedger::new(members, tenders, bids, feedback, config),
        }
    }
}
