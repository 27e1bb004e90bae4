//! Procura Market: tender and bid lifecycle services, quorum decisions,
//! and the feedback ledger.
//!
//! Every service is generic over the `procura-core` repository traits
//! and has no dependency on a concrete store.

pub mod bid;
pub mod config;
pub mod decision;
pub mod error;
pub mod feedback;
pub mod marketplace;
pub mod membership;
pub mod tender;
pub mod visibility;

pub use bid::BidService;
pub use config::MarketConfig;
pub use decision::DecisionEngine;
pub use error::MarketError;
pub use feedback::FeedbackLedger;
pub use marketplace::Marketplace;
pub use membership::MembershipResolver;
pub use tender::TenderService;
