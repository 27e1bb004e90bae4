//! Shared fixture for the service integration tests.
//!
//! Builds an in-memory store with two organizations: the tender owner
//! with a configurable number of responsibles (`owner0`, `owner1`, ...)
//! and a bidding organization with one responsible (`pete`). A third
//! employee (`lou`) belongs to no organization.

#![allow(dead_code)]

use procura_core::models::bid::{AuthorType, Bid, BidStatus, CreateBid};
use procura_core::models::employee::{CreateEmployee, Employee};
use procura_core::models::organization::{CreateOrganization, Organization};
use procura_core::models::tender::{CreateTender, ServiceType, Tender, TenderStatus};
use procura_core::repository::MembershipRepository;
use procura_db::repository::{
    SurrealBidRepository, SurrealDecisionRepository, SurrealFeedbackRepository,
    SurrealMembershipRepository, SurrealTenderRepository,
};
use procura_market::{
    BidService, DecisionEngine, FeedbackLedger, MarketConfig, Marketplace, TenderService,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

pub type Members = SurrealMembershipRepository<Db>;
pub type Tenders = SurrealTenderRepository<Db>;
pub type Bids = SurrealBidRepository<Db>;
pub type Market =
    Marketplace<Members, Tenders, Bids, SurrealDecisionRepository<Db>, SurrealFeedbackRepository<Db>>;

pub struct World {
    pub db: Surreal<Db>,
    pub owner_org: Organization,
    pub bidder_org: Organization,
    pub owners: Vec<Employee>,
    pub pete: Employee,
    pub lou: Employee,
}

pub async fn world(owner_responsibles: usize) -> World {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    procura_db::run_migrations(&db).await.unwrap();

    let members = SurrealMembershipRepository::new(db.clone());
    let owner_org = members
        .create_organization(CreateOrganization {
            name: "Owner Ltd".into(),
            description: "Publishes tenders".into(),
        })
        .await
        .unwrap();
    let bidder_org = members
        .create_organization(CreateOrganization {
            name: "Bidder Inc".into(),
            description: "Answers tenders".into(),
        })
        .await
        .unwrap();

    let mut owners = Vec::new();
    for i in 0..owner_responsibles {
        let e = employee(&members, &format!("owner{i}")).await;
        members.add_responsible(owner_org.id, e.id).await.unwrap();
        owners.push(e);
    }
    let pete = employee(&members, "pete").await;
    members.add_responsible(bidder_org.id, pete.id).await.unwrap();
    let lou = employee(&members, "lou").await;

    World {
        db,
        owner_org,
        bidder_org,
        owners,
        pete,
        lou,
    }
}

async fn employee(members: &Members, username: &str) -> Employee {
    members
        .create_employee(CreateEmployee {
            username: username.into(),
            first_name: None,
            last_name: None,
        })
        .await
        .unwrap()
}

impl World {
    pub fn members(&self) -> Members {
        SurrealMembershipRepository::new(self.db.clone())
    }

    pub fn tenders(&self) -> Tenders {
        SurrealTenderRepository::new(self.db.clone())
    }

    pub fn bids(&self) -> Bids {
        SurrealBidRepository::new(self.db.clone())
    }

    pub fn owner(&self, i: usize) -> Option<&str> {
        Some(self.owners[i].username.as_str())
    }

    pub fn tender_service(&self) -> TenderService<Members, Tenders> {
        TenderService::new(self.members(), self.tenders(), MarketConfig::default())
    }

    pub fn bid_service(&self) -> BidService<Members, Tenders, Bids> {
        BidService::new(
            self.members(),
            self.tenders(),
            self.bids(),
            MarketConfig::default(),
        )
    }

    pub fn decision_engine(
        &self,
    ) -> DecisionEngine<Members, Tenders, Bids, SurrealDecisionRepository<Db>> {
        DecisionEngine::new(
            self.members(),
            self.tenders(),
            self.bids(),
            SurrealDecisionRepository::new(self.db.clone()),
            MarketConfig::default(),
        )
    }

    pub fn feedback_ledger(
        &self,
    ) -> FeedbackLedger<Members, Tenders, Bids, SurrealFeedbackRepository<Db>> {
        FeedbackLedger::new(
            self.members(),
            self.tenders(),
            self.bids(),
            SurrealFeedbackRepository::new(self.db.clone()),
            MarketConfig::default(),
        )
    }

    pub fn marketplace(&self) -> Market {
        Marketplace::new(
            self.members(),
            self.tenders(),
            self.bids(),
            SurrealDecisionRepository::new(self.db.clone()),
            SurrealFeedbackRepository::new(self.db.clone()),
            MarketConfig::default(),
        )
    }

    /// A tender of the owner organization, created by `owner0`.
    pub async fn tender(&self, name: &str, service_type: ServiceType) -> Tender {
        self.tender_service()
            .create(
                CreateTender {
                    organization_id: self.owner_org.id,
                    name: name.into(),
                    description: format!("{name} description"),
                    service_type,
                },
                self.owner(0),
            )
            .await
            .unwrap()
    }

    pub async fn published_tender(&self, name: &str) -> Tender {
        let t = self.tender(name, ServiceType::Construction).await;
        self.tender_service()
            .update_status(t.id, self.owner(0), TenderStatus::Published)
            .await
            .unwrap()
    }

    /// A bid by `pete` on `tender`, still in `Created`.
    pub async fn draft_bid(&self, tender: &Tender, name: &str) -> Bid {
        self.bid_service()
            .create(CreateBid {
                tender_id: tender.id,
                name: name.into(),
                description: format!("{name} offer"),
                author_type: AuthorType::Organization,
                author_id: self.pete.id,
            })
            .await
            .unwrap()
    }

    pub async fn published_bid(&self, tender: &Tender, name: &str) -> Bid {
        let b = self.draft_bid(tender, name).await;
        self.bid_service()
            .update_status(b.id, Some("pete"), BidStatus::Published)
            .await
            .unwrap()
    }
}
