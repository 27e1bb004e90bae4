//! End-to-end flow through the wired marketplace.

mod common;

use procura_core::models::bid::{AuthorType, BidStatus, CreateBid, Decision};
use procura_core::models::tender::{CreateTender, ServiceType, TenderStatus};
use procura_core::repository::Pagination;

#[tokio::test]
async fn tender_to_approved_bid() {
    let w = common::world(1).await;
    let market = w.marketplace();

    let tender = market
        .tenders
        .create(
            CreateTender {
                organization_id: w.owner_org.id,
                name: "Depot".into(),
                description: "Cold storage".into(),
                service_type: ServiceType::Construction,
            },
            w.owner(0),
        )
        .await
        .unwrap();
    market
        .tenders
        .update_status(tender.id, w.owner(0), TenderStatus::Published)
        .await
        .unwrap();

    let bid = market
        .bids
        .create(CreateBid {
            tender_id: tender.id,
            name: "Panels".into(),
            description: "Insulated".into(),
            author_type: AuthorType::User,
            author_id: w.pete.id,
        })
        .await
        .unwrap();
    market
        .bids
        .update_status(bid.id, Some("pete"), BidStatus::Published)
        .await
        .unwrap();

    market
        .feedback
        .submit(bid.id, "Solid offer", w.owner(0))
        .await
        .unwrap();
    let approved = market
        .decisions
        .submit_decision(bid.id, Decision::Approved, w.owner(0))
        .await
        .unwrap();
    assert_eq!(approved.status, BidStatus::Approved);

    assert_eq!(
        market.tenders.read_status(tender.id, w.owner(0)).await.unwrap(),
        TenderStatus::Closed
    );
    assert_eq!(
        market.bids.read_status(bid.id, Some("pete")).await.unwrap(),
        BidStatus::Approved
    );
    let reviews = market
        .feedback
        .list_reviews(tender.id, Some("pete"), w.owner(0), Pagination::default())
        .await
        .unwrap();
    assert_eq!(reviews.total, 1);
}
