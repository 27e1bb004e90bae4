//! Integration tests for quorum-based bid decisions.

mod common;

use procura_core::error::{ErrorKind, ProcuraError};
use procura_core::models::bid::{BidStatus, Decision};
use procura_core::models::tender::TenderStatus;
use procura_core::repository::{BidRepository, TenderRepository};

#[tokio::test]
async fn two_responsibles_close_together() {
    let w = common::world(2).await;
    let t = w.published_tender("Fleet").await;
    let x = w.published_bid(&t, "Trucks").await;
    let engine = w.decision_engine();

    let after_a = engine
        .submit_decision(x.id, Decision::Approved, w.owner(0))
        .await
        .unwrap();
    assert_eq!(after_a.status, BidStatus::Published);
    assert_eq!(after_a.version, x.version);
    let tender = w.tenders().get_by_id(t.id).await.unwrap();
    assert_eq!(tender.status, TenderStatus::Published);
    assert_eq!(tender.version, t.version);

    let status = engine.quorum_status(x.id).await.unwrap();
    assert_eq!((status.votes, status.quorum), (1, 2));
    assert!(!status.reached());

    let after_b = engine
        .submit_decision(x.id, Decision::Approved, w.owner(1))
        .await
        .unwrap();
    assert_eq!(after_b.status, BidStatus::Approved);
    assert_eq!(after_b.version, x.version + 1);
    let tender = w.tenders().get_by_id(t.id).await.unwrap();
    assert_eq!(tender.status, TenderStatus::Closed);
    assert_eq!(tender.version, t.version + 1);
}

#[tokio::test]
async fn five_responsibles_need_three_votes() {
    let w = common::world(5).await;
    let t = w.published_tender("Fleet").await;
    let x = w.published_bid(&t, "Trucks").await;
    let engine = w.decision_engine();

    for i in 0..2 {
        let b = engine
            .submit_decision(x.id, Decision::Approved, w.owner(i))
            .await
            .unwrap();
        assert_eq!(b.status, BidStatus::Published);
    }
    let b = engine
        .submit_decision(x.id, Decision::Approved, w.owner(2))
        .await
        .unwrap();
    assert_eq!(b.status, BidStatus::Approved);

    let err = engine
        .submit_decision(x.id, Decision::Approved, w.owner(3))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn repeated_vote_does_not_reach_quorum() {
    let w = common::world(2).await;
    let t = w.published_tender("Fleet").await;
    let x = w.published_bid(&t, "Trucks").await;
    let engine = w.decision_engine();

    for _ in 0..3 {
        let b = engine
            .submit_decision(x.id, Decision::Approved, w.owner(0))
            .await
            .unwrap();
        assert_eq!(b.status, BidStatus::Published);
    }
    assert_eq!(engine.quorum_status(x.id).await.unwrap().votes, 1);
}

#[tokio::test]
async fn rejection_leaves_tender_alone() {
    let w = common::world(3).await;
    let t = w.published_tender("Fleet").await;
    let x = w.published_bid(&t, "Trucks").await;
    let engine = w.decision_engine();

    engine
        .submit_decision(x.id, Decision::Approved, w.owner(0))
        .await
        .unwrap();
    let rejected = engine
        .submit_decision(x.id, Decision::Rejected, w.owner(1))
        .await
        .unwrap();
    assert_eq!(rejected.status, BidStatus::Rejected);
    assert_eq!(rejected.version, x.version + 1);

    let tender = w.tenders().get_by_id(t.id).await.unwrap();
    assert_eq!(tender.status, TenderStatus::Published);
    assert_eq!(tender.version, t.version);
}

#[tokio::test]
async fn only_tender_responsibles_decide() {
    let w = common::world(1).await;
    let t = w.published_tender("Fleet").await;
    let x = w.published_bid(&t, "Trucks").await;
    let engine = w.decision_engine();

    for user in [Some("pete"), Some("lou")] {
        let err = engine
            .submit_decision(x.id, Decision::Approved, user)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
    assert_eq!(engine.quorum_status(x.id).await.unwrap().votes, 0);
}

#[tokio::test]
async fn draft_bid_cannot_be_decided() {
    let w = common::world(1).await;
    let t = w.published_tender("Fleet").await;
    let x = w.draft_bid(&t, "Trucks").await;

    let err = w
        .decision_engine()
        .submit_decision(x.id, Decision::Rejected, w.owner(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ProcuraError::Conflict { .. }));
}

#[tokio::test]
async fn closed_tender_is_a_distinct_conflict() {
    let w = common::world(1).await;
    let t = w.published_tender("Fleet").await;
    let x = w.published_bid(&t, "Trucks").await;
    w.tender_service()
        .update_status(t.id, w.owner(0), TenderStatus::Closed)
        .await
        .unwrap();

    let err = w
        .decision_engine()
        .submit_decision(x.id, Decision::Approved, w.owner(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ProcuraError::TenderClosed { tender_id } if tender_id == t.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_votes_never_lose_the_decision() {
    for _ in 0..10 {
        let w = common::world(3).await;
        let t = w.published_tender("Fleet").await;
        let x = w.published_bid(&t, "Trucks").await;
        let engine = w.decision_engine();

        let (a, b, c) = tokio::join!(
            engine.submit_decision(x.id, Decision::Approved, w.owner(0)),
            engine.submit_decision(x.id, Decision::Approved, w.owner(1)),
            engine.submit_decision(x.id, Decision::Approved, w.owner(2)),
        );

        let mut losers = Vec::new();
        for (i, result) in [a, b, c].into_iter().enumerate() {
            if let Err(err) = result {
                assert!(err.is_retryable(), "vote {i} failed with {err:?}");
                losers.push(i);
            }
        }

        let status = engine.quorum_status(x.id).await.unwrap();
        let bid = w.bids().get_by_id(x.id).await.unwrap();
        let tender = w.tenders().get_by_id(t.id).await.unwrap();
        assert_eq!(status.reached(), bid.status == BidStatus::Approved);
        assert_eq!(
            bid.status == BidStatus::Approved,
            tender.status == TenderStatus::Closed
        );

        for i in losers {
            let mut attempts = 0;
            loop {
                attempts += 1;
                match engine
                    .submit_decision(x.id, Decision::Approved, w.owner(i))
                    .await
                {
                    Ok(_) => break,
                    Err(err) if err.is_retryable() && attempts < 10 => continue,
                    Err(err) => panic!("retry of vote {i} failed with {err:?}"),
                }
            }
        }

        let bid = w.bids().get_by_id(x.id).await.unwrap();
        assert_eq!(bid.status, BidStatus::Approved);
        assert_eq!(bid.version, x.version + 1);
        let tender = w.tenders().get_by_id(t.id).await.unwrap();
        assert_eq!(tender.status, TenderStatus::Closed);
        assert_eq!(tender.version, t.version + 1);
        assert_eq!(engine.quorum_status(x.id).await.unwrap().votes, 3);
    }
}
