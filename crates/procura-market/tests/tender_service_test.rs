//! Integration tests for the tender lifecycle service.

mod common;

use procura_core::error::{ErrorKind, ProcuraError};
use procura_core::models::tender::{
    CreateTender, ServiceType, ServiceTypeFilter, TenderPatch, TenderStatus,
};
use procura_core::repository::Pagination;
use procura_market::MarketConfig;
use uuid::Uuid;

#[tokio::test]
async fn create_requires_membership() {
    let w = common::world(1).await;
    let svc = w.tender_service();

    let input = CreateTender {
        organization_id: w.owner_org.id,
        name: "Warehouse".into(),
        description: "Build it".into(),
        service_type: ServiceType::Construction,
    };

    let err = svc.create(input.clone(), Some("pete")).await.unwrap_err();
    assert!(matches!(err, ProcuraError::Forbidden { .. }));

    let err = svc.create(input.clone(), None).await.unwrap_err();
    assert!(matches!(err, ProcuraError::Forbidden { ref reason } if reason == "pass username"));

    let err = svc.create(input.clone(), Some("nobody")).await.unwrap_err();
    assert!(matches!(err, ProcuraError::UnknownUser { .. }));

    let t = svc.create(input, w.owner(0)).await.unwrap();
    assert_eq!(t.status, TenderStatus::Created);
    assert_eq!(t.version, 1);
}

#[tokio::test]
async fn read_status_is_public_once_published() {
    let w = common::world(1).await;
    let svc = w.tender_service();
    let t = w.tender("Warehouse", ServiceType::Construction).await;

    let err = svc.read_status(t.id, Some("pete")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(
        svc.read_status(t.id, w.owner(0)).await.unwrap(),
        TenderStatus::Created
    );

    svc.update_status(t.id, w.owner(0), TenderStatus::Published)
        .await
        .unwrap();
    assert_eq!(
        svc.read_status(t.id, None).await.unwrap(),
        TenderStatus::Published
    );
}

#[tokio::test]
async fn versions_grow_by_one_per_mutation() {
    let w = common::world(1).await;
    let svc = w.tender_service();
    let t = w.tender("Warehouse", ServiceType::Construction).await;

    let t = svc
        .update_status(t.id, w.owner(0), TenderStatus::Published)
        .await
        .unwrap();
    assert_eq!(t.version, 2);

    let t = svc
        .edit(
            t.id,
            w.owner(0),
            TenderPatch {
                description: Some("Bigger warehouse".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(t.version, 3);

    let t = svc.rollback(t.id, w.owner(0), 2).await.unwrap();
    assert_eq!(t.version, 4);
    assert_eq!(t.description, "Warehouse description");
    assert_eq!(t.status, TenderStatus::Published);

    let history = svc.history(t.id, w.owner(0)).await.unwrap();
    assert_eq!(
        history.iter().map(|s| s.version).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn empty_edit_is_rejected() {
    let w = common::world(1).await;
    let svc = w.tender_service();
    let t = w.tender("Warehouse", ServiceType::Construction).await;

    let err = svc
        .edit(
            t.id,
            w.owner(0),
            TenderPatch {
                name: Some("   ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProcuraError::InvalidInput { ref message } if message == "nothing to change"));

    let history = svc.history(t.id, w.owner(0)).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn outsider_edit_is_forbidden_not_missing() {
    let w = common::world(1).await;
    let svc = w.tender_service();
    let t = w.tender("Warehouse", ServiceType::Construction).await;
    let patch = TenderPatch {
        name: Some("Hijacked".into()),
        ..Default::default()
    };

    let err = svc.edit(t.id, Some("lou"), patch.clone()).await.unwrap_err();
    assert!(matches!(err, ProcuraError::Forbidden { .. }));

    let err = svc.edit(t.id, Some("pete"), patch.clone()).await.unwrap_err();
    assert!(matches!(err, ProcuraError::Forbidden { .. }));

    let err = svc
        .edit(Uuid::new_v4(), Some("lou"), patch)
        .await
        .unwrap_err();
    assert!(matches!(err, ProcuraError::NotFound { .. }));
}

#[tokio::test]
async fn closed_tender_refuses_everyone() {
    let w = common::world(1).await;
    let svc = w.tender_service();
    let t = w.tender("Warehouse", ServiceType::Construction).await;
    svc.update_status(t.id, w.owner(0), TenderStatus::Closed)
        .await
        .unwrap();

    for user in [w.owner(0), Some("pete"), Some("lou")] {
        let err = svc
            .update_status(t.id, user, TenderStatus::Published)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcuraError::TenderClosed { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = svc
            .edit(
                t.id,
                user,
                TenderPatch {
                    name: Some("Reopened".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = svc.rollback(t.id, user, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}

#[tokio::test]
async fn rollback_to_missing_version() {
    let w = common::world(1).await;
    let svc = w.tender_service();
    let t = w.tender("Warehouse", ServiceType::Construction).await;

    let err = svc.rollback(t.id, w.owner(0), 9).await.unwrap_err();
    assert!(matches!(err, ProcuraError::VersionNotFound { version: 9, .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn listings() {
    let w = common::world(1).await;
    let svc = w.tender_service();

    for (name, st) in [
        ("Couriers", ServiceType::Delivery),
        ("Annex", ServiceType::Construction),
        ("Boxes", ServiceType::Delivery),
    ] {
        let t = w.tender(name, st).await;
        svc.update_status(t.id, w.owner(0), TenderStatus::Published)
            .await
            .unwrap();
    }
    w.tender("Draft delivery", ServiceType::Delivery).await;

    let delivery = svc
        .list_published(
            &ServiceTypeFilter::from_query(["Delivery", "Teleportation"]),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        delivery
            .items
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>(),
        vec!["Boxes", "Couriers"]
    );

    let owned = svc
        .list_owned(w.owner(0), Pagination::default())
        .await
        .unwrap();
    assert_eq!(owned.total, 4);

    let err = svc
        .list_owned(Some("lou"), Pagination::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let page = svc
        .list_published(
            &ServiceTypeFilter::default(),
            Pagination {
                offset: 0,
                limit: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn oversized_page_values_fall_back_to_defaults() {
    let w = common::world(1).await;
    let svc = w.tender_service();
    w.published_tender("Bridge").await;
    let cfg = MarketConfig::default();

    let page = svc
        .list_published(
            &ServiceTypeFilter::default(),
            cfg.page(None, Some("18446744073709551615")),
        )
        .await
        .unwrap();
    assert_eq!(page.offset, 0);
    assert_eq!(page.items.len(), 1);

    let page = svc
        .list_owned(
            w.owner(0),
            cfg.page(Some("9223372036854775808"), Some("-1")),
        )
        .await
        .unwrap();
    assert_eq!(page.limit, cfg.default_page_limit);
    assert_eq!(page.items.len(), 1);
}
