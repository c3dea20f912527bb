//! Integration Tests for the Record Service
//!
//! Drives the operations exposed to the routing layer and checks the shapes
//! of what they return.

use std::sync::Arc;
use vellum_config::StoreConfig;
use vellum_records::{RecordManager, RecordService, DEFAULT_RECORDS};
use vellum_types::StoreError;

async fn service() -> RecordService {
    let manager = RecordManager::new(&StoreConfig::default())
        .await
        .expect("Failed to build record manager");
    RecordService::new(Arc::new(manager))
}

#[tokio::test]
async fn test_service_end_to_end() {
    let service = service().await;

    let summary = service.create_or_update("x", "hello", None).await.unwrap();
    assert_eq!(summary.id, "x");
    assert_eq!(summary.version, 0);

    let summary = service.create_or_update("x", "hello2", Some(0)).await.unwrap();
    assert_eq!(summary.version, 1);

    let current = service.fetch_current("x").await.unwrap();
    assert_eq!(current.plaintext, "hello2");
    assert_eq!(current.version, 1);

    let history = service.history("x").await.unwrap();
    let listed: Vec<_> = history
        .iter()
        .map(|view| (view.version, view.plaintext.as_str()))
        .collect();
    assert_eq!(listed, vec![(1, "hello2"), (0, "hello")]);

    let restored = service.restore("x", 0).await.unwrap();
    assert_eq!(restored.plaintext, "hello");
    assert_eq!(restored.version, 0);
    assert_eq!(service.history("x").await.unwrap().len(), 1);

    assert!(service.verify("x", "hello").await.unwrap());
    assert!(!service.verify("x", "hello2").await.unwrap());

    let recovered = service.recover("x").await.unwrap();
    assert_eq!(recovered, restored);
}

#[tokio::test]
async fn test_service_error_taxonomy() {
    let service = service().await;

    assert!(matches!(
        service.fetch_current("missing").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        service.recover("missing").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        service.restore("missing", 3).await,
        Err(StoreError::VersionNotFound { version: 3, .. })
    ));
    assert!(matches!(
        service.create_or_update("", "x", None).await,
        Err(StoreError::InvalidIdentifier(_))
    ));
}

#[tokio::test]
async fn test_failed_restore_surfaces_integrity_failure() {
    let service = service().await;
    service.create_or_update("x", "epoch one", None).await.unwrap();

    // A second create starts a new key epoch, so version 0 cannot be decrypted
    service.manager().create("x", b"epoch two").await.unwrap();

    assert!(matches!(
        service.restore("x", 0).await,
        Err(StoreError::IntegrityFailure(_))
    ));
    let current = service.fetch_current("x").await.unwrap();
    assert_eq!(current.plaintext, "epoch two");
    assert_eq!(current.version, 1);
}

#[tokio::test]
async fn test_seeded_records_are_readable() {
    let service = service().await;
    assert_eq!(service.seed(DEFAULT_RECORDS).await, 3);

    for (id, plaintext) in DEFAULT_RECORDS {
        let view = service.fetch_current(id).await.unwrap();
        assert_eq!(view.plaintext, *plaintext);
        assert_eq!(view.version, 0);
    }
}

#[tokio::test]
async fn test_snapshot_keeps_history() {
    let service = service().await;
    service.create_or_update("x", "v0", None).await.unwrap();

    let snapshot = service.snapshot("x").await.unwrap();
    assert_eq!(snapshot.version, 0);
    assert!(!snapshot.snapshot_id.is_empty());
    assert_eq!(service.history("x").await.unwrap().len(), 1);

    assert!(matches!(
        service.snapshot("missing").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_response_shapes() {
    let service = service().await;
    let summary = service.create_or_update("x", "hello", None).await.unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["id"], "x");
    assert_eq!(json["version"], 0);
    assert!(json["timestamp"].is_i64());

    let history = service.history("x").await.unwrap();
    let json = serde_json::to_value(&history).unwrap();
    assert_eq!(json[0]["plaintext"], "hello");
}

#[tokio::test]
async fn test_identifiers_are_isolated() {
    let service = service().await;
    service.create_or_update("a", "alpha", None).await.unwrap();
    service.create_or_update("b", "beta", None).await.unwrap();
    service.create_or_update("a", "alpha2", None).await.unwrap();

    assert_eq!(service.fetch_current("a").await.unwrap().version, 1);
    assert_eq!(service.fetch_current("b").await.unwrap().version, 0);
    assert_eq!(service.history("b").await.unwrap().len(), 1);
}
