//! Integration Tests for the Record Store
//!
//! Exercises the record lifecycle end to end through `RecordManager`:
//! versioning, tamper detection, bounded history, restore and recovery,
//! and key/canary expiry.

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use vellum_config::StoreConfig;
use vellum_keys::Cleanable;
use vellum_records::{BackupManager, RecordManager};
use vellum_types::{Record, StoreError, Version};

async fn manager() -> RecordManager {
    RecordManager::new(&StoreConfig::default())
        .await
        .expect("Failed to build record manager")
}

fn versions(manager_history: &[vellum_records::DecryptedRecord]) -> Vec<Version> {
    manager_history.iter().map(|entry| entry.record.version).collect()
}

#[tokio::test]
async fn test_end_to_end_example() {
    let manager = manager().await;

    let created = manager.create("x", b"hello").await.unwrap();
    assert_eq!(created.version, 0);

    let updated = manager.update("x", b"hello2").await.unwrap();
    assert_eq!(updated.version, 1);

    let history = manager.history("x").await;
    assert_eq!(versions(&history), vec![1, 0]);
    assert_eq!(history[0].plaintext, b"hello2".to_vec());
    assert_eq!(history[1].plaintext, b"hello".to_vec());

    let restored = manager.restore_version("x", 0).await.unwrap();
    assert_eq!(restored.version, 0);
    assert_eq!(
        manager.verify_and_decrypt("x", &restored).await,
        Some(b"hello".to_vec())
    );

    let history = manager.history("x").await;
    assert_eq!(versions(&history), vec![0]);
    assert!(manager.verify("x", b"hello").await);
}

#[tokio::test]
async fn test_versions_increase_by_one() {
    let manager = manager().await;

    let mut expected = 0;
    for i in 0..6 {
        let record = if i % 3 == 2 {
            manager.create("x", b"data").await.unwrap()
        } else {
            manager.update("x", b"data").await.unwrap()
        };
        assert_eq!(record.version, expected);
        expected += 1;
    }
}

#[tokio::test]
async fn test_history_is_bounded_to_highest_versions() {
    let manager = manager().await;
    manager.create("x", b"v0").await.unwrap();
    for i in 1..=14 {
        manager.update("x", format!("v{}", i).as_bytes()).await.unwrap();
    }

    let history = manager.history("x").await;
    assert_eq!(history.len(), 10);
    assert_eq!(versions(&history), (5..=14).rev().collect::<Vec<_>>());
    assert_eq!(history[0].plaintext, b"v14".to_vec());
}

#[tokio::test]
async fn test_duplicate_backup_version_keeps_latest() {
    let manager = manager().await;
    let original = manager.create("x", b"one").await.unwrap();

    let backups = BackupManager::default();
    let mut replacement = original.clone();
    replacement.timestamp += 1;

    backups.add("x", original).await;
    backups.add("x", replacement.clone()).await;

    let all = backups.get_all("x").await;
    assert_eq!(all, vec![replacement]);
}

#[tokio::test]
async fn test_restore_prunes_newer_history() {
    let manager = manager().await;
    manager.create("x", b"v0").await.unwrap();
    for i in 1..=5 {
        manager.update("x", format!("v{}", i).as_bytes()).await.unwrap();
    }

    let restored = manager.restore_version("x", 2).await.unwrap();
    assert_eq!(restored.version, 2);

    let history = manager.history("x").await;
    assert!(history.iter().all(|entry| entry.record.version <= 2));
    assert_eq!(versions(&history), vec![2, 1, 0]);

    // The next write continues from the restored version
    let next = manager.update("x", b"after").await.unwrap();
    assert_eq!(next.version, 3);
}

#[tokio::test]
async fn test_restore_missing_version() {
    let manager = manager().await;
    manager.create("x", b"v0").await.unwrap();

    assert!(manager.restore_version("x", 9).await.is_none());
    assert!(manager.restore_version("unknown", 0).await.is_none());
    assert!(matches!(
        manager.try_restore_version("x", 9).await,
        Err(StoreError::VersionNotFound { version: 9, .. })
    ));
}

#[tokio::test]
async fn test_recover_promotes_latest_backup() {
    let manager = manager().await;
    manager.create("x", b"v0").await.unwrap();
    manager.update("x", b"v1").await.unwrap();
    manager.restore_version("x", 0).await.unwrap();

    let recovered = manager.recover("x").await.unwrap();
    assert_eq!(recovered.version, 0);
    assert_eq!(manager.current("x").await, Some(recovered));
    assert!(manager.verify("x", b"v0").await);
}

#[tokio::test]
async fn test_tampered_fields_are_rejected() {
    let manager = manager().await;
    let record = manager.create("x", b"secret payload").await.unwrap();

    let mut tampered = record.clone();
    tampered.tag[0] ^= 0x01;
    assert_eq!(manager.verify_and_decrypt("x", &tampered).await, None);

    let mut tampered = record.clone();
    tampered.nonce[3] ^= 0x80;
    assert_eq!(manager.verify_and_decrypt("x", &tampered).await, None);

    let mut tampered = record.clone();
    tampered.signature[10] ^= 0x04;
    assert_eq!(manager.verify_and_decrypt("x", &tampered).await, None);

    let mut tampered = record.clone();
    let mut canary = tampered.canary.into_bytes();
    canary[0] = if canary[0] == b'a' { b'b' } else { b'a' };
    tampered.canary = String::from_utf8(canary).unwrap();
    assert_eq!(manager.verify_and_decrypt("x", &tampered).await, None);

    // A record is only readable under its own identifier's key
    manager.create("y", b"other").await.unwrap();
    assert_eq!(manager.verify_and_decrypt("y", &record).await, None);

    assert_eq!(
        manager.verify_and_decrypt("x", &record).await,
        Some(b"secret payload".to_vec())
    );
}

#[tokio::test]
async fn test_signatures_survive_rotation() {
    let manager = manager().await;
    let before = manager.create("x", b"signed early").await.unwrap();

    let new_key = manager.key_manager().rotate().await;
    assert_ne!(new_key, before.key_id);

    let after = manager.update("x", b"signed late").await.unwrap();
    assert_eq!(after.key_id, new_key);

    assert_eq!(
        manager.verify_and_decrypt("x", &before).await,
        Some(b"signed early".to_vec())
    );
    assert_eq!(
        manager.verify_and_decrypt("x", &after).await,
        Some(b"signed late".to_vec())
    );
}

#[tokio::test(start_paused = true)]
async fn test_expired_symmetric_key_makes_record_unreadable() {
    let config = StoreConfig {
        symmetric_key_ttl_secs: 60,
        ..StoreConfig::default()
    };
    let manager = RecordManager::new(&config).await.unwrap();
    let record = manager.create("x", b"short lived").await.unwrap();
    let untouched = record.clone();

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(manager.verify_and_decrypt("x", &record).await.is_some());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(manager.verify_and_decrypt("x", &record).await, None);
    assert_eq!(record, untouched);

    // Writes under the lost key fail rather than silently re-keying
    assert!(matches!(
        manager.update("x", b"again").await,
        Err(StoreError::KeyUnavailable(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_expired_canary_makes_record_untrusted() {
    let manager = manager().await;
    let record = manager.create("x", b"watched").await.unwrap();

    tokio::time::advance(Duration::from_secs(60 * 60 + 1)).await;
    assert_eq!(manager.verify_and_decrypt("x", &record).await, None);
    assert!(matches!(
        manager.try_verify_and_decrypt("x", &record).await,
        Err(StoreError::IntegrityFailure(_))
    ));
    assert!(manager.history("x").await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_expired_signing_key_makes_record_untrusted() {
    let config = StoreConfig {
        signing_key_lifetime_secs: 120,
        ..StoreConfig::default()
    };
    let manager = RecordManager::new(&config).await.unwrap();
    let record = manager.create("x", b"signed").await.unwrap();
    manager.key_manager().rotate().await;

    tokio::time::advance(Duration::from_secs(121)).await;
    assert_eq!(manager.verify_and_decrypt("x", &record).await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_creates_agree_on_versions() {
    let manager = Arc::new(manager().await);

    let mut handles = Vec::new();
    for i in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager
                .create("fresh", format!("writer {}", i).as_bytes())
                .await
                .unwrap()
                .version
        }));
    }

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap());
    }
    versions.sort_unstable();
    assert_eq!(versions, (0..8).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_destroy_tears_down_keys() {
    let manager = manager().await;
    let record = manager.create("x", b"hello").await.unwrap();

    manager.destroy().await;
    assert_eq!(manager.verify_and_decrypt("x", &record).await, None);
    assert!(matches!(
        manager.update("x", b"again").await,
        Err(StoreError::KeyUnavailable(_))
    ));
}

fn flip(bytes: &mut [u8], index: prop::sample::Index, bit: u8) {
    let i = index.index(bytes.len());
    bytes[i] ^= 1 << bit;
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Ciphertext,
    Tag,
    Canary,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_round_trip(plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
        let opened = tokio_test::block_on(async {
            let manager = manager().await;
            let record = manager.create("p", &plaintext).await.unwrap();
            manager.verify_and_decrypt("p", &record).await
        });
        prop_assert_eq!(opened, Some(plaintext));
    }

    #[test]
    fn prop_bit_flip_never_yields_plaintext(
        plaintext in proptest::collection::vec(any::<u8>(), 1..128),
        field in prop_oneof![Just(Field::Ciphertext), Just(Field::Tag), Just(Field::Canary)],
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let opened = tokio_test::block_on(async {
            let manager = manager().await;
            let record: Record = manager.create("p", &plaintext).await.unwrap();

            let mut tampered = record.clone();
            match field {
                Field::Ciphertext => flip(&mut tampered.ciphertext, index, bit),
                Field::Tag => flip(&mut tampered.tag, index, bit),
                Field::Canary => {
                    let mut canary = tampered.canary.into_bytes();
                    flip(&mut canary, index, bit);
                    tampered.canary = String::from_utf8_lossy(&canary).into_owned();
                }
            }
            manager.verify_and_decrypt("p", &tampered).await
        });
        prop_assert_eq!(opened, None);
    }
}
