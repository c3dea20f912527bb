//! Record manager
//!
//! Owns the current record per identifier and the per-identifier symmetric
//! keys, and coordinates the key manager, canary manager and backup history
//! to create, update, verify, restore and recover records.
//!
//! Every operation on an identifier holds that identifier's lock for its
//! whole duration, so concurrent writers cannot lose updates or race on
//! establishing version 0.
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::backup::BackupManager;
use crate::crypto::{self, SymmetricKey};
use crate::locks::IdLocks;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vellum_config::StoreConfig;
use vellum_keys::{CanaryManager, Cleanable, ExpiringCache, KeyError, KeyManager};
use vellum_types::{now_millis, Record, SnapshotInfo, StoreError, StoreResult, Version};

/// A record that passed every integrity check, with its plaintext
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedRecord {
    pub record: Record,
    pub plaintext: Vec<u8>,
}

/// Orchestrates the secure record lifecycle
pub struct RecordManager {
    records: RwLock<HashMap<String, Record>>,
    encryption_keys: ExpiringCache<String, SymmetricKey>,
    key_manager: Arc<KeyManager>,
    canaries: CanaryManager,
    backups: BackupManager,
    locks: IdLocks,
    symmetric_key_ttl: Duration,
}

fn key_unavailable(err: KeyError) -> StoreError {
    StoreError::KeyUnavailable(err.to_string())
}

impl RecordManager {
    /// Build a record manager and all of its collaborators from `config`
    pub async fn new(config: &StoreConfig) -> StoreResult<Self> {
        let key_manager = KeyManager::new(config.signing_key_lifetime(), config.signing_key_sweep())
            .await
            .map_err(key_unavailable)?;

        info!(
            max_backups = config.max_backups,
            symmetric_key_ttl_secs = config.symmetric_key_ttl_secs,
            canary_ttl_secs = config.canary_ttl_secs,
            "Record manager initialized"
        );

        Ok(Self {
            records: RwLock::new(HashMap::new()),
            encryption_keys: ExpiringCache::new("encryption-keys", config.symmetric_key_sweep()),
            key_manager: Arc::new(key_manager),
            canaries: CanaryManager::new(config.canary_ttl(), config.canary_sweep()),
            backups: BackupManager::new(config.max_backups),
            locks: IdLocks::new(),
            symmetric_key_ttl: config.symmetric_key_ttl(),
        })
    }

    /// Signing keys, e.g. for scheduling rotation
    pub fn key_manager(&self) -> &Arc<KeyManager> {
        &self.key_manager
    }

    /// The stored current record, unverified
    pub async fn current(&self, id: &str) -> Option<Record> {
        self.records.read().await.get(id).cloned()
    }

    /// Create a record, starting a new encryption key epoch for `id`
    ///
    /// The version continues from any existing current record (0 otherwise),
    /// but a brand-new symmetric key always replaces the previous one.
    pub async fn create(&self, id: &str, plaintext: &[u8]) -> StoreResult<Record> {
        let _guard = self.locks.lock(id).await;
        self.create_locked(id, plaintext).await
    }

    async fn create_locked(&self, id: &str, plaintext: &[u8]) -> StoreResult<Record> {
        let version = self
            .current(id)
            .await
            .map(|current| current.version + 1)
            .unwrap_or(0);

        // The previous key stays in place until the new record is sealed,
        // so a failed create leaves the current record readable.
        let key = crypto::generate_key();
        let record = self.seal(id, plaintext, &key, version).await?;
        self.encryption_keys
            .set(id.to_string(), key, self.symmetric_key_ttl)
            .await;

        // Back up before it becomes current
        self.backups.add(id, record.clone()).await;
        self.records.write().await.insert(id.to_string(), record.clone());

        info!(id = id, version = version, key_id = %record.key_id, "Record created");
        Ok(record)
    }

    /// Write a new version under the existing symmetric key
    ///
    /// Falls back to [`create`](Self::create) when `id` has no current record.
    /// Fails with `KeyUnavailable` if the symmetric key has expired; no new
    /// key is minted in that case.
    pub async fn update(&self, id: &str, plaintext: &[u8]) -> StoreResult<Record> {
        let _guard = self.locks.lock(id).await;

        let Some(current) = self.current(id).await else {
            return self.create_locked(id, plaintext).await;
        };

        self.backups.add(id, current.clone()).await;

        let key = self.encryption_keys.get(id).await.ok_or_else(|| {
            StoreError::KeyUnavailable(format!("Encryption key for {} is missing or expired", id))
        })?;

        let version = current.version + 1;
        let record = self.seal(id, plaintext, &key, version).await?;

        self.backups.add(id, record.clone()).await;
        self.records.write().await.insert(id.to_string(), record.clone());

        info!(id = id, version = version, key_id = %record.key_id, "Record updated");
        Ok(record)
    }

    async fn seal(
        &self,
        id: &str,
        plaintext: &[u8],
        key: &SymmetricKey,
        version: Version,
    ) -> StoreResult<Record> {
        let sealed = crypto::encrypt(plaintext, key)?;
        let signing_key = self.key_manager.current_key().await.map_err(key_unavailable)?;
        let signature = crypto::sign(plaintext, &signing_key.signing_key);
        let canary = self.canaries.issue().await;

        Ok(Record {
            id: id.to_string(),
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
            tag: sealed.tag,
            signature,
            key_id: signing_key.key_id,
            version,
            timestamp: now_millis(),
            canary,
        })
    }

    /// Decrypt `record` and run every integrity check on it
    pub async fn verify_and_decrypt(&self, id: &str, record: &Record) -> Option<Vec<u8>> {
        self.try_verify_and_decrypt(id, record).await.ok()
    }

    /// Like [`verify_and_decrypt`](Self::verify_and_decrypt), reporting which
    /// check failed
    pub async fn try_verify_and_decrypt(&self, id: &str, record: &Record) -> StoreResult<Vec<u8>> {
        let result = self.check(id, record).await;
        if let Err(e) = &result {
            warn!(id = id, version = record.version, error = %e, "Record failed verification");
        }
        result
    }

    async fn check(&self, id: &str, record: &Record) -> StoreResult<Vec<u8>> {
        let key = self.encryption_keys.get(id).await.ok_or_else(|| {
            StoreError::IntegrityFailure("Encryption key missing or expired".to_string())
        })?;

        let plaintext = crypto::decrypt(&record.ciphertext, &key, &record.nonce, &record.tag)?;

        if !self.canaries.verify(&record.canary).await {
            return Err(StoreError::IntegrityFailure(
                "Canary token did not resolve".to_string(),
            ));
        }

        let signing_key = self.key_manager.get(&record.key_id).await.ok_or_else(|| {
            StoreError::IntegrityFailure(format!("Signing key {} missing or expired", record.key_id))
        })?;

        if !crypto::verify(&plaintext, &record.signature, &signing_key.verifying_key()) {
            return Err(StoreError::IntegrityFailure("Signature mismatch".to_string()));
        }

        Ok(plaintext)
    }

    /// True iff the current record verifies and decrypts to `candidate`
    pub async fn verify(&self, id: &str, candidate: &[u8]) -> bool {
        let _guard = self.locks.lock(id).await;

        let Some(current) = self.current(id).await else {
            return false;
        };
        self.verify_and_decrypt(id, &current)
            .await
            .is_some_and(|plaintext| plaintext == candidate)
    }

    /// Make backup `version` current again, discarding newer backups
    pub async fn restore_version(&self, id: &str, version: Version) -> Option<Record> {
        self.try_restore_version(id, version)
            .await
            .ok()
            .map(|restored| restored.record)
    }

    /// Like [`restore_version`](Self::restore_version), reporting why it failed
    ///
    /// A backup that fails verification is never promoted.
    pub async fn try_restore_version(&self, id: &str, version: Version) -> StoreResult<DecryptedRecord> {
        let _guard = self.locks.lock(id).await;

        let restored = self
            .backups
            .restore_to_version(id, version)
            .await
            .ok_or_else(|| StoreError::VersionNotFound {
                id: id.to_string(),
                version,
            })?;

        let decrypted = self.promote(id, restored).await?;
        info!(id = id, version = version, "Record restored from backup");
        Ok(decrypted)
    }

    /// Make the latest backup current again
    pub async fn recover(&self, id: &str) -> Option<Record> {
        self.try_recover(id).await.ok().map(|recovered| recovered.record)
    }

    /// Like [`recover`](Self::recover), reporting why it failed
    pub async fn try_recover(&self, id: &str) -> StoreResult<DecryptedRecord> {
        let _guard = self.locks.lock(id).await;

        let latest = self
            .backups
            .get_latest(id)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("No backups for {}", id)))?;

        let version = latest.version;
        let decrypted = self.promote(id, latest).await?;
        info!(id = id, version = version, "Record recovered from backup");
        Ok(decrypted)
    }

    /// Verify a backup and set it current without adding a new backup entry
    async fn promote(&self, id: &str, record: Record) -> StoreResult<DecryptedRecord> {
        let plaintext = self.try_verify_and_decrypt(id, &record).await?;
        self.records.write().await.insert(id.to_string(), record.clone());
        Ok(DecryptedRecord { record, plaintext })
    }

    /// Every backup that still verifies, highest version first
    pub async fn history(&self, id: &str) -> Vec<DecryptedRecord> {
        let _guard = self.locks.lock(id).await;

        let backups = self.backups.get_all(id).await;
        let total = backups.len();
        let mut history = Vec::with_capacity(total);
        for record in backups {
            if let Some(plaintext) = self.verify_and_decrypt(id, &record).await {
                history.push(DecryptedRecord { record, plaintext });
            }
        }
        history.sort_by(|a, b| b.record.version.cmp(&a.record.version));

        if history.len() < total {
            debug!(id = id, dropped = total - history.len(), "Dropped unverifiable history entries");
        }
        history
    }

    /// Push the current record into backup history again
    pub async fn snapshot(&self, id: &str) -> StoreResult<SnapshotInfo> {
        let _guard = self.locks.lock(id).await;

        let current = self
            .current(id)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("No record for {}", id)))?;
        let version = current.version;
        self.backups.add(id, current).await;

        let snapshot = SnapshotInfo {
            snapshot_id: Uuid::new_v4().to_string(),
            timestamp: now_millis(),
            version,
        };
        info!(id = id, version = version, snapshot_id = %snapshot.snapshot_id, "Snapshot taken");
        Ok(snapshot)
    }
}

#[async_trait]
impl Cleanable for RecordManager {
    async fn destroy(&self) {
        self.key_manager.destroy().await;
        self.canaries.destroy().await;
        self.encryption_keys.destroy().await;
        info!("Record manager destroyed");
    }
}
