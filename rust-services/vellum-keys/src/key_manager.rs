//! Rotating signing key set
//!
//! Exactly one key is current at any time. Keys retired by a rotation stay
//! resolvable by id until their own lifetime elapses, so signatures made
//! before a rotation still verify.
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

use crate::cache::{deadline, ExpiringCache};
use crate::cleanable::Cleanable;
use crate::error::{KeyError, KeyResult};
use crate::key_types::{KeyId, SigningKeyRecord, KEY_ID_BYTES};
use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Manages the set of live signing keys
pub struct KeyManager {
    keys: ExpiringCache<KeyId, SigningKeyRecord>,
    current_key_id: RwLock<KeyId>,
    lifetime: Duration,
}

impl KeyManager {
    /// Create a key manager and generate its initial current key
    ///
    /// # Arguments
    /// * `lifetime` - How long each key stays usable after generation
    /// * `sweep_interval` - How often expired keys are purged in the background
    pub async fn new(lifetime: Duration, sweep_interval: Duration) -> KeyResult<Self> {
        if lifetime.is_zero() {
            return Err(KeyError::Configuration(
                "Signing key lifetime must be greater than zero".to_string(),
            ));
        }

        let manager = Self {
            keys: ExpiringCache::new("signing-keys", sweep_interval),
            current_key_id: RwLock::new(KeyId::new()),
            lifetime,
        };
        manager.rotate().await;
        Ok(manager)
    }

    /// Generate a new key and make it current
    ///
    /// Previously issued keys are left untouched until they expire.
    pub async fn rotate(&self) -> KeyId {
        let key_id = generate_key_id();
        let signing_key = SigningKey::generate(&mut OsRng);
        let record = SigningKeyRecord::new(key_id.clone(), signing_key, self.lifetime);
        let expires_at = record.expires_at;

        let mut current = self.current_key_id.write().await;
        self.keys.set(key_id.clone(), record, self.lifetime).await;
        *current = key_id.clone();

        info!(key_id = %key_id, expires_at = expires_at, "Rotated signing key");
        key_id
    }

    /// Id of the most recently rotated key
    pub async fn current_key_id(&self) -> KeyId {
        self.current_key_id.read().await.clone()
    }

    /// The current key, if it has not expired
    pub async fn current_key(&self) -> KeyResult<SigningKeyRecord> {
        let key_id = self.current_key_id().await;
        match self.get(&key_id).await {
            Some(record) => Ok(record),
            None => Err(KeyError::NotFound(key_id)),
        }
    }

    /// Look up a key by id; expired keys are dropped and reported absent
    pub async fn get(&self, key_id: &str) -> Option<SigningKeyRecord> {
        let record = self.keys.get(key_id).await;
        if record.is_none() {
            debug!(key_id = key_id, "Signing key not available");
        }
        record
    }

    /// Purge expired keys now
    pub async fn cleanup(&self) -> usize {
        self.keys.sweep().await
    }

    /// Rotate the current key every `interval` until the manager is dropped
    /// or the returned handle is aborted
    pub fn spawn_rotation(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(deadline(interval), interval);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.rotate().await;
            }
        })
    }
}

fn generate_key_id() -> KeyId {
    let mut bytes = [0u8; KEY_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[async_trait]
impl Cleanable for KeyManager {
    async fn destroy(&self) {
        self.keys.destroy().await;
        info!("Key manager destroyed");
    }
}
