//! Key type definitions
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

use ed25519_dalek::{SigningKey, VerifyingKey};
use std::time::Duration;

/// Unique identifier for a signing key (hex encoded random bytes)
pub type KeyId = String;

/// Number of random bytes behind a [`KeyId`]
pub const KEY_ID_BYTES: usize = 16;

/// A signing key together with its lifecycle metadata
#[derive(Clone)]
pub struct SigningKeyRecord {
    pub key_id: KeyId,
    pub signing_key: SigningKey,
    /// When this key was generated (milliseconds)
    pub created_at: i64,
    /// When this key stops being usable (milliseconds)
    pub expires_at: i64,
}

impl SigningKeyRecord {
    pub fn new(key_id: KeyId, signing_key: SigningKey, lifetime: Duration) -> Self {
        let created_at = chrono::Utc::now().timestamp_millis();
        let lifetime_ms = i64::try_from(lifetime.as_millis()).unwrap_or(i64::MAX);
        Self {
            key_id,
            signing_key,
            created_at,
            expires_at: created_at.saturating_add(lifetime_ms),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

// Private key material stays out of logs.
impl std::fmt::Debug for SigningKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyRecord")
            .field("key_id", &self.key_id)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
