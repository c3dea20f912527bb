//! Tamper-evidence canary tokens
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

use crate::cache::ExpiringCache;
use crate::cleanable::Cleanable;
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::Duration;
use tracing::debug;

/// Number of random bytes in a canary token
pub const TOKEN_BYTES: usize = 32;

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Default sweep interval for issued tokens
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Issues opaque tokens that are valid only while still held
///
/// A canary is stamped onto a record when it is written. If the token can no
/// longer be resolved when the record is read, the record is not trusted.
pub struct CanaryManager {
    /// Token -> issue time (milliseconds)
    tokens: ExpiringCache<String, i64>,
    ttl: Duration,
}

impl CanaryManager {
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            tokens: ExpiringCache::new("canary-tokens", sweep_interval),
            ttl,
        }
    }

    /// Issue a fresh random token
    pub async fn issue(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        self.tokens
            .set(token.clone(), chrono::Utc::now().timestamp_millis(), self.ttl)
            .await;
        token
    }

    /// True iff `token` was issued here and has not expired
    pub async fn verify(&self, token: &str) -> bool {
        let valid = self.tokens.get(token).await.is_some();
        if !valid {
            debug!("Canary token did not resolve");
        }
        valid
    }
}

impl Default for CanaryManager {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL, DEFAULT_SWEEP_INTERVAL)
    }
}

#[async_trait]
impl Cleanable for CanaryManager {
    async fn destroy(&self) {
        self.tokens.destroy().await;
    }
}
