//! Record service
//!
//! The operations exposed to the routing layer. Callers are expected to have
//! authenticated the request already; no per-caller access control happens
//! here.
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

use crate::manager::{DecryptedRecord, RecordManager};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vellum_types::{RecordSummary, RecordView, SnapshotInfo, StoreError, StoreResult, Version};

/// Records created at startup when seeding is enabled
pub const DEFAULT_RECORDS: &[(&str, &str)] = &[
    ("test-data", "Test Hello, World!"),
    ("hello", "Hello, World!"),
    ("welcome", "Welcome to the secure data manager!"),
];

/// Text-oriented facade over [`RecordManager`]
#[derive(Clone)]
pub struct RecordService {
    manager: Arc<RecordManager>,
}

fn validate_id(id: &str) -> StoreResult<()> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidIdentifier(
            "Identifier must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn into_view(decrypted: DecryptedRecord) -> StoreResult<RecordView> {
    let plaintext = String::from_utf8(decrypted.plaintext).map_err(|_| {
        StoreError::IntegrityFailure("Plaintext is not valid UTF-8".to_string())
    })?;
    Ok(RecordView::new(&decrypted.record, plaintext))
}

impl RecordService {
    pub fn new(manager: Arc<RecordManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<RecordManager> {
        &self.manager
    }

    /// Write `plaintext` as the next version of `id`
    ///
    /// `expected_version` is informational only: a mismatch is logged and the
    /// write proceeds anyway.
    pub async fn create_or_update(
        &self,
        id: &str,
        plaintext: &str,
        expected_version: Option<Version>,
    ) -> StoreResult<RecordSummary> {
        validate_id(id)?;

        if let Some(expected) = expected_version {
            let actual = self.manager.current(id).await.map(|record| record.version);
            if actual != Some(expected) {
                debug!(
                    id = id,
                    expected = expected,
                    actual = ?actual,
                    "Expected version does not match, writing anyway"
                );
            }
        }

        let record = self.manager.update(id, plaintext.as_bytes()).await?;
        Ok(RecordSummary::from(&record))
    }

    /// The verified current plaintext of `id`
    pub async fn fetch_current(&self, id: &str) -> StoreResult<RecordView> {
        validate_id(id)?;

        let record = self
            .manager
            .current(id)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("No record for {}", id)))?;
        let plaintext = self.manager.try_verify_and_decrypt(id, &record).await?;
        into_view(DecryptedRecord { record, plaintext })
    }

    /// Whether the current record of `id` holds exactly `candidate`
    ///
    /// `NotFound` when `id` has no record. On `Ok(false)` the caller may
    /// choose to [`recover`](Self::recover).
    pub async fn verify(&self, id: &str, candidate: &str) -> StoreResult<bool> {
        validate_id(id)?;

        if self.manager.current(id).await.is_none() {
            return Err(StoreError::NotFound(format!("No record for {}", id)));
        }
        Ok(self.manager.verify(id, candidate.as_bytes()).await)
    }

    /// Roll `id` back to backup `version`
    pub async fn restore(&self, id: &str, version: Version) -> StoreResult<RecordView> {
        validate_id(id)?;
        into_view(self.manager.try_restore_version(id, version).await?)
    }

    /// Roll `id` back to its latest backup
    pub async fn recover(&self, id: &str) -> StoreResult<RecordView> {
        validate_id(id)?;
        into_view(self.manager.try_recover(id).await?)
    }

    /// Verified history of `id`, newest first
    pub async fn history(&self, id: &str) -> StoreResult<Vec<RecordView>> {
        validate_id(id)?;

        let history = self
            .manager
            .history(id)
            .await
            .into_iter()
            .filter_map(|entry| {
                let version = entry.record.version;
                into_view(entry)
                    .map_err(|e| warn!(id = id, version = version, error = %e, "Skipping history entry"))
                    .ok()
            })
            .collect();
        Ok(history)
    }

    /// Push the current record of `id` into its history again
    pub async fn snapshot(&self, id: &str) -> StoreResult<SnapshotInfo> {
        validate_id(id)?;
        self.manager.snapshot(id).await
    }

    /// Create each `(id, plaintext)` pair, skipping failures
    ///
    /// Returns how many records were written.
    pub async fn seed(&self, items: &[(&str, &str)]) -> usize {
        let mut seeded = 0;
        for (id, plaintext) in items {
            match self.create_or_update(id, plaintext, None).await {
                Ok(summary) => {
                    seeded += 1;
                    debug!(id = %summary.id, version = summary.version, "Seeded record");
                }
                Err(e) => {
                    error!(id = id, error = %e, "Failed to seed record");
                }
            }
        }
        info!(seeded = seeded, total = items.len(), "Default records seeded");
        seeded
    }
}
