//! Bounded, deduplicated backup history per identifier
//!
//! New entries are prepended, so among entries sharing a version the one
//! nearest the front is the most recently inserted. Every read normalizes the
//! list: sort by version descending (stable), then keep only the first entry
//! seen for each version.
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

use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use vellum_types::{BackupEntry, Record, Version};

/// Default number of backups retained per identifier
pub const MAX_BACKUPS_PER_ID: usize = 10;

/// Per-identifier version history
pub struct BackupManager {
    backups: Mutex<HashMap<String, Vec<BackupEntry>>>,
    max_backups: usize,
}

impl BackupManager {
    pub fn new(max_backups: usize) -> Self {
        Self {
            backups: Mutex::new(HashMap::new()),
            max_backups,
        }
    }

    /// Record a snapshot of `record`, keeping at most `max_backups` versions
    pub async fn add(&self, id: &str, record: Record) {
        let version = record.version;
        let mut backups = self.backups.lock().await;
        let list = backups.entry(id.to_string()).or_default();

        list.insert(0, BackupEntry::new(record));
        let mut cleaned = normalize(std::mem::take(list), None);
        cleaned.truncate(self.max_backups);
        *list = cleaned;

        debug!(id = id, version = version, retained = list.len(), "Backup added");
    }

    /// Find the backup for `version`, discarding every newer backup
    ///
    /// History above `version` is pruned only when the version is found.
    pub async fn restore_to_version(&self, id: &str, version: Version) -> Option<Record> {
        let mut backups = self.backups.lock().await;
        let list = backups.get_mut(id).filter(|list| !list.is_empty())?;

        let cleaned = normalize(list.clone(), Some(version));
        let record = cleaned
            .iter()
            .find(|entry| entry.version() == version)
            .map(|entry| entry.record.clone())?;

        let pruned = list.len().saturating_sub(cleaned.len());
        *list = cleaned;
        info!(id = id, version = version, pruned = pruned, "Backup history restored to version");
        Some(record)
    }

    /// All backups, highest version first
    pub async fn get_all(&self, id: &str) -> Vec<Record> {
        self.entries(id)
            .await
            .into_iter()
            .map(|entry| entry.record)
            .collect()
    }

    /// Backup entries with their capture times, highest version first
    pub async fn entries(&self, id: &str) -> Vec<BackupEntry> {
        let mut backups = self.backups.lock().await;
        match backups.get_mut(id) {
            Some(list) => {
                *list = normalize(std::mem::take(list), None);
                list.clone()
            }
            None => Vec::new(),
        }
    }

    /// The highest-version backup
    pub async fn get_latest(&self, id: &str) -> Option<Record> {
        let mut backups = self.backups.lock().await;
        let list = backups.get_mut(id).filter(|list| !list.is_empty())?;
        *list = normalize(std::mem::take(list), None);
        list.first().map(|entry| entry.record.clone())
    }
}

impl Default for BackupManager {
    fn default() -> Self {
        Self::new(MAX_BACKUPS_PER_ID)
    }
}

/// Drop versions above `max_version`, order by version descending, and keep
/// the most recently inserted entry for each version
fn normalize(mut list: Vec<BackupEntry>, max_version: Option<Version>) -> Vec<BackupEntry> {
    if let Some(max_version) = max_version {
        list.retain(|entry| entry.version() <= max_version);
    }
    // Stable: ties keep insertion recency (front = newest)
    list.sort_by(|a, b| b.version().cmp(&a.version()));
    list.dedup_by_key(|entry| entry.version());
    list
}
