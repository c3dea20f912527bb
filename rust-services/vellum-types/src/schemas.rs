//! Payloads returned to callers of the record service
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

use crate::record::{Record, Version};
use serde::{Deserialize, Serialize};

/// Returned by `create_or_update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: String,
    pub version: Version,
    pub timestamp: i64,
}

impl From<&Record> for RecordSummary {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            version: record.version,
            timestamp: record.timestamp,
        }
    }
}

/// A verified, decrypted record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordView {
    pub id: String,
    pub plaintext: String,
    pub version: Version,
    pub timestamp: i64,
}

impl RecordView {
    pub fn new(record: &Record, plaintext: String) -> Self {
        Self {
            id: record.id.clone(),
            plaintext,
            version: record.version,
            timestamp: record.timestamp,
        }
    }
}

/// Result of a snapshot request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub snapshot_id: String,
    pub timestamp: i64,
    pub version: Version,
}
