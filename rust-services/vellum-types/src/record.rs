//! Stored record and backup entry types
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

use serde::{Deserialize, Serialize};

/// Record version. The first record for an identifier is version 0.
pub type Version = u64;

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// An encrypted, signed, canary-stamped record for one identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
    /// Detached signature over the plaintext
    pub signature: Vec<u8>,
    /// Signing key that produced `signature`
    pub key_id: String,
    pub version: Version,
    /// Creation time (milliseconds)
    pub timestamp: i64,
    /// Tamper-evidence token
    pub canary: String,
}

/// A record snapshot retained in backup history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub record: Record,
    /// When the snapshot was captured (milliseconds)
    pub captured_at: i64,
}

impl BackupEntry {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            captured_at: now_millis(),
        }
    }

    pub fn version(&self) -> Version {
        self.record.version
    }
}
