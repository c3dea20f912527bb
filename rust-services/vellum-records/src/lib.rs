//! Vellum Records Library
//!
//! This library provides the versioned, tamper-evident record store:
//! - Authenticated encryption and detached signatures
//! - Bounded, deduplicated backup history
//! - Record lifecycle orchestration with per-identifier locking
//! - The service operations used by the routing layer
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

pub mod backup;
pub mod crypto;
pub mod locks;
pub mod manager;
pub mod service;

pub use backup::BackupManager;
pub use manager::{DecryptedRecord, RecordManager};
pub use service::{RecordService, DEFAULT_RECORDS};
