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

use crate::record::Version;
use thiserror::Error;

/// Errors surfaced by the record store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Integrity failure: {0}")]
    IntegrityFailure(String),

    #[error("Version {version} not found for {id}")]
    VersionNotFound { id: String, version: Version },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Encryption error: {0}")]
    Encryption(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
