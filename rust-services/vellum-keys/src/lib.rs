//! Key Management for Vellum
//!
//! Provides the expiring in-memory cache, the rotating signing key set, and
//! tamper-evidence canary tokens used by the record store.
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

pub mod cache;
pub mod canary;
pub mod cleanable;
pub mod error;
pub mod key_manager;
pub mod key_types;

pub use cache::ExpiringCache;
pub use canary::CanaryManager;
pub use cleanable::Cleanable;
pub use error::{KeyError, KeyResult};
pub use key_manager::KeyManager;
pub use key_types::{KeyId, SigningKeyRecord};
