//! Authenticated encryption and detached signatures
//!
//! Stateless helpers: AES-256-GCM with a fresh random nonce per call, and
//! Ed25519 signatures over plaintext.
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

use aes_gcm::{
    aead::{AeadCore, AeadInPlace, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce, Tag,
};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use vellum_types::{StoreError, StoreResult};

/// Per-identifier symmetric key
pub type SymmetricKey = Key<Aes256Gcm>;

/// AES-GCM nonce length in bytes
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag length in bytes
pub const TAG_SIZE: usize = 16;

/// Output of [`encrypt`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Generate a random 256-bit key
pub fn generate_key() -> SymmetricKey {
    Aes256Gcm::generate_key(&mut OsRng)
}

/// Encrypt `plaintext` under `key` with a freshly generated nonce
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> StoreResult<Sealed> {
    let cipher = Aes256Gcm::new(key);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(&nonce, b"", &mut buffer)
        .map_err(|e| StoreError::Encryption(format!("Encryption failed: {}", e)))?;

    Ok(Sealed {
        ciphertext: buffer,
        nonce: nonce.to_vec(),
        tag: tag.to_vec(),
    })
}

/// Decrypt and authenticate
///
/// Fails with `IntegrityFailure` on a malformed nonce or tag, a wrong key, or
/// any modification of the ciphertext.
pub fn decrypt(
    ciphertext: &[u8],
    key: &SymmetricKey,
    nonce: &[u8],
    tag: &[u8],
) -> StoreResult<Vec<u8>> {
    if nonce.len() != NONCE_SIZE {
        return Err(StoreError::IntegrityFailure(format!(
            "Nonce must be {} bytes, got {}",
            NONCE_SIZE,
            nonce.len()
        )));
    }
    if tag.len() != TAG_SIZE {
        return Err(StoreError::IntegrityFailure(format!(
            "Tag must be {} bytes, got {}",
            TAG_SIZE,
            tag.len()
        )));
    }

    let cipher = Aes256Gcm::new(key);
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut buffer, Tag::from_slice(tag))
        .map_err(|_| StoreError::IntegrityFailure("Authentication tag mismatch".to_string()))?;

    Ok(buffer)
}

/// Detached Ed25519 signature over `message`
pub fn sign(message: &[u8], signing_key: &SigningKey) -> Vec<u8> {
    signing_key.sign(message).to_bytes().to_vec()
}

/// Check a detached signature; malformed signatures simply fail
pub fn verify(message: &[u8], signature: &[u8], verifying_key: &VerifyingKey) -> bool {
    match Signature::from_slice(signature) {
        Ok(signature) => verifying_key.verify_strict(message, &signature).is_ok(),
        Err(_) => false,
    }
}
