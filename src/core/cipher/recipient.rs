//! Recipient public keys as published by the secret store.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::PUBLIC_KEY_LEN;
use crate::core::types::KeyId;
use crate::error::SealingError;

/// A 32-byte X25519 public key and the id the secret store knows it by.
///
/// Keys rotate on the store's schedule, so a `RecipientKey` is fetched
/// immediately before sealing and dropped after.
#[derive(Clone, PartialEq, Eq)]
pub struct RecipientKey {
    key_id: KeyId,
    bytes: [u8; PUBLIC_KEY_LEN],
}

impl RecipientKey {
    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `SealingError::InvalidKeyLength` unless `bytes` is exactly 32 bytes.
    pub fn from_bytes(key_id: KeyId, bytes: &[u8]) -> Result<Self, SealingError> {
        let bytes: [u8; PUBLIC_KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| SealingError::InvalidKeyLength {
                    expected: PUBLIC_KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self { key_id, bytes })
    }

    /// Build a key from the base64 form returned by the secret store API.
    pub fn from_base64(key_id: KeyId, encoded: &str) -> Result<Self, SealingError> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| SealingError::InvalidKeyEncoding(e.to_string()))?;
        Self::from_bytes(key_id, &decoded)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for RecipientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipientKey")
            .field("key_id", &self.key_id)
            .field("key", &STANDARD.encode(self.bytes))
            .finish()
    }
}
