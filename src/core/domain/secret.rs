//! Secret types.
//!
//! A `Secret` holds a plaintext value only in memory; a `SealedSecret` is the
//! form that leaves the process.

use std::fmt;

use zeroize::Zeroizing;

use crate::core::types::{KeyId, SecretName};

/// A named plaintext secret.
#[derive(Clone)]
pub struct Secret {
    name: SecretName,
    value: Zeroizing<String>,
}

impl Secret {
    /// Create a new secret from a name and plaintext value
    pub fn new(name: impl Into<SecretName>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Zeroizing::new(value.into()),
        }
    }

    /// Secret's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plaintext bytes, for sealing
    pub fn expose(&self) -> &[u8] {
        self.value.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("value", &"***")
            .finish()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A secret sealed against one recipient key.
///
/// Only meaningful together with the `key_id` it was sealed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    name: SecretName,
    key_id: KeyId,
    encrypted_value: String,
}

impl SealedSecret {
    pub fn new(name: SecretName, key_id: KeyId, encrypted_value: String) -> Self {
        Self {
            name,
            key_id,
            encrypted_value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Base64 of `ephemeral public key || box ciphertext`.
    pub fn encrypted_value(&self) -> &str {
        &self.encrypted_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_new() {
        let secret = Secret::new("awsAccessKeyId", "AKIA123");

        assert_eq!(secret.name(), "awsAccessKeyId");
        assert_eq!(secret.expose(), b"AKIA123");
    }

    #[test]
    fn test_secret_display_and_debug_hide_value() {
        let secret = Secret::new("githubToken", "ghp_value");

        assert_eq!(format!("{}", secret), "githubToken");
        assert!(!format!("{:?}", secret).contains("ghp_value"));
    }
}
