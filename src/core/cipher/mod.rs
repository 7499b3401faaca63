//! Cryptographic operations.
//!
//! Secrets are delivered to the CI secret store as anonymous sealed boxes:
//! X25519 + XSalsa20-Poly1305 with a fresh ephemeral key per call and a
//! nonce derived from both public keys. The byte layout matches libsodium's
//! `crypto_box_seal`, which is what the secret store decrypts with.

use zeroize::Zeroizing;

use crate::core::domain::{SealedSecret, Secret};
use crate::error::Result;

mod recipient;
mod sealed;

pub use recipient::RecipientKey;
pub use sealed::{derive_nonce, SealedBox, NONCE_LEN, PUBLIC_KEY_LEN};

pub use crypto_box::{PublicKey, SecretKey};

/// Cryptographic backend trait.
///
/// Abstracts encryption and decryption for one recipient so the pipeline
/// does not depend on the box construction directly.
pub trait Cipher {
    /// Type representing a recipient public key.
    type Recipient;

    /// Type representing a private identity/key.
    type Identity;

    /// Encrypt plaintext for a recipient.
    ///
    /// Returns the transport encoding of the ciphertext.
    ///
    /// # Errors
    ///
    /// Returns `SealingError` if encryption fails.
    fn encrypt(&self, plaintext: &[u8], recipient: &Self::Recipient) -> Result<String>;

    /// Decrypt a transport-encoded ciphertext using a private identity.
    ///
    /// # Errors
    ///
    /// Returns `SealingError` if the value is malformed or the key doesn't match.
    fn decrypt(&self, encrypted: &str, identity: &Self::Identity) -> Result<Zeroizing<Vec<u8>>>;
}

/// Seal plaintext against a raw recipient public key.
///
/// The key length is checked before anything else happens; a key that is
/// not exactly 32 bytes is rejected rather than truncated or padded.
///
/// # Errors
///
/// Returns `SealingError::InvalidKeyLength` for a malformed key and
/// `SealingError::RandomSource` if no ephemeral key can be generated.
pub fn seal(plaintext: &[u8], recipient_public_key: &[u8]) -> Result<String> {
    let recipient = RecipientKey::from_bytes(String::new(), recipient_public_key)?;
    SealedBox.encrypt(plaintext, &recipient)
}

/// Open a sealed value with the recipient's private key.
pub fn open(sealed: &str, recipient_secret: &SecretKey) -> Result<Zeroizing<Vec<u8>>> {
    SealedBox.decrypt(sealed, recipient_secret)
}

/// Seal a named secret, binding the result to the key's id.
pub fn seal_secret(secret: &Secret, recipient: &RecipientKey) -> Result<SealedSecret> {
    let encrypted = SealedBox.encrypt(secret.expose(), recipient)?;
    Ok(SealedSecret::new(
        secret.name().to_string(),
        recipient.key_id().to_string(),
        encrypted,
    ))
}
