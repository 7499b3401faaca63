//! Anonymous sealed-box backend.
//!
//! Output layout: `ephemeral public key (32) || crypto_box ciphertext`,
//! base64 (standard alphabet). The nonce is never transmitted; both sides
//! derive it as BLAKE2b-192 over `ephemeral pk || recipient pk`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use blake2::digest::consts::U24;
use blake2::{Blake2b, Digest};
use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::rand_core::RngCore;
use crypto_box::aead::{Aead, OsRng};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use tracing::trace;
use zeroize::{Zeroize, Zeroizing};

use super::{Cipher, RecipientKey};
use crate::error::{Result, SealingError};

/// Length of an X25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of an XSalsa20 nonce.
pub const NONCE_LEN: usize = 24;

/// Sealed-box backend.
pub struct SealedBox;

impl Cipher for SealedBox {
    type Recipient = RecipientKey;
    type Identity = SecretKey;

    fn encrypt(&self, plaintext: &[u8], recipient: &RecipientKey) -> Result<String> {
        trace!(
            key_id = recipient.key_id(),
            plaintext_len = plaintext.len(),
            "sealing"
        );

        let ephemeral_secret = generate_ephemeral()?;
        let ephemeral_public = ephemeral_secret.public_key();
        let recipient_public = PublicKey::from(*recipient.as_bytes());

        let nonce = derive_nonce(ephemeral_public.as_bytes(), recipient.as_bytes());
        let ciphertext = SalsaBox::new(&recipient_public, &ephemeral_secret)
            .encrypt(GenericArray::from_slice(&nonce), plaintext)
            .map_err(|_| SealingError::EncryptionFailed)?;
        drop(ephemeral_secret);

        let mut sealed = Vec::with_capacity(PUBLIC_KEY_LEN + ciphertext.len());
        sealed.extend_from_slice(ephemeral_public.as_bytes());
        sealed.extend_from_slice(&ciphertext);

        trace!(sealed_len = sealed.len(), "sealed");

        Ok(STANDARD.encode(sealed))
    }

    fn decrypt(&self, encrypted: &str, identity: &SecretKey) -> Result<Zeroizing<Vec<u8>>> {
        let sealed = STANDARD
            .decode(encrypted.trim())
            .map_err(|e| SealingError::Malformed(format!("invalid base64: {}", e)))?;

        if sealed.len() < PUBLIC_KEY_LEN {
            return Err(SealingError::Malformed(format!(
                "{} bytes is shorter than an ephemeral key",
                sealed.len()
            ))
            .into());
        }

        let (ephemeral, ciphertext) = sealed.split_at(PUBLIC_KEY_LEN);
        let mut ephemeral_bytes = [0u8; PUBLIC_KEY_LEN];
        ephemeral_bytes.copy_from_slice(ephemeral);
        let ephemeral_public = PublicKey::from(ephemeral_bytes);
        let recipient_public = identity.public_key();

        let nonce = derive_nonce(&ephemeral_bytes, recipient_public.as_bytes());
        let plaintext = SalsaBox::new(&ephemeral_public, identity)
            .decrypt(GenericArray::from_slice(&nonce), ciphertext)
            .map_err(|_| SealingError::DecryptionFailed)?;

        trace!(plaintext_len = plaintext.len(), "opened");

        Ok(Zeroizing::new(plaintext))
    }
}

/// Nonce for a sealed box: BLAKE2b with a 24-byte output over
/// `ephemeral_public || recipient_public`.
pub fn derive_nonce(
    ephemeral_public: &[u8; PUBLIC_KEY_LEN],
    recipient_public: &[u8; PUBLIC_KEY_LEN],
) -> [u8; NONCE_LEN] {
    let digest = Blake2b::<U24>::new()
        .chain_update(ephemeral_public)
        .chain_update(recipient_public)
        .finalize();

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&digest);
    nonce
}

fn generate_ephemeral() -> Result<SecretKey> {
    let mut bytes = [0u8; PUBLIC_KEY_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SealingError::RandomSource(e.to_string()))?;
    let secret = SecretKey::from(bytes);
    bytes.zeroize();
    Ok(secret)
}
