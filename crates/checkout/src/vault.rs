//! Session vault: symmetric encryption for client-storage blobs.
//!
//! Auth tokens and profile data live in browser storage, which any extension
//! or devtools session can read. The vault seals those blobs with
//! AES-256-GCM under a key derived from the application secret.
//!
//! # Security boundary
//!
//! This protects against **casual inspection of client storage only**. The
//! derivation inputs ship with the application, so a motivated attacker with
//! code access can recover the key. That is an intentional, documented
//! limitation - the vault is an obfuscation layer for at-rest storage, not a
//! confidentiality guarantee against the app's own origin.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use sha2::Sha256;
use thiserror::Error;

/// Fixed application salt for key derivation.
///
/// Fixed on purpose: every client must derive the same key from the same
/// application secret, or a session written yesterday would be unreadable
/// today.
const KDF_SALT: &[u8] = b"marigold-session-vault-v1";

/// PBKDF2-HMAC-SHA256 iteration count.
const KDF_ITERATIONS: u32 = 310_000;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Errors from sealing a payload.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The AEAD rejected the plaintext.
    #[error("encryption failed")]
    Encrypt,

    /// The payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

enum VaultCipher {
    /// AES-256-GCM under the derived key.
    Sealed(Box<Aes256Gcm>),
    /// INSECURE fallback: reversible base64 encoding, no encryption at all.
    ///
    /// Exists so the application keeps working where the AEAD primitive is
    /// unavailable. Must never be treated as equivalent security.
    Degraded,
}

/// Encrypts and decrypts serializable session blobs for client storage.
pub struct SessionVault {
    cipher: VaultCipher,
}

impl SessionVault {
    /// Create a vault keyed from the application secret.
    ///
    /// The key is derived with PBKDF2-HMAC-SHA256 over a fixed salt and a
    /// high iteration count; see the module docs for what that does and does
    /// not protect against.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let mut key = [0u8; 32];
        pbkdf2_hmac::<Sha256>(
            secret.expose_secret().as_bytes(),
            KDF_SALT,
            KDF_ITERATIONS,
            &mut key,
        );

        // 32-byte key, so new_from_slice cannot fail
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_or(VaultCipher::Degraded, |c| VaultCipher::Sealed(Box::new(c)));

        if matches!(cipher, VaultCipher::Degraded) {
            tracing::error!("AEAD unavailable, session vault running degraded");
        }

        Self { cipher }
    }

    /// Create a vault in degraded mode: reversible encoding, **no
    /// encryption**.
    ///
    /// For embedders on platforms without the AEAD primitive. Clearly
    /// insecure-but-functional; [`Self::is_degraded`] reports it so callers
    /// can warn.
    #[must_use]
    pub const fn degraded() -> Self {
        Self {
            cipher: VaultCipher::Degraded,
        }
    }

    /// Whether this vault is running without real encryption.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self.cipher, VaultCipher::Degraded)
    }

    /// Encrypt a payload into a single storable string.
    ///
    /// Layout is `base64(nonce || sealed-data)` with a fresh random nonce per
    /// call, so encrypting the same payload twice yields different strings.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Encrypt`] if the AEAD rejects the plaintext.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, VaultError> {
        match &self.cipher {
            VaultCipher::Sealed(cipher) => {
                let mut nonce_bytes = [0u8; NONCE_LEN];
                rand::rng().fill_bytes(&mut nonce_bytes);
                let nonce = Nonce::from(nonce_bytes);

                let sealed = cipher
                    .encrypt(&nonce, plaintext)
                    .map_err(|_| VaultError::Encrypt)?;

                let mut out = nonce_bytes.to_vec();
                out.extend_from_slice(&sealed);
                Ok(BASE64.encode(out))
            }
            // INSECURE: reversible encoding only.
            VaultCipher::Degraded => Ok(BASE64.encode(plaintext)),
        }
    }

    /// Decrypt a stored string.
    ///
    /// Returns `None` for corrupt, truncated, or foreign ciphertext - never
    /// an error. Callers treat `None` as "no stored session".
    #[must_use]
    pub fn decrypt(&self, ciphertext: &str) -> Option<Vec<u8>> {
        let raw = BASE64.decode(ciphertext).ok()?;

        match &self.cipher {
            VaultCipher::Sealed(cipher) => {
                if raw.len() < NONCE_LEN {
                    return None;
                }
                // Nonce length is fixed, so the split point is deterministic.
                let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
                let nonce = Nonce::from_slice(nonce_bytes);
                cipher.decrypt(nonce, sealed).ok()
            }
            VaultCipher::Degraded => Some(raw),
        }
    }

    /// Serialize and encrypt a value.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError`] if serialization or encryption fails.
    pub fn seal<T: Serialize>(&self, value: &T) -> Result<String, VaultError> {
        let json = serde_json::to_vec(value)?;
        self.encrypt(&json)
    }

    /// Decrypt and deserialize a value.
    ///
    /// Returns `None` on any decryption or decode failure.
    #[must_use]
    pub fn open<T: DeserializeOwned>(&self, ciphertext: &str) -> Option<T> {
        let json = self.decrypt(ciphertext)?;
        serde_json::from_slice(&json).ok()
    }
}
