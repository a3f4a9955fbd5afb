//! Counter sealing and opening.
//!
//! A nonce body is the issuance counter sealed under AES-256-GCM. The
//! authentication tag is the load-bearing part: a forged or bit-flipped body
//! fails to open, so redemption never needs a server-side record of every
//! nonce ever issued. Confidentiality of the counter value is incidental.
//!
//! Body layout, before base64url encoding:
//!
//! ```text
//! random nonce tail (8) || ciphertext (8) || GCM tag (16)
//! ```
//!
//! The 12-byte AEAD nonce is a zero 4-byte head plus the random tail; only
//! the tail travels in the body.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, OsRng},
};
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::nonce::error::NonceError;
use crate::nonce::key::SecretKey;

/// Decoded body length in bytes: 8 nonce tail + 8 ciphertext + 16 tag.
const BODY_LEN: usize = 32;

/// Seals counters into opaque nonce bodies and opens them back.
///
/// The AEAD key is the SHA-256 digest of the secret key, so any non-empty
/// secret works regardless of length. Sealing uses a fresh random nonce tail
/// per call; uniqueness of the *token* comes from the counter, not the tail.
///
/// The codec counts how often `open` is invoked. The wrong-instance fast
/// path in redemption must reject before decoding, and that property is only
/// testable if decoder invocations are observable.
pub struct CounterCodec {
    cipher: Aes256Gcm,
    opens: AtomicU64,
}

impl std::fmt::Debug for CounterCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterCodec")
            .field("opens", &self.opens.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl CounterCodec {
    /// Creates a codec keyed by the given secret.
    pub fn new(key: &SecretKey) -> Result<Self, NonceError> {
        let digest = Sha256::digest(key.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(digest.as_slice())
            .map_err(|e| NonceError::CryptoError(format!("failed to create cipher: {e}")))?;
        Ok(Self {
            cipher,
            opens: AtomicU64::new(0),
        })
    }

    /// Seals a counter into a base64url nonce body.
    pub fn seal(&self, counter: u64) -> Result<String, NonceError> {
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes[4..]);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, counter.to_be_bytes().as_slice())
            .map_err(|e| NonceError::CryptoError(format!("sealing failed: {e}")))?;

        let mut body = Vec::with_capacity(BODY_LEN);
        body.extend_from_slice(&nonce_bytes[4..]);
        body.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&body))
    }

    /// Opens a nonce body back into its counter.
    ///
    /// Wrong length, invalid base64, and tag mismatch all collapse into
    /// `NonceError::MalformedNonce`; callers learn nothing about which check
    /// failed.
    pub fn open(&self, body: &str) -> Result<u64, NonceError> {
        self.opens.fetch_add(1, Ordering::Relaxed);

        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| NonceError::MalformedNonce)?;
        if decoded.len() != BODY_LEN {
            return Err(NonceError::MalformedNonce);
        }

        let (tail, ciphertext) = decoded.split_at(8);
        let mut nonce_bytes = [0u8; 12];
        nonce_bytes[4..].copy_from_slice(tail);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| NonceError::MalformedNonce)?;
        let bytes: [u8; 8] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| NonceError::MalformedNonce)?;

        Ok(u64::from_be_bytes(bytes))
    }

    /// Number of times `open` has been invoked on this codec.
    pub fn open_count(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }
}
