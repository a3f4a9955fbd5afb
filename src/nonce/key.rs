//! Secret key loading and handling.
//!
//! The secret key is opaque bytes loaded once at startup. It is the input to
//! both prefix derivation and counter sealing, and it must never appear in
//! logs or Debug output.

use std::path::Path;

use base64::Engine;

use crate::nonce::error::NonceError;

/// The process-wide secret key.
///
/// A `SecretKey` is a non-empty opaque byte sequence. It can be constructed
/// from raw bytes, from a hex or base64 string, from an environment variable,
/// or from a key file. An empty key is a configuration error: the service
/// must not start without one.
///
/// The `Debug` implementation shows only the key length, never the material.
///
/// # Example
///
/// ```rust
/// use replay_nonce::SecretKey;
///
/// # fn example() -> Result<(), replay_nonce::NonceError> {
/// let key = SecretKey::from_encoded(
///     "6d79207265706c61792d6e6f6e6365206b6579206d6174657269616c21212121",
/// )?;
/// assert_eq!(key.as_bytes().len(), 32);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl SecretKey {
    /// Creates a secret key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `NonceError::ConfigurationError` if `bytes` is empty.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NonceError> {
        if bytes.is_empty() {
            return Err(NonceError::ConfigurationError(
                "secret key must not be empty".to_string(),
            ));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Creates a secret key from a hex or base64 encoded string.
    ///
    /// The string is trimmed, then tried as hex and as standard base64 in
    /// that order. A string that decodes under neither encoding is rejected
    /// rather than used verbatim, so a typo in a key file cannot silently
    /// become a different key.
    pub fn from_encoded(encoded: &str) -> Result<Self, NonceError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(NonceError::ConfigurationError(
                "secret key must not be empty".to_string(),
            ));
        }

        if let Ok(bytes) = hex::decode(encoded) {
            return Self::from_bytes(&bytes);
        }
        if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(encoded) {
            return Self::from_bytes(&bytes);
        }

        Err(NonceError::ConfigurationError(
            "secret key is neither valid hex nor valid base64".to_string(),
        ))
    }

    /// Loads a secret key from an environment variable.
    ///
    /// The variable's value goes through the same hex-or-base64 parsing as
    /// [`SecretKey::from_encoded`].
    pub fn from_env(var: &str) -> Result<Self, NonceError> {
        let value = std::env::var(var).map_err(|e| {
            NonceError::ConfigurationError(format!(
                "failed to read secret key from environment variable {var}: {e}"
            ))
        })?;
        Self::from_encoded(&value)
    }

    /// Loads a secret key from a file.
    ///
    /// The file contents go through the same hex-or-base64 parsing as
    /// [`SecretKey::from_encoded`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NonceError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            NonceError::ConfigurationError(format!(
                "failed to read secret key from file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_encoded(&contents)
    }

    /// The raw key material.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
