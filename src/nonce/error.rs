use thiserror::Error;

/// Error types that can occur while generating or redeeming nonces.
///
/// The redemption variants (`MalformedNonce`, `WrongInstance`,
/// `ExpiredNonce`, `DuplicateNonce`, `NotYetIssued`) are all surfaced to
/// remote callers as a plain `valid = false`; the distinction exists for
/// internal logging and metrics only.
///
/// # Example
///
/// ```rust
/// use replay_nonce::{NonceAuthority, NonceError, SecretKey};
///
/// # fn example() -> Result<(), NonceError> {
/// let authority = NonceAuthority::builder(
///     SecretKey::from_bytes(b"high-entropy-secret-key-material")?,
///     "10.0.0.7:9101",
/// )
/// .build()?;
///
/// let nonce = authority.generate()?;
/// authority.redeem(&nonce)?;
///
/// match authority.redeem(&nonce) {
///     Err(NonceError::DuplicateNonce) => println!("replay caught"),
///     other => panic!("expected DuplicateNonce, got {other:?}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum NonceError {
    /// The service was configured in a way it refuses to start with.
    ///
    /// Raised for an empty or undecodable secret key and for a zero window
    /// size. This is fatal at construction time: there is no degraded mode
    /// in which a nonce service with no key is acceptable.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The nonce body failed decoding or authentication.
    ///
    /// Covers wrong-length bodies, invalid base64, and AEAD tag mismatch
    /// alike. A single merged outcome keeps forged and corrupted values
    /// indistinguishable to the caller.
    #[error("Malformed nonce")]
    MalformedNonce,

    /// The nonce carries a prefix this instance did not derive.
    ///
    /// It was issued by a different instance (or under a different key) and
    /// is rejected before any decoding is attempted.
    #[error("Nonce was issued by a different instance")]
    WrongInstance,

    /// The nonce decoded correctly but its counter has slid out of the
    /// tracking window.
    ///
    /// Once a counter falls below the window floor the service can no longer
    /// vouch for its single-use property, so the nonce is rejected even
    /// though it authenticated.
    #[error("Nonce expired")]
    ExpiredNonce,

    /// The nonce has already been redeemed once.
    ///
    /// This is the core anti-replay outcome: a second redemption of the same
    /// value, whether from a retry or a captured request, always lands here.
    #[error("Nonce already redeemed")]
    DuplicateNonce,

    /// The nonce decoded to a counter above the highest ever issued.
    ///
    /// Cannot happen for a nonce minted by this process's current state;
    /// occurs for values forged under the right key or issued before a
    /// restart reset the in-memory window.
    #[error("Nonce counter was never issued")]
    NotYetIssued,

    /// The issuance counter would wrap.
    ///
    /// With a 64-bit counter this is not reachable in practice, but wrap
    /// would silently break the uniqueness guarantee, so it is a terminal
    /// error rather than a modular increment.
    #[error("Nonce counter space exhausted")]
    Exhausted,

    /// A cryptographic operation failed.
    ///
    /// Cipher construction or sealing failures; not attributable to the
    /// caller's input.
    #[error("Crypto error: {0}")]
    CryptoError(String),
}

impl NonceError {
    /// Short stable label for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            NonceError::ConfigurationError(_) => "configuration",
            NonceError::MalformedNonce => "malformed",
            NonceError::WrongInstance => "wrong_instance",
            NonceError::ExpiredNonce => "expired",
            NonceError::DuplicateNonce => "already_used",
            NonceError::NotYetIssued => "not_yet_issued",
            NonceError::Exhausted => "exhausted",
            NonceError::CryptoError(_) => "crypto",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(NonceError::MalformedNonce.to_string(), "Malformed nonce");
        assert_eq!(NonceError::ExpiredNonce.to_string(), "Nonce expired");
        assert_eq!(
            NonceError::DuplicateNonce.to_string(),
            "Nonce already redeemed"
        );
        assert_eq!(
            NonceError::WrongInstance.to_string(),
            "Nonce was issued by a different instance"
        );

        let config_error = NonceError::ConfigurationError("empty key".to_string());
        assert_eq!(config_error.to_string(), "Configuration error: empty key");
    }

    #[test]
    fn test_error_reason_labels() {
        assert_eq!(NonceError::DuplicateNonce.reason(), "already_used");
        assert_eq!(NonceError::ExpiredNonce.reason(), "expired");
        assert_eq!(NonceError::WrongInstance.reason(), "wrong_instance");
        assert_eq!(NonceError::NotYetIssued.reason(), "not_yet_issued");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NonceError>();
    }

    #[test]
    fn test_error_debug() {
        let error = NonceError::DuplicateNonce;
        assert_eq!(format!("{error:?}"), "DuplicateNonce");
    }
}
