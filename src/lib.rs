//! # Replay Nonce
//!
//! A single-use nonce service for ACME-style front ends: clients obtain a
//! nonce, embed it in a signed request, and the server accepts it exactly
//! once. Anything replayed, forged, expired, or issued by another instance
//! is rejected.
//!
//! ## How it works
//!
//! - **Counter, not storage**: every nonce is a monotonically increasing
//!   counter sealed under AES-256-GCM, so validity is a decrypt-and-check
//!   rather than a lookup in a table of every nonce ever issued.
//! - **Instance prefix**: each nonce starts with a short prefix derived by
//!   HMAC-SHA256 from the secret key and the instance's listen address.
//!   Nonces from other instances are rejected by string comparison alone,
//!   which is what lets instances scale out without coordinating counters.
//! - **Sliding window**: only the most recent `W` counters stay eligible;
//!   redeemed ones are crossed off until the window slides past them, so
//!   memory stays bounded no matter the issuance volume.
//! - **In-memory by design**: a restart invalidates everything outstanding.
//!   Clients of ACME-style APIs already re-fetch a nonce on rejection.
//!
//! ## Quick Start
//!
//! ```rust
//! use replay_nonce::{NonceAuthority, SecretKey};
//!
//! # fn example() -> Result<(), replay_nonce::NonceError> {
//! let authority = NonceAuthority::builder(
//!     SecretKey::from_bytes(b"high-entropy-secret-key-material")?,
//!     "10.0.0.7:9101",
//! )
//! .build()?;
//!
//! let nonce = authority.generate()?;
//! assert!(authority.redeem(&nonce).is_ok());  // first use accepted
//! assert!(authority.redeem(&nonce).is_err()); // replay rejected
//! # Ok(())
//! # }
//! ```
//!
//! ## Serving it
//!
//! The remote contract is two operations, [`NonceRpc::nonce`] and
//! [`NonceRpc::redeem`], implemented by [`NonceService`]. Mount it behind
//! whatever transport the deployment uses; callers see only
//! `valid: true/false`, while per-reason rejection counts surface through
//! the [`metrics`](crate::nonce::metrics) module and the debug log.
//!
//! ## Architecture
//!
//! - [`NonceAuthority`]: the engine — prefix, codec, and window under one lock
//! - [`NonceService`]: async facade exposing the two remote operations
//! - [`SecretKey`]: opaque key material, loadable from bytes/hex/base64/env/file
//! - [`NonceConfig`]: window size and counter-seed knobs
//! - [`NonceError`]: every failure mode, with stable reason labels

pub mod nonce;

// Re-export commonly used types
pub use nonce::{
    NonceAuthority, NonceAuthorityBuilder, NonceConfig, NonceError, NonceMessage, NonceRpc,
    NonceService, SecretKey, ValidMessage,
};

#[cfg(test)]
mod tests {
    use crate::nonce::{InMemoryMetricsCollector, NonceAuthority, NonceError, SecretKey};
    use std::sync::Arc;

    const TEST_KEY: &[u8] = b"integration test key material 01";

    fn authority_on(identity: &str) -> NonceAuthority {
        NonceAuthority::builder(SecretKey::from_bytes(TEST_KEY).unwrap(), identity)
            .with_metrics_collector(Arc::new(InMemoryMetricsCollector::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_full_lifecycle() {
        let authority = authority_on("127.0.0.1:9101");

        let nonce = authority.generate().unwrap();
        assert!(nonce.starts_with(authority.prefix()));

        assert!(authority.redeem(&nonce).is_ok());
        assert!(matches!(
            authority.redeem(&nonce),
            Err(NonceError::DuplicateNonce)
        ));

        let metrics = authority.metrics();
        assert_eq!(metrics.generated, 1);
        assert_eq!(metrics.redeemed_valid, 1);
        assert_eq!(metrics.rejections.already_used, 1);
    }

    #[test]
    fn test_cross_instance_rejection() {
        let a = authority_on("10.0.0.1:9101");
        let b = authority_on("10.0.0.2:9101");

        let nonce = a.generate().unwrap();
        assert!(matches!(b.redeem(&nonce), Err(NonceError::WrongInstance)));

        // The issuing instance still honours it.
        assert!(a.redeem(&nonce).is_ok());
    }

    #[test]
    fn test_different_keys_same_identity() {
        let a = authority_on("10.0.0.1:9101");
        let b = NonceAuthority::builder(
            SecretKey::from_bytes(b"a completely different key here!").unwrap(),
            "10.0.0.1:9101",
        )
        .build()
        .unwrap();

        // Same address, different key: prefixes diverge, so the nonce is
        // rejected before decoding.
        let nonce = a.generate().unwrap();
        assert!(matches!(b.redeem(&nonce), Err(NonceError::WrongInstance)));
        assert_eq!(b.decode_attempts(), 0);
    }
}
