//! The two-operation service surface.
//!
//! Calling services consume the core through exactly two logical remote
//! operations: fetch a fresh nonce, and redeem one. The transport itself is
//! out of scope; [`NonceRpc`] is the seam a gRPC or HTTP layer mounts, and
//! [`NonceService`] is its in-process implementation.
//!
//! Redemption failures reach callers as a bare `valid = false`. The internal
//! reason is recorded in metrics and the debug log only; callers must treat
//! any invalid nonce as "reject the enclosing signed request".

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::nonce::authority::NonceAuthority;
use crate::nonce::error::NonceError;

/// A nonce travelling in either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceMessage {
    /// The opaque nonce string
    pub nonce: String,
}

/// Result of a redemption attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidMessage {
    /// Whether the nonce was accepted
    pub valid: bool,
}

/// The service's remote contract.
///
/// Implemented by [`NonceService`]; also the trait to mock when testing
/// callers of this service.
#[async_trait]
pub trait NonceRpc: Send + Sync {
    /// Returns a freshly generated nonce.
    async fn nonce(&self) -> Result<NonceMessage, NonceError>;

    /// Redeems a nonce, reporting only whether it was accepted.
    async fn redeem(&self, msg: NonceMessage) -> Result<ValidMessage, NonceError>;
}

/// In-process implementation of [`NonceRpc`] over a [`NonceAuthority`].
///
/// Cheap to clone; clones share the underlying authority.
#[derive(Debug, Clone)]
pub struct NonceService {
    authority: Arc<NonceAuthority>,
}

impl NonceService {
    /// Wraps an authority in the service facade.
    pub fn new(authority: Arc<NonceAuthority>) -> Self {
        Self { authority }
    }

    /// The wrapped authority.
    pub fn authority(&self) -> &NonceAuthority {
        &self.authority
    }
}

#[async_trait]
impl NonceRpc for NonceService {
    async fn nonce(&self) -> Result<NonceMessage, NonceError> {
        let nonce = self.authority.generate()?;
        Ok(NonceMessage { nonce })
    }

    async fn redeem(&self, msg: NonceMessage) -> Result<ValidMessage, NonceError> {
        // Every rejection reason collapses to valid=false at this boundary;
        // the authority has already logged and counted the specifics.
        let valid = self.authority.redeem(&msg.nonce).is_ok();
        Ok(ValidMessage { valid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonce::key::SecretKey;

    fn service() -> NonceService {
        let authority = NonceAuthority::builder(
            SecretKey::from_bytes(b"service test key").unwrap(),
            "127.0.0.1:9101",
        )
        .build()
        .unwrap();
        NonceService::new(Arc::new(authority))
    }

    #[tokio::test]
    async fn test_nonce_then_redeem() {
        let service = service();

        let msg = service.nonce().await.unwrap();
        let first = service.redeem(msg.clone()).await.unwrap();
        assert!(first.valid);

        let second = service.redeem(msg).await.unwrap();
        assert!(!second.valid);
    }

    #[tokio::test]
    async fn test_garbage_input_is_just_invalid() {
        let service = service();
        let result = service
            .redeem(NonceMessage {
                nonce: "definitely not a nonce".to_string(),
            })
            .await
            .unwrap();
        assert!(!result.valid);
    }

    #[tokio::test]
    async fn test_concurrent_requests_through_facade() {
        let service = service();
        let mut handles = vec![];

        for _ in 0..32 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let msg = service.nonce().await.unwrap();
                service.redeem(msg).await.unwrap().valid
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_trait_object_usable() {
        let service: Arc<dyn NonceRpc> = Arc::new(service());
        let msg = service.nonce().await.unwrap();
        assert!(service.redeem(msg).await.unwrap().valid);
    }

    #[test]
    fn test_message_serialization() {
        let msg = NonceMessage {
            nonce: "abcd1234".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: NonceMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nonce, msg.nonce);

        let valid: ValidMessage = serde_json::from_str(r#"{"valid":true}"#).unwrap();
        assert!(valid.valid);
    }
}
