use std::sync::{Arc, Mutex, PoisonError};

use crate::nonce::authority_builder::NonceAuthorityBuilder;
use crate::nonce::codec::CounterCodec;
use crate::nonce::error::NonceError;
use crate::nonce::key::SecretKey;
use crate::nonce::metrics::{MetricEvent, MetricsCollector, NonceMetrics};
use crate::nonce::window::{RedeemOutcome, ReplayWindow};

/// The nonce generation and redemption engine.
///
/// A `NonceAuthority` owns the three leaves of the design: the cached
/// instance prefix, the counter codec, and the replay window behind a mutex.
/// `generate` and `redeem` are the only operations; both are synchronous,
/// non-blocking, and safe to call concurrently from many request handlers.
///
/// To create an instance, use [`NonceAuthority::builder`].
///
/// # Example
///
/// ```rust
/// use replay_nonce::{NonceAuthority, SecretKey};
///
/// # fn example() -> Result<(), replay_nonce::NonceError> {
/// let authority = NonceAuthority::builder(
///     SecretKey::from_bytes(b"high-entropy-secret-key-material")?,
///     "10.0.0.7:9101",
/// )
/// .build()?;
///
/// let nonce = authority.generate()?;
/// assert!(authority.redeem(&nonce).is_ok());
/// assert!(authority.redeem(&nonce).is_err());
/// # Ok(())
/// # }
/// ```
pub struct NonceAuthority {
    prefix: String,
    codec: CounterCodec,
    window: Mutex<ReplayWindow>,
    metrics: Arc<dyn MetricsCollector>,
}

impl std::fmt::Debug for NonceAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceAuthority")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl NonceAuthority {
    /// Creates a new [`NonceAuthorityBuilder`].
    ///
    /// The secret key and the instance identity (conventionally the listen
    /// address) are required; window size, counter seed, and metrics
    /// collector are configurable on the builder.
    pub fn builder(key: SecretKey, identity: &str) -> NonceAuthorityBuilder {
        NonceAuthorityBuilder::new(key, identity)
    }

    /// Internal constructor used by the builder.
    pub(crate) fn new(
        prefix: String,
        codec: CounterCodec,
        window: ReplayWindow,
        metrics: Arc<dyn MetricsCollector>,
    ) -> Self {
        Self {
            prefix,
            codec,
            window: Mutex::new(window),
            metrics,
        }
    }

    /// Generates a fresh single-use nonce.
    ///
    /// Reserves the next counter under the window lock, seals it outside the
    /// lock, and prepends the cached prefix. Does not block on I/O.
    ///
    /// # Errors
    ///
    /// `NonceError::Exhausted` if the counter space wrapped, or
    /// `NonceError::CryptoError` if sealing failed; neither occurs in normal
    /// operation.
    pub fn generate(&self) -> Result<String, NonceError> {
        let counter = self.lock_window().advance()?;
        let body = self.codec.seal(counter)?;

        self.metrics.record_event(MetricEvent::Generated);
        Ok(format!("{}{}", self.prefix, body))
    }

    /// Redeems a nonce, accepting it exactly once.
    ///
    /// The checks run cheapest-first:
    ///
    /// 1. Prefix comparison. A mismatch returns `WrongInstance` without
    ///    touching the decoder, so values issued elsewhere cost no
    ///    cryptographic work.
    /// 2. Decode and authenticate the body; any failure is `MalformedNonce`.
    /// 3. Check the counter against the window and cross it off; `Expired`,
    ///    `DuplicateNonce`, or `NotYetIssued` on rejection.
    ///
    /// Redemption is deliberately not idempotent: the first call for a
    /// generated nonce succeeds and every later call fails.
    pub fn redeem(&self, nonce: &str) -> Result<(), NonceError> {
        let result = self.redeem_inner(nonce);
        match &result {
            Ok(()) => self.metrics.record_event(MetricEvent::RedemptionValid),
            Err(e) => {
                self.metrics.record_event(MetricEvent::RedemptionRejected {
                    reason: e.reason(),
                });
                tracing::debug!(reason = e.reason(), "nonce redemption rejected");
            }
        }
        result
    }

    fn redeem_inner(&self, nonce: &str) -> Result<(), NonceError> {
        let body = nonce
            .strip_prefix(self.prefix.as_str())
            .ok_or(NonceError::WrongInstance)?;

        let counter = self.codec.open(body)?;

        match self.lock_window().check_and_mark(counter) {
            RedeemOutcome::Valid => Ok(()),
            RedeemOutcome::Expired => Err(NonceError::ExpiredNonce),
            RedeemOutcome::AlreadyUsed => Err(NonceError::DuplicateNonce),
            RedeemOutcome::NotYetIssued => Err(NonceError::NotYetIssued),
        }
    }

    /// The instance prefix every nonce from this authority starts with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Snapshot of the metrics collected so far.
    pub fn metrics(&self) -> NonceMetrics {
        self.metrics.snapshot()
    }

    /// Number of times the body decoder has run.
    ///
    /// Lets tests and monitoring confirm that wrong-instance rejections
    /// never reach the decoder.
    pub fn decode_attempts(&self) -> u64 {
        self.codec.open_count()
    }

    fn lock_window(&self) -> std::sync::MutexGuard<'_, ReplayWindow> {
        // The critical sections cannot leave the window half-updated, so a
        // poisoned lock is recoverable.
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonce::metrics::InMemoryMetricsCollector;

    fn authority() -> NonceAuthority {
        NonceAuthority::builder(
            SecretKey::from_bytes(b"authority test key").unwrap(),
            "127.0.0.1:9101",
        )
        .with_metrics_collector(Arc::new(InMemoryMetricsCollector::new()))
        .build()
        .unwrap()
    }

    #[test]
    fn test_generated_nonce_starts_with_prefix() {
        let authority = authority();
        let nonce = authority.generate().unwrap();
        assert!(nonce.starts_with(authority.prefix()));
    }

    #[test]
    fn test_single_redemption() {
        let authority = authority();
        let nonce = authority.generate().unwrap();

        assert!(authority.redeem(&nonce).is_ok());
        assert!(matches!(
            authority.redeem(&nonce),
            Err(NonceError::DuplicateNonce)
        ));
        assert!(matches!(
            authority.redeem(&nonce),
            Err(NonceError::DuplicateNonce)
        ));
    }

    #[test]
    fn test_generated_nonces_are_distinct() {
        let authority = authority();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(authority.generate().unwrap()));
        }
    }

    #[test]
    fn test_wrong_instance_skips_decoder() {
        let issuer = authority();
        let redeemer = NonceAuthority::builder(
            SecretKey::from_bytes(b"authority test key").unwrap(),
            "127.0.0.1:9102",
        )
        .build()
        .unwrap();

        let nonce = issuer.generate().unwrap();
        assert!(matches!(
            redeemer.redeem(&nonce),
            Err(NonceError::WrongInstance)
        ));
        assert_eq!(redeemer.decode_attempts(), 0);
    }

    #[test]
    fn test_malformed_body_rejected() {
        let authority = authority();
        let forged = format!("{}{}", authority.prefix(), "A".repeat(43));
        assert!(matches!(
            authority.redeem(&forged),
            Err(NonceError::MalformedNonce)
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        let authority = authority();
        assert!(matches!(
            authority.redeem(""),
            Err(NonceError::WrongInstance)
        ));
    }

    #[test]
    fn test_metrics_reflect_operations() {
        let authority = authority();
        let nonce = authority.generate().unwrap();
        authority.redeem(&nonce).unwrap();
        let _ = authority.redeem(&nonce);

        let metrics = authority.metrics();
        assert_eq!(metrics.generated, 1);
        assert_eq!(metrics.redeemed_valid, 1);
        assert_eq!(metrics.rejections.already_used, 1);
    }

    #[test]
    fn test_concurrent_generate_and_redeem() {
        let authority = Arc::new(authority());
        let mut handles = vec![];

        for _ in 0..8 {
            let authority = Arc::clone(&authority);
            handles.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    let nonce = authority.generate().unwrap();
                    authority.redeem(&nonce).unwrap();
                    assert!(authority.redeem(&nonce).is_err());
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = authority.metrics();
        assert_eq!(metrics.generated, 1600);
        assert_eq!(metrics.redeemed_valid, 1600);
        assert_eq!(metrics.rejections.already_used, 1600);
    }

    #[test]
    fn test_concurrent_redemption_of_one_nonce_accepts_exactly_once() {
        let authority = Arc::new(authority());
        let nonce = Arc::new(authority.generate().unwrap());

        let mut handles = vec![];
        for _ in 0..16 {
            let authority = Arc::clone(&authority);
            let nonce = Arc::clone(&nonce);
            handles.push(std::thread::spawn(move || {
                authority.redeem(&nonce).is_ok()
            }));
        }

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
    }
}
