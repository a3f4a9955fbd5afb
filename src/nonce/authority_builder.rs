use std::sync::Arc;

use rand::Rng;

use crate::nonce::authority::NonceAuthority;
use crate::nonce::codec::CounterCodec;
use crate::nonce::config::NonceConfig;
use crate::nonce::error::NonceError;
use crate::nonce::key::SecretKey;
use crate::nonce::metrics::{MetricsCollector, NoOpMetricsCollector};
use crate::nonce::prefix::derive_prefix;
use crate::nonce::window::ReplayWindow;

/// A builder for creating a [`NonceAuthority`] instance.
///
/// The secret key and instance identity are required up front; everything
/// else defaults from [`NonceConfig`] and can be overridden with the
/// chainable `with_*` methods.
#[must_use = "The builder does nothing unless `.build()` is called."]
pub struct NonceAuthorityBuilder {
    key: SecretKey,
    identity: String,
    config: Option<NonceConfig>,
    seed: Option<u64>,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

impl NonceAuthorityBuilder {
    pub(crate) fn new(key: SecretKey, identity: &str) -> Self {
        Self {
            key,
            identity: identity.to_string(),
            config: None,
            seed: None,
            metrics: None,
        }
    }

    /// Uses the given configuration instead of [`NonceConfig::default`].
    pub fn with_config(mut self, config: NonceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the maximum window size.
    ///
    /// Convenience for tests and callers that only care about this knob.
    pub fn with_window_size(mut self, window_size: u64) -> Self {
        let mut config = self.config.take().unwrap_or_default();
        config.window_size = window_size;
        self.config = Some(config);
        self
    }

    /// Pins the counter seed to a fixed value.
    ///
    /// Overrides the `randomize_seed` configuration. Intended for tests that
    /// need a reproducible counter sequence.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the metrics collector.
    ///
    /// Defaults to [`NoOpMetricsCollector`].
    pub fn with_metrics_collector(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the [`NonceAuthority`].
    ///
    /// Derives and caches the instance prefix, keys the codec, and seeds the
    /// window. Configuration warnings are logged; a zero window size is
    /// rejected outright.
    ///
    /// # Errors
    ///
    /// `NonceError::ConfigurationError` for a zero window size, or
    /// `NonceError::CryptoError` if the cipher cannot be constructed.
    pub fn build(self) -> Result<NonceAuthority, NonceError> {
        let config = self.config.unwrap_or_default();
        if config.window_size == 0 {
            return Err(NonceError::ConfigurationError(
                "window size must be positive".to_string(),
            ));
        }
        for warning in config.validate() {
            tracing::warn!("{warning}");
        }

        let prefix = derive_prefix(&self.key, &self.identity);
        let codec = CounterCodec::new(&self.key)?;

        let seed = self.seed.unwrap_or_else(|| {
            if config.randomize_seed {
                // Bounded away from the top so exhaustion stays unreachable.
                rand::thread_rng().gen_range(0..u64::MAX / 2)
            } else {
                0
            }
        });
        let window = ReplayWindow::new(seed, config.window_size);

        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(NoOpMetricsCollector::new()));

        tracing::info!(
            prefix = %prefix,
            window_size = config.window_size,
            "nonce authority initialized"
        );
        Ok(NonceAuthority::new(prefix, codec, window, metrics))
    }
}
