/// Configuration for the nonce window.
///
/// # Environment Variables
///
/// The defaults can be overridden via environment variables:
/// - `REPLAY_NONCE_WINDOW_SIZE`: maximum window size `W` (default: 65536)
/// - `REPLAY_NONCE_RANDOMIZE_SEED`: whether the counter starts from a random
///   seed instead of zero (default: true)
///
/// # Example
///
/// ```rust
/// use replay_nonce::NonceConfig;
///
/// // Use default configuration
/// let config = NonceConfig::default();
///
/// // Create custom configuration
/// let config = NonceConfig {
///     window_size: 4096,
///     randomize_seed: false,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct NonceConfig {
    /// Maximum number of outstanding, unredeemed nonces tracked at once.
    ///
    /// Issuing past this count slides the window floor forward and silently
    /// expires the oldest outstanding nonces. Sized to comfortably exceed
    /// expected nonce lifetime times expected issuance rate.
    pub window_size: u64,
    /// Seed the counter randomly at startup instead of starting from zero.
    ///
    /// Counter state is never persisted; a restart invalidates everything
    /// outstanding either way. A random seed keeps a restarted process's
    /// counter space from overlapping its predecessor's.
    pub randomize_seed: bool,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            window_size: std::env::var("REPLAY_NONCE_WINDOW_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(65536),
            randomize_seed: std::env::var("REPLAY_NONCE_RANDOMIZE_SEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
        }
    }
}

impl NonceConfig {
    /// Validates the configuration and returns any warnings.
    ///
    /// A zero window size is a hard error at build time, not a warning; this
    /// method covers the merely questionable settings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.window_size < 1024 {
            warnings.push(
                "Small window size (< 1024) will expire outstanding nonces quickly under load"
                    .to_string(),
            );
        }
        if self.window_size > 1 << 24 {
            warnings.push(
                "Very large window size (> 16M) makes the cross-off set memory-heavy".to_string(),
            );
        }
        if !self.randomize_seed {
            warnings.push(
                "Seed randomization disabled; counters restart from zero after a crash"
                    .to_string(),
            );
        }

        warnings
    }

    /// Returns a summary of the current configuration.
    pub fn summary(&self) -> String {
        format!(
            "NonceConfig {{ Window: {}, Randomized seed: {} }}",
            self.window_size, self.randomize_seed,
        )
    }
}
