// Core engine components
mod authority;
mod authority_builder;
mod codec;
mod config;
mod error;
mod key;
mod prefix;
mod window;

// Observability and service surface
pub mod metrics;
pub mod service;

// Core exports
pub use authority::NonceAuthority;
pub use authority_builder::NonceAuthorityBuilder;
pub use config::NonceConfig;
pub use error::NonceError;
pub use key::SecretKey;
pub use prefix::{PREFIX_LEN, derive_prefix};
pub use window::{RedeemOutcome, ReplayWindow};

// Service surface exports
pub use metrics::{
    InMemoryMetricsCollector, MetricEvent, MetricsCollector, NoOpMetricsCollector, NonceMetrics,
    RejectionMetrics,
};
pub use service::{NonceMessage, NonceRpc, NonceService, ValidMessage};
