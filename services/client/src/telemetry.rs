//! services/client/src/telemetry.rs
//!
//! Tracing subscriber setup, shared by the demo binary and any embedding
//! process.

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber: an env-filter seeded from the
/// configured level plus the standard fmt layer.
pub fn init(log_level: Level) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
