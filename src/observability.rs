//! # Observability
//!
//! Structured logging setup. `RUST_LOG` wins over the configured level so
//! operators can raise verbosity per module without touching config.

use tracing_subscriber::EnvFilter;

use crate::config::ControllerConfig;

/// Initialize the global tracing subscriber.
pub fn init(config: &ControllerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log_format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}
