//! # Logging
//!
//! Tracing subscriber setup. `RUST_LOG` selects the filter; the output format
//! is plain text or one JSON object per line.

use crate::config::ControllerSettings;
use crate::constants::DEFAULT_LOG_FILTER;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
pub fn init_tracing(settings: &ControllerSettings) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if settings.json_logs() {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.with_target(true).try_init()
    };

    result.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
