//! # Controller Settings
//!
//! Process-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_CONFIG_MAP_NAME, DEFAULT_LOG_FORMAT, DEFAULT_METRICS_PORT, DEFAULT_NAMESPACE,
};

/// Process-level settings
///
/// All settings have sensible defaults and can be overridden via environment
/// variables, and then again via command-line flags (see `main.rs`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Namespace in which workflows, pods, the ConfigMap and secrets live
    pub namespace: String,
    /// Name of the ConfigMap holding the workflow controller configuration
    pub config_map_name: String,
    /// Port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// Log format (json, text)
    pub log_format: String,
    /// Reload the configuration whenever the ConfigMap changes
    pub config_watch_enabled: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            config_map_name: DEFAULT_CONFIG_MAP_NAME.to_string(),
            metrics_port: DEFAULT_METRICS_PORT,
            log_format: DEFAULT_LOG_FORMAT.to_string(),
            config_watch_enabled: true,
        }
    }
}

impl ControllerSettings {
    /// Load settings from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            namespace: env_var_or_default_str("POD_NAMESPACE", DEFAULT_NAMESPACE),
            config_map_name: env_var_or_default_str("CONFIG_MAP_NAME", DEFAULT_CONFIG_MAP_NAME),
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            log_format: env_var_or_default_str("LOG_FORMAT", DEFAULT_LOG_FORMAT),
            config_watch_enabled: env_var_or_default_bool("CONFIG_WATCH_ENABLED", true),
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |v| parse_bool(&v))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
