//! Environment-driven configuration

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Single allowed CORS origin; `None` allows any
    pub cors_origin: Option<String>,
}

impl Config {
    /// Load from the environment, falling back to logged defaults
    pub fn load() -> Self {
        Self {
            host: try_load("FORMBUILDER_HOST", "0.0.0.0"),
            port: try_load("FORMBUILDER_PORT", "8080"),
            cors_origin: env::var("FORMBUILDER_CORS_ORIGIN").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            cors_origin: None,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value `{raw}`: {e}, using default: {default}");
        default.parse().ok().expect("default must parse")
    })
}
