//! Environment configuration
//!
//! | Variable              | Meaning                              | Default                  |
//! |-----------------------|--------------------------------------|--------------------------|
//! | `ZRPC_BIND`           | ZeroMQ endpoint to bind              | `tcp://127.0.0.1:10000`  |
//! | `ZRPC_BATCH_MODE`     | `sequential` or `parallel`           | `sequential`             |
//! | `ZRPC_MAX_BATCH_SIZE` | largest accepted batch               | unlimited                |
//! | `ZRPC_OBSERVABILITY`  | `1`/`true` enables OTLP export       | off                      |
//!
//! Values that are set but cannot be parsed are reported as
//! `Error::Config` rather than silently replaced by defaults.

use crate::batch::BatchMode;
use zrpc_core::{Error, Result};

pub const DEFAULT_BIND: &str = "tcp://127.0.0.1:10000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub batch_mode: BatchMode,
    pub max_batch_size: Option<usize>,
    pub observability: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            batch_mode: BatchMode::default(),
            max_batch_size: None,
            observability: false,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind) = lookup("ZRPC_BIND") {
            if bind.trim().is_empty() {
                return Err(Error::Config("ZRPC_BIND must not be empty".to_string()));
            }
            config.bind = bind.trim().to_string();
        }

        if let Some(mode) = lookup("ZRPC_BATCH_MODE") {
            config.batch_mode = mode.parse()?;
        }

        if let Some(size) = lookup("ZRPC_MAX_BATCH_SIZE") {
            let size: usize = size.trim().parse().map_err(|e| {
                Error::Config(format!("ZRPC_MAX_BATCH_SIZE '{}': {}", size, e))
            })?;
            if size == 0 {
                return Err(Error::Config(
                    "ZRPC_MAX_BATCH_SIZE must be at least 1".to_string(),
                ));
            }
            config.max_batch_size = Some(size);
        }

        if let Some(flag) = lookup("ZRPC_OBSERVABILITY") {
            config.observability = parse_flag("ZRPC_OBSERVABILITY", &flag)?;
        }

        Ok(config)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(format!(
            "{} '{}' is not a boolean",
            name, other
        ))),
    }
}
