//! Tracing subscriber setup and runtime log-level control.

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::config::{LogFormat, ServerConfig};
use crate::types::{LogLevel, McpError, McpResult};

/// Changes the process-wide log filter in response to `logging/setLevel`.
pub trait LogLevelControl: Send + Sync {
    fn set_level(&self, level: LogLevel) -> McpResult<()>;
}

/// Backed by a `tracing_subscriber` reload handle.
pub struct ReloadLogControl {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogLevelControl for ReloadLogControl {
    fn set_level(&self, level: LogLevel) -> McpResult<()> {
        self.handle
            .reload(EnvFilter::new(level.filter_directive()))
            .map_err(|e| McpError::InternalError(format!("Failed to change log level: {e}")))
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays protocol-only.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init(config: &ServerConfig) -> anyhow::Result<Arc<dyn LogLevelControl>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let (filter, handle) = reload::Layer::new(filter);
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
    }

    Ok(Arc::new(ReloadLogControl { handle }))
}
