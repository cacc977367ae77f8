//! Configuration loading and resolution.
//!
//! Every setting resolves as: explicit value (CLI flag) > environment variable > default.

use std::time::Duration;

use crate::types::{Implementation, SERVER_NAME, SERVER_VERSION};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
const DEFAULT_KEEPALIVE_SECS: u64 = 30;
const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;
const DEFAULT_REAPER_INTERVAL_SECS: u64 = 60;

/// Log line format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "plain" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Fully resolved server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub server_name: String,
    pub server_version: String,
    pub token: Option<String>,
    pub keepalive: Duration,
    pub session_idle_timeout: Duration,
    pub reaper_interval: Duration,
    /// Capability names a client must declare in `initialize`.
    pub required_client_capabilities: Vec<String>,
    /// Tools that consult the auth hook before running.
    pub privileged_tools: Vec<String>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            server_name: SERVER_NAME.to_string(),
            server_version: SERVER_VERSION.to_string(),
            token: None,
            keepalive: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            reaper_interval: Duration::from_secs(DEFAULT_REAPER_INTERVAL_SECS),
            required_client_capabilities: Vec::new(),
            privileged_tools: Vec::new(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with whatever the environment sets.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: get("MCP_HOST").unwrap_or(defaults.host),
            port: parse_or(get("MCP_PORT"), "MCP_PORT", defaults.port),
            server_name: get("MCP_SERVER_NAME").unwrap_or(defaults.server_name),
            server_version: get("MCP_SERVER_VERSION").unwrap_or(defaults.server_version),
            token: get("MCP_TOKEN"),
            keepalive: secs_or(get("MCP_KEEPALIVE_SECS"), "MCP_KEEPALIVE_SECS", defaults.keepalive),
            session_idle_timeout: secs_or(
                get("MCP_SESSION_IDLE_SECS"),
                "MCP_SESSION_IDLE_SECS",
                defaults.session_idle_timeout,
            ),
            reaper_interval: secs_or(
                get("MCP_REAPER_INTERVAL_SECS"),
                "MCP_REAPER_INTERVAL_SECS",
                defaults.reaper_interval,
            ),
            required_client_capabilities: get("MCP_REQUIRED_CLIENT_CAPABILITIES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            privileged_tools: get("MCP_PRIVILEGED_TOOLS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            log_level: get("LOG_LEVEL")
                .map(|v| v.to_ascii_lowercase())
                .unwrap_or(defaults.log_level),
            log_format: get("LOG_FORMAT")
                .and_then(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
        }
    }

    pub fn server_info(&self) -> Implementation {
        Implementation {
            name: self.server_name.clone(),
            version: self.server_version.clone(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply an explicit `host:port` listen address.
    pub fn with_addr(mut self, addr: &str) -> Self {
        if let Some((host, port)) = addr.rsplit_once(':') {
            if let Ok(port) = port.parse() {
                self.host = host.to_string();
                self.port = port;
                return self;
            }
        }
        tracing::warn!("Ignoring malformed listen address: {addr}");
        self
    }
}

/// Resolve the bearer token: explicit flag > `MCP_TOKEN`.
pub fn resolve_token(explicit: Option<&str>) -> Option<String> {
    if let Some(token) = explicit {
        return Some(token.to_string());
    }
    std::env::var("MCP_TOKEN").ok().filter(|t| !t.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {key}={raw}, using default");
            default
        }),
        None => default,
    }
}

fn secs_or(value: Option<String>, key: &str, default: Duration) -> Duration {
    Duration::from_secs(parse_or(value, key, default.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.port, 8000);
        assert_eq!(config.keepalive, Duration::from_secs(30));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(3600));
        assert_eq!(config.server_name, "scratchpad-mcp");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("MCP_PORT", "9100"),
            ("MCP_KEEPALIVE_SECS", "5"),
            ("MCP_PRIVILEGED_TOOLS", "add_note, increment_counter"),
            ("LOG_FORMAT", "json"),
        ]));
        assert_eq!(config.port, 9100);
        assert_eq!(config.keepalive, Duration::from_secs(5));
        assert_eq!(config.privileged_tools, vec!["add_note", "increment_counter"]);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[("MCP_PORT", "eighty")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_with_addr() {
        let config = ServerConfig::default().with_addr("0.0.0.0:3100");
        assert_eq!(config.bind_addr(), "0.0.0.0:3100");
    }
}
