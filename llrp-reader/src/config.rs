//! Configuration for the reader client.

use std::path::Path;
use std::time::Duration;

use llrp_core::ConnectionInfo;
use llrp_core::network::{DEFAULT_HOST, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Reader connection settings.
    pub reader: ReaderSettings,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Tag output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    /// Reader host name or IP address.
    pub host: String,
    /// LLRP port on the reader.
    pub port: u16,
    /// Pause before reconnecting after the session is lost.
    pub reconnect_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Master switch. When off, nothing is logged and protocol traffic
    /// is not traced.
    pub enabled: bool,
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print each tag as a JSON line instead of plain text.
    pub json: bool,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            reconnect_delay_secs: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ReaderConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo::new(self.reader.host.clone(), self.reader.port)
            .with_logging(self.logging.enabled)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reader.reconnect_delay_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────
