//! CLI configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tvctl_core::RemoteConfig;

/// Top-level configuration for the command-line remote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Connection parameters, including the token from the last pairing.
    pub remote: RemoteConfig,
    /// Session pacing.
    pub session: SessionConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Session pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long to wait for the TV to allow the client, in milliseconds.
    /// Covers the time spent on the TV's pairing prompt.
    pub auth_timeout_ms: u64,
    /// Pause between consecutive key presses, in milliseconds.
    pub key_delay_ms: u64,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG`.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_timeout_ms: 30_000,
            key_delay_ms: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl CliConfig {
    /// Load from a TOML file, falling back to defaults.
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

    /// Write this config to a file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        Self::default().save(path)
    }
}

// ── Tests ────────────────────────────────────────────────────────
