//! Configuration file loading
//!
//! Settings resolve in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Levels 1 and 2 are handled by the binaries; this module owns level 3.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-user and system-wide config directory
const CONFIG_DIR_NAME: &str = "fmcast";

/// Name of the TOML file inside the config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Contents of `config.toml`
///
/// Every field is optional. Missing fields fall through to the
/// compiled defaults of the consuming crate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    /// Decoder executable (bare name searched on PATH, or a path)
    pub decoder_path: Option<PathBuf>,

    /// Consumer (transmitter) executable
    pub consumer_path: Option<PathBuf>,

    /// Output sample rate in Hz
    pub sample_rate: Option<u32>,

    /// Output channel count
    pub channels: Option<u16>,

    /// Read size used when draining decoder output
    pub chunk_size: Option<usize>,

    /// Logging section
    pub logging: LoggingConfig,
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset (e.g. "info", "fmcast_tx=debug")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

/// Load configuration
///
/// An explicit path must exist. Without one, the platform locations are
/// searched and a missing file yields defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        debug!(path = %path.display(), "Loading config file");
        return TomlConfig::from_file(path);
    }

    match locate_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "Loading config file");
            TomlConfig::from_file(&path)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Find the first existing config file for the platform
///
/// Linux: `~/.config/fmcast/config.toml`, then `/etc/fmcast/config.toml`.
/// Elsewhere: the platform config directory only.
pub fn locate_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.is_file() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME);
        if system_config.is_file() {
            return Some(system_config);
        }
    }

    None
}
