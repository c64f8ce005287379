//! Plugin configuration
//!
//! The host starts the plugin without any arguments beyond the mode flag,
//! so everything adjustable outside the protocol lives in a TOML file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Append diagnostics here instead of stderr
    pub log_file: Option<PathBuf>,
    /// `tracing` filter directive (error, warn, info, debug, trace)
    pub log_level: String,
    /// Effect played until the host sends an `effect` param
    pub effect: String,
    /// Initial colour for effects using `$color`
    pub color: String,
    /// Effects library replacing the built-in one
    pub effects_file: Option<PathBuf>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_level: "info".to_string(),
            effect: "breathe".to_string(),
            color: "ffffffff".to_string(),
            effects_file: None,
        }
    }
}

impl PluginConfig {
    /// `$XDG_CONFIG_HOME/ckb-anim/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ckb-anim")
            .join("config.toml")
    }

    /// Load config from a file, or return defaults if it does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: PluginConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
