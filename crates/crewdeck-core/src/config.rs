use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub notices: NoticeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metrics: MetricsConfig::default(),
            notices: NoticeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// How many calendar months the dashboard trend looks back.
    #[serde(default = "default_trend_months")]
    pub trend_months: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            trend_months: default_trend_months(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeConfig {
    /// Whether successful mutations produce a notice. Failures always do.
    #[serde(default = "default_true")]
    pub on_success: bool,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            on_success: default_true(),
        }
    }
}

/// Load the workspace-level config from `.crewdeck/config.toml` under
/// `root`. A missing file is not an error; defaults apply.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_app_config(root: &Path) -> Result<AppConfig> {
    let path = root.join(".crewdeck/config.toml");
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<AppConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the per-user config from the platform config directory
/// (`crewdeck/config.toml`). Missing directory or file means defaults.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<AppConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(AppConfig::default());
    };

    let path = config_dir.join("crewdeck/config.toml");
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<AppConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Effective config for a workspace: the workspace file when present,
/// otherwise the user file, otherwise defaults.
///
/// # Errors
///
/// Fails when whichever file is consulted cannot be read or parsed.
pub fn resolve_config(root: &Path) -> Result<AppConfig> {
    if root.join(".crewdeck/config.toml").exists() {
        load_app_config(root)
    } else {
        load_user_config()
    }
}

const fn default_true() -> bool {
    true
}

const fn default_trend_months() -> usize {
    6
}
