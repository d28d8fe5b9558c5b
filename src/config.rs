use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::error::SwipeError;
use crate::swipe::SwipeSettings;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Config {
    pub version: u32,
    /// Client list file; the built-in sample clients are used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    #[serde(default)]
    pub swipe: SwipeSettings,
    #[serde(default)]
    pub ui: UiConfig,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct UiConfig {
    /// Upper bound on how long the event loop waits for input
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "tick_rate_ms")]
    pub tick_rate: Duration,
    /// Length of the open/close settle animation
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "animation_ms")]
    pub animation: Duration,
    /// Ask before deleting a client
    pub confirm_delete: bool,
    /// Swipe distance covered by one terminal column
    pub column_width: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data_file: None,
            swipe: SwipeSettings::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(50),
            animation: Duration::from_millis(180),
            confirm_delete: true,
            column_width: 8.0,
        }
    }
}

pub fn get_default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "swipedeck")
        .context("Failed to determine project directories")?;

    let config_dir = proj_dirs.config_dir();
    Ok(config_dir.join("swipedeck.toml"))
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p,
            None => get_default_config_path()?,
        };

        if !path.exists() {
            let default_config = Config::default();
            // Create directory if it doesn't exist
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .context("Failed to create config directory")?;
            }
            default_config.save(&path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config to TOML")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), SwipeError> {
        if self.version != CONFIG_VERSION {
            return Err(SwipeError::UnsupportedVersion {
                version: self.version,
            });
        }
        self.swipe.validate()?;
        if self.ui.tick_rate.is_zero() {
            return Err(SwipeError::ZeroDuration { name: "tick rate" });
        }
        if !self.ui.column_width.is_finite() || self.ui.column_width <= 0.0 {
            return Err(SwipeError::InvalidColumnWidth {
                width: self.ui.column_width,
            });
        }
        Ok(())
    }

    pub fn from_cli_and_file(cli_args: CliArgs, config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load(config_path)?;

        // CLI args override config file
        if let Some(data) = cli_args.data {
            config.data_file = Some(data);
        }
        if let Some(width) = cli_args.action_width {
            config.swipe.action_width = width;
        }
        if let Some(ms) = cli_args.auto_close_ms {
            config.swipe.auto_close = Duration::from_millis(ms);
        }
        config.data_file = config.data_file.as_deref().map(expand_home);

        config.validate().context("Invalid command line override")?;
        Ok(config)
    }
}
