//! Lectern settings
//!
//! One TOML file in the platform config directory with two sections:
//!
//! - `app`: where the catalog lives and how loudly to log
//! - `player`: speed, inter-segment pause and progress refresh defaults
//!
//! ```rust,no_run
//! use lectern_config::ConfigManager;
//!
//! let manager = ConfigManager::new().expect("Failed to locate settings");
//! let config = manager.load_or_default();
//! println!("Pause between segments: {}s", config.player.default_pause_secs);
//! ```

mod app_config;
mod error;
mod manager;
mod persistence;
mod player_config;
mod validation;

pub use app_config::{AppConfig, LogLevel};
pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use player_config::{PlayerConfig, MAX_PAUSE_SECS, SPEED_RANGE};
pub use validation::{ConfigSection, Validator};

use serde::{Deserialize, Serialize};

/// Settings file format written by this release
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub app: AppConfig,
    pub player: PlayerConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates both sections, collecting every error
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [self.app.validate(), self.player.validate()]
            .into_iter()
            .filter_map(Result::err)
            .flatten()
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validation problems joined into one line, `None` when valid
    pub fn problems(&self) -> Option<String> {
        self.validate().err().map(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}
