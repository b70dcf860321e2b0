// crates/stakewell-host/src/config.rs
//
// Runtime configuration for a Stakewell host.
// Loaded from a TOML file or populated with the deployment defaults.

use serde::{Deserialize, Serialize};
use std::fs;

use stakewell_incentives::IncentivesConfig;
use stakewell_staking::StakingConfig;

/// Top-level host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Log level used when `RUST_LOG` is unset: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Buffer size of the event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    #[serde(default)]
    pub staking: StakingConfig,

    #[serde(default)]
    pub incentives: IncentivesConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_capacity() -> usize {
    1024
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            event_capacity: default_event_capacity(),
            staking: StakingConfig::default(),
            incentives: IncentivesConfig::default(),
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
