//! Configuration loading and types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use central_api::requests::InstanceInput;
use central_core::LifecycleConfig;

/// Top-level configuration for the console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Console settings
    #[serde(default)]
    pub console: ConsoleConfig,
    /// Deploy delays
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Instances to create at startup
    #[serde(default)]
    pub instance: Vec<InstanceInput>,
}

/// Console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seed the demo instances when none are configured
    #[serde(default = "default_seed_demo")]
    pub seed_demo: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            seed_demo: default_seed_demo(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_seed_demo() -> bool {
    true
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML or the delays are inconsistent
    pub fn parse(content: &str) -> eyre::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.lifecycle.validate()?;
        Ok(config)
    }

    /// Pick the config file: explicit path, `CENTRAL_CONFIG`, then the first
    /// existing default path
    #[must_use]
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        // Check environment variable
        if let Ok(path) = std::env::var("CENTRAL_CONFIG") {
            return Some(PathBuf::from(path));
        }

        // Try common paths
        let mut paths = vec![PathBuf::from("central.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("central/central.toml"));
        }
        paths.into_iter().find(|path| path.exists())
    }

    /// Load the located file, or defaults when there is none
    ///
    /// Also returns the loaded path, `None` for defaults.
    ///
    /// # Errors
    /// Returns error if a config file exists but cannot be loaded
    pub fn load_default(explicit: Option<&Path>) -> eyre::Result<(Self, Option<PathBuf>)> {
        match Self::locate(explicit) {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Config::default(), None)),
        }
    }

    /// Instances to create at startup
    #[must_use]
    pub fn seed_instances(&self) -> Vec<InstanceInput> {
        if !self.instance.is_empty() || !self.console.seed_demo {
            return self.instance.clone();
        }
        vec![
            InstanceInput::new("Client A", "Running", "10.0.0.10"),
            InstanceInput::new("Client B", "Stopped", "10.0.0.15"),
            InstanceInput::new("Client C", "Deploying", "10.0.0.22"),
        ]
    }
}
