//! # Recalculation Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     AKSI_RECALC_DEBOUNCE_MS=300                                        │
//! │     AKSI_RECALC_COMPUTE_TIMEOUT_MS=2000   (0 disables the timeout)     │
//! │     AKSI_RECALC_CHANNEL_CAPACITY=64                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/aksi-pricing/recalc.toml (Linux)                         │
//! │     ~/Library/Application Support/com.aksi.pricing/recalc.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no debounce, no timeout, capacity 64                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # recalc.toml
//! [scheduler]
//! debounce_ms = 0
//! compute_timeout_ms = 2000
//! channel_capacity = 64
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RecalcError, RecalcResult};

/// Upper bound for the debounce quiet period.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Environment variable names.
pub const ENV_DEBOUNCE_MS: &str = "AKSI_RECALC_DEBOUNCE_MS";
pub const ENV_COMPUTE_TIMEOUT_MS: &str = "AKSI_RECALC_COMPUTE_TIMEOUT_MS";
pub const ENV_CHANNEL_CAPACITY: &str = "AKSI_RECALC_CHANNEL_CAPACITY";

// =============================================================================
// Scheduler Settings
// =============================================================================

/// Timing and buffering settings of the recalculation scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Quiet period after the last edit before an idle scheduler starts
    /// computing. 0 disables debouncing.
    #[serde(default)]
    pub debounce_ms: u64,

    /// Upper bound on a single computation. Expiry is published as
    /// `ComputeError::Timeout`. Absent means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_timeout_ms: Option<u64>,

    /// Capacity of the command channel and of the publication broadcast.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        SchedulerSettings {
            debounce_ms: 0,
            compute_timeout_ms: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete recalculation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalcConfig {
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

impl RecalcConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (recalc.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> RecalcResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading recalculation config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load recalculation config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> RecalcResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| RecalcError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RecalcError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| RecalcError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Recalculation config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> RecalcResult<()> {
        if self.scheduler.channel_capacity == 0 {
            return Err(RecalcError::InvalidConfig(
                "channel_capacity must be greater than 0".into(),
            ));
        }

        if self.scheduler.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(RecalcError::InvalidConfig(format!(
                "debounce_ms must not exceed {}, got: {}",
                MAX_DEBOUNCE_MS, self.scheduler.debounce_ms
            )));
        }

        if self.scheduler.compute_timeout_ms == Some(0) {
            return Err(RecalcError::InvalidConfig(
                "compute_timeout_ms must be greater than 0 (omit it to disable)".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DEBOUNCE_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => {
                    debug!(debounce_ms = ms, "Overriding debounce from environment");
                    self.scheduler.debounce_ms = ms;
                }
                Err(_) => warn!(value = %raw, "Invalid {} in environment", ENV_DEBOUNCE_MS),
            }
        }

        if let Some(raw) = lookup(ENV_COMPUTE_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(0) => self.scheduler.compute_timeout_ms = None,
                Ok(ms) => {
                    debug!(compute_timeout_ms = ms, "Overriding compute timeout from environment");
                    self.scheduler.compute_timeout_ms = Some(ms);
                }
                Err(_) => warn!(value = %raw, "Invalid {} in environment", ENV_COMPUTE_TIMEOUT_MS),
            }
        }

        if let Some(raw) = lookup(ENV_CHANNEL_CAPACITY) {
            match raw.trim().parse::<usize>() {
                Ok(capacity) => self.scheduler.channel_capacity = capacity,
                Err(_) => warn!(value = %raw, "Invalid {} in environment", ENV_CHANNEL_CAPACITY),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "aksi", "pricing")
            .map(|dirs| dirs.config_dir().join("recalc.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Debounce quiet period, `None` when disabled.
    pub fn debounce(&self) -> Option<Duration> {
        match self.scheduler.debounce_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn compute_timeout(&self) -> Option<Duration> {
        self.scheduler.compute_timeout_ms.map(Duration::from_millis)
    }

    pub fn channel_capacity(&self) -> usize {
        self.scheduler.channel_capacity
    }

    /// Builder-style debounce setter.
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.scheduler.debounce_ms = ms;
        self
    }

    /// Builder-style compute timeout setter.
    pub fn with_compute_timeout_ms(mut self, ms: u64) -> Self {
        self.scheduler.compute_timeout_ms = Some(ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RecalcConfig::default();
        assert_eq!(config.debounce(), None);
        assert_eq!(config.compute_timeout(), None);
        assert_eq!(config.channel_capacity(), 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = RecalcConfig::default();

        config.scheduler.channel_capacity = 0;
        assert!(config.validate().is_err());

        config.scheduler.channel_capacity = 8;
        config.scheduler.compute_timeout_ms = Some(0);
        assert!(config.validate().is_err());

        config.scheduler.compute_timeout_ms = Some(1500);
        config.scheduler.debounce_ms = MAX_DEBOUNCE_MS + 1;
        assert!(config.validate().is_err());

        config.scheduler.debounce_ms = 500;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parsing() {
        let config: RecalcConfig = toml::from_str(
            r#"
            [scheduler]
            debounce_ms = 500
            compute_timeout_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.debounce(), Some(Duration::from_millis(500)));
        assert_eq!(config.compute_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(config.channel_capacity(), 64);

        let empty: RecalcConfig = toml::from_str("").unwrap();
        assert_eq!(empty, RecalcConfig::default());
    }

    #[test]
    fn test_toml_serialization() {
        let config = RecalcConfig::default().with_debounce_ms(250);
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("debounce_ms = 250"));

        let parsed: RecalcConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DEBOUNCE_MS, "300"),
            (ENV_COMPUTE_TIMEOUT_MS, "1200"),
            (ENV_CHANNEL_CAPACITY, "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = RecalcConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.scheduler.debounce_ms, 300);
        assert_eq!(config.scheduler.compute_timeout_ms, Some(1200));
        assert_eq!(config.scheduler.channel_capacity, 64);
    }

    #[test]
    fn test_zero_timeout_override_disables_timeout() {
        let mut config = RecalcConfig::default().with_compute_timeout_ms(500);
        config.apply_overrides(|key| (key == ENV_COMPUTE_TIMEOUT_MS).then(|| "0".to_string()));
        assert_eq!(config.compute_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("aksi-recalc-config-{}", std::process::id()));
        let path = dir.join("recalc.toml");

        let saved = RecalcConfig::default()
            .with_debounce_ms(120)
            .with_compute_timeout_ms(900);
        assert_eq!(saved.save(Some(path.clone())).unwrap(), path);

        let loaded = RecalcConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.scheduler.channel_capacity, 64);

        std::fs::remove_dir_all(dir).ok();
    }
}
