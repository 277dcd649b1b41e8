//! Tracker configuration loaded from TOML

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use yield_math::MAX_DECIMALS;

use crate::abi::Address;
use crate::assets::{AssetConfig, AAVE_V3_POOL};
use crate::error::{YieldError, YieldResult};

/// Tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rpc: RpcSettings,
    pub pool: PoolConfig,
    pub assets: Vec<AssetConfig>,
    pub yield_policy: YieldPolicy,
    pub monitoring: MonitoringConfig,
    pub settings: SettingsConfig,
}

/// HTTP transport settings for the JSON-RPC client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcSettings {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

/// Lending pool emitting the supply events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub address: Address,
}

/// Which flows count toward the supplied amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldPolicy {
    /// Subtract `Withdraw` events from supply and exposure
    pub include_withdrawals: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub structured_logging: bool,
}

/// Location of the durable settings file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc: RpcSettings::default(),
            pool: PoolConfig::default(),
            assets: AssetConfig::defaults(),
            yield_policy: YieldPolicy::default(),
            monitoring: MonitoringConfig::default(),
            settings: SettingsConfig::default(),
        }
    }
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
        }
    }
}

impl RpcSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            address: AAVE_V3_POOL,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            structured_logging: false,
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".aave-yield/settings.toml"),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> YieldResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            YieldError::Configuration(format!("Failed to read config file {}: {}", path, e))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            YieldError::Configuration(format!("Failed to parse config file {}: {}", path, e))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> YieldResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            YieldError::Configuration(format!("Failed to serialize config: {}", e))
        })?;
        fs::write(path, content).map_err(|e| {
            YieldError::Configuration(format!("Failed to write config file {}: {}", path, e))
        })?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> YieldResult<()> {
        if self.assets.is_empty() {
            return Err(YieldError::Configuration(
                "at least one asset must be configured".to_string(),
            ));
        }

        if self.rpc.connect_timeout_secs == 0 || self.rpc.read_timeout_secs == 0 {
            return Err(YieldError::Configuration(
                "rpc timeouts must be greater than 0".to_string(),
            ));
        }

        for (i, asset) in self.assets.iter().enumerate() {
            if asset.symbol.trim().is_empty() {
                return Err(YieldError::Configuration(format!("asset #{} has no symbol", i)));
            }

            if asset.decimals > MAX_DECIMALS {
                return Err(YieldError::Configuration(format!(
                    "asset {} declares {} decimals (max {})",
                    asset.symbol, asset.decimals, MAX_DECIMALS
                )));
            }

            let duplicate = self.assets[..i]
                .iter()
                .any(|other| other.symbol.eq_ignore_ascii_case(&asset.symbol));
            if duplicate {
                return Err(YieldError::Configuration(format!(
                    "asset {} is listed twice",
                    asset.symbol
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.assets.len(), 2);
        assert!(!config.yield_policy.include_withdrawals);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.assets[0].decimals = 30;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.assets[1].symbol = "usdc".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.assets.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rpc.read_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[yield_policy]
include_withdrawals = true

[monitoring]
log_level = "debug"
"#,
        )
        .unwrap();

        assert!(config.yield_policy.include_withdrawals);
        assert_eq!(config.monitoring.log_level, "debug");
        assert_eq!(config.pool.address, AAVE_V3_POOL);
        assert_eq!(config.rpc.read_timeout_secs, 30);
        assert_eq!(config.assets, AssetConfig::defaults());
    }
}
