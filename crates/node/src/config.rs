use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Node configuration: everything `chain-node` needs to open a store and
/// stand up an `Executor`. No network/consensus/RPC sections — those
/// remain external collaborators per the external-interfaces scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub chain: ChainConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain ID mixed into transaction signing digests.
    pub id: u64,

    /// Block gas limit enforced against each applied transaction.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

fn default_gas_limit() -> u64 {
    30_000_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// RocksDB data directory.
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// JSON formatted logs.
    #[serde(default)]
    pub json_format: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain: ChainConfig { id: 1337, gas_limit: default_gas_limit() },
            storage: StorageConfig { db_path: PathBuf::from("./data/db") },
            logging: LoggingConfig { level: "info".to_string(), json_format: false },
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chain.gas_limit == 0 {
            anyhow::bail!("chain.gas_limit must be greater than 0");
        }
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("invalid log level: {}", self.logging.level);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_gas_limit_is_rejected() {
        let mut config = Config::default();
        config.chain.gas_limit = 0;
        assert!(config.validate().is_err());
    }
}
