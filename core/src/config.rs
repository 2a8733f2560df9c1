//! Configuration Module
//!
//! Handles loading configuration from:
//! 1. `$CLOAK_CONFIG`, `~/.cloak/config.toml` or `./config.toml`
//! 2. Environment variables (override TOML values)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::{env, fs};

use crate::contract::ContractPolicy;
use crate::ledger::Timelock;
use crate::ledger::escrow::{DEFAULT_BLOCK_TIME_SECS, DEFAULT_TIMELOCK_BLOCKS};

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".cloak";

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloakConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub timelock: TimelockConfig,
    #[serde(default)]
    pub roles: RolesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "./cloak-db".to_string()
}

/// Escrow window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelockConfig {
    /// Blocks a proposal stays claimable by its recipient
    #[serde(default = "default_timelock_blocks")]
    pub blocks: i64,
    /// Seconds per block when deriving height from a timestamp
    #[serde(default = "default_block_time_secs")]
    pub block_time_secs: u64,
}

impl Default for TimelockConfig {
    fn default() -> Self {
        Self {
            blocks: default_timelock_blocks(),
            block_time_secs: default_block_time_secs(),
        }
    }
}

fn default_timelock_blocks() -> i64 {
    DEFAULT_TIMELOCK_BLOCKS
}

fn default_block_time_secs() -> u64 {
    DEFAULT_BLOCK_TIME_SECS
}

/// Organisational roles allowed to initialize and mint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolesConfig {
    #[serde(default = "default_role")]
    pub admin: String,
    #[serde(default = "default_role")]
    pub minter: String,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            admin: default_role(),
            minter: default_role(),
        }
    }
}

fn default_role() -> String {
    "Org1MSP".to_string()
}

impl CloakConfig {
    /// Load configuration from the first config file found, with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(config_path) => {
                log::info!("Loading config from: {}", config_path.display());
                Self::from_file(&config_path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn find_config_file() -> Option<PathBuf> {
        // 1. CLOAK_CONFIG
        if let Ok(path) = env::var("CLOAK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. ~/.cloak/config.toml
        if let Some(config_path) = Self::default_config_path() {
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // 3. ./config.toml
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        None
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("CLOAK_DB_PATH") {
            self.database.path = v;
        }

        if let Ok(v) = env::var("CLOAK_TIMELOCK_BLOCKS") {
            if let Ok(n) = v.parse() {
                self.timelock.blocks = n;
            }
        }
        if let Ok(v) = env::var("CLOAK_BLOCK_TIME_SECS") {
            if let Ok(n) = v.parse() {
                self.timelock.block_time_secs = n;
            }
        }

        if let Ok(v) = env::var("CLOAK_ADMIN_ROLE") {
            self.roles.admin = v;
        }
        if let Ok(v) = env::var("CLOAK_MINTER_ROLE") {
            self.roles.minter = v;
        }
    }

    pub fn to_timelock(&self) -> Result<Timelock> {
        if self.timelock.blocks < 0 {
            bail!("timelock must not be negative, got {}", self.timelock.blocks);
        }
        let block_time = NonZeroU64::new(self.timelock.block_time_secs)
            .context("block_time_secs must be greater than zero")?;
        Ok(Timelock::new(self.timelock.blocks, block_time))
    }

    /// Convert to the contract's role and timelock policy
    pub fn to_policy(&self) -> Result<ContractPolicy> {
        Ok(ContractPolicy {
            admin_role: self.roles.admin.clone(),
            minter_role: self.roles.minter.clone(),
            timelock: self.to_timelock()?,
        })
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}
