//! # Application Configuration
//!
//! Layered in this order, later layers winning:
//!
//! 1. Built-in defaults (local mode, `./.fhv` data directory, devnet).
//! 2. An optional YAML file passed with `--config`.
//! 3. `FHV_*` environment variables, after loading `.env` if present.
//! 4. Command-line flags (`--mode`, `--data-dir`).
//!
//! ```yaml
//! mode: ledger
//! data_dir: /var/lib/fhv
//! ledger:
//!   network: testnet
//!   module_address: "0xabc..."
//!   wallet_bridge_url: http://127.0.0.1:7000
//!   timeout_secs: 20
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use fhv_ledger::{ConfigError, LedgerConfig, LedgerNetwork, ModuleAddress};
use fhv_store::StoreMode;

/// Default directory for local records and the activity log.
pub const DEFAULT_DATA_DIR: &str = ".fhv";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub mode: StoreMode,
    pub data_dir: PathBuf,
    pub ledger: LedgerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: StoreMode::Local,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            ledger: LedgerSettings::default(),
        }
    }
}

/// The `ledger:` section. Unset fields fall back to the network defaults.
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerSettings {
    pub network: LedgerNetwork,
    pub node_url: Option<String>,
    pub module_address: Option<String>,
    pub wallet_bridge_url: Option<String>,
    pub wallet_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for LedgerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerSettings")
            .field("network", &self.network)
            .field("node_url", &self.node_url)
            .field("module_address", &self.module_address)
            .field("wallet_bridge_url", &self.wallet_bridge_url)
            .field(
                "wallet_token",
                &self.wallet_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Read the YAML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay `FHV_*` variables resolved through `lookup`. Blank values are
    /// ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = var("FHV_MODE") {
            self.mode = raw
                .parse()
                .map_err(|e: String| anyhow::anyhow!("FHV_MODE: {e}"))?;
        }
        if let Some(raw) = var("FHV_DATA_DIR") {
            self.data_dir = PathBuf::from(raw);
        }
        if let Some(raw) = var("FHV_NETWORK") {
            self.ledger.network = raw.parse().context("FHV_NETWORK")?;
        }
        if let Some(raw) = var("FHV_NODE_URL") {
            self.ledger.node_url = Some(raw);
        }
        if let Some(raw) = var("FHV_MODULE_ADDRESS") {
            self.ledger.module_address = Some(raw);
        }
        if let Some(raw) = var("FHV_WALLET_BRIDGE_URL") {
            self.ledger.wallet_bridge_url = Some(raw);
        }
        if let Some(raw) = var("FHV_WALLET_TOKEN") {
            self.ledger.wallet_token = Some(raw);
        }
        if let Some(raw) = var("FHV_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse()
                .with_context(|| format!("FHV_TIMEOUT_SECS: not a number: {raw:?}"))?;
            self.ledger.timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// Apply command-line overrides.
    pub fn apply_flags(&mut self, mode: Option<StoreMode>, data_dir: Option<PathBuf>) {
        if let Some(mode) = mode {
            self.mode = mode;
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
    }

    /// Build the ledger client configuration from the `ledger` section.
    pub fn ledger_config(&self) -> Result<LedgerConfig, ConfigError> {
        let settings = &self.ledger;
        let mut config = LedgerConfig::for_network(settings.network)?;
        if let Some(raw) = &settings.node_url {
            config.node_url = parse_url("node_url", raw)?;
        }
        if let Some(raw) = &settings.module_address {
            config.module_address = Some(ModuleAddress::parse(raw)?);
        }
        if let Some(raw) = &settings.wallet_bridge_url {
            config.wallet_bridge_url = Some(parse_url("wallet_bridge_url", raw)?);
        }
        config.wallet_token = settings.wallet_token.clone();
        if let Some(secs) = settings.timeout_secs {
            config.timeout_secs = secs;
        }
        Ok(config)
    }
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    url::Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidUrl(field.to_string(), e.to_string()))
}
