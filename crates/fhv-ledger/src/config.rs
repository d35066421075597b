//! Ledger node configuration.
//!
//! Points the client at a fullnode REST endpoint and names the deployed
//! contract. Defaults target the public devnet. Callers override fields
//! directly; the CLI layers its file and environment settings on top of
//! [`LedgerConfig::for_network()`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::retry::RetryPolicy;

/// Address the browser build shipped as a placeholder. Treated as unset.
pub const SENTINEL_MODULE_ADDRESS: &str = "0x1";

/// Name of the contract module under the deployed address.
pub const MODULE_NAME: &str = "file_hash_verifier";

/// Public networks with a known fullnode endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedgerNetwork {
    #[default]
    Devnet,
    Testnet,
    Mainnet,
    Local,
}

impl LedgerNetwork {
    /// Default fullnode REST base URL for this network.
    pub fn default_node_url(&self) -> &'static str {
        match self {
            Self::Devnet => "https://fullnode.devnet.aptoslabs.com/v1",
            Self::Testnet => "https://fullnode.testnet.aptoslabs.com/v1",
            Self::Mainnet => "https://fullnode.mainnet.aptoslabs.com/v1",
            Self::Local => "http://127.0.0.1:8080/v1",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for LedgerNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LedgerNetwork {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            "local" | "localnet" => Ok(Self::Local),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Account address the contract is published under.
///
/// Stored lowercase with a `0x` prefix. The sentinel `0x1` parses but is
/// reported by [`ModuleAddress::is_sentinel()`] and never used for calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleAddress(String);

impl ModuleAddress {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ConfigError::InvalidAddress(raw.to_string()))?;
        if hex.is_empty() || hex.len() > 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the placeholder address.
    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL_MODULE_ADDRESS
    }

    /// Fully qualified function id, e.g. `0xabc::file_hash_verifier::get_all_files`.
    pub fn function_id(&self, function: &str) -> String {
        format!("{}::{MODULE_NAME}::{function}", self.0)
    }
}

impl TryFrom<String> for ModuleAddress {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModuleAddress> for String {
    fn from(value: ModuleAddress) -> Self {
        value.0
    }
}

impl std::fmt::Display for ModuleAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration for the ledger client and wallet bridge.
///
/// Custom `Debug` implementation redacts `wallet_token`.
#[derive(Clone)]
pub struct LedgerConfig {
    pub network: LedgerNetwork,
    /// Fullnode REST base URL, including the `/v1` path.
    pub node_url: Url,
    /// Published contract address. `None` or the sentinel leaves the store
    /// in its unavailable state.
    pub module_address: Option<ModuleAddress>,
    /// Wallet bridge that signs and submits entry function transactions.
    pub wallet_bridge_url: Option<Url>,
    /// Bearer token for the wallet bridge.
    pub wallet_token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Interval between confirmation polls, in milliseconds.
    pub confirmation_poll_ms: u64,
    /// Total time to wait for a transaction to leave the pending state.
    pub confirmation_timeout_secs: u64,
    /// Retries of a read after a transport error.
    pub read_retries: u32,
    /// Backoff before the first read retry, in milliseconds. Doubles per retry.
    pub read_retry_base_ms: u64,
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("network", &self.network)
            .field("node_url", &self.node_url)
            .field("module_address", &self.module_address)
            .field("wallet_bridge_url", &self.wallet_bridge_url)
            .field(
                "wallet_token",
                &self.wallet_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .field("confirmation_poll_ms", &self.confirmation_poll_ms)
            .field("confirmation_timeout_secs", &self.confirmation_timeout_secs)
            .field("read_retries", &self.read_retries)
            .field("read_retry_base_ms", &self.read_retry_base_ms)
            .finish()
    }
}

impl LedgerConfig {
    /// Defaults for `network` with no contract address configured.
    pub fn for_network(network: LedgerNetwork) -> Result<Self, ConfigError> {
        Ok(Self {
            network,
            node_url: parse_url("node_url", network.default_node_url())?,
            module_address: None,
            wallet_bridge_url: None,
            wallet_token: None,
            timeout_secs: 30,
            confirmation_poll_ms: 500,
            confirmation_timeout_secs: 30,
            read_retries: 3,
            read_retry_base_ms: 200,
        })
    }

    /// Configuration pointing at a local mock node (for testing).
    pub fn local_mock(node_url: &str, module_address: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            node_url: parse_url("node_url", node_url)?,
            module_address: Some(ModuleAddress::parse(module_address)?),
            timeout_secs: 5,
            confirmation_poll_ms: 10,
            confirmation_timeout_secs: 2,
            read_retry_base_ms: 5,
            ..Self::for_network(LedgerNetwork::Local)?
        })
    }

    /// The contract address, if one is configured and is not the sentinel.
    pub fn usable_module_address(&self) -> Option<&ModuleAddress> {
        self.module_address.as_ref().filter(|a| !a.is_sentinel())
    }

    /// Backoff applied to view calls, confirmation polls and the wallet
    /// account lookup.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.read_retries,
            base_delay: Duration::from_millis(self.read_retry_base_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `{node_url}/{path}` without doubling slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.node_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

pub(crate) fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid module address {0:?}: expected 0x-prefixed hex")]
    InvalidAddress(String),
    #[error("unknown network {0:?} (expected devnet, testnet, mainnet or local)")]
    UnknownNetwork(String),
}
