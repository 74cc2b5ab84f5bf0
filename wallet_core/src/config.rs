//! Wallet configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use trio_types::{AssetId, ChainId, NetworkId};
use trio_utils::LogFormat;

use crate::error::WalletError;
use crate::stake_economics::StakingPolicy;
use crate::transaction_builder::FeeSchedule;
use crate::utxo_tracker::DEFAULT_PAGE_LIMIT;

/// Configuration for a wallet engine.
///
/// Can be loaded from a TOML file via [`WalletConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Overrides the network's bech32 human-readable part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrp: Option<String>,

    #[serde(default)]
    pub exchange_chain_id: ChainId,

    #[serde(default)]
    pub staking_chain_id: ChainId,

    /// Asset fees are paid in; also the asset staked.
    #[serde(default)]
    pub fee_asset_id: AssetId,

    /// EIP-155 chain id of the account chain.
    #[serde(default = "default_account_chain_id")]
    pub account_chain_id: u64,

    /// UTXOs requested per page during a refresh.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub fees: FeeSchedule,

    #[serde(default)]
    pub staking: StakingPolicy,

    #[serde(default)]
    pub rpc: RpcConfig,
}

/// Where the node's JSON-RPC endpoints live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_exchange_path")]
    pub exchange_path: String,
    #[serde(default = "default_staking_path")]
    pub staking_path: String,
    #[serde(default = "default_account_path")]
    pub account_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

// ── Defaults ───────────────────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Local
}

fn default_account_chain_id() -> u64 {
    43112
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:9650".to_string()
}

fn default_exchange_path() -> String {
    "/ext/bc/X".to_string()
}

fn default_staking_path() -> String {
    "/ext/bc/P".to_string()
}

fn default_account_path() -> String {
    "/ext/bc/C/rpc".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WalletConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, WalletError> {
        toml::from_str(s).map_err(|e| WalletError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("WalletConfig is always serializable to TOML")
    }

    /// The effective bech32 human-readable part.
    pub fn hrp(&self) -> &str {
        self.hrp.as_deref().unwrap_or_else(|| self.network.hrp())
    }

    /// Install the global tracing subscriber described by `log_format` and
    /// `log_level`. `RUST_LOG` still wins when set.
    pub fn init_logging(&self) -> Result<(), WalletError> {
        trio_utils::init_logging(self.log_format, &self.log_level)
            .map_err(|e| WalletError::Config(e.to_string()))
    }
}

impl RpcConfig {
    pub fn exchange_url(&self) -> String {
        join(&self.base_url, &self.exchange_path)
    }

    pub fn staking_url(&self) -> String {
        join(&self.base_url, &self.staking_path)
    }

    pub fn account_url(&self) -> String {
        join(&self.base_url, &self.account_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            hrp: None,
            exchange_chain_id: ChainId::ZERO,
            staking_chain_id: ChainId::ZERO,
            fee_asset_id: AssetId::ZERO,
            account_chain_id: default_account_chain_id(),
            page_limit: default_page_limit(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            fees: FeeSchedule::default(),
            staking: StakingPolicy::default(),
            rpc: RpcConfig::default(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            exchange_path: default_exchange_path(),
            staking_path: default_staking_path(),
            account_path: default_account_path(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}
