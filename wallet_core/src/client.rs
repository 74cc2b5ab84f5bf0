//! Collaborator interfaces for the three chains.
//!
//! The wallet never talks to a node directly; it goes through these traits.
//! [`crate::rpc`] implements them over JSON-RPC, and `trio-nullables` provides
//! in-memory doubles for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use trio_types::{Amount, EvmAddress, MinStake, PendingSet, TxId, Utxo, UtxoChain, ValidatorRecord};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("endpoint returned HTTP {0}")]
    Status(u16),

    #[error("node error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Opaque continuation point returned with each UTXO page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoCursor {
    pub address: String,
    pub utxo: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UtxoPage {
    pub utxos: Vec<Utxo>,
    pub end_cursor: Option<UtxoCursor>,
}

/// A read-only call used for gas estimation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<EvmAddress>,
    pub to: EvmAddress,
    pub value: Amount,
    pub data: Vec<u8>,
}

/// Account-chain transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for TxHash {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| RpcError::Malformed(format!("tx hash {s}: {e}")))?;
        bytes
            .as_slice()
            .try_into()
            .map(Self)
            .map_err(|_| RpcError::Malformed(format!("tx hash {s}: expected 32 bytes")))
    }
}

/// UTXO queries and issuance on the exchange and staking chains.
#[async_trait]
pub trait UtxoChainClient: Send + Sync {
    /// One page of at most `limit` UTXOs owned by any of `addresses`,
    /// continuing after `cursor`.
    async fn get_utxos(
        &self,
        chain: UtxoChain,
        addresses: &[String],
        limit: u32,
        cursor: Option<&UtxoCursor>,
    ) -> Result<UtxoPage, RpcError>;

    /// Submit a `0x`-hex checksummed signed transaction.
    async fn issue_tx(&self, chain: UtxoChain, tx_hex: &str) -> Result<TxId, RpcError>;
}

/// Read-only staking-chain state.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn get_current_validators(&self) -> Result<Vec<ValidatorRecord>, RpcError>;

    async fn get_pending_validators(&self) -> Result<PendingSet, RpcError>;

    async fn get_min_stake(&self) -> Result<MinStake, RpcError>;

    async fn get_current_supply(&self) -> Result<Amount, RpcError>;

    /// Total currently staked by `addresses`.
    async fn get_stake(&self, addresses: &[String]) -> Result<Amount, RpcError>;
}

#[async_trait]
pub trait AccountChainClient: Send + Sync {
    async fn get_balance(&self, address: &EvmAddress) -> Result<Amount, RpcError>;

    /// Next nonce for `address`, counting pending transactions.
    async fn get_transaction_count(&self, address: &EvmAddress) -> Result<u64, RpcError>;

    async fn get_gas_price(&self) -> Result<Amount, RpcError>;

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, RpcError>;

    /// Submit `0x`-hex RLP-encoded signed bytes.
    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<TxHash, RpcError>;
}
