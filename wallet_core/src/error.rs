use thiserror::Error;
use trio_transactions::TransactionError;
use trio_types::{Amount, AssetId, NodeId, UtxoChain};

use crate::client::RpcError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("insufficient funds for asset {asset}: need {needed}, have {available}")]
    InsufficientFunds {
        asset: AssetId,
        needed: Amount,
        available: Amount,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("signing failure: {0}")]
    SigningFailure(String),

    #[error("rpc failure: {0}")]
    Rpc(#[from] RpcError),

    #[error("stake {requested} is below the chain minimum {minimum}")]
    BelowMinimumStake { minimum: Amount, requested: Amount },

    #[error("delegation of {requested} to {node_id} exceeds remaining capacity {remaining}")]
    CapacityExceeded {
        node_id: NodeId,
        requested: Amount,
        remaining: Amount,
    },

    #[error("stale {chain} snapshot: {reason}")]
    StaleSnapshot { chain: UtxoChain, reason: String },

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("config error: {0}")]
    Config(String),

    #[error("no {0} client configured")]
    NoClient(&'static str),
}
