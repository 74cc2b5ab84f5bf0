//! Submit signed transactions to a node.
//!
//! No retries and no cached state is touched here; the pipeline decides what
//! a failure means.

use std::fmt;

use tracing::{info, warn};
use trio_transactions::SignedTx;
use trio_types::TxId;

use crate::client::{AccountChainClient, TxHash, UtxoChainClient};
use crate::error::WalletError;

/// The clients a submission may need.
#[derive(Clone, Copy, Default)]
pub struct Endpoints<'a> {
    pub utxo: Option<&'a dyn UtxoChainClient>,
    pub account: Option<&'a dyn AccountChainClient>,
}

/// Identifier a node returned for an issued transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssuedId {
    Utxo(TxId),
    Account(TxHash),
}

impl fmt::Display for IssuedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utxo(id) => write!(f, "{id}"),
            Self::Account(hash) => write!(f, "{hash}"),
        }
    }
}

pub async fn issue(signed: &SignedTx, endpoints: &Endpoints<'_>) -> Result<IssuedId, WalletError> {
    match signed {
        SignedTx::Utxo(tx) => {
            let client = endpoints.utxo.ok_or(WalletError::NoClient("utxo chain"))?;
            let chain = tx.unsigned.chain();
            let expected = tx.id();
            let id = client.issue_tx(chain, &tx.issue_payload()).await?;
            if id != expected {
                warn!(%chain, returned = %id, computed = %expected, "node returned an unexpected tx id");
            }
            info!(%chain, tx = %id, "transaction issued");
            Ok(IssuedId::Utxo(id))
        }
        SignedTx::Account(tx) => {
            let client = endpoints.account.ok_or(WalletError::NoClient("account chain"))?;
            let expected = TxHash(tx.hash());
            let hash = client.send_raw_transaction(&tx.raw_hex()).await?;
            if hash != expected {
                warn!(returned = %hash, computed = %expected, "node returned an unexpected tx hash");
            }
            info!(tx = %hash, nonce = tx.tx.nonce, "transaction issued");
            Ok(IssuedId::Account(hash))
        }
    }
}
