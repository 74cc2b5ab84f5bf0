//! Transaction construction.
//!
//! Builders are pure: they read the request, a UTXO snapshot, the fee schedule
//! and the current time, and either return an unsigned transaction or fail
//! before anything is sent anywhere. Every UTXO transaction they return has
//! passed the structural and value-conservation checks of
//! [`trio_transactions::validation`].

pub mod account;
pub mod nft;
pub mod selection;
pub mod staking;
pub mod transfer;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;
use trio_crypto::parse_address;
use trio_transactions::validation::{check_conservation, validate_structure};
use trio_transactions::{
    BaseTx, TransferableInput, TransferableOutput, UnsignedTx, UtxoTx,
};
use trio_types::{Amount, AssetId, ChainFamily, ChainId, ShortId, Timestamp, UtxoChain, UtxoId};

use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::utxo_tracker::{SnapshotStamp, UtxoSnapshot};

pub use account::{gas_with_margin, AccountTransfer, AccountTxParams};
pub use nft::{CreateNftFamily, MintNft};
pub use selection::Selection;
pub use staking::{StakeRequest, ValidatorRequest};
pub use transfer::{NftTransferOrder, TransferOrder, TransferRequest};

/// Flat fees charged in the fee asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Transfers, mints and NFT transfers.
    #[serde(default = "default_base_fee")]
    pub base_fee: Amount,
    #[serde(default = "default_create_asset_fee")]
    pub create_asset_fee: Amount,
    /// Add-validator and add-delegator.
    #[serde(default)]
    pub staking_fee: Amount,
}

fn default_base_fee() -> Amount {
    Amount::new(1_000_000)
}

fn default_create_asset_fee() -> Amount {
    Amount::new(10_000_000)
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee: default_base_fee(),
            create_asset_fee: default_create_asset_fee(),
            staking_fee: Amount::ZERO,
        }
    }
}

/// What a UTXO builder spends from.
#[derive(Clone, Copy, Debug)]
pub struct SpendContext<'a> {
    pub snapshot: &'a UtxoSnapshot,
    /// Addresses the wallet can sign for. Only UTXOs these can unlock are
    /// selected.
    pub owners: &'a BTreeSet<ShortId>,
    /// Receives change, stake returns and (by default) rewards.
    pub change: ShortId,
    pub now: Timestamp,
}

/// An unsigned transaction plus what the signer and issuer need to know
/// about it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltTx {
    pub unsigned: UnsignedTx,
    /// For each credential, in order, the owner address behind each signature
    /// index. Empty for account-chain transactions.
    pub signers: Vec<Vec<ShortId>>,
    /// Snapshot the inputs were selected from. `None` on the account chain.
    pub stamp: Option<SnapshotStamp>,
    pub fee: Amount,
}

impl BuiltTx {
    pub fn family(&self) -> ChainFamily {
        self.unsigned.family()
    }

    /// Every UTXO this transaction consumes: inputs, then operation UTXOs.
    pub fn consumed_utxos(&self) -> Vec<UtxoId> {
        match &self.unsigned {
            UnsignedTx::Utxo(tx) => tx
                .base()
                .inputs
                .iter()
                .map(|i| i.utxo_id)
                .chain(tx.operations().iter().flat_map(|op| op.utxo_ids.iter().copied()))
                .collect(),
            UnsignedTx::Account(_) => Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    network_id: u32,
    hrp: String,
    exchange_chain_id: ChainId,
    staking_chain_id: ChainId,
    fee_asset: AssetId,
    fees: FeeSchedule,
}

impl TransactionBuilder {
    pub fn new(
        network_id: u32,
        hrp: impl Into<String>,
        exchange_chain_id: ChainId,
        staking_chain_id: ChainId,
        fee_asset: AssetId,
        fees: FeeSchedule,
    ) -> Self {
        Self {
            network_id,
            hrp: hrp.into(),
            exchange_chain_id,
            staking_chain_id,
            fee_asset,
            fees,
        }
    }

    pub fn from_config(config: &WalletConfig) -> Self {
        Self::new(
            config.network.id(),
            config.hrp(),
            config.exchange_chain_id,
            config.staking_chain_id,
            config.fee_asset_id,
            config.fees.clone(),
        )
    }

    pub fn fee_asset(&self) -> AssetId {
        self.fee_asset
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Decode a UTXO-chain address and check it belongs to `family` on this
    /// network.
    pub fn parse_owner(&self, address: &str, family: ChainFamily) -> Result<ShortId, WalletError> {
        let parsed = parse_address(address).map_err(|e| WalletError::InvalidAddress(e.to_string()))?;
        if parsed.chain != family {
            return Err(WalletError::InvalidAddress(format!(
                "{address} is a {} address, expected {family}",
                parsed.chain
            )));
        }
        if parsed.hrp != self.hrp {
            return Err(WalletError::InvalidAddress(format!(
                "{address} belongs to network \"{}\", expected \"{}\"",
                parsed.hrp, self.hrp
            )));
        }
        Ok(parsed.short_id)
    }

    fn chain_id(&self, chain: UtxoChain) -> ChainId {
        match chain {
            UtxoChain::Exchange => self.exchange_chain_id,
            UtxoChain::Staking => self.staking_chain_id,
        }
    }

    fn base_tx(
        &self,
        chain: UtxoChain,
        outputs: Vec<TransferableOutput>,
        inputs: Vec<TransferableInput>,
        memo: &[u8],
    ) -> BaseTx {
        BaseTx {
            network_id: self.network_id,
            blockchain_id: self.chain_id(chain),
            outputs,
            inputs,
            memo: memo.to_vec(),
        }
    }

    /// Change outputs, one per asset with a positive surplus.
    fn change_outputs(&self, selection: &Selection, change: ShortId) -> Vec<TransferableOutput> {
        selection
            .change
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(asset, amount)| {
                TransferableOutput::transfer(
                    *asset,
                    *amount,
                    trio_types::OutputOwners::single(change),
                )
            })
            .collect()
    }

    /// Run the stateless checks and package the result.
    fn finish(
        &self,
        tx: UtxoTx,
        signers: Vec<Vec<ShortId>>,
        snapshot: &UtxoSnapshot,
        fee: Amount,
    ) -> Result<BuiltTx, WalletError> {
        validate_structure(&tx)?;
        check_conservation(&tx, self.fee_asset, fee)?;
        if signers.len() != tx.credential_count() {
            return Err(WalletError::InvalidState(format!(
                "{} signer groups for {} credentials",
                signers.len(),
                tx.credential_count()
            )));
        }
        debug!(
            chain = %tx.chain(),
            inputs = tx.base().inputs.len(),
            outputs = tx.base().outputs.len(),
            operations = tx.operations().len(),
            %fee,
            version = snapshot.version,
            "transaction built"
        );
        Ok(BuiltTx {
            unsigned: UnsignedTx::Utxo(tx),
            signers,
            stamp: Some(snapshot.stamp()),
            fee,
        })
    }
}

fn expect_chain(snapshot: &UtxoSnapshot, chain: UtxoChain) -> Result<(), WalletError> {
    if snapshot.chain != chain {
        return Err(WalletError::InvalidState(format!(
            "expected a {chain} snapshot, got {}",
            snapshot.chain
        )));
    }
    Ok(())
}

fn check_memo(memo: &[u8]) -> Result<(), WalletError> {
    if memo.len() > trio_transactions::exchange::MAX_MEMO_LEN {
        return Err(WalletError::InvalidState(format!(
            "memo of {} bytes exceeds {}",
            memo.len(),
            trio_transactions::exchange::MAX_MEMO_LEN
        )));
    }
    Ok(())
}
