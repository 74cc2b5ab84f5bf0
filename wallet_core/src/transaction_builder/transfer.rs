use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use trio_transactions::{Operation, OperationTx, TransferableOperation, TransferableOutput, UtxoTx};
use trio_types::{Amount, AssetId, ChainFamily, Output, OutputOwners, ShortId, UtxoChain, UtxoId};

use super::selection::{require, select, signature_indices};
use super::{check_memo, expect_chain, BuiltTx, SpendContext, TransactionBuilder};
use crate::error::WalletError;

/// Send `amount` of a fungible asset to an exchange-chain address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOrder {
    pub asset_id: AssetId,
    pub amount: Amount,
    pub to: String,
}

/// Move one NFT instance the wallet owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftTransferOrder {
    pub utxo_id: UtxoId,
    pub to: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub outputs: Vec<TransferOrder>,
    #[serde(default)]
    pub nft_transfers: Vec<NftTransferOrder>,
    #[serde(default)]
    pub memo: Vec<u8>,
}

impl TransferRequest {
    pub fn single(asset_id: AssetId, amount: Amount, to: impl Into<String>) -> Self {
        Self {
            outputs: vec![TransferOrder {
                asset_id,
                amount,
                to: to.into(),
            }],
            ..Self::default()
        }
    }
}

impl TransactionBuilder {
    /// Build an exchange-chain transfer. Outputs appear in request order
    /// followed by one change output per asset. Requests carrying NFT moves
    /// become operation transactions.
    pub fn transfer(
        &self,
        ctx: &SpendContext<'_>,
        request: &TransferRequest,
    ) -> Result<BuiltTx, WalletError> {
        expect_chain(ctx.snapshot, UtxoChain::Exchange)?;
        if request.outputs.is_empty() && request.nft_transfers.is_empty() {
            return Err(WalletError::InvalidState("empty transfer request".into()));
        }
        check_memo(&request.memo)?;

        let fee = self.fees.base_fee;
        let mut required = BTreeMap::new();
        let mut outputs = Vec::with_capacity(request.outputs.len());
        for order in &request.outputs {
            if order.amount.is_zero() {
                return Err(WalletError::InvalidState(format!(
                    "zero amount to {}",
                    order.to
                )));
            }
            let to = self.parse_owner(&order.to, ChainFamily::Exchange)?;
            require(&mut required, order.asset_id, order.amount)?;
            outputs.push(TransferableOutput::transfer(
                order.asset_id,
                order.amount,
                OutputOwners::single(to),
            ));
        }
        let (operations, op_signers) = self.nft_moves(ctx, &request.nft_transfers)?;
        require(&mut required, self.fee_asset, fee)?;

        let selection = select(&ctx.snapshot.utxos, &required, ctx.owners, ctx.now)?;
        outputs.extend(self.change_outputs(&selection, ctx.change));

        let base = self.base_tx(UtxoChain::Exchange, outputs, selection.inputs, &request.memo);
        let mut signers = selection.signers;
        let tx = if operations.is_empty() {
            UtxoTx::Base(base)
        } else {
            signers.extend(op_signers);
            UtxoTx::Operation(OperationTx { base, operations })
        };
        self.finish(tx, signers, ctx.snapshot, fee)
    }

    /// NFT transfer operations sorted by the UTXO they consume.
    fn nft_moves(
        &self,
        ctx: &SpendContext<'_>,
        orders: &[NftTransferOrder],
    ) -> Result<(Vec<TransferableOperation>, Vec<Vec<ShortId>>), WalletError> {
        let mut seen = BTreeSet::new();
        let mut moves = Vec::with_capacity(orders.len());
        for order in orders {
            if !seen.insert(order.utxo_id) {
                return Err(WalletError::InvalidState(format!(
                    "NFT {} transferred twice",
                    order.utxo_id
                )));
            }
            let utxo = ctx.snapshot.utxos.get(&order.utxo_id).ok_or_else(|| {
                WalletError::InvalidState(format!("NFT {} not in snapshot", order.utxo_id))
            })?;
            let Output::NftTransfer {
                group_id,
                payload,
                owners,
            } = &utxo.output
            else {
                return Err(WalletError::InvalidState(format!(
                    "UTXO {} is not an NFT instance",
                    order.utxo_id
                )));
            };
            if utxo.flags.is_locked() || !owners.is_unlocked_at(ctx.now) {
                return Err(WalletError::InvalidState(format!(
                    "NFT {} is locked",
                    order.utxo_id
                )));
            }
            let (sig_indices, signers) = signature_indices(owners, ctx.owners).ok_or_else(|| {
                WalletError::InvalidState(format!("NFT {} is not owned by this wallet", order.utxo_id))
            })?;
            let to = self.parse_owner(&order.to, ChainFamily::Exchange)?;
            moves.push((
                TransferableOperation {
                    asset_id: utxo.asset_id,
                    utxo_ids: vec![order.utxo_id],
                    op: Operation::NftTransfer {
                        sig_indices,
                        group_id: *group_id,
                        payload: payload.clone(),
                        owners: OutputOwners::single(to),
                    },
                },
                signers,
            ));
        }
        moves.sort_by_key(|(op, _)| op.utxo_ids.first().copied());
        Ok(moves.into_iter().unzip())
    }
}
