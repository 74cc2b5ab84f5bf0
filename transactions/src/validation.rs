//! Stateless validation of built transactions.
//!
//! These checks run on every transaction the builder produces, before it is
//! handed to the signer. They do not consult chain state.

use std::collections::BTreeMap;

use trio_types::{Amount, AssetId};

use crate::codec::MAX_ENCODED_AMOUNT;
use crate::error::TransactionError;
use crate::exchange::MAX_MEMO_LEN;
use crate::{SignedUtxoTx, UtxoTx};

/// Check that, per asset, `inputs = outputs + fee`, where only `fee_asset`
/// pays a fee. Stake outputs count as outputs.
pub fn check_conservation(
    tx: &UtxoTx,
    fee_asset: AssetId,
    fee: Amount,
) -> Result<(), TransactionError> {
    let mut inputs: BTreeMap<AssetId, Amount> = BTreeMap::new();
    let mut outputs: BTreeMap<AssetId, Amount> = BTreeMap::new();

    for input in &tx.base().inputs {
        add(&mut inputs, input.asset_id, input.amount)?;
    }
    for out in tx.base().outputs.iter().chain(tx.stake_outputs()) {
        if let Some(amount) = out.output.amount() {
            add(&mut outputs, out.asset_id, amount)?;
        }
    }
    if !fee.is_zero() {
        inputs.entry(fee_asset).or_insert(Amount::ZERO);
    }

    let assets: Vec<AssetId> = inputs.keys().chain(outputs.keys()).copied().collect();
    for asset in assets {
        let consumed = inputs.get(&asset).copied().unwrap_or_default();
        let produced = outputs.get(&asset).copied().unwrap_or_default();
        let asset_fee = if asset == fee_asset { fee } else { Amount::ZERO };
        if produced.checked_add(asset_fee) != Some(consumed) {
            return Err(TransactionError::ValueNotConserved {
                asset,
                inputs: consumed,
                outputs: produced,
                fee: asset_fee,
            });
        }
    }
    Ok(())
}

fn add(
    totals: &mut BTreeMap<AssetId, Amount>,
    asset: AssetId,
    amount: Amount,
) -> Result<(), TransactionError> {
    let entry = totals.entry(asset).or_insert(Amount::ZERO);
    *entry = entry.checked_add(amount).ok_or(TransactionError::Overflow)?;
    Ok(())
}

/// Structural checks: amounts positive and within the `u64` wire field, memo
/// size, and inputs sorted by UTXO id without duplicates.
pub fn validate_structure(tx: &UtxoTx) -> Result<(), TransactionError> {
    let base = tx.base();
    if base.memo.len() > MAX_MEMO_LEN {
        return Err(TransactionError::InvalidField(format!(
            "memo of {} bytes exceeds {MAX_MEMO_LEN}",
            base.memo.len()
        )));
    }
    for input in &base.inputs {
        check_amount(input.amount)?;
    }
    for out in base.outputs.iter().chain(tx.stake_outputs()) {
        if let Some(amount) = out.output.amount() {
            check_amount(amount)?;
        }
    }
    if base
        .inputs
        .windows(2)
        .any(|pair| pair[0].utxo_id >= pair[1].utxo_id)
    {
        return Err(TransactionError::InvalidField(
            "inputs must be sorted by UTXO id without duplicates".into(),
        ));
    }
    Ok(())
}

fn check_amount(amount: Amount) -> Result<(), TransactionError> {
    if amount.is_zero() {
        return Err(TransactionError::ZeroAmount);
    }
    if amount > MAX_ENCODED_AMOUNT {
        return Err(TransactionError::AmountTooWide(amount));
    }
    Ok(())
}

/// One credential per input and operation, each with one signature per
/// signature index.
pub fn check_credentials(tx: &SignedUtxoTx) -> Result<(), TransactionError> {
    let expected = tx.unsigned.credential_count();
    if tx.credentials.len() != expected {
        return Err(TransactionError::InvalidField(format!(
            "{} credentials for {expected} inputs and operations",
            tx.credentials.len()
        )));
    }
    let indices = tx
        .unsigned
        .base()
        .inputs
        .iter()
        .map(|i| i.sig_indices.len())
        .chain(tx.unsigned.operations().iter().map(|o| o.op.sig_indices().len()));
    for (position, (credential, wanted)) in tx.credentials.iter().zip(indices).enumerate() {
        if credential.signatures.len() != wanted {
            return Err(TransactionError::InvalidField(format!(
                "credential {position} has {} signatures, expected {wanted}",
                credential.signatures.len()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{TransferableInput, TransferableOutput};
    use crate::exchange::BaseTx;
    use trio_types::{ChainId, OutputOwners, ShortId, TxId, UtxoId};

    const NATIVE: AssetId = AssetId::new([1u8; 32]);
    const OTHER: AssetId = AssetId::new([2u8; 32]);

    fn input(n: u8, asset: AssetId, amount: u128) -> TransferableInput {
        TransferableInput {
            utxo_id: UtxoId::new(TxId::new([n; 32]), 0),
            asset_id: asset,
            amount: Amount::new(amount),
            sig_indices: vec![0],
        }
    }

    fn output(asset: AssetId, amount: u128) -> TransferableOutput {
        TransferableOutput::transfer(
            asset,
            Amount::new(amount),
            OutputOwners::single(ShortId::new([9u8; 20])),
        )
    }

    fn tx(inputs: Vec<TransferableInput>, outputs: Vec<TransferableOutput>) -> UtxoTx {
        UtxoTx::Base(BaseTx {
            network_id: 1,
            blockchain_id: ChainId::ZERO,
            outputs,
            inputs,
            memo: Vec::new(),
        })
    }

    #[test]
    fn balanced_with_fee() {
        let t = tx(
            vec![input(1, NATIVE, 100), input(2, OTHER, 5)],
            vec![output(NATIVE, 60), output(NATIVE, 39), output(OTHER, 5)],
        );
        assert!(check_conservation(&t, NATIVE, Amount::new(1)).is_ok());
    }

    #[test]
    fn fee_on_wrong_asset_detected() {
        let t = tx(
            vec![input(1, NATIVE, 100), input(2, OTHER, 5)],
            vec![output(NATIVE, 100), output(OTHER, 4)],
        );
        assert_eq!(
            check_conservation(&t, NATIVE, Amount::new(1)),
            Err(TransactionError::ValueNotConserved {
                asset: NATIVE,
                inputs: Amount::new(100),
                outputs: Amount::new(100),
                fee: Amount::new(1),
            })
        );
    }

    #[test]
    fn fee_with_no_fee_asset_inputs_detected() {
        let t = tx(vec![input(1, OTHER, 5)], vec![output(OTHER, 5)]);
        assert!(check_conservation(&t, NATIVE, Amount::new(1)).is_err());
    }

    #[test]
    fn unsorted_inputs_rejected() {
        let t = tx(
            vec![input(2, NATIVE, 1), input(1, NATIVE, 1)],
            vec![output(NATIVE, 2)],
        );
        assert!(matches!(
            validate_structure(&t),
            Err(TransactionError::InvalidField(_))
        ));
    }

    #[test]
    fn amounts_must_fit_wire_field() {
        let max = u128::from(u64::MAX);
        let t = tx(vec![input(1, NATIVE, max)], vec![output(NATIVE, max)]);
        assert!(validate_structure(&t).is_ok());

        let t = tx(vec![input(1, NATIVE, max + 1)], vec![output(NATIVE, 1)]);
        assert_eq!(
            validate_structure(&t),
            Err(TransactionError::AmountTooWide(Amount::new(max + 1)))
        );
        let t = tx(vec![input(1, NATIVE, 1)], vec![output(NATIVE, max + 1)]);
        assert!(matches!(
            validate_structure(&t),
            Err(TransactionError::AmountTooWide(_))
        ));
    }

    #[test]
    fn credential_count_must_match() {
        let signed = SignedUtxoTx {
            unsigned: tx(vec![input(1, NATIVE, 2)], vec![output(NATIVE, 2)]),
            credentials: Vec::new(),
        };
        assert!(check_credentials(&signed).is_err());
    }
}
