//! Greedy coin selection.
//!
//! For each required asset, spendable outputs the wallet can unlock are taken
//! in [`UtxoId`] order until the requirement is covered. Whatever is taken
//! beyond the requirement comes back as change.

use std::collections::{BTreeMap, BTreeSet};

use trio_transactions::TransferableInput;
use trio_types::{Amount, AssetId, OutputOwners, ShortId, Timestamp, UtxoSet};

use crate::error::WalletError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Sorted by UTXO id.
    pub inputs: Vec<TransferableInput>,
    /// Owner behind each signature index of the matching input.
    pub signers: Vec<Vec<ShortId>>,
    pub change: BTreeMap<AssetId, Amount>,
}

/// Signature indices for spending an output with `owners`, using the first
/// `threshold` owners the wallet holds, or `None` if it holds too few.
pub fn signature_indices(
    owners: &OutputOwners,
    held: &BTreeSet<ShortId>,
) -> Option<(Vec<u32>, Vec<ShortId>)> {
    let threshold = owners.threshold as usize;
    let mut indices = Vec::with_capacity(threshold);
    let mut signers = Vec::with_capacity(threshold);
    for (index, address) in owners.addresses.iter().enumerate() {
        if indices.len() == threshold {
            break;
        }
        if held.contains(address) {
            indices.push(u32::try_from(index).ok()?);
            signers.push(*address);
        }
    }
    (indices.len() == threshold).then_some((indices, signers))
}

/// Add `amount` of `asset` to a requirement map.
pub fn require(
    required: &mut BTreeMap<AssetId, Amount>,
    asset: AssetId,
    amount: Amount,
) -> Result<(), WalletError> {
    let entry = required.entry(asset).or_insert(Amount::ZERO);
    *entry = entry
        .checked_add(amount)
        .ok_or_else(|| WalletError::InvalidState(format!("total of asset {asset} overflows")))?;
    Ok(())
}

/// Cover every entry of `required` from `utxos`.
pub fn select(
    utxos: &UtxoSet,
    required: &BTreeMap<AssetId, Amount>,
    held: &BTreeSet<ShortId>,
    now: Timestamp,
) -> Result<Selection, WalletError> {
    let mut picked: Vec<(TransferableInput, Vec<ShortId>)> = Vec::new();
    let mut change = BTreeMap::new();

    for (&asset, &needed) in required {
        if needed.is_zero() {
            continue;
        }
        let mut gathered = Amount::ZERO;
        let eligible = utxos
            .spendable(asset, now)
            .filter_map(|(utxo, amount)| {
                signature_indices(utxo.output.owners(), held).map(|sig| (utxo, amount, sig))
            });

        for (utxo, amount, (sig_indices, signers)) in eligible {
            if gathered >= needed {
                break;
            }
            gathered = gathered.saturating_add(amount);
            picked.push((
                TransferableInput {
                    utxo_id: utxo.id,
                    asset_id: asset,
                    amount,
                    sig_indices,
                },
                signers,
            ));
        }

        if gathered < needed {
            let available = available(utxos, asset, held, now);
            return Err(WalletError::InsufficientFunds {
                asset,
                needed,
                available,
            });
        }
        let surplus = gathered.saturating_sub(needed);
        if !surplus.is_zero() {
            change.insert(asset, surplus);
        }
    }

    picked.sort_by_key(|(input, _)| input.utxo_id);
    let (inputs, signers) = picked.into_iter().unzip();
    Ok(Selection {
        inputs,
        signers,
        change,
    })
}

fn available(
    utxos: &UtxoSet,
    asset: AssetId,
    held: &BTreeSet<ShortId>,
    now: Timestamp,
) -> Amount {
    utxos
        .spendable(asset, now)
        .filter(|(utxo, _)| signature_indices(utxo.output.owners(), held).is_some())
        .fold(Amount::ZERO, |total, (_, amount)| total.saturating_add(amount))
}
