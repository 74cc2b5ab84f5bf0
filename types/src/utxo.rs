//! Unspent outputs on the UTXO-model chains.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::amount::Amount;
use crate::hash::{AssetId, ShortId, TxId};
use crate::time::Timestamp;

/// Points at one output of one transaction. Ordering is by transaction id, then
/// output index, which is the order coin selection walks a set in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UtxoId {
    pub tx_id: TxId,
    pub output_index: u32,
}

impl UtxoId {
    pub fn new(tx_id: TxId, output_index: u32) -> Self {
        Self {
            tx_id,
            output_index,
        }
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.output_index)
    }
}

/// Who may spend an output, and from when.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOwners {
    /// Unix time before which the output cannot be spent (0 = unlocked).
    pub locktime: u64,
    /// Number of owner signatures required.
    pub threshold: u32,
    pub addresses: Vec<ShortId>,
}

impl OutputOwners {
    /// Single-owner, unlocked, threshold 1.
    pub fn single(owner: ShortId) -> Self {
        Self {
            locktime: 0,
            threshold: 1,
            addresses: vec![owner],
        }
    }

    pub fn locked_until(owner: ShortId, until: Timestamp) -> Self {
        Self {
            locktime: until.as_secs(),
            threshold: 1,
            addresses: vec![owner],
        }
    }

    pub fn is_unlocked_at(&self, now: Timestamp) -> bool {
        self.locktime <= now.as_secs()
    }
}

/// The payload of an output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Output {
    /// A fungible amount of the asset. The amount is always positive.
    Transfer { amount: Amount, owners: OutputOwners },
    /// Authority to mint instances of one NFT group.
    NftMint { group_id: u32, owners: OutputOwners },
    /// One NFT instance.
    NftTransfer {
        group_id: u32,
        payload: Vec<u8>,
        owners: OutputOwners,
    },
}

impl Output {
    pub fn owners(&self) -> &OutputOwners {
        match self {
            Self::Transfer { owners, .. }
            | Self::NftMint { owners, .. }
            | Self::NftTransfer { owners, .. } => owners,
        }
    }

    /// The fungible amount, if this is a transfer output.
    pub fn amount(&self) -> Option<Amount> {
        match self {
            Self::Transfer { amount, .. } => Some(*amount),
            _ => None,
        }
    }
}

/// Chain-reported markers for outputs that are bonded or reward outputs. Such
/// outputs are never consumed by coin selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoFlags {
    pub stake: bool,
    pub reward: bool,
}

impl UtxoFlags {
    pub fn is_locked(&self) -> bool {
        self.stake || self.reward
    }
}

/// An unspent output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub id: UtxoId,
    pub asset_id: AssetId,
    pub output: Output,
    #[serde(default)]
    pub flags: UtxoFlags,
}

impl Utxo {
    /// A spendable fungible output: the common case in tests and fixtures.
    pub fn transfer(id: UtxoId, asset_id: AssetId, amount: Amount, owner: ShortId) -> Self {
        Self {
            id,
            asset_id,
            output: Output::Transfer {
                amount,
                owners: OutputOwners::single(owner),
            },
            flags: UtxoFlags::default(),
        }
    }

    /// Fungible amount that coin selection may consume at `now`, if any.
    pub fn spendable_amount(&self, now: Timestamp) -> Option<Amount> {
        if self.flags.is_locked() || !self.output.owners().is_unlocked_at(now) {
            return None;
        }
        self.output.amount()
    }

    pub fn is_owned_by_any(&self, owners: &BTreeSet<ShortId>) -> bool {
        self.output
            .owners()
            .addresses
            .iter()
            .any(|a| owners.contains(a))
    }
}

/// All unspent outputs known for one chain and one address set, keyed and
/// iterated in [`UtxoId`] order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoSet {
    utxos: BTreeMap<UtxoId, Utxo>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, utxo: Utxo) {
        self.utxos.insert(utxo.id, utxo);
    }

    pub fn get(&self, id: &UtxoId) -> Option<&Utxo> {
        self.utxos.get(id)
    }

    pub fn contains(&self, id: &UtxoId) -> bool {
        self.utxos.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Utxo> {
        self.utxos.values()
    }

    /// Spendable fungible outputs of `asset`, in selection order.
    pub fn spendable(&self, asset: AssetId, now: Timestamp) -> impl Iterator<Item = (&Utxo, Amount)> {
        self.utxos.values().filter_map(move |utxo| {
            if utxo.asset_id != asset {
                return None;
            }
            utxo.spendable_amount(now).map(|amount| (utxo, amount))
        })
    }

    /// Total spendable balance of `asset` at `now`.
    pub fn balance(&self, asset: AssetId, now: Timestamp) -> Amount {
        self.spendable(asset, now).map(|(_, amount)| amount).sum()
    }

    /// Every distinct asset held in the set.
    pub fn assets(&self) -> BTreeSet<AssetId> {
        self.utxos.values().map(|u| u.asset_id).collect()
    }
}

impl FromIterator<Utxo> for UtxoSet {
    fn from_iter<I: IntoIterator<Item = Utxo>>(iter: I) -> Self {
        let mut set = Self::new();
        for utxo in iter {
            set.insert(utxo);
        }
        set
    }
}
