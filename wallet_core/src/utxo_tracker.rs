//! Cached UTXO snapshots for the exchange and staking chains.
//!
//! A refresh fetches every page for the address set and then replaces the
//! chain's snapshot in one `Arc` swap; readers hold whichever snapshot they
//! cloned and never see a mix. Snapshots carry a version so a transaction
//! built from one can be checked against the current one at issuance, and
//! inputs issued from the current snapshot are reserved until the next
//! refresh.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};
use trio_types::{Amount, AssetId, Timestamp, UtxoChain, UtxoId, UtxoSet};

use crate::client::{PlatformClient, UtxoChainClient};
use crate::error::WalletError;

pub const DEFAULT_PAGE_LIMIT: u32 = 1024;

/// An immutable view of one chain's UTXOs for one address set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtxoSnapshot {
    pub chain: UtxoChain,
    /// Strictly increasing across refreshes of all chains. Version 0 is the
    /// empty snapshot a tracker starts with.
    pub version: u64,
    pub addresses: Vec<String>,
    pub utxos: UtxoSet,
    pub fetched_at: Timestamp,
}

impl UtxoSnapshot {
    fn empty(chain: UtxoChain) -> Self {
        Self {
            chain,
            version: 0,
            addresses: Vec::new(),
            utxos: UtxoSet::new(),
            fetched_at: Timestamp::EPOCH,
        }
    }

    pub fn stamp(&self) -> SnapshotStamp {
        SnapshotStamp {
            chain: self.chain,
            version: self.version,
        }
    }

    pub fn balance(&self, asset: AssetId, now: Timestamp) -> Amount {
        self.utxos.balance(asset, now)
    }
}

/// Identifies the snapshot a transaction was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SnapshotStamp {
    pub chain: UtxoChain,
    pub version: u64,
}

struct ChainState {
    snapshot: Arc<UtxoSnapshot>,
    reserved: BTreeSet<UtxoId>,
}

pub struct UtxoTracker {
    page_limit: u32,
    next_version: AtomicU64,
    chains: RwLock<BTreeMap<UtxoChain, ChainState>>,
    staked: RwLock<Amount>,
}

impl UtxoTracker {
    pub fn new(page_limit: u32) -> Self {
        let chains = UtxoChain::ALL
            .into_iter()
            .map(|chain| {
                (
                    chain,
                    ChainState {
                        snapshot: Arc::new(UtxoSnapshot::empty(chain)),
                        reserved: BTreeSet::new(),
                    },
                )
            })
            .collect();
        Self {
            page_limit: page_limit.max(1),
            next_version: AtomicU64::new(1),
            chains: RwLock::new(chains),
            staked: RwLock::new(Amount::ZERO),
        }
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    /// Drop every snapshot, reservation and the cached stake. Versions keep
    /// counting up, so stamps taken before the reset are stale afterwards.
    pub fn reset(&mut self, page_limit: u32) {
        self.page_limit = page_limit.max(1);
        let chains = self.chains.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (chain, state) in chains.iter_mut() {
            state.snapshot = Arc::new(UtxoSnapshot {
                version: self.next_version.fetch_add(1, Ordering::SeqCst),
                ..UtxoSnapshot::empty(*chain)
            });
            state.reserved.clear();
        }
        *self.staked.get_mut().unwrap_or_else(PoisonError::into_inner) = Amount::ZERO;
        info!(page_limit = self.page_limit, "utxo tracker reset");
    }

    /// Fetch all UTXOs of `addresses` on `chain` and make them the current
    /// snapshot. On failure the previous snapshot stays in place.
    pub async fn refresh(
        &self,
        client: &dyn UtxoChainClient,
        chain: UtxoChain,
        addresses: &[String],
        now: Timestamp,
    ) -> Result<Arc<UtxoSnapshot>, WalletError> {
        let mut utxos = UtxoSet::new();
        let mut cursor = None;
        let mut pages = 0usize;
        loop {
            let page = client
                .get_utxos(chain, addresses, self.page_limit, cursor.as_ref())
                .await
                .map_err(|e| {
                    warn!(%chain, error = %e, "utxo refresh failed; keeping previous snapshot");
                    e
                })?;
            pages += 1;
            let full = page.utxos.len() >= self.page_limit as usize;
            for utxo in page.utxos {
                utxos.insert(utxo);
            }
            match (full, page.end_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        let snapshot = Arc::new(UtxoSnapshot {
            chain,
            version: self.next_version.fetch_add(1, Ordering::SeqCst),
            addresses: addresses.to_vec(),
            utxos,
            fetched_at: now,
        });
        {
            let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
            let state = chains.entry(chain).or_insert_with(|| ChainState {
                snapshot: Arc::new(UtxoSnapshot::empty(chain)),
                reserved: BTreeSet::new(),
            });
            state.snapshot = Arc::clone(&snapshot);
            state.reserved.clear();
        }
        info!(
            %chain,
            version = snapshot.version,
            utxos = snapshot.utxos.len(),
            pages,
            "utxo snapshot refreshed"
        );
        Ok(snapshot)
    }

    pub fn snapshot(&self, chain: UtxoChain) -> Arc<UtxoSnapshot> {
        let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
        match chains.get(&chain) {
            Some(state) => Arc::clone(&state.snapshot),
            None => Arc::new(UtxoSnapshot::empty(chain)),
        }
    }

    /// Claim `inputs` for issuance. Fails if the snapshot was replaced since
    /// `stamp` was taken, or if any input was already claimed from it.
    pub fn reserve(&self, stamp: SnapshotStamp, inputs: &[UtxoId]) -> Result<(), WalletError> {
        let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
        let state = chains.get_mut(&stamp.chain).ok_or_else(|| WalletError::StaleSnapshot {
            chain: stamp.chain,
            reason: "chain has never been refreshed".into(),
        })?;
        let current = state.snapshot.version;
        if current != stamp.version {
            warn!(chain = %stamp.chain, built = stamp.version, current, "stale snapshot");
            return Err(WalletError::StaleSnapshot {
                chain: stamp.chain,
                reason: format!("built from version {}, current is {current}", stamp.version),
            });
        }
        if let Some(taken) = inputs.iter().find(|id| state.reserved.contains(*id)) {
            warn!(chain = %stamp.chain, utxo = %taken, "input already issued from this snapshot");
            return Err(WalletError::StaleSnapshot {
                chain: stamp.chain,
                reason: format!("input {taken} already issued"),
            });
        }
        state.reserved.extend(inputs.iter().copied());
        debug!(chain = %stamp.chain, count = inputs.len(), "inputs reserved");
        Ok(())
    }

    /// Undo a reservation after a failed submission. A no-op if the snapshot
    /// has moved on.
    pub fn release(&self, stamp: SnapshotStamp, inputs: &[UtxoId]) {
        let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = chains.get_mut(&stamp.chain) {
            if state.snapshot.version == stamp.version {
                for id in inputs {
                    state.reserved.remove(id);
                }
            }
        }
    }

    pub fn is_reserved(&self, chain: UtxoChain, id: &UtxoId) -> bool {
        let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
        chains.get(&chain).is_some_and(|s| s.reserved.contains(id))
    }

    /// Query and cache the amount staked by `addresses`.
    pub async fn refresh_stake(
        &self,
        client: &dyn PlatformClient,
        addresses: &[String],
    ) -> Result<Amount, WalletError> {
        let staked = client.get_stake(addresses).await?;
        *self.staked.write().unwrap_or_else(PoisonError::into_inner) = staked;
        info!(%staked, "stake refreshed");
        Ok(staked)
    }

    pub fn staked(&self) -> Amount {
        *self.staked.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for UtxoTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_empty_version_zero() {
        let tracker = UtxoTracker::default();
        let snap = tracker.snapshot(UtxoChain::Exchange);
        assert_eq!(snap.version, 0);
        assert!(snap.utxos.is_empty());
    }

    #[test]
    fn reserve_rejects_wrong_version() {
        let tracker = UtxoTracker::default();
        let stamp = SnapshotStamp {
            chain: UtxoChain::Exchange,
            version: 7,
        };
        assert!(matches!(
            tracker.reserve(stamp, &[]),
            Err(WalletError::StaleSnapshot { .. })
        ));
    }

    #[test]
    fn reserve_then_release() {
        let tracker = UtxoTracker::default();
        let stamp = tracker.snapshot(UtxoChain::Staking).stamp();
        let id = UtxoId::new(trio_types::TxId::new([1u8; 32]), 0);
        tracker.reserve(stamp, &[id]).unwrap();
        assert!(tracker.is_reserved(UtxoChain::Staking, &id));
        assert!(tracker.reserve(stamp, &[id]).is_err());
        tracker.release(stamp, &[id]);
        assert!(!tracker.is_reserved(UtxoChain::Staking, &id));
        assert!(tracker.reserve(stamp, &[id]).is_ok());
    }

    #[test]
    fn reset_makes_earlier_stamps_stale() {
        let mut tracker = UtxoTracker::default();
        let before = tracker.snapshot(UtxoChain::Exchange).stamp();
        let id = UtxoId::new(trio_types::TxId::new([1u8; 32]), 0);
        tracker.reserve(before, &[id]).unwrap();

        tracker.reset(7);
        assert_eq!(tracker.page_limit(), 7);
        assert!(!tracker.is_reserved(UtxoChain::Exchange, &id));
        let after = tracker.snapshot(UtxoChain::Exchange);
        assert!(after.version > before.version);
        assert!(after.utxos.is_empty());
        assert!(matches!(
            tracker.reserve(before, &[id]),
            Err(WalletError::StaleSnapshot { .. })
        ));
        assert!(tracker.reserve(after.stamp(), &[id]).is_ok());
    }
}
