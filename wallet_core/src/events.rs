//! Events emitted as wallet state changes.

use trio_types::{Amount, AssetId, ChainFamily, UtxoChain};

use crate::issuer::IssuedId;

/// Wallet-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    /// A UTXO snapshot was replaced.
    UtxoSetUpdated {
        chain: UtxoChain,
        version: u64,
        utxos: usize,
    },
    /// A cached balance changed.
    BalanceUpdated {
        family: ChainFamily,
        asset: Option<AssetId>,
        balance: Amount,
    },
    /// The cached staked total was refreshed.
    StakeUpdated { staked: Amount },
    /// A signed transaction was accepted by a node.
    TransactionIssued { family: ChainFamily, id: IssuedId },
}

/// Synchronous fan-out event bus for wallet events.
///
/// Listeners are invoked inline on the emitting task; keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&WalletEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&WalletEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &WalletEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
