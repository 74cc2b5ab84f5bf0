//! Nullable exchange/staking chain node.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use trio_transactions::SignedUtxoTx;
use trio_types::{TxId, Utxo, UtxoChain};
use trio_wallet_core::{RpcError, UtxoChainClient, UtxoCursor, UtxoPage};

#[derive(Default)]
struct State {
    utxos: BTreeMap<UtxoChain, Vec<Utxo>>,
    issued: Vec<(UtxoChain, String)>,
    page_requests: usize,
    fail_get_utxos: Option<RpcError>,
    fail_issue: Option<RpcError>,
}

/// An in-memory UTXO node.
///
/// Pages are served in insertion order; the cursor carries the offset of the
/// next UTXO. Issued payloads are decoded, so a malformed transaction is
/// rejected the way a node would reject it.
#[derive(Default)]
pub struct NullUtxoChain {
    state: Mutex<State>,
}

impl NullUtxoChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the UTXO set of `chain`.
    pub fn set_utxos(&self, chain: UtxoChain, utxos: Vec<Utxo>) {
        self.state().utxos.insert(chain, utxos);
    }

    pub fn add_utxo(&self, chain: UtxoChain, utxo: Utxo) {
        self.state().utxos.entry(chain).or_default().push(utxo);
    }

    /// Every payload accepted by `issue_tx`, in order.
    pub fn issued(&self) -> Vec<(UtxoChain, String)> {
        self.state().issued.clone()
    }

    /// Number of `get_utxos` calls served, failed ones included.
    pub fn page_requests(&self) -> usize {
        self.state().page_requests
    }

    /// Fail every `get_utxos` call until cleared.
    pub fn fail_get_utxos(&self, error: Option<RpcError>) {
        self.state().fail_get_utxos = error;
    }

    /// Fail the next `issue_tx` call only.
    pub fn fail_next_issue(&self, error: RpcError) {
        self.state().fail_issue = Some(error);
    }
}

#[async_trait]
impl UtxoChainClient for NullUtxoChain {
    async fn get_utxos(
        &self,
        chain: UtxoChain,
        _addresses: &[String],
        limit: u32,
        cursor: Option<&UtxoCursor>,
    ) -> Result<UtxoPage, RpcError> {
        let mut state = self.state();
        state.page_requests += 1;
        if let Some(error) = &state.fail_get_utxos {
            return Err(error.clone());
        }

        let start = match cursor {
            Some(c) => c
                .utxo
                .parse::<usize>()
                .map_err(|_| RpcError::Remote {
                    code: -32000,
                    message: format!("bad cursor {}", c.utxo),
                })?,
            None => 0,
        };
        let all = state.utxos.get(&chain).map(Vec::as_slice).unwrap_or(&[]);
        let end = (start + limit as usize).min(all.len());
        let utxos = all.get(start..end).unwrap_or(&[]).to_vec();
        Ok(UtxoPage {
            utxos,
            end_cursor: Some(UtxoCursor {
                address: String::new(),
                utxo: end.to_string(),
            }),
        })
    }

    async fn issue_tx(&self, chain: UtxoChain, tx_hex: &str) -> Result<TxId, RpcError> {
        let mut state = self.state();
        if let Some(error) = state.fail_issue.take() {
            return Err(error);
        }
        let tx = SignedUtxoTx::from_issue_payload(tx_hex).map_err(|e| RpcError::Remote {
            code: -32000,
            message: format!("couldn't parse tx: {e}"),
        })?;
        state.issued.push((chain, tx_hex.to_owned()));
        Ok(tx.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trio_types::{Amount, AssetId, ShortId, UtxoId};

    fn utxo(n: u8) -> Utxo {
        Utxo::transfer(
            UtxoId::new(TxId::new([n; 32]), 0),
            AssetId::new([1; 32]),
            Amount::new(10),
            ShortId::new([1; 20]),
        )
    }

    #[tokio::test]
    async fn pages_follow_cursor() {
        let node = NullUtxoChain::new();
        node.set_utxos(UtxoChain::Exchange, (1..=5).map(utxo).collect());

        let first = node.get_utxos(UtxoChain::Exchange, &[], 2, None).await.unwrap();
        assert_eq!(first.utxos.len(), 2);
        let cursor = first.end_cursor.unwrap();
        let second = node
            .get_utxos(UtxoChain::Exchange, &[], 2, Some(&cursor))
            .await
            .unwrap();
        assert_eq!(second.utxos[0], utxo(3));
        assert_eq!(node.page_requests(), 2);

        let other = node.get_utxos(UtxoChain::Staking, &[], 2, None).await.unwrap();
        assert!(other.utxos.is_empty());
    }

    #[tokio::test]
    async fn garbage_payload_is_rejected() {
        let node = NullUtxoChain::new();
        let err = node.issue_tx(UtxoChain::Exchange, "0xdeadbeef").await.unwrap_err();
        assert!(matches!(err, RpcError::Remote { .. }));
        assert!(node.issued().is_empty());
    }

    #[tokio::test]
    async fn injected_issue_failure_fires_once() {
        let node = NullUtxoChain::new();
        node.fail_next_issue(RpcError::Status(503));
        assert_eq!(
            node.issue_tx(UtxoChain::Exchange, "0x").await,
            Err(RpcError::Status(503))
        );
        assert!(matches!(
            node.issue_tx(UtxoChain::Exchange, "0x").await,
            Err(RpcError::Remote { .. })
        ));
    }
}
