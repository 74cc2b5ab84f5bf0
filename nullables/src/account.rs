//! Nullable account-chain node.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use trio_crypto::keccak256;
use trio_types::{Amount, EvmAddress};
use trio_wallet_core::{AccountChainClient, CallRequest, RpcError, TxHash};

struct State {
    balance: Amount,
    nonce: u64,
    gas_price: Amount,
    gas_estimate: u64,
    calls: Vec<CallRequest>,
    sent: Vec<String>,
    fail_send: Option<RpcError>,
}

/// An in-memory EVM node.
///
/// Each accepted raw transaction bumps the nonce and is answered with the
/// Keccak-256 of its bytes.
pub struct NullAccountChain {
    state: Mutex<State>,
}

impl NullAccountChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                balance: Amount::ZERO,
                nonce: 0,
                gas_price: Amount::new(25_000_000_000),
                gas_estimate: 21_000,
                calls: Vec::new(),
                sent: Vec::new(),
                fail_send: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_balance(&self, balance: Amount) {
        self.state().balance = balance;
    }

    pub fn set_nonce(&self, nonce: u64) {
        self.state().nonce = nonce;
    }

    pub fn set_gas_price(&self, price: Amount) {
        self.state().gas_price = price;
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.state().gas_estimate = gas;
    }

    /// Calls passed to `estimate_gas`, in order.
    pub fn estimate_calls(&self) -> Vec<CallRequest> {
        self.state().calls.clone()
    }

    /// Raw transactions accepted so far.
    pub fn sent(&self) -> Vec<String> {
        self.state().sent.clone()
    }

    /// Fail the next `send_raw_transaction` call only.
    pub fn fail_next_send(&self, error: RpcError) {
        self.state().fail_send = Some(error);
    }
}

impl Default for NullAccountChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountChainClient for NullAccountChain {
    async fn get_balance(&self, _address: &EvmAddress) -> Result<Amount, RpcError> {
        Ok(self.state().balance)
    }

    async fn get_transaction_count(&self, _address: &EvmAddress) -> Result<u64, RpcError> {
        Ok(self.state().nonce)
    }

    async fn get_gas_price(&self) -> Result<Amount, RpcError> {
        Ok(self.state().gas_price)
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, RpcError> {
        let mut state = self.state();
        state.calls.push(call.clone());
        Ok(state.gas_estimate)
    }

    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<TxHash, RpcError> {
        let mut state = self.state();
        if let Some(error) = state.fail_send.take() {
            return Err(error);
        }
        let digits = raw_hex.strip_prefix("0x").unwrap_or(raw_hex);
        let raw = hex::decode(digits).map_err(|e| RpcError::Remote {
            code: -32602,
            message: format!("invalid raw transaction: {e}"),
        })?;
        state.sent.push(raw_hex.to_owned());
        state.nonce += 1;
        Ok(TxHash(keccak256(&raw)))
    }
}
