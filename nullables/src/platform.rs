//! Nullable staking-chain state.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use trio_types::{Amount, MinStake, PendingSet, ValidatorRecord};
use trio_wallet_core::{PlatformClient, RpcError};

#[derive(Default)]
struct State {
    validators: Vec<ValidatorRecord>,
    pending: PendingSet,
    min_stake: MinStake,
    supply: Amount,
    staked: Amount,
    fail: Option<RpcError>,
}

/// Staking-chain queries answered from programmable state.
#[derive(Default)]
pub struct NullPlatform {
    state: Mutex<State>,
}

impl NullPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self) -> Result<MutexGuard<'_, State>, RpcError> {
        let state = self.state();
        match &state.fail {
            Some(error) => Err(error.clone()),
            None => Ok(state),
        }
    }

    pub fn set_validators(&self, validators: Vec<ValidatorRecord>) {
        self.state().validators = validators;
    }

    pub fn set_pending(&self, pending: PendingSet) {
        self.state().pending = pending;
    }

    pub fn set_min_stake(&self, min_stake: MinStake) {
        self.state().min_stake = min_stake;
    }

    pub fn set_supply(&self, supply: Amount) {
        self.state().supply = supply;
    }

    pub fn set_staked(&self, staked: Amount) {
        self.state().staked = staked;
    }

    /// Fail every query until cleared.
    pub fn fail_with(&self, error: Option<RpcError>) {
        self.state().fail = error;
    }
}

#[async_trait]
impl PlatformClient for NullPlatform {
    async fn get_current_validators(&self) -> Result<Vec<ValidatorRecord>, RpcError> {
        Ok(self.check()?.validators.clone())
    }

    async fn get_pending_validators(&self) -> Result<PendingSet, RpcError> {
        Ok(self.check()?.pending.clone())
    }

    async fn get_min_stake(&self) -> Result<MinStake, RpcError> {
        Ok(self.check()?.min_stake)
    }

    async fn get_current_supply(&self) -> Result<Amount, RpcError> {
        Ok(self.check()?.supply)
    }

    async fn get_stake(&self, _addresses: &[String]) -> Result<Amount, RpcError> {
        Ok(self.check()?.staked)
    }
}
