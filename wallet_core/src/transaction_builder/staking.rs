use std::collections::BTreeMap;
use std::time::SystemTime;

use trio_transactions::staking::SHARES_PER_PERCENT;
use trio_transactions::{AddDelegatorTx, AddValidatorTx, TransferableOutput, UtxoTx, Validator};
use trio_types::{Amount, ChainFamily, NodeId, OutputOwners, Timestamp, UtxoChain, UtxoSet};

use super::selection::{require, select};
use super::{check_memo, expect_chain, BuiltTx, SpendContext, TransactionBuilder};
use crate::error::WalletError;
use crate::stake_economics::ValidatorCapacity;

/// Bond `amount` of the native asset to `node_id` from `start` to `end`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StakeRequest {
    pub node_id: NodeId,
    pub amount: Amount,
    pub start: SystemTime,
    pub end: SystemTime,
    /// Chain-reported minimum for this kind of stake.
    pub minimum: Amount,
    /// Defaults to the wallet's first staking-chain address.
    pub reward_address: Option<String>,
    /// Fund the stake from these UTXOs instead of the snapshot, e.g. outputs
    /// of a transaction the node has not indexed yet.
    pub utxo_override: Option<UtxoSet>,
    pub memo: Vec<u8>,
}

/// Register a validator, charging delegators `delegation_fee` percent of
/// their rewards.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatorRequest {
    pub stake: StakeRequest,
    pub delegation_fee: f64,
}

/// A stake request checked and resolved against the snapshot.
struct PreparedStake {
    validator: Validator,
    stake: Vec<TransferableOutput>,
    rewards_owner: OutputOwners,
    base: trio_transactions::BaseTx,
    signers: Vec<Vec<trio_types::ShortId>>,
}

impl TransactionBuilder {
    pub fn add_validator(
        &self,
        ctx: &SpendContext<'_>,
        request: &ValidatorRequest,
    ) -> Result<BuiltTx, WalletError> {
        let fee = request.delegation_fee;
        if !(0.0..=100.0).contains(&fee) {
            return Err(WalletError::InvalidState(format!(
                "delegation fee {fee}% outside 0..=100"
            )));
        }
        let prepared = self.prepare_stake(ctx, &request.stake)?;
        let shares = (fee * f64::from(SHARES_PER_PERCENT)).round() as u32;
        let tx = UtxoTx::AddValidator(AddValidatorTx {
            base: prepared.base,
            validator: prepared.validator,
            stake: prepared.stake,
            rewards_owner: prepared.rewards_owner,
            shares,
        });
        self.finish(tx, prepared.signers, ctx.snapshot, self.fees.staking_fee)
    }

    pub fn add_delegator(
        &self,
        ctx: &SpendContext<'_>,
        request: &StakeRequest,
    ) -> Result<BuiltTx, WalletError> {
        let prepared = self.prepare_stake(ctx, request)?;
        let tx = UtxoTx::AddDelegator(AddDelegatorTx {
            base: prepared.base,
            validator: prepared.validator,
            stake: prepared.stake,
            rewards_owner: prepared.rewards_owner,
        });
        self.finish(tx, prepared.signers, ctx.snapshot, self.fees.staking_fee)
    }

    /// [`Self::add_delegator`], refusing more than the validator has room for.
    pub fn delegate_within_capacity(
        &self,
        ctx: &SpendContext<'_>,
        request: &StakeRequest,
        capacity: &ValidatorCapacity,
    ) -> Result<BuiltTx, WalletError> {
        if capacity.node_id != request.node_id {
            return Err(WalletError::InvalidState(format!(
                "capacity is for {}, request targets {}",
                capacity.node_id, request.node_id
            )));
        }
        if request.amount > capacity.remaining_stake {
            return Err(WalletError::CapacityExceeded {
                node_id: request.node_id,
                requested: request.amount,
                remaining: capacity.remaining_stake,
            });
        }
        self.add_delegator(ctx, request)
    }

    fn prepare_stake(
        &self,
        ctx: &SpendContext<'_>,
        request: &StakeRequest,
    ) -> Result<PreparedStake, WalletError> {
        expect_chain(ctx.snapshot, UtxoChain::Staking)?;
        if request.amount < request.minimum {
            return Err(WalletError::BelowMinimumStake {
                minimum: request.minimum,
                requested: request.amount,
            });
        }
        if request.amount.is_zero() {
            return Err(WalletError::InvalidState("zero stake".into()));
        }
        let start = Timestamp::from_system_time(request.start);
        let end = Timestamp::from_system_time(request.end);
        if end <= start {
            return Err(WalletError::InvalidState(format!(
                "staking period ends at {} before it starts at {}",
                end.as_secs(),
                start.as_secs()
            )));
        }
        if start <= ctx.now {
            return Err(WalletError::InvalidState(format!(
                "staking period must start after {}",
                ctx.now.as_secs()
            )));
        }
        check_memo(&request.memo)?;
        let reward_owner = match &request.reward_address {
            Some(address) => self.parse_owner(address, ChainFamily::Staking)?,
            None => ctx.change,
        };

        let fee = self.fees.staking_fee;
        let mut required = BTreeMap::new();
        require(&mut required, self.fee_asset, request.amount)?;
        require(&mut required, self.fee_asset, fee)?;
        let source = request.utxo_override.as_ref().unwrap_or(&ctx.snapshot.utxos);
        let selection = select(source, &required, ctx.owners, ctx.now)?;

        let stake = vec![TransferableOutput::transfer(
            self.fee_asset,
            request.amount,
            OutputOwners::locked_until(ctx.change, end),
        )];
        let outputs = self.change_outputs(&selection, ctx.change);
        Ok(PreparedStake {
            validator: Validator {
                node_id: request.node_id,
                start,
                end,
                weight: request.amount,
            },
            stake,
            rewards_owner: OutputOwners::single(reward_owner),
            base: self.base_tx(UtxoChain::Staking, outputs, selection.inputs, &request.memo),
            signers: selection.signers,
        })
    }
}
