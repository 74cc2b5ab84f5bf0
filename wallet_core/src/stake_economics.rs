//! Delegation capacity of current validators.
//!
//! A validator may carry at most `min(absolute_cap, multiple × own stake)` in
//! total weight. What is left after its own stake and every active or pending
//! delegation is the room open to new delegators. Validators close to the end
//! of their period, or with less room than the minimum delegation, are not
//! offered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use trio_types::{Amount, DelegatorRecord, NodeId, Timestamp, ValidatorRecord, NANO_PER_UNIT};
use trio_utils::format_duration;

/// 14 days plus 10 minutes: the shortest remaining period still offered.
pub const MIN_REMAINING_DURATION_SECS: u64 = 14 * 24 * 3600 + 10 * 60;

/// Economic constants of the staking chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPolicy {
    /// Absolute upper bound on a validator's total weight.
    #[serde(default = "default_absolute_cap")]
    pub absolute_cap: Amount,
    /// Total weight may not exceed this multiple of the validator's own stake.
    #[serde(default = "default_max_stake_multiple")]
    pub max_stake_multiple: u64,
    #[serde(default = "default_min_remaining_duration")]
    pub min_remaining_duration_secs: u64,
}

fn default_absolute_cap() -> Amount {
    Amount::new(3_000_000 * NANO_PER_UNIT)
}

fn default_max_stake_multiple() -> u64 {
    5
}

fn default_min_remaining_duration() -> u64 {
    MIN_REMAINING_DURATION_SECS
}

impl Default for StakingPolicy {
    fn default() -> Self {
        Self {
            absolute_cap: default_absolute_cap(),
            max_stake_multiple: default_max_stake_multiple(),
            min_remaining_duration_secs: default_min_remaining_duration(),
        }
    }
}

/// Chain state the calculation runs over.
#[derive(Clone, Copy, Debug)]
pub struct CapacityInput<'a> {
    /// Current validators, each carrying its active delegators.
    pub validators: &'a [ValidatorRecord],
    /// Delegations accepted but not yet started.
    pub pending_delegators: &'a [DelegatorRecord],
    pub min_delegation: Amount,
    pub now: Timestamp,
}

/// One validator open to delegation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidatorCapacity {
    pub node_id: NodeId,
    pub stake: Amount,
    /// Active plus pending delegations.
    pub delegated: Amount,
    pub max_stake: Amount,
    pub remaining_stake: Amount,
    pub num_delegators: usize,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub delegation_fee: f64,
    pub uptime: f64,
}

#[derive(Clone, Debug, Default)]
pub struct StakeEconomicsCalculator {
    policy: StakingPolicy,
}

impl StakeEconomicsCalculator {
    pub fn new(policy: StakingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &StakingPolicy {
        &self.policy
    }

    /// Largest total weight a validator with `stake` may carry.
    pub fn validator_max_stake(&self, stake: Amount) -> Amount {
        match stake.checked_mul(u128::from(self.policy.max_stake_multiple)) {
            Some(relative) => relative.min(self.policy.absolute_cap),
            None => self.policy.absolute_cap,
        }
    }

    /// Validators still open to a delegation of at least `min_delegation`,
    /// in input order.
    pub fn compute_capacity(&self, input: &CapacityInput<'_>) -> Vec<ValidatorCapacity> {
        let pending = pending_by_node(input.pending_delegators);
        let mut out = Vec::new();

        for validator in input.validators {
            let left = validator.end_time.secs_until(input.now);
            if left <= self.policy.min_remaining_duration_secs {
                debug!(
                    node = %validator.node_id,
                    remaining = %format_duration(left),
                    "validator ends too soon for delegation"
                );
                continue;
            }

            let pending_for_node = pending.get(&validator.node_id).map(Vec::as_slice).unwrap_or(&[]);
            let delegated = Amount::checked_sum(
                validator
                    .delegators
                    .iter()
                    .chain(pending_for_node.iter().copied())
                    .map(|d| d.stake_amount),
            );
            let Some(delegated) = delegated else {
                debug!(node = %validator.node_id, "delegated total overflows");
                continue;
            };

            let max_stake = self.validator_max_stake(validator.stake_amount);
            let remaining = max_stake
                .checked_sub(validator.stake_amount)
                .and_then(|room| room.checked_sub(delegated));
            let Some(remaining) = remaining else {
                debug!(node = %validator.node_id, %delegated, "validator is over-subscribed");
                continue;
            };
            if remaining < input.min_delegation {
                continue;
            }

            out.push(ValidatorCapacity {
                node_id: validator.node_id,
                stake: validator.stake_amount,
                delegated,
                max_stake,
                remaining_stake: remaining,
                num_delegators: validator.delegators.len() + pending_for_node.len(),
                start_time: validator.start_time,
                end_time: validator.end_time,
                delegation_fee: validator.delegation_fee,
                uptime: validator.uptime,
            });
        }
        out
    }
}

/// Active delegators of each validator.
pub fn delegators_by_node(validators: &[ValidatorRecord]) -> BTreeMap<NodeId, Vec<&DelegatorRecord>> {
    validators
        .iter()
        .map(|v| (v.node_id, v.delegators.iter().collect()))
        .collect()
}

/// Pending delegators grouped by the validator they target.
pub fn pending_by_node(pending: &[DelegatorRecord]) -> BTreeMap<NodeId, Vec<&DelegatorRecord>> {
    let mut map: BTreeMap<NodeId, Vec<&DelegatorRecord>> = BTreeMap::new();
    for d in pending {
        map.entry(d.node_id).or_default().push(d);
    }
    map
}
