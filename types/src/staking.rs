//! Read-only snapshots of validator and delegator state reported by the
//! staking chain.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::amount::Amount;
use crate::encoding::{cb58_decode_fixed, cb58_encode};
use crate::error::TypesError;
use crate::time::Timestamp;

/// A validator node identity, displayed as `NodeID-<cb58>`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId([u8; 20]);

impl NodeId {
    pub const PREFIX: &'static str = "NodeID-";

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, cb58_encode(&self.0))
    }
}

impl FromStr for NodeId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| TypesError::InvalidNodeId(s.to_string()))?;
        cb58_decode_fixed::<20>(encoded)
            .map(Self)
            .map_err(|e| TypesError::InvalidNodeId(format!("{s}: {e}")))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DelegatorStatus {
    /// Delegation period has started.
    Active,
    /// Accepted but not yet started.
    Pending,
}

/// One delegation behind a validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelegatorRecord {
    pub node_id: NodeId,
    pub stake_amount: Amount,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status: DelegatorStatus,
}

/// One validator with its active delegators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub node_id: NodeId,
    pub stake_amount: Amount,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Percent of delegator rewards kept by the validator (0..=100).
    pub delegation_fee: f64,
    /// Observed uptime as a fraction (0.0..=1.0).
    pub uptime: f64,
    #[serde(default)]
    pub delegators: Vec<DelegatorRecord>,
}

/// Validators and delegators accepted but not yet started.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingSet {
    pub validators: Vec<ValidatorRecord>,
    pub delegators: Vec<DelegatorRecord>,
}

/// Chain-enforced minimum stake amounts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinStake {
    pub min_validator_stake: Amount,
    pub min_delegator_stake: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_roundtrip() {
        let node = NodeId::new([3u8; 20]);
        let text = node.to_string();
        assert!(text.starts_with("NodeID-"));
        assert_eq!(text.parse::<NodeId>().unwrap(), node);
    }

    #[test]
    fn node_id_requires_prefix() {
        let bare = cb58_encode(&[3u8; 20]);
        assert!(matches!(
            bare.parse::<NodeId>(),
            Err(TypesError::InvalidNodeId(_))
        ));
    }
}
