//! Staking-chain transactions: add a validator or delegate to one.

use serde::{Deserialize, Serialize};
use trio_types::{Amount, NodeId, OutputOwners, Timestamp};

use crate::codec::{Decode, Encode, Reader, Writer};
use crate::components::TransferableOutput;
use crate::error::TransactionError;
use crate::exchange::BaseTx;

/// Delegation fee percentages are carried as parts per million.
pub const SHARES_PER_PERCENT: u32 = 10_000;

/// The validation period and weight being staked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub node_id: NodeId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub weight: Amount,
}

impl Encode for Validator {
    fn encode(&self, w: &mut Writer) {
        self.node_id.encode(w);
        w.u64(self.start.as_secs())
            .u64(self.end.as_secs())
            .amount(self.weight);
    }
}

impl Decode for Validator {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let validator = Self {
            node_id: NodeId::decode(r)?,
            start: Timestamp::new(r.u64()?),
            end: Timestamp::new(r.u64()?),
            weight: r.amount()?,
        };
        if validator.end <= validator.start {
            return Err(TransactionError::InvalidField(
                "validation period ends before it starts".into(),
            ));
        }
        Ok(validator)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddValidatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    /// Outputs bonded for the validation period.
    pub stake: Vec<TransferableOutput>,
    pub rewards_owner: OutputOwners,
    /// Delegation fee in parts per million.
    pub shares: u32,
}

impl Encode for AddValidatorTx {
    fn encode(&self, w: &mut Writer) {
        self.base.encode(w);
        self.validator.encode(w);
        self.stake.encode(w);
        self.rewards_owner.encode(w);
        w.u32(self.shares);
    }
}

impl Decode for AddValidatorTx {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let tx = Self {
            base: BaseTx::decode(r)?,
            validator: Validator::decode(r)?,
            stake: Vec::decode(r)?,
            rewards_owner: OutputOwners::decode(r)?,
            shares: r.u32()?,
        };
        if tx.shares > 100 * SHARES_PER_PERCENT {
            return Err(TransactionError::InvalidField(format!(
                "delegation shares {} above 100%",
                tx.shares
            )));
        }
        Ok(tx)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDelegatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub stake: Vec<TransferableOutput>,
    pub rewards_owner: OutputOwners,
}

impl Encode for AddDelegatorTx {
    fn encode(&self, w: &mut Writer) {
        self.base.encode(w);
        self.validator.encode(w);
        self.stake.encode(w);
        self.rewards_owner.encode(w);
    }
}

impl Decode for AddDelegatorTx {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        Ok(Self {
            base: BaseTx::decode(r)?,
            validator: Validator::decode(r)?,
            stake: Vec::decode(r)?,
            rewards_owner: OutputOwners::decode(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_period_rejected() {
        let v = Validator {
            node_id: NodeId::new([1u8; 20]),
            start: Timestamp::new(200),
            end: Timestamp::new(100),
            weight: Amount::new(5),
        };
        assert!(matches!(
            Validator::from_bytes(&v.to_bytes()),
            Err(TransactionError::InvalidField(_))
        ));
    }

    #[test]
    fn validator_layout_is_fixed_width() {
        let v = Validator {
            node_id: NodeId::new([1u8; 20]),
            start: Timestamp::new(100),
            end: Timestamp::new(200),
            weight: Amount::new(5),
        };
        assert_eq!(v.to_bytes().len(), 20 + 8 + 8 + 16);
    }
}
