//! The three chain families a wallet spans.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// The ledger a key bundle, address or transaction belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChainFamily {
    /// UTXO-model chain for asset transfers and NFTs.
    Exchange,
    /// UTXO-model chain holding validator and delegator stake.
    Staking,
    /// Account-model chain for contract calls.
    Account,
}

impl ChainFamily {
    pub const ALL: [ChainFamily; 3] = [Self::Exchange, Self::Staking, Self::Account];

    /// Single-letter alias used as the address prefix (`X-`, `P-`, `C-`).
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Exchange => "X",
            Self::Staking => "P",
            Self::Account => "C",
        }
    }

    pub fn as_utxo(&self) -> Option<UtxoChain> {
        match self {
            Self::Exchange => Some(UtxoChain::Exchange),
            Self::Staking => Some(UtxoChain::Staking),
            Self::Account => None,
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

impl FromStr for ChainFamily {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" | "x" => Ok(Self::Exchange),
            "P" | "p" => Ok(Self::Staking),
            "C" | "c" => Ok(Self::Account),
            other => Err(TypesError::UnknownChain(other.to_string())),
        }
    }
}

/// The subset of chain families that track unspent outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UtxoChain {
    Exchange,
    Staking,
}

impl UtxoChain {
    pub const ALL: [UtxoChain; 2] = [Self::Exchange, Self::Staking];

    pub fn family(&self) -> ChainFamily {
        match self {
            Self::Exchange => ChainFamily::Exchange,
            Self::Staking => ChainFamily::Staking,
        }
    }

    pub fn alias(&self) -> &'static str {
        self.family().alias()
    }
}

impl From<UtxoChain> for ChainFamily {
    fn from(chain: UtxoChain) -> Self {
        chain.family()
    }
}

impl fmt::Display for UtxoChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}
