//! Network identifier.

use serde::{Deserialize, Serialize};

/// Identifies which network the wallet talks to. The numeric id is written
/// into every UTXO-chain transaction; the hrp is the bech32 human-readable
/// part of UTXO-chain addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
    /// Local development network.
    Local,
}

impl NetworkId {
    pub fn id(&self) -> u32 {
        match self {
            Self::Mainnet => 1,
            Self::Testnet => 5,
            Self::Local => 12345,
        }
    }

    /// Default bech32 human-readable part.
    pub fn hrp(&self) -> &'static str {
        match self {
            Self::Mainnet => "trio",
            Self::Testnet => "test",
            Self::Local => "local",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Local => "local",
        }
    }
}
