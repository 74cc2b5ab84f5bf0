//! Fundamental types for the Trio wallet engine.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: amounts, 32- and 20-byte identifiers, chain families, timestamps,
//! key containers, unspent outputs, and the staking records reported by the
//! staking chain.

pub mod amount;
pub mod chain;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod keys;
pub mod network;
pub mod staking;
pub mod time;
pub mod utxo;

pub use amount::{Amount, NANO_PER_UNIT};
pub use chain::{ChainFamily, UtxoChain};
pub use encoding::{cb58_decode, cb58_decode_fixed, cb58_encode, checksum, strip_checksum, with_checksum};
pub use error::TypesError;
pub use hash::{AssetId, ChainId, EvmAddress, ShortId, TxId};
pub use keys::{PrivateKey, PublicKey, RecoverableSignature};
pub use network::NetworkId;
pub use staking::{DelegatorRecord, DelegatorStatus, MinStake, NodeId, PendingSet, ValidatorRecord};
pub use time::Timestamp;
pub use utxo::{Output, OutputOwners, Utxo, UtxoFlags, UtxoId, UtxoSet};
