//! Wallet engine for the Trio multi-chain network.
//!
//! Provides everything a wallet application needs:
//! - Key import, derivation and address encoding for all three chains
//! - UTXO snapshots with versioned reservations
//! - Transaction building for transfers, NFTs, staking and account-chain calls
//! - Signing, issuance and a state-tracked submission pipeline
//! - Validator delegation capacity

pub mod client;
pub mod clock;
pub mod config;
pub mod custody;
pub mod error;
pub mod events;
pub mod issuer;
pub mod key_manager;
pub mod pipeline;
pub mod rpc;
pub mod signer;
pub mod stake_economics;
pub mod transaction_builder;
pub mod utxo_tracker;
pub mod wallet;

pub use client::{AccountChainClient, CallRequest, PlatformClient, RpcError, TxHash, UtxoChainClient, UtxoCursor, UtxoPage};
pub use clock::{Clock, SystemClock};
pub use config::{RpcConfig, WalletConfig};
pub use custody::{KeyCustody, MnemonicWallet, SingleKeyWallet};
pub use error::WalletError;
pub use events::{EventBus, WalletEvent};
pub use issuer::{issue, Endpoints, IssuedId};
pub use key_manager::{KeyBundle, KeyManager};
pub use pipeline::{PipelineContext, Submission, TxState};
pub use rpc::{JsonRpcAccountClient, JsonRpcUtxoClient};
pub use signer::sign;
pub use stake_economics::{CapacityInput, StakeEconomicsCalculator, StakingPolicy, ValidatorCapacity};
pub use transaction_builder::{
    AccountTransfer, AccountTxParams, BuiltTx, CreateNftFamily, FeeSchedule, MintNft, NftTransferOrder,
    SpendContext, StakeRequest, TransactionBuilder, TransferOrder, TransferRequest, ValidatorRequest,
};
pub use utxo_tracker::{SnapshotStamp, UtxoSnapshot, UtxoTracker};
pub use wallet::Wallet;
