//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the wallet (clock, exchange/staking chain
//! node, account chain node) is abstracted behind a trait in
//! `trio-wallet-core`. This crate provides test-friendly implementations that:
//! - Return deterministic, programmable values
//! - Record what was sent to them for later assertions
//! - Can be told to fail on demand
//! - Never touch the network
//!
//! Usage: hand these to `Wallet::with_*` in place of the JSON-RPC clients.

pub mod account;
pub mod clock;
pub mod platform;
pub mod utxo_chain;

pub use account::NullAccountChain;
pub use clock::NullClock;
pub use platform::NullPlatform;
pub use utxo_chain::NullUtxoChain;
