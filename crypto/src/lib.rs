//! Cryptographic collaborator for the Trio wallet engine.
//!
//! - **secp256k1** (`k256`) recoverable ECDSA over 32-byte digests
//! - **SHA-256** for UTXO-chain signing digests and checksums
//! - **RIPEMD-160 ∘ SHA-256** for UTXO-chain short addresses, bech32-encoded
//! - **Keccak-256** for account-chain addresses and transaction hashes
//! - cb58 secret import/export and BIP39 mnemonic derivation

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod mnemonic;
pub mod sign;

pub use address::{address_string, evm_address, parse_address, short_id, ParsedAddress};
pub use error::CryptoError;
pub use hash::{hash160, keccak256, sha256};
pub use keys::{export_secret, generate_secret, import_secret, public_from_private, SECRET_PREFIX};
pub use mnemonic::{generate_mnemonic, secret_from_mnemonic, secret_from_seed, validate_mnemonic};
pub use sign::{recover_public, sign_digest, verify_digest};
pub use trio_types::checksum;
