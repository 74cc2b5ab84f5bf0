//! BIP39 mnemonic generation and secp256k1 secret derivation.
//!
//! The mnemonic is normalised into its 64-byte BIP39 seed, the BIP32 master
//! key is derived from that seed, and the child at `m/44'/9000'/0'/0/0`
//! becomes the wallet secret. Any BIP32 wallet given the same phrase and
//! path arrives at the same key.

use bip39::Mnemonic;
use coins_bip32::path::DerivationPath;
use coins_bip32::prelude::XPriv;
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use trio_types::PrivateKey;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// BIP44 derivation path used for every chain family.
pub const DERIVATION_PATH: &str = "m/44'/9000'/0'/0/0";

/// Generate a new 24-word BIP39 mnemonic from 256-bit entropy.
pub fn generate_mnemonic() -> Result<String, CryptoError> {
    let mut entropy = Zeroizing::new([0u8; 32]);
    OsRng.fill_bytes(entropy.as_mut());
    let mnemonic = Mnemonic::from_entropy(entropy.as_ref())
        .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;
    Ok(mnemonic.to_string())
}

/// Derive the wallet secret from a BIP39 phrase (empty passphrase).
pub fn secret_from_mnemonic(phrase: &str) -> Result<PrivateKey, CryptoError> {
    let mnemonic = Mnemonic::parse_normalized(phrase)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    let seed = Zeroizing::new(mnemonic.to_seed_normalized(""));
    secret_from_seed(seed.as_ref(), DERIVATION_PATH)
}

/// BIP32 child secret of `seed` at `path`.
pub fn secret_from_seed(seed: &[u8], path: &str) -> Result<PrivateKey, CryptoError> {
    let path = path
        .parse::<DerivationPath>()
        .map_err(|e| CryptoError::DerivationFailed(format!("bad path {path}: {e}")))?;
    let master = XPriv::root_from_seed(seed, None)
        .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;
    let child = master
        .derive_path(&path)
        .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;
    let signing_key: &SigningKey = child.as_ref();
    Ok(PrivateKey(signing_key.to_bytes().into()))
}

/// Validate that a mnemonic phrase is a valid BIP39 mnemonic.
pub fn validate_mnemonic(mnemonic: &str) -> bool {
    Mnemonic::parse_normalized(mnemonic).is_ok()
}
