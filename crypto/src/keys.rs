//! secp256k1 secret import, export and generation.
//!
//! A secret is accepted either as `PrivateKey-<cb58(32 bytes)>` or as 64 hex
//! digits (with or without `0x`). Both forms must decode to a scalar in
//! `[1, n)` for the secp256k1 group order `n`.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use trio_types::{cb58_decode_fixed, cb58_encode, PrivateKey, PublicKey};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Prefix of the textual secret form.
pub const SECRET_PREFIX: &str = "PrivateKey-";

/// Parse a secret in either accepted form and check that it is a valid scalar.
pub fn import_secret(secret: &str) -> Result<PrivateKey, CryptoError> {
    let secret = secret.trim();
    let bytes: [u8; 32] = match secret.strip_prefix(SECRET_PREFIX) {
        Some(encoded) => cb58_decode_fixed::<32>(encoded)
            .map_err(|e| CryptoError::InvalidSecret(e.to_string()))?,
        None => {
            let digits = secret.strip_prefix("0x").unwrap_or(secret);
            let raw = Zeroizing::new(hex::decode(digits).map_err(|_| {
                CryptoError::InvalidSecret("expected PrivateKey-<cb58> or 64 hex digits".into())
            })?);
            raw.as_slice().try_into().map_err(|_| {
                CryptoError::InvalidSecret(format!("secret must be 32 bytes, got {}", raw.len()))
            })?
        }
    };
    let private = PrivateKey(bytes);
    signing_key(&private)?;
    Ok(private)
}

/// The canonical `PrivateKey-<cb58>` form of a secret.
pub fn export_secret(private: &PrivateKey) -> String {
    format!("{SECRET_PREFIX}{}", cb58_encode(&private.0))
}

/// Generate a fresh secret from the OS random source.
pub fn generate_secret() -> PrivateKey {
    loop {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let candidate = PrivateKey(bytes);
        if signing_key(&candidate).is_ok() {
            return candidate;
        }
    }
}

/// The compressed public key for a secret.
pub fn public_from_private(private: &PrivateKey) -> Result<PublicKey, CryptoError> {
    let key = signing_key(private)?;
    let point = key.verifying_key().to_encoded_point(true);
    let bytes: [u8; 33] = point
        .as_bytes()
        .try_into()
        .map_err(|_| CryptoError::InvalidSecret("unexpected public key encoding".into()))?;
    Ok(PublicKey(bytes))
}

pub(crate) fn signing_key(private: &PrivateKey) -> Result<SigningKey, CryptoError> {
    SigningKey::from_slice(&private.0)
        .map_err(|_| CryptoError::InvalidSecret("scalar out of range".into()))
}
