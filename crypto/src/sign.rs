//! Recoverable secp256k1 signatures over 32-byte digests.
//!
//! Both UTXO and account chains sign a digest rather than the message itself;
//! the caller chooses the hash (SHA-256 or Keccak-256). Signatures are low-S
//! normalised and carry the recovery id in the last byte.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use trio_types::{PrivateKey, PublicKey, RecoverableSignature};

use crate::error::CryptoError;
use crate::keys::signing_key;

/// Sign a 32-byte digest, returning `r ‖ s ‖ recovery_id`.
pub fn sign_digest(
    digest: &[u8; 32],
    private: &PrivateKey,
) -> Result<RecoverableSignature, CryptoError> {
    let key = signing_key(private)?;
    let (sig, recid) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = recid.to_byte();
    Ok(RecoverableSignature(out))
}

/// Recover the compressed public key that produced `signature` over `digest`.
pub fn recover_public(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<PublicKey, CryptoError> {
    let sig = Signature::from_slice(&signature.0[..64])
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let recid = RecoveryId::from_byte(signature.recovery_id())
        .ok_or_else(|| CryptoError::InvalidSignature("recovery id out of range".into()))?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recid)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let point = key.to_encoded_point(true);
    let bytes: [u8; 33] = point
        .as_bytes()
        .try_into()
        .map_err(|_| CryptoError::InvalidSignature("unexpected key encoding".into()))?;
    Ok(PublicKey(bytes))
}

/// Whether `signature` over `digest` was produced by `public`.
pub fn verify_digest(digest: &[u8; 32], signature: &RecoverableSignature, public: &PublicKey) -> bool {
    recover_public(digest, signature)
        .map(|recovered| &recovered == public)
        .unwrap_or(false)
}
