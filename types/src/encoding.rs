//! cb58 encoding and the 4-byte integrity checksum.
//!
//! cb58 is base58 over `payload ‖ checksum(payload)`, where the checksum is the
//! last four bytes of SHA-256(payload). The same checksum is appended to signed
//! transaction bytes before they are submitted to a UTXO chain.

use sha2::{Digest, Sha256};

use crate::error::TypesError;

/// Length of the integrity checksum in bytes.
pub const CHECKSUM_LEN: usize = 4;

/// The last four bytes of SHA-256(`bytes`).
pub fn checksum(bytes: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    out
}

/// `bytes` followed by its checksum.
pub fn with_checksum(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + CHECKSUM_LEN);
    out.extend_from_slice(bytes);
    out.extend_from_slice(&checksum(bytes));
    out
}

/// Split `payload ‖ checksum` and verify the checksum.
pub fn strip_checksum(bytes: &[u8]) -> Result<&[u8], TypesError> {
    if bytes.len() < CHECKSUM_LEN {
        return Err(TypesError::InvalidLength {
            expected: CHECKSUM_LEN,
            actual: bytes.len(),
        });
    }
    let (payload, sum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if checksum(payload) != sum {
        return Err(TypesError::ChecksumMismatch);
    }
    Ok(payload)
}

pub fn cb58_encode(bytes: &[u8]) -> String {
    bs58::encode(with_checksum(bytes)).into_string()
}

pub fn cb58_decode(s: &str) -> Result<Vec<u8>, TypesError> {
    let raw = bs58::decode(s)
        .into_vec()
        .map_err(|e| TypesError::InvalidCb58(e.to_string()))?;
    strip_checksum(&raw).map(<[u8]>::to_vec)
}

/// Decode a cb58 string that must hold exactly `N` payload bytes.
pub fn cb58_decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], TypesError> {
    let payload = cb58_decode(s)?;
    payload
        .as_slice()
        .try_into()
        .map_err(|_| TypesError::InvalidLength {
            expected: N,
            actual: payload.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cb58_roundtrip() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x42];
        let encoded = cb58_encode(&data);
        assert_eq!(cb58_decode(&encoded).unwrap(), data);
    }

    #[test]
    fn corrupted_cb58_rejected() {
        let mut encoded = cb58_encode(&[7u8; 32]);
        let last = encoded.pop().unwrap();
        encoded.push(if last == '2' { '3' } else { '2' });
        assert!(cb58_decode(&encoded).is_err());
    }

    #[test]
    fn fixed_length_enforced() {
        let encoded = cb58_encode(&[1u8; 20]);
        assert!(cb58_decode_fixed::<20>(&encoded).is_ok());
        assert_eq!(
            cb58_decode_fixed::<32>(&encoded),
            Err(TypesError::InvalidLength {
                expected: 32,
                actual: 20
            })
        );
    }

    #[test]
    fn checksum_is_sha256_tail() {
        let digest = Sha256::digest(b"trio");
        assert_eq!(checksum(b"trio"), digest[28..32]);
    }

    #[test]
    fn strip_checksum_detects_tampering() {
        let mut framed = with_checksum(b"payload");
        assert_eq!(strip_checksum(&framed).unwrap(), b"payload");
        framed[0] ^= 1;
        assert_eq!(strip_checksum(&framed), Err(TypesError::ChecksumMismatch));
    }
}
