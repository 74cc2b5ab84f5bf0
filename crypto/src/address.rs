//! Address derivation for the three chain families.
//!
//! UTXO chains: `<alias>-<bech32(hrp, RIPEMD160(SHA256(compressed pubkey)))>`,
//! e.g. `X-trio1...` and `P-trio1...`. The 20-byte payload is the
//! [`ShortId`] written into output owner lists.
//!
//! Account chain: `0x` + the low-order 20 bytes of Keccak-256 over the
//! 64-byte uncompressed public key (SEC1 encoding without the `0x04` tag).

use bech32::{Bech32, Hrp};
use k256::ecdsa::VerifyingKey;
use trio_types::{ChainFamily, EvmAddress, PublicKey, ShortId};

use crate::error::CryptoError;
use crate::hash::{hash160, keccak256};

/// The short id owning UTXO-chain outputs for a public key.
pub fn short_id(public: &PublicKey) -> ShortId {
    ShortId::new(hash160(public.as_bytes()))
}

/// The account-chain address for a public key.
pub fn evm_address(public: &PublicKey) -> Result<EvmAddress, CryptoError> {
    let key = VerifyingKey::from_sec1_bytes(public.as_bytes())
        .map_err(|e| CryptoError::InvalidAddress(format!("bad public key: {e}")))?;
    let uncompressed = key.to_encoded_point(false);
    let hash = keccak256(&uncompressed.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Ok(EvmAddress::new(out))
}

/// Format a UTXO-chain address string.
pub fn address_string(
    chain: ChainFamily,
    hrp: &str,
    short_id: &ShortId,
) -> Result<String, CryptoError> {
    let hrp = Hrp::parse(hrp).map_err(|e| CryptoError::InvalidAddress(format!("bad hrp: {e}")))?;
    let encoded = bech32::encode::<Bech32>(hrp, short_id.as_bytes())
        .map_err(|e| CryptoError::InvalidAddress(format!("bech32 encoding failed: {e}")))?;
    Ok(format!("{}-{}", chain.alias(), encoded))
}

/// A decoded UTXO-chain address string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedAddress {
    pub chain: ChainFamily,
    pub hrp: String,
    pub short_id: ShortId,
}

/// Decode `<alias>-<bech32>` into its parts. Only structural decoding is
/// done here; whether the hrp matches the active network is the caller's
/// concern.
pub fn parse_address(address: &str) -> Result<ParsedAddress, CryptoError> {
    let (alias, encoded) = address
        .split_once('-')
        .ok_or_else(|| CryptoError::InvalidAddress(format!("missing chain alias: {address}")))?;
    let chain: ChainFamily = alias
        .parse()
        .map_err(|_| CryptoError::InvalidAddress(format!("unknown chain alias: {alias}")))?;
    let (hrp, data) = bech32::decode(encoded)
        .map_err(|e| CryptoError::InvalidAddress(format!("{address}: {e}")))?;
    let bytes: [u8; 20] = data.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidAddress(format!("{address}: payload must be 20 bytes"))
    })?;
    Ok(ParsedAddress {
        chain,
        hrp: hrp.to_lowercase(),
        short_id: ShortId::new(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{import_secret, public_from_private};

    fn public_for(hex_secret: &str) -> PublicKey {
        public_from_private(&import_secret(hex_secret).unwrap()).unwrap()
    }

    #[test]
    fn evm_address_matches_known_vector() {
        // Secret scalar 1: the generator point.
        let public = public_for(&format!("{}01", "00".repeat(31)));
        assert_eq!(
            evm_address(&public).unwrap().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn utxo_address_roundtrip() {
        let public = public_for(&"33".repeat(32));
        let short = short_id(&public);
        let text = address_string(ChainFamily::Exchange, "trio", &short).unwrap();
        assert!(text.starts_with("X-trio1"));

        let parsed = parse_address(&text).unwrap();
        assert_eq!(parsed.chain, ChainFamily::Exchange);
        assert_eq!(parsed.hrp, "trio");
        assert_eq!(parsed.short_id, short);
    }

    #[test]
    fn same_key_same_short_id_on_both_utxo_chains() {
        let public = public_for(&"44".repeat(32));
        let short = short_id(&public);
        let x = address_string(ChainFamily::Exchange, "trio", &short).unwrap();
        let p = address_string(ChainFamily::Staking, "trio", &short).unwrap();
        assert_eq!(&x[2..], &p[2..]);
    }

    #[test]
    fn malformed_addresses_rejected() {
        assert!(parse_address("trio1qqqq").is_err());
        assert!(parse_address("Z-trio1qqqq").is_err());
        assert!(parse_address("X-nonsense").is_err());
    }
}
