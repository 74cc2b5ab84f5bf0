//! Calldata for the token contracts the wallet talks to.

use trio_crypto::keccak256;
use trio_types::{Amount, EvmAddress};

use crate::error::TransactionError;

pub const ERC20_TRANSFER: &str = "transfer(address,uint256)";
pub const ERC721_SAFE_TRANSFER_FROM: &str = "safeTransferFrom(address,address,uint256)";

/// First four bytes of Keccak-256 of the function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn address_word(address: &EvmAddress) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

pub fn uint_word(value: Amount) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.raw().to_be_bytes());
    word
}

/// Parse a `uint256` from decimal or `0x` hex.
pub fn parse_uint_word(s: &str) -> Result<[u8; 32], TransactionError> {
    let s = s.trim();
    let invalid = || TransactionError::InvalidField(format!("not a uint256: {s:?}"));
    if let Some(digits) = s.strip_prefix("0x") {
        if digits.is_empty() || digits.len() > 64 {
            return Err(invalid());
        }
        let padded = format!("{digits:0>64}");
        let bytes = hex::decode(padded).map_err(|_| invalid())?;
        let mut word = [0u8; 32];
        word.copy_from_slice(&bytes);
        return Ok(word);
    }
    if s.is_empty() {
        return Err(invalid());
    }
    let mut word = [0u8; 32];
    for c in s.chars() {
        let digit = c.to_digit(10).ok_or_else(invalid)?;
        let mut carry = digit;
        for byte in word.iter_mut().rev() {
            let v = (*byte as u32) * 10 + carry;
            *byte = v as u8;
            carry = v >> 8;
        }
        if carry != 0 {
            return Err(TransactionError::Overflow);
        }
    }
    Ok(word)
}

fn call(signature: &str, words: &[[u8; 32]]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32 * words.len());
    data.extend_from_slice(&selector(signature));
    for word in words {
        data.extend_from_slice(word);
    }
    data
}

pub fn erc20_transfer(to: &EvmAddress, amount: Amount) -> Vec<u8> {
    call(ERC20_TRANSFER, &[address_word(to), uint_word(amount)])
}

pub fn erc721_safe_transfer_from(from: &EvmAddress, to: &EvmAddress, token_id: [u8; 32]) -> Vec<u8> {
    call(
        ERC721_SAFE_TRANSFER_FROM,
        &[address_word(from), address_word(to), token_id],
    )
}
