//! Legacy EIP-155 transactions for the account chain.

use rlp::{Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use trio_crypto::keccak256;
use trio_types::{Amount, EvmAddress, RecoverableSignature};

use crate::error::TransactionError;

/// Gas limit of a plain native-value transfer.
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmTx {
    pub nonce: u64,
    pub gas_price: Amount,
    pub gas_limit: u64,
    pub to: EvmAddress,
    pub value: Amount,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl EvmTx {
    fn append_body(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price.to_be_bytes_trimmed());
        s.append(&self.gas_limit);
        s.append(&self.to.as_bytes().to_vec());
        s.append(&self.value.to_be_bytes_trimmed());
        s.append(&self.data);
    }

    /// RLP(nonce, gasPrice, gas, to, value, data, chainId, 0, 0).
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(9);
        self.append_body(&mut s);
        s.append(&self.chain_id);
        s.append(&0u8);
        s.append(&0u8);
        s.out().to_vec()
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEvmTx {
    pub tx: EvmTx,
    pub v: u64,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl SignedEvmTx {
    /// Attach a recoverable signature over [`EvmTx::signing_hash`], folding the
    /// chain id into `v`.
    pub fn from_signature(tx: EvmTx, signature: &RecoverableSignature) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(signature.r());
        s.copy_from_slice(signature.s());
        let v = signature.recovery_id() as u64 + 35 + 2 * tx.chain_id;
        Self { tx, v, r, s }
    }

    /// The 65-byte signature with the EIP-155 offset removed from `v`.
    pub fn signature(&self) -> Result<RecoverableSignature, TransactionError> {
        let recid = self
            .v
            .checked_sub(35 + 2 * self.tx.chain_id)
            .filter(|id| *id <= 1)
            .ok_or_else(|| {
                TransactionError::InvalidField(format!(
                    "v {} does not match chain id {}",
                    self.v, self.tx.chain_id
                ))
            })?;
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = recid as u8;
        Ok(RecoverableSignature(bytes))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(9);
        self.tx.append_body(&mut s);
        s.append(&self.v);
        s.append(&trim_leading_zeros(&self.r));
        s.append(&trim_leading_zeros(&self.s));
        s.out().to_vec()
    }

    /// Decode raw signed bytes. The chain id is recovered from `v`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let rlp = Rlp::new(bytes);
        let info = rlp.payload_info()?;
        let total = info.header_len + info.value_len;
        if total != bytes.len() {
            return Err(TransactionError::TrailingBytes(bytes.len().saturating_sub(total)));
        }
        if !rlp.is_list() || rlp.item_count()? != 9 {
            return Err(TransactionError::Rlp("expected a 9-item list".into()));
        }
        let to: Vec<u8> = rlp.val_at(3)?;
        let to: [u8; 20] = to.as_slice().try_into().map_err(|_| {
            TransactionError::InvalidField(format!("destination of {} bytes", to.len()))
        })?;
        let v: u64 = rlp.val_at(6)?;
        if v < 35 {
            return Err(TransactionError::InvalidField(format!(
                "v {v} is not an EIP-155 value"
            )));
        }
        let tx = EvmTx {
            nonce: rlp.val_at(0)?,
            gas_price: amount_from_be(&rlp.val_at::<Vec<u8>>(1)?)?,
            gas_limit: rlp.val_at(2)?,
            to: EvmAddress::new(to),
            value: amount_from_be(&rlp.val_at::<Vec<u8>>(4)?)?,
            data: rlp.val_at(5)?,
            chain_id: (v - 35) / 2,
        };
        Ok(Self {
            tx,
            v,
            r: word_from_be(&rlp.val_at::<Vec<u8>>(7)?)?,
            s: word_from_be(&rlp.val_at::<Vec<u8>>(8)?)?,
        })
    }

    /// Keccak-256 of the signed bytes: the account-chain transaction hash.
    pub fn hash(&self) -> [u8; 32] {
        keccak256(&self.to_bytes())
    }

    /// `0x`-prefixed hex of the signed bytes, as `eth_sendRawTransaction`
    /// expects.
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

fn check_integer(bytes: &[u8], max: usize) -> Result<(), TransactionError> {
    if bytes.len() > max {
        return Err(TransactionError::Overflow);
    }
    if bytes.first() == Some(&0) {
        return Err(TransactionError::Rlp("integer has leading zero".into()));
    }
    Ok(())
}

fn amount_from_be(bytes: &[u8]) -> Result<Amount, TransactionError> {
    check_integer(bytes, 16)?;
    let mut buf = [0u8; 16];
    buf[16 - bytes.len()..].copy_from_slice(bytes);
    Ok(Amount::new(u128::from_be_bytes(buf)))
}

fn word_from_be(bytes: &[u8]) -> Result<[u8; 32], TransactionError> {
    check_integer(bytes, 32)?;
    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(buf)
}
