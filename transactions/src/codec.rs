//! Canonical binary codec for UTXO-chain transactions and outputs.
//!
//! Every integer is big-endian and amounts are `u64`. Variable-length byte strings carry a `u32`
//! length prefix (names and symbols a `u16` one), collections a `u32` count,
//! and polymorphic values a `u32` type id ahead of their body. A top-level
//! value starts with the `u16` codec version.

use trio_types::{Amount, AssetId, ChainId, NodeId, ShortId, TxId};

use crate::error::TransactionError;

pub const CODEC_VERSION: u16 = 0;

/// Upper bound on any decoded collection count.
pub const MAX_COLLECTION_LEN: usize = 1 << 16;

/// Widest amount the `u64` wire field carries.
pub const MAX_ENCODED_AMOUNT: Amount = Amount::new(u64::MAX as u128);

/// Upper bound on any decoded byte string.
pub const MAX_BYTES_LEN: usize = 1 << 20;

/// Type ids of polymorphic values.
pub mod type_id {
    pub const BASE_TX: u32 = 0x00;
    pub const CREATE_ASSET_TX: u32 = 0x01;
    pub const OPERATION_TX: u32 = 0x02;
    pub const SECP_TRANSFER_INPUT: u32 = 0x05;
    pub const SECP_TRANSFER_OUTPUT: u32 = 0x07;
    pub const SECP_CREDENTIAL: u32 = 0x09;
    pub const NFT_MINT_OUTPUT: u32 = 0x0a;
    pub const NFT_TRANSFER_OUTPUT: u32 = 0x0b;
    pub const NFT_MINT_OP: u32 = 0x0c;
    pub const NFT_TRANSFER_OP: u32 = 0x0d;
    pub const NFT_CREDENTIAL: u32 = 0x0e;
    pub const ADD_VALIDATOR_TX: u32 = 0x0c;
    pub const ADD_DELEGATOR_TX: u32 = 0x0e;
}

#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Saturates above [`MAX_ENCODED_AMOUNT`]; built transactions never get
    /// here with such a value since `validate_structure` rejects it.
    pub fn amount(&mut self, v: Amount) -> &mut Self {
        self.u64(u64::try_from(v.raw()).unwrap_or(u64::MAX))
    }

    /// Raw bytes with no length prefix.
    pub fn fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// `u32` length prefix, then the bytes.
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.u32(bytes.len() as u32);
        self.fixed(bytes)
    }

    /// `u16` length prefix, then the bytes.
    pub fn short_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.u16(bytes.len() as u16);
        self.fixed(bytes)
    }

    pub fn count(&mut self, n: usize) -> &mut Self {
        self.u32(n as u32)
    }

    pub fn u32s(&mut self, values: &[u32]) -> &mut Self {
        self.count(values.len());
        for v in values {
            self.u32(*v);
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TransactionError> {
        if self.remaining() < n {
            return Err(TransactionError::Truncated {
                needed: n,
                offset: self.pos,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], TransactionError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, TransactionError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, TransactionError> {
        self.array().map(u16::from_be_bytes)
    }

    pub fn u32(&mut self) -> Result<u32, TransactionError> {
        self.array().map(u32::from_be_bytes)
    }

    pub fn u64(&mut self) -> Result<u64, TransactionError> {
        self.array().map(u64::from_be_bytes)
    }

    pub fn amount(&mut self) -> Result<Amount, TransactionError> {
        self.u64().map(|v| Amount::new(u128::from(v)))
    }

    pub fn bytes(&mut self) -> Result<Vec<u8>, TransactionError> {
        let len = self.u32()? as usize;
        if len > MAX_BYTES_LEN {
            return Err(TransactionError::TooLarge {
                len,
                limit: MAX_BYTES_LEN,
            });
        }
        self.take(len).map(<[u8]>::to_vec)
    }

    pub fn short_bytes(&mut self) -> Result<Vec<u8>, TransactionError> {
        let len = self.u16()? as usize;
        self.take(len).map(<[u8]>::to_vec)
    }

    pub fn count(&mut self) -> Result<usize, TransactionError> {
        let len = self.u32()? as usize;
        if len > MAX_COLLECTION_LEN {
            return Err(TransactionError::TooLarge {
                len,
                limit: MAX_COLLECTION_LEN,
            });
        }
        Ok(len)
    }

    pub fn u32s(&mut self) -> Result<Vec<u32>, TransactionError> {
        let n = self.count()?;
        (0..n).map(|_| self.u32()).collect()
    }

    /// Read and check the leading codec version.
    pub fn codec_version(&mut self) -> Result<(), TransactionError> {
        match self.u16()? {
            CODEC_VERSION => Ok(()),
            other => Err(TransactionError::UnsupportedCodec(other)),
        }
    }

    /// Fail if any input is left unread.
    pub fn finish(self) -> Result<(), TransactionError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(TransactionError::TrailingBytes(n)),
        }
    }
}

pub trait Encode {
    fn encode(&self, w: &mut Writer);

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.encode(&mut w);
        w.into_bytes()
    }
}

pub trait Decode: Sized {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError>;

    /// Decode a value that must span all of `bytes`.
    fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut r = Reader::new(bytes);
        let value = Self::decode(&mut r)?;
        r.finish()?;
        Ok(value)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, w: &mut Writer) {
        w.count(self.len());
        for item in self {
            item.encode(w);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let n = r.count()?;
        (0..n).map(|_| T::decode(r)).collect()
    }
}

macro_rules! fixed_id_codec {
    ($($ty:ty => $len:literal),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, w: &mut Writer) {
                    w.fixed(self.as_bytes());
                }
            }

            impl Decode for $ty {
                fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
                    r.array::<$len>().map(<$ty>::new)
                }
            }
        )*
    };
}

fixed_id_codec!(
    TxId => 32,
    AssetId => 32,
    ChainId => 32,
    ShortId => 20,
    NodeId => 20,
);
