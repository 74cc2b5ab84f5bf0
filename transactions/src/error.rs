use thiserror::Error;
use trio_types::{Amount, AssetId, TypesError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("unexpected end of input: needed {needed} bytes at offset {offset}")]
    Truncated { needed: usize, offset: usize },

    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    #[error("unknown {what} type id {id}")]
    UnknownTypeId { what: &'static str, id: u32 },

    #[error("unsupported codec version {0}")]
    UnsupportedCodec(u16),

    #[error("collection of {len} entries exceeds limit {limit}")]
    TooLarge { len: usize, limit: usize },

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("amount overflow")]
    Overflow,

    #[error("amount {0} does not fit in 64 bits")]
    AmountTooWide(Amount),

    #[error(
        "value not conserved for asset {asset}: inputs {inputs}, outputs {outputs}, fee {fee}"
    )]
    ValueNotConserved {
        asset: AssetId,
        inputs: Amount,
        outputs: Amount,
        fee: Amount,
    },

    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error("rlp: {0}")]
    Rlp(String),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl From<rlp::DecoderError> for TransactionError {
    fn from(e: rlp::DecoderError) -> Self {
        Self::Rlp(e.to_string())
    }
}
