//! Transaction model for the Trio wallet engine.
//!
//! Transaction types:
//! - **Base**: move fungible assets on the exchange chain
//! - **CreateAsset**: create an NFT family with one minter per group
//! - **Operation**: mint NFT instances or transfer them
//! - **AddValidator** / **AddDelegator**: bond stake on the staking chain
//! - **EvmTx**: legacy EIP-155 transaction on the account chain
//!
//! UTXO-chain transactions use the canonical codec in [`codec`]; account-chain
//! transactions use RLP.

pub mod abi;
pub mod account;
pub mod codec;
pub mod components;
pub mod error;
pub mod exchange;
pub mod staking;
pub mod validation;

use serde::{Deserialize, Serialize};
use trio_crypto::sha256;
use trio_types::encoding::{strip_checksum, with_checksum};
use trio_types::{ChainFamily, TxId, UtxoChain};

pub use account::{EvmTx, SignedEvmTx};
pub use codec::{Decode, Encode, Reader, Writer};
pub use components::{Credential, CredentialKind, TransferableInput, TransferableOutput};
pub use error::TransactionError;
pub use exchange::{BaseTx, CreateAssetTx, InitialState, Operation, OperationTx, TransferableOperation};
pub use staking::{AddDelegatorTx, AddValidatorTx, Validator};

use codec::{type_id, CODEC_VERSION};

/// An unsigned transaction on one of the UTXO chains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UtxoTx {
    Base(BaseTx),
    CreateAsset(CreateAssetTx),
    Operation(OperationTx),
    AddValidator(AddValidatorTx),
    AddDelegator(AddDelegatorTx),
}

impl UtxoTx {
    pub fn chain(&self) -> UtxoChain {
        match self {
            Self::Base(_) | Self::CreateAsset(_) | Self::Operation(_) => UtxoChain::Exchange,
            Self::AddValidator(_) | Self::AddDelegator(_) => UtxoChain::Staking,
        }
    }

    pub fn base(&self) -> &BaseTx {
        match self {
            Self::Base(tx) => tx,
            Self::CreateAsset(tx) => &tx.base,
            Self::Operation(tx) => &tx.base,
            Self::AddValidator(tx) => &tx.base,
            Self::AddDelegator(tx) => &tx.base,
        }
    }

    pub fn operations(&self) -> &[TransferableOperation] {
        match self {
            Self::Operation(tx) => &tx.operations,
            _ => &[],
        }
    }

    /// Outputs bonded by a staking transaction.
    pub fn stake_outputs(&self) -> &[TransferableOutput] {
        match self {
            Self::AddValidator(tx) => &tx.stake,
            Self::AddDelegator(tx) => &tx.stake,
            _ => &[],
        }
    }

    /// Number of credentials a signed form must carry: one per input, then
    /// one per operation.
    pub fn credential_count(&self) -> usize {
        self.base().inputs.len() + self.operations().len()
    }

    fn type_id(&self) -> u32 {
        match self {
            Self::Base(_) => type_id::BASE_TX,
            Self::CreateAsset(_) => type_id::CREATE_ASSET_TX,
            Self::Operation(_) => type_id::OPERATION_TX,
            Self::AddValidator(_) => type_id::ADD_VALIDATOR_TX,
            Self::AddDelegator(_) => type_id::ADD_DELEGATOR_TX,
        }
    }
}

impl Encode for UtxoTx {
    fn encode(&self, w: &mut Writer) {
        w.u16(CODEC_VERSION).u32(self.type_id());
        match self {
            Self::Base(tx) => tx.encode(w),
            Self::CreateAsset(tx) => tx.encode(w),
            Self::Operation(tx) => tx.encode(w),
            Self::AddValidator(tx) => tx.encode(w),
            Self::AddDelegator(tx) => tx.encode(w),
        }
    }
}

impl Decode for UtxoTx {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        r.codec_version()?;
        match r.u32()? {
            type_id::BASE_TX => BaseTx::decode(r).map(Self::Base),
            type_id::CREATE_ASSET_TX => CreateAssetTx::decode(r).map(Self::CreateAsset),
            type_id::OPERATION_TX => OperationTx::decode(r).map(Self::Operation),
            type_id::ADD_VALIDATOR_TX => AddValidatorTx::decode(r).map(Self::AddValidator),
            type_id::ADD_DELEGATOR_TX => AddDelegatorTx::decode(r).map(Self::AddDelegator),
            id => Err(TransactionError::UnknownTypeId {
                what: "transaction",
                id,
            }),
        }
    }
}

/// A UTXO-chain transaction with its credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUtxoTx {
    pub unsigned: UtxoTx,
    pub credentials: Vec<Credential>,
}

impl SignedUtxoTx {
    /// SHA-256 of the signed bytes.
    pub fn id(&self) -> TxId {
        TxId::new(sha256(&self.to_bytes()))
    }

    /// Signed bytes plus checksum, hex-encoded with a `0x` prefix: the form
    /// `issueTx` accepts.
    pub fn issue_payload(&self) -> String {
        format!("0x{}", hex::encode(with_checksum(&self.to_bytes())))
    }

    /// Inverse of [`SignedUtxoTx::issue_payload`]. The checksum is verified.
    pub fn from_issue_payload(payload: &str) -> Result<Self, TransactionError> {
        let digits = payload.strip_prefix("0x").unwrap_or(payload);
        let raw = hex::decode(digits).map_err(|e| TransactionError::InvalidField(e.to_string()))?;
        Self::from_bytes(strip_checksum(&raw)?)
    }
}

impl Encode for SignedUtxoTx {
    fn encode(&self, w: &mut Writer) {
        self.unsigned.encode(w);
        self.credentials.encode(w);
    }
}

impl Decode for SignedUtxoTx {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        Ok(Self {
            unsigned: UtxoTx::decode(r)?,
            credentials: Vec::decode(r)?,
        })
    }
}

/// Any unsigned transaction the wallet can build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnsignedTx {
    Utxo(UtxoTx),
    Account(EvmTx),
}

impl UnsignedTx {
    pub fn family(&self) -> ChainFamily {
        match self {
            Self::Utxo(tx) => tx.chain().family(),
            Self::Account(_) => ChainFamily::Account,
        }
    }
}

/// Any signed transaction ready for issuance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignedTx {
    Utxo(SignedUtxoTx),
    Account(SignedEvmTx),
}

impl SignedTx {
    pub fn family(&self) -> ChainFamily {
        match self {
            Self::Utxo(tx) => tx.unsigned.chain().family(),
            Self::Account(_) => ChainFamily::Account,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trio_types::{Amount, AssetId, ChainId, OutputOwners, RecoverableSignature, ShortId, UtxoId};

    fn signed_base() -> SignedUtxoTx {
        let asset = AssetId::new([1u8; 32]);
        SignedUtxoTx {
            unsigned: UtxoTx::Base(BaseTx {
                network_id: 5,
                blockchain_id: ChainId::new([2u8; 32]),
                outputs: vec![TransferableOutput::transfer(
                    asset,
                    Amount::new(40),
                    OutputOwners::single(ShortId::new([3u8; 20])),
                )],
                inputs: vec![TransferableInput {
                    utxo_id: UtxoId::new(TxId::new([4u8; 32]), 0),
                    asset_id: asset,
                    amount: Amount::new(50),
                    sig_indices: vec![0],
                }],
                memo: Vec::new(),
            }),
            credentials: vec![Credential {
                kind: CredentialKind::Secp,
                signatures: vec![RecoverableSignature([9u8; 65])],
            }],
        }
    }

    #[test]
    fn signed_bytes_start_with_unsigned_bytes() {
        let signed = signed_base();
        let unsigned = signed.unsigned.to_bytes();
        let full = signed.to_bytes();
        assert!(full.starts_with(&unsigned));
        assert_eq!(&full[..2], &CODEC_VERSION.to_be_bytes());
    }

    #[test]
    fn issue_payload_strips_back_to_signed_bytes() {
        let signed = signed_base();
        let payload = signed.issue_payload();
        assert!(payload.starts_with("0x"));
        let decoded = SignedUtxoTx::from_issue_payload(&payload).unwrap();
        assert_eq!(decoded.to_bytes(), signed.to_bytes());
        assert_eq!(decoded.id(), signed.id());
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let mut payload = signed_base().issue_payload();
        let last = payload.pop().unwrap();
        payload.push(if last == '0' { '1' } else { '0' });
        assert!(matches!(
            SignedUtxoTx::from_issue_payload(&payload),
            Err(TransactionError::Types(_))
        ));
    }

    #[test]
    fn families() {
        let signed = signed_base();
        assert_eq!(signed.unsigned.chain(), UtxoChain::Exchange);
        assert_eq!(SignedTx::Utxo(signed).family(), ChainFamily::Exchange);
    }
}
