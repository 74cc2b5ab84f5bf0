//! Inputs, outputs and credentials shared by every UTXO transaction type.

use serde::{Deserialize, Serialize};
use trio_types::{Amount, AssetId, Output, OutputOwners, RecoverableSignature, Utxo, UtxoFlags, UtxoId};

use crate::codec::{type_id, Decode, Encode, Reader, Writer, CODEC_VERSION};
use crate::error::TransactionError;

impl Encode for OutputOwners {
    fn encode(&self, w: &mut Writer) {
        w.u64(self.locktime).u32(self.threshold);
        self.addresses.encode(w);
    }
}

impl Decode for OutputOwners {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let locktime = r.u64()?;
        let threshold = r.u32()?;
        let addresses = Vec::decode(r)?;
        if threshold as usize > addresses.len() {
            return Err(TransactionError::InvalidField(format!(
                "threshold {threshold} exceeds {} owners",
                addresses.len()
            )));
        }
        Ok(Self {
            locktime,
            threshold,
            addresses,
        })
    }
}

impl Encode for Output {
    fn encode(&self, w: &mut Writer) {
        match self {
            Output::Transfer { amount, owners } => {
                w.u32(type_id::SECP_TRANSFER_OUTPUT).amount(*amount);
                owners.encode(w);
            }
            Output::NftMint { group_id, owners } => {
                w.u32(type_id::NFT_MINT_OUTPUT).u32(*group_id);
                owners.encode(w);
            }
            Output::NftTransfer {
                group_id,
                payload,
                owners,
            } => {
                w.u32(type_id::NFT_TRANSFER_OUTPUT)
                    .u32(*group_id)
                    .bytes(payload);
                owners.encode(w);
            }
        }
    }
}

impl Decode for Output {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        match r.u32()? {
            type_id::SECP_TRANSFER_OUTPUT => {
                let amount = r.amount()?;
                if amount.is_zero() {
                    return Err(TransactionError::ZeroAmount);
                }
                Ok(Output::Transfer {
                    amount,
                    owners: OutputOwners::decode(r)?,
                })
            }
            type_id::NFT_MINT_OUTPUT => Ok(Output::NftMint {
                group_id: r.u32()?,
                owners: OutputOwners::decode(r)?,
            }),
            type_id::NFT_TRANSFER_OUTPUT => Ok(Output::NftTransfer {
                group_id: r.u32()?,
                payload: r.bytes()?,
                owners: OutputOwners::decode(r)?,
            }),
            id => Err(TransactionError::UnknownTypeId { what: "output", id }),
        }
    }
}

impl Encode for UtxoId {
    fn encode(&self, w: &mut Writer) {
        self.tx_id.encode(w);
        w.u32(self.output_index);
    }
}

impl Decode for UtxoId {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        Ok(UtxoId::new(Decode::decode(r)?, r.u32()?))
    }
}

/// A UTXO as returned by the chain's `getUTXOs`: codec version, id, asset,
/// then the output. Stake and reward flags are wallet-side metadata and
/// never appear in the bytes; a decoded UTXO carries none.
impl Encode for Utxo {
    fn encode(&self, w: &mut Writer) {
        w.u16(CODEC_VERSION);
        self.id.encode(w);
        self.asset_id.encode(w);
        self.output.encode(w);
    }
}

impl Decode for Utxo {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        r.codec_version()?;
        let id = UtxoId::decode(r)?;
        let asset_id = AssetId::decode(r)?;
        let output = Output::decode(r)?;
        Ok(Utxo {
            id,
            asset_id,
            output,
            flags: UtxoFlags::default(),
        })
    }
}

/// An output together with the asset it carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableOutput {
    pub asset_id: AssetId,
    pub output: Output,
}

impl TransferableOutput {
    pub fn transfer(asset_id: AssetId, amount: Amount, owners: OutputOwners) -> Self {
        Self {
            asset_id,
            output: Output::Transfer { amount, owners },
        }
    }
}

impl Encode for TransferableOutput {
    fn encode(&self, w: &mut Writer) {
        self.asset_id.encode(w);
        self.output.encode(w);
    }
}

impl Decode for TransferableOutput {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        Ok(Self {
            asset_id: AssetId::decode(r)?,
            output: Output::decode(r)?,
        })
    }
}

/// A consumed fungible UTXO. `sig_indices` index into the owner list of the
/// spent output; one signature is required per index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableInput {
    pub utxo_id: UtxoId,
    pub asset_id: AssetId,
    pub amount: Amount,
    pub sig_indices: Vec<u32>,
}

impl Encode for TransferableInput {
    fn encode(&self, w: &mut Writer) {
        self.utxo_id.encode(w);
        self.asset_id.encode(w);
        w.u32(type_id::SECP_TRANSFER_INPUT).amount(self.amount);
        w.u32s(&self.sig_indices);
    }
}

impl Decode for TransferableInput {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let utxo_id = UtxoId::decode(r)?;
        let asset_id = AssetId::decode(r)?;
        match r.u32()? {
            type_id::SECP_TRANSFER_INPUT => {}
            id => return Err(TransactionError::UnknownTypeId { what: "input", id }),
        }
        let amount = r.amount()?;
        if amount.is_zero() {
            return Err(TransactionError::ZeroAmount);
        }
        Ok(Self {
            utxo_id,
            asset_id,
            amount,
            sig_indices: r.u32s()?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialKind {
    /// Authorizes a fungible input.
    Secp,
    /// Authorizes an NFT operation.
    Nft,
}

/// Signatures authorizing one input or operation, one per signature index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub kind: CredentialKind,
    pub signatures: Vec<RecoverableSignature>,
}

impl Encode for Credential {
    fn encode(&self, w: &mut Writer) {
        w.u32(match self.kind {
            CredentialKind::Secp => type_id::SECP_CREDENTIAL,
            CredentialKind::Nft => type_id::NFT_CREDENTIAL,
        });
        w.count(self.signatures.len());
        for sig in &self.signatures {
            w.fixed(sig.as_bytes());
        }
    }
}

impl Decode for Credential {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let kind = match r.u32()? {
            type_id::SECP_CREDENTIAL => CredentialKind::Secp,
            type_id::NFT_CREDENTIAL => CredentialKind::Nft,
            id => {
                return Err(TransactionError::UnknownTypeId {
                    what: "credential",
                    id,
                })
            }
        };
        let n = r.count()?;
        let signatures = (0..n)
            .map(|_| r.array::<65>().map(RecoverableSignature))
            .collect::<Result<_, _>>()?;
        Ok(Self { kind, signatures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trio_types::{ShortId, TxId};

    fn owner() -> ShortId {
        ShortId::new([4u8; 20])
    }

    #[test]
    fn utxo_layout_has_no_flag_byte() {
        let plain = Utxo::transfer(
            UtxoId::new(TxId::new([1u8; 32]), 3),
            AssetId::new([2u8; 32]),
            Amount::new(500),
            owner(),
        );
        let mut reward = plain.clone();
        reward.flags.reward = true;
        let bytes = reward.to_bytes();
        assert_eq!(bytes, plain.to_bytes());
        // version, tx id, output index, asset id, type id, amount, owners
        assert_eq!(bytes.len(), 2 + 32 + 4 + 32 + 4 + 8 + (8 + 4 + 4 + 20));
        assert_eq!(&bytes[70..74], &type_id::SECP_TRANSFER_OUTPUT.to_be_bytes());
        assert_eq!(&bytes[74..82], &500u64.to_be_bytes());
        assert_eq!(Utxo::from_bytes(&bytes).unwrap(), plain);
    }

    #[test]
    fn nft_output_layout() {
        let out = Output::NftTransfer {
            group_id: 2,
            payload: b"hi".to_vec(),
            owners: OutputOwners::single(owner()),
        };
        let bytes = out.to_bytes();
        assert_eq!(&bytes[..4], &type_id::NFT_TRANSFER_OUTPUT.to_be_bytes());
        assert_eq!(&bytes[4..8], &2u32.to_be_bytes());
        assert_eq!(&bytes[8..12], &2u32.to_be_bytes());
        assert_eq!(&bytes[12..14], b"hi");
        assert_eq!(Output::from_bytes(&bytes).unwrap(), out);
    }

    #[test]
    fn zero_transfer_output_rejected() {
        let mut w = Writer::new();
        w.u32(type_id::SECP_TRANSFER_OUTPUT).amount(Amount::ZERO);
        OutputOwners::single(owner()).encode(&mut w);
        assert_eq!(
            Output::from_bytes(&w.into_bytes()),
            Err(TransactionError::ZeroAmount)
        );
    }

    #[test]
    fn threshold_above_owner_count_rejected() {
        let owners = OutputOwners {
            locktime: 0,
            threshold: 2,
            addresses: vec![owner()],
        };
        assert!(matches!(
            OutputOwners::from_bytes(&owners.to_bytes()),
            Err(TransactionError::InvalidField(_))
        ));
    }

    #[test]
    fn unknown_output_type_rejected() {
        let bytes = 99u32.to_be_bytes();
        assert_eq!(
            Output::from_bytes(&bytes),
            Err(TransactionError::UnknownTypeId {
                what: "output",
                id: 99
            })
        );
    }
}
