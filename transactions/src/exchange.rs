//! Exchange-chain transactions: base transfers, NFT family creation, and NFT
//! mint/transfer operations.

use serde::{Deserialize, Serialize};
use trio_types::{AssetId, ChainId, Output, OutputOwners, UtxoId};

use crate::codec::{type_id, Decode, Encode, Reader, Writer};
use crate::components::{TransferableInput, TransferableOutput};
use crate::error::TransactionError;

pub const MAX_MEMO_LEN: usize = 256;
pub const MAX_NAME_LEN: usize = 128;
pub const MAX_SYMBOL_LEN: usize = 4;
pub const MAX_NFT_GROUPS: u32 = 32;
pub const MAX_NFT_PAYLOAD_LEN: usize = 1024;

/// Feature-extension index of the NFT output family in an initial state.
pub const NFT_FX_INDEX: u32 = 1;

/// Fields common to every UTXO transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTx {
    pub network_id: u32,
    pub blockchain_id: ChainId,
    pub outputs: Vec<TransferableOutput>,
    pub inputs: Vec<TransferableInput>,
    pub memo: Vec<u8>,
}

impl Encode for BaseTx {
    fn encode(&self, w: &mut Writer) {
        w.u32(self.network_id);
        self.blockchain_id.encode(w);
        self.outputs.encode(w);
        self.inputs.encode(w);
        w.bytes(&self.memo);
    }
}

impl Decode for BaseTx {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let tx = Self {
            network_id: r.u32()?,
            blockchain_id: ChainId::decode(r)?,
            outputs: Vec::decode(r)?,
            inputs: Vec::decode(r)?,
            memo: r.bytes()?,
        };
        if tx.memo.len() > MAX_MEMO_LEN {
            return Err(TransactionError::InvalidField(format!(
                "memo of {} bytes exceeds {MAX_MEMO_LEN}",
                tx.memo.len()
            )));
        }
        Ok(tx)
    }
}

/// Outputs created together with a new asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialState {
    pub fx_index: u32,
    pub outputs: Vec<Output>,
}

impl Encode for InitialState {
    fn encode(&self, w: &mut Writer) {
        w.u32(self.fx_index);
        self.outputs.encode(w);
    }
}

impl Decode for InitialState {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        Ok(Self {
            fx_index: r.u32()?,
            outputs: Vec::decode(r)?,
        })
    }
}

/// Creates a new asset. The asset id is the id of this transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssetTx {
    pub base: BaseTx,
    pub name: String,
    pub symbol: String,
    pub denomination: u8,
    pub initial_states: Vec<InitialState>,
}

impl Encode for CreateAssetTx {
    fn encode(&self, w: &mut Writer) {
        self.base.encode(w);
        w.short_bytes(self.name.as_bytes())
            .short_bytes(self.symbol.as_bytes())
            .u8(self.denomination);
        self.initial_states.encode(w);
    }
}

fn utf8(bytes: Vec<u8>, field: &str) -> Result<String, TransactionError> {
    String::from_utf8(bytes).map_err(|_| TransactionError::InvalidField(format!("{field} is not UTF-8")))
}

impl Decode for CreateAssetTx {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        Ok(Self {
            base: BaseTx::decode(r)?,
            name: utf8(r.short_bytes()?, "name")?,
            symbol: utf8(r.short_bytes()?, "symbol")?,
            denomination: r.u8()?,
            initial_states: Vec::decode(r)?,
        })
    }
}

/// An NFT operation consuming one UTXO of the asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Spend a minter output to create instances of its group. The minter
    /// authority is not re-issued.
    NftMint {
        sig_indices: Vec<u32>,
        group_id: u32,
        payload: Vec<u8>,
        owners: Vec<OutputOwners>,
    },
    /// Move one NFT instance to a new owner.
    NftTransfer {
        sig_indices: Vec<u32>,
        group_id: u32,
        payload: Vec<u8>,
        owners: OutputOwners,
    },
}

impl Operation {
    pub fn sig_indices(&self) -> &[u32] {
        match self {
            Self::NftMint { sig_indices, .. } | Self::NftTransfer { sig_indices, .. } => {
                sig_indices
            }
        }
    }
}

impl Encode for Operation {
    fn encode(&self, w: &mut Writer) {
        match self {
            Self::NftMint {
                sig_indices,
                group_id,
                payload,
                owners,
            } => {
                w.u32(type_id::NFT_MINT_OP)
                    .u32s(sig_indices)
                    .u32(*group_id)
                    .bytes(payload);
                owners.encode(w);
            }
            Self::NftTransfer {
                sig_indices,
                group_id,
                payload,
                owners,
            } => {
                w.u32(type_id::NFT_TRANSFER_OP)
                    .u32s(sig_indices)
                    .u32(*group_id)
                    .bytes(payload);
                owners.encode(w);
            }
        }
    }
}

impl Decode for Operation {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        match r.u32()? {
            type_id::NFT_MINT_OP => Ok(Self::NftMint {
                sig_indices: r.u32s()?,
                group_id: r.u32()?,
                payload: r.bytes()?,
                owners: Vec::decode(r)?,
            }),
            type_id::NFT_TRANSFER_OP => Ok(Self::NftTransfer {
                sig_indices: r.u32s()?,
                group_id: r.u32()?,
                payload: r.bytes()?,
                owners: OutputOwners::decode(r)?,
            }),
            id => Err(TransactionError::UnknownTypeId {
                what: "operation",
                id,
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableOperation {
    pub asset_id: AssetId,
    pub utxo_ids: Vec<UtxoId>,
    pub op: Operation,
}

impl Encode for TransferableOperation {
    fn encode(&self, w: &mut Writer) {
        self.asset_id.encode(w);
        self.utxo_ids.encode(w);
        self.op.encode(w);
    }
}

impl Decode for TransferableOperation {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        Ok(Self {
            asset_id: AssetId::decode(r)?,
            utxo_ids: Vec::decode(r)?,
            op: Operation::decode(r)?,
        })
    }
}

/// Fungible inputs and outputs (for the fee) plus NFT operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationTx {
    pub base: BaseTx,
    pub operations: Vec<TransferableOperation>,
}

impl Encode for OperationTx {
    fn encode(&self, w: &mut Writer) {
        self.base.encode(w);
        self.operations.encode(w);
    }
}

impl Decode for OperationTx {
    fn decode(r: &mut Reader<'_>) -> Result<Self, TransactionError> {
        Ok(Self {
            base: BaseTx::decode(r)?,
            operations: Vec::decode(r)?,
        })
    }
}
