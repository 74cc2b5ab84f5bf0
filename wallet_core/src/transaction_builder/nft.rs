use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use trio_transactions::codec::MAX_COLLECTION_LEN;
use trio_transactions::exchange::{
    MAX_NAME_LEN, MAX_NFT_GROUPS, MAX_NFT_PAYLOAD_LEN, MAX_SYMBOL_LEN, NFT_FX_INDEX,
};
use trio_transactions::{
    CreateAssetTx, InitialState, Operation, OperationTx, TransferableOperation, UtxoTx,
};
use trio_types::{ChainFamily, Output, OutputOwners, UtxoChain, UtxoId};

use super::selection::{require, select, signature_indices};
use super::{check_memo, expect_chain, BuiltTx, SpendContext, TransactionBuilder};
use crate::error::WalletError;

/// Create a new NFT family with `groups` minter outputs, all owned by
/// `minter`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNftFamily {
    pub name: String,
    pub symbol: String,
    pub groups: u32,
    pub minter: String,
    #[serde(default)]
    pub memo: Vec<u8>,
}

/// Mint `quantity` instances of the group behind `minter_utxo`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintNft {
    pub minter_utxo: UtxoId,
    pub payload: Vec<u8>,
    pub quantity: u32,
    pub owner: String,
    #[serde(default)]
    pub memo: Vec<u8>,
}

impl TransactionBuilder {
    pub fn create_nft_family(
        &self,
        ctx: &SpendContext<'_>,
        request: &CreateNftFamily,
    ) -> Result<BuiltTx, WalletError> {
        expect_chain(ctx.snapshot, UtxoChain::Exchange)?;
        check_memo(&request.memo)?;
        if request.name.is_empty() || request.name.len() > MAX_NAME_LEN {
            return Err(WalletError::InvalidState(format!(
                "name must be 1 to {MAX_NAME_LEN} bytes"
            )));
        }
        if request.symbol.is_empty() || request.symbol.len() > MAX_SYMBOL_LEN {
            return Err(WalletError::InvalidState(format!(
                "symbol must be 1 to {MAX_SYMBOL_LEN} bytes"
            )));
        }
        if request.groups == 0 || request.groups > MAX_NFT_GROUPS {
            return Err(WalletError::InvalidState(format!(
                "group count must be 1 to {MAX_NFT_GROUPS}, got {}",
                request.groups
            )));
        }
        let minter = self.parse_owner(&request.minter, ChainFamily::Exchange)?;

        let fee = self.fees.create_asset_fee;
        let mut required = BTreeMap::new();
        require(&mut required, self.fee_asset, fee)?;
        let selection = select(&ctx.snapshot.utxos, &required, ctx.owners, ctx.now)?;
        let outputs = self.change_outputs(&selection, ctx.change);

        let minters = (0..request.groups)
            .map(|group_id| Output::NftMint {
                group_id,
                owners: OutputOwners::single(minter),
            })
            .collect();
        let tx = UtxoTx::CreateAsset(CreateAssetTx {
            base: self.base_tx(UtxoChain::Exchange, outputs, selection.inputs, &request.memo),
            name: request.name.clone(),
            symbol: request.symbol.clone(),
            denomination: 0,
            initial_states: vec![InitialState {
                fx_index: NFT_FX_INDEX,
                outputs: minters,
            }],
        });
        self.finish(tx, selection.signers, ctx.snapshot, fee)
    }

    pub fn mint_nft(&self, ctx: &SpendContext<'_>, request: &MintNft) -> Result<BuiltTx, WalletError> {
        expect_chain(ctx.snapshot, UtxoChain::Exchange)?;
        check_memo(&request.memo)?;
        if request.payload.len() > MAX_NFT_PAYLOAD_LEN {
            return Err(WalletError::InvalidState(format!(
                "payload of {} bytes exceeds {MAX_NFT_PAYLOAD_LEN}",
                request.payload.len()
            )));
        }
        if request.quantity == 0 {
            return Err(WalletError::InvalidState("quantity must be at least 1".into()));
        }
        if request.quantity as usize > MAX_COLLECTION_LEN {
            return Err(WalletError::InvalidState(format!(
                "quantity {} exceeds {MAX_COLLECTION_LEN}",
                request.quantity
            )));
        }

        let minter = ctx.snapshot.utxos.get(&request.minter_utxo).ok_or_else(|| {
            WalletError::InvalidState(format!("minter {} not in snapshot", request.minter_utxo))
        })?;
        let Output::NftMint { group_id, owners } = &minter.output else {
            return Err(WalletError::InvalidState(format!(
                "UTXO {} is not a minter output",
                request.minter_utxo
            )));
        };
        if !owners.is_unlocked_at(ctx.now) {
            return Err(WalletError::InvalidState(format!(
                "minter {} is locked",
                request.minter_utxo
            )));
        }
        let (sig_indices, op_signers) = signature_indices(owners, ctx.owners).ok_or_else(|| {
            WalletError::InvalidState(format!(
                "minter {} is not owned by this wallet",
                request.minter_utxo
            ))
        })?;
        let owner = self.parse_owner(&request.owner, ChainFamily::Exchange)?;

        let fee = self.fees.base_fee;
        let mut required = BTreeMap::new();
        require(&mut required, self.fee_asset, fee)?;
        let selection = select(&ctx.snapshot.utxos, &required, ctx.owners, ctx.now)?;
        let outputs = self.change_outputs(&selection, ctx.change);

        let operation = TransferableOperation {
            asset_id: minter.asset_id,
            utxo_ids: vec![request.minter_utxo],
            op: Operation::NftMint {
                sig_indices,
                group_id: *group_id,
                payload: request.payload.clone(),
                owners: vec![OutputOwners::single(owner); request.quantity as usize],
            },
        };
        let mut signers = selection.signers;
        signers.push(op_signers);
        let tx = UtxoTx::Operation(OperationTx {
            base: self.base_tx(UtxoChain::Exchange, outputs, selection.inputs, &request.memo),
            operations: vec![operation],
        });
        self.finish(tx, signers, ctx.snapshot, fee)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use std::collections::BTreeSet;
    use trio_transactions::{Decode, Encode, UnsignedTx};
    use trio_types::{Amount, AssetId, ShortId, Timestamp};

    fn ctx<'a>(
        snapshot: &'a crate::utxo_tracker::UtxoSnapshot,
        owners: &'a BTreeSet<ShortId>,
    ) -> SpendContext<'a> {
        SpendContext {
            snapshot,
            owners,
            change: me(),
            now: Timestamp::new(2_000),
        }
    }

    fn family_request(groups: u32) -> CreateNftFamily {
        CreateNftFamily {
            name: "Gallery".into(),
            symbol: "GAL".into(),
            groups,
            minter: address(ChainFamily::Exchange, me()),
            memo: Vec::new(),
        }
    }

    #[test]
    fn family_has_one_minter_per_group() {
        let snap = snapshot(UtxoChain::Exchange, vec![coin(1, NATIVE, 25)]);
        let held = owners();
        let built = builder().create_nft_family(&ctx(&snap, &held), &family_request(3)).unwrap();
        assert_eq!(built.fee, Amount::new(10));
        let UnsignedTx::Utxo(UtxoTx::CreateAsset(tx)) = &built.unsigned else {
            panic!("expected create-asset");
        };
        assert_eq!(tx.initial_states.len(), 1);
        assert_eq!(tx.initial_states[0].fx_index, NFT_FX_INDEX);
        let groups: Vec<u32> = tx.initial_states[0]
            .outputs
            .iter()
            .map(|o| match o {
                Output::NftMint { group_id, .. } => *group_id,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(groups, vec![0, 1, 2]);
        assert_eq!(tx.base.outputs[0].output.amount(), Some(Amount::new(15)));
    }

    #[test]
    fn family_bounds() {
        let snap = snapshot(UtxoChain::Exchange, vec![coin(1, NATIVE, 25)]);
        let held = owners();
        let b = builder();
        let c = ctx(&snap, &held);
        for bad in [0, 33] {
            assert!(matches!(
                b.create_nft_family(&c, &family_request(bad)),
                Err(WalletError::InvalidState(_))
            ));
        }
        let mut long_symbol = family_request(1);
        long_symbol.symbol = "GALLERY".into();
        assert!(b.create_nft_family(&c, &long_symbol).is_err());
        let mut no_name = family_request(1);
        no_name.name.clear();
        assert!(b.create_nft_family(&c, &no_name).is_err());
        assert!(b.create_nft_family(&c, &family_request(32)).is_ok());
    }

    #[test]
    fn mint_spends_minter_via_operation() {
        let family = AssetId::new([0xCC; 32]);
        let snap = snapshot(
            UtxoChain::Exchange,
            vec![coin(1, NATIVE, 5), minter(7, family, 2)],
        );
        let held = owners();
        let request = MintNft {
            minter_utxo: utxo_id(7),
            payload: b"hello".to_vec(),
            quantity: 2,
            owner: address(ChainFamily::Exchange, stranger()),
            memo: Vec::new(),
        };
        let built = builder().mint_nft(&ctx(&snap, &held), &request).unwrap();
        let UnsignedTx::Utxo(tx) = &built.unsigned else {
            panic!("expected UTXO tx");
        };
        assert_eq!(tx.operations().len(), 1);
        match &tx.operations()[0].op {
            Operation::NftMint {
                group_id, owners, ..
            } => {
                assert_eq!(*group_id, 2);
                assert_eq!(owners.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(built.signers, vec![vec![me()], vec![me()]]);
    }

    #[test]
    fn mint_rejects_missing_or_wrong_minter() {
        let family = AssetId::new([0xCC; 32]);
        let snap = snapshot(
            UtxoChain::Exchange,
            vec![coin(1, NATIVE, 5), nft(7, family, 0)],
        );
        let held = owners();
        let mut request = MintNft {
            minter_utxo: utxo_id(7),
            payload: Vec::new(),
            quantity: 1,
            owner: address(ChainFamily::Exchange, me()),
            memo: Vec::new(),
        };
        let c = ctx(&snap, &held);
        assert!(matches!(builder().mint_nft(&c, &request), Err(WalletError::InvalidState(_))));
        request.minter_utxo = utxo_id(99);
        assert!(matches!(builder().mint_nft(&c, &request), Err(WalletError::InvalidState(_))));
    }

    #[test]
    fn mint_payload_and_quantity_limits() {
        let family = AssetId::new([0xCC; 32]);
        let snap = snapshot(
            UtxoChain::Exchange,
            vec![coin(1, NATIVE, 5), minter(7, family, 0)],
        );
        let held = owners();
        let c = ctx(&snap, &held);
        let mut request = MintNft {
            minter_utxo: utxo_id(7),
            payload: vec![0u8; MAX_NFT_PAYLOAD_LEN + 1],
            quantity: 1,
            owner: address(ChainFamily::Exchange, me()),
            memo: Vec::new(),
        };
        assert!(builder().mint_nft(&c, &request).is_err());
        request.payload = vec![0u8; MAX_NFT_PAYLOAD_LEN];
        request.quantity = 0;
        assert!(builder().mint_nft(&c, &request).is_err());
        request.quantity = 1;
        assert!(builder().mint_nft(&c, &request).is_ok());
    }

    #[test]
    fn mint_quantity_is_capped_at_codec_collection_limit() {
        let family = AssetId::new([0xCC; 32]);
        let snap = snapshot(
            UtxoChain::Exchange,
            vec![coin(1, NATIVE, 5), minter(7, family, 0)],
        );
        let held = owners();
        let c = ctx(&snap, &held);
        let mut request = MintNft {
            minter_utxo: utxo_id(7),
            payload: Vec::new(),
            quantity: MAX_COLLECTION_LEN as u32 + 1,
            owner: address(ChainFamily::Exchange, me()),
            memo: Vec::new(),
        };
        assert!(matches!(builder().mint_nft(&c, &request), Err(WalletError::InvalidState(_))));

        request.quantity = MAX_COLLECTION_LEN as u32;
        let built = builder().mint_nft(&c, &request).unwrap();
        let UnsignedTx::Utxo(tx) = &built.unsigned else {
            panic!("expected UTXO tx");
        };
        let decoded = UtxoTx::from_bytes(&tx.to_bytes()).unwrap();
        assert_eq!(&decoded, tx);
    }
}
