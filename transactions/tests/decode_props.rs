//! Property tests: decoders never panic on hostile input, and validation
//! agrees with a direct recomputation of per-asset totals.

use proptest::prelude::*;
use trio_transactions::validation::check_conservation;
use trio_transactions::{
    BaseTx, Decode, Encode, SignedEvmTx, SignedUtxoTx, TransferableInput, TransferableOutput,
    UtxoTx,
};
use trio_types::{Amount, AssetId, ChainId, OutputOwners, ShortId, TxId, Utxo, UtxoId};

proptest! {
    #[test]
    fn signed_utxo_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = SignedUtxoTx::from_bytes(&bytes);
    }

    #[test]
    fn utxo_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = Utxo::from_bytes(&bytes);
    }

    #[test]
    fn evm_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = SignedEvmTx::from_bytes(&bytes);
    }

    #[test]
    fn truncation_is_always_an_error(cut in 1usize..80) {
        let tx = UtxoTx::Base(BaseTx {
            network_id: 1,
            blockchain_id: ChainId::new([1u8; 32]),
            outputs: vec![TransferableOutput::transfer(
                AssetId::new([2u8; 32]),
                Amount::new(5),
                OutputOwners::single(ShortId::new([3u8; 20])),
            )],
            inputs: Vec::new(),
            memo: Vec::new(),
        });
        let bytes = tx.to_bytes();
        let cut = cut.min(bytes.len());
        prop_assert!(UtxoTx::from_bytes(&bytes[..bytes.len() - cut]).is_err());
    }

    #[test]
    fn conservation_matches_totals(
        ins in proptest::collection::vec(1u64..1_000_000, 1..8),
        fee in 0u64..1_000,
    ) {
        let asset = AssetId::new([7u8; 32]);
        let total: u128 = ins.iter().map(|v| *v as u128).sum();
        prop_assume!(total > fee as u128);
        let inputs = ins
            .iter()
            .enumerate()
            .map(|(i, v)| TransferableInput {
                utxo_id: UtxoId::new(TxId::new([i as u8; 32]), 0),
                asset_id: asset,
                amount: Amount::new(*v as u128),
                sig_indices: vec![0],
            })
            .collect();
        let tx = UtxoTx::Base(BaseTx {
            network_id: 1,
            blockchain_id: ChainId::ZERO,
            outputs: vec![TransferableOutput::transfer(
                asset,
                Amount::new(total - fee as u128),
                OutputOwners::single(ShortId::new([3u8; 20])),
            )],
            inputs,
            memo: Vec::new(),
        });
        prop_assert!(check_conservation(&tx, asset, Amount::new(fee as u128)).is_ok());
        prop_assert!(check_conservation(&tx, asset, Amount::new(fee as u128 + 1)).is_err());
    }
}
