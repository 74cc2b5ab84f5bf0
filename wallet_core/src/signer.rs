//! Attach signatures to a built transaction.
//!
//! UTXO chains sign SHA-256 of the canonical unsigned bytes once per
//! signature index; the account chain signs the EIP-155 Keccak digest. The
//! signer has no side effects.

use tracing::debug;
use trio_crypto::sha256;
use trio_transactions::validation::check_credentials;
use trio_transactions::{
    Credential, CredentialKind, Encode, SignedEvmTx, SignedTx, SignedUtxoTx, UnsignedTx, UtxoTx,
};
use trio_types::ShortId;

use crate::custody::KeyCustody;
use crate::error::WalletError;
use crate::transaction_builder::BuiltTx;

pub fn sign<C: KeyCustody + ?Sized>(built: &BuiltTx, custody: &C) -> Result<SignedTx, WalletError> {
    match &built.unsigned {
        UnsignedTx::Utxo(tx) => sign_utxo(tx, &built.signers, custody).map(SignedTx::Utxo),
        UnsignedTx::Account(tx) => {
            let digest = tx.signing_hash();
            let signature = custody.sign_account_digest(&digest)?;
            debug!(nonce = tx.nonce, chain_id = tx.chain_id, "account transaction signed");
            Ok(SignedTx::Account(SignedEvmTx::from_signature(tx.clone(), &signature)))
        }
    }
}

/// One credential per input, then one per operation.
pub fn sign_utxo<C: KeyCustody + ?Sized>(
    tx: &UtxoTx,
    signers: &[Vec<ShortId>],
    custody: &C,
) -> Result<SignedUtxoTx, WalletError> {
    let expected = tx.credential_count();
    if signers.len() != expected {
        return Err(WalletError::SigningFailure(format!(
            "{} signer groups for {expected} credentials",
            signers.len()
        )));
    }
    let digest = sha256(&tx.to_bytes());

    let kinds = std::iter::repeat(CredentialKind::Secp)
        .take(tx.base().inputs.len())
        .chain(std::iter::repeat(CredentialKind::Nft).take(tx.operations().len()));
    let credentials = kinds
        .zip(signers)
        .map(|(kind, owners)| {
            let signatures = owners
                .iter()
                .map(|owner| {
                    if !custody.owns(owner) {
                        return Err(WalletError::SigningFailure(format!(
                            "no key for owner {}",
                            hex::encode(owner.as_bytes())
                        )));
                    }
                    custody.sign_utxo_digest(owner, &digest)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Credential { kind, signatures })
        })
        .collect::<Result<Vec<_>, WalletError>>()?;

    let signed = SignedUtxoTx {
        unsigned: tx.clone(),
        credentials,
    };
    check_credentials(&signed).map_err(|e| WalletError::SigningFailure(e.to_string()))?;
    debug!(chain = %tx.chain(), credentials = signed.credentials.len(), "utxo transaction signed");
    Ok(signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_manager::KeyManager;
    use trio_crypto::recover_public;
    use trio_transactions::{BaseTx, EvmTx, TransferableInput, TransferableOutput};
    use trio_types::{Amount, AssetId, ChainFamily, ChainId, EvmAddress, OutputOwners, TxId, UtxoId};

    fn keys() -> KeyManager {
        KeyManager::import_secret(
            "0x0000000000000000000000000000000000000000000000000000000000000003",
            "local",
        )
        .unwrap()
    }

    fn base(inputs: usize) -> UtxoTx {
        let asset = AssetId::new([1u8; 32]);
        UtxoTx::Base(BaseTx {
            network_id: 12345,
            blockchain_id: ChainId::ZERO,
            outputs: vec![TransferableOutput::transfer(
                asset,
                Amount::new(inputs as u128),
                OutputOwners::single(ShortId::new([5u8; 20])),
            )],
            inputs: (0..inputs)
                .map(|n| TransferableInput {
                    utxo_id: UtxoId::new(TxId::new([n as u8; 32]), 0),
                    asset_id: asset,
                    amount: Amount::new(1),
                    sig_indices: vec![0],
                })
                .collect(),
            memo: Vec::new(),
        })
    }

    #[test]
    fn one_credential_per_input() {
        let km = keys();
        let tx = base(2);
        let signers = vec![vec![km.short_id()], vec![km.short_id()]];
        let signed = sign_utxo(&tx, &signers, &km).unwrap();
        assert_eq!(signed.credentials.len(), 2);
        let digest = sha256(&tx.to_bytes());
        for credential in &signed.credentials {
            assert_eq!(credential.kind, CredentialKind::Secp);
            let public = recover_public(&digest, &credential.signatures[0]).unwrap();
            assert_eq!(public, km.bundle(ChainFamily::Exchange).public);
        }
    }

    #[test]
    fn unknown_owner_fails_without_artifact() {
        let km = keys();
        let signers = vec![vec![ShortId::new([0u8; 20])]];
        assert!(matches!(
            sign_utxo(&base(1), &signers, &km),
            Err(WalletError::SigningFailure(_))
        ));
    }

    #[test]
    fn signer_groups_must_match_credentials() {
        let km = keys();
        assert!(matches!(
            sign_utxo(&base(2), &[vec![km.short_id()]], &km),
            Err(WalletError::SigningFailure(_))
        ));
    }

    #[test]
    fn account_signature_recovers_sender() {
        let km = keys();
        let tx = EvmTx {
            nonce: 0,
            gas_price: Amount::new(1),
            gas_limit: 21_000,
            to: EvmAddress::new([2u8; 20]),
            value: Amount::new(1),
            data: Vec::new(),
            chain_id: 43112,
        };
        let built = BuiltTx {
            unsigned: UnsignedTx::Account(tx.clone()),
            signers: Vec::new(),
            stamp: None,
            fee: Amount::new(21_000),
        };
        let SignedTx::Account(signed) = sign(&built, &km).unwrap() else {
            panic!("expected account tx");
        };
        assert!(signed.v == 35 + 2 * 43112 || signed.v == 36 + 2 * 43112);
        let public = recover_public(&tx.signing_hash(), &signed.signature().unwrap()).unwrap();
        assert_eq!(trio_crypto::evm_address(&public).unwrap(), km.evm_address());
    }
}
