//! One secret, three chain families.
//!
//! A [`KeyManager`] holds a single secp256k1 secret and derives a
//! [`KeyBundle`] per chain family from it. The exchange and staking bundles
//! share a short id and differ only in their address prefix; the account
//! bundle is addressed by its Keccak-derived 20-byte address.

use std::fmt;

use tracing::info;
use trio_crypto::{
    address_string, evm_address, export_secret, import_secret, public_from_private,
    secret_from_mnemonic, sha256, short_id, sign_digest,
};
use trio_types::{cb58_encode, ChainFamily, EvmAddress, PrivateKey, PublicKey, RecoverableSignature, ShortId};

use crate::error::WalletError;

/// Prefix hashed ahead of every signed message.
pub const MESSAGE_PREFIX: &[u8] = b"\x1ATrio Signed Message:\n";

/// The keys and address of one chain family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBundle {
    pub family: ChainFamily,
    pub public: PublicKey,
    pub short_id: ShortId,
    /// `X-...`, `P-...` or `0x...`.
    pub address: String,
    pub evm: EvmAddress,
}

pub struct KeyManager {
    secret: PrivateKey,
    hrp: String,
    bundles: Vec<KeyBundle>,
}

impl KeyManager {
    /// Import a `PrivateKey-<cb58>` or hex secret.
    pub fn import_secret(secret: &str, hrp: &str) -> Result<Self, WalletError> {
        let private = import_secret(secret).map_err(|e| WalletError::InvalidSecret(e.to_string()))?;
        Self::from_private(private, hrp)
    }

    /// Derive the secret from a BIP39 phrase.
    pub fn from_mnemonic(phrase: &str, hrp: &str) -> Result<Self, WalletError> {
        let private =
            secret_from_mnemonic(phrase).map_err(|e| WalletError::InvalidSecret(e.to_string()))?;
        Self::from_private(private, hrp)
    }

    pub fn from_private(secret: PrivateKey, hrp: &str) -> Result<Self, WalletError> {
        let bundles = derive_bundles(&secret, hrp)?;
        let manager = Self {
            secret,
            hrp: hrp.to_string(),
            bundles,
        };
        info!(
            exchange = %manager.address_for(ChainFamily::Exchange),
            account = %manager.evm_address(),
            "key imported"
        );
        Ok(manager)
    }

    pub fn hrp(&self) -> &str {
        &self.hrp
    }

    pub fn bundle(&self, family: ChainFamily) -> &KeyBundle {
        // derive_bundles yields one bundle per family in ChainFamily::ALL order
        let index = ChainFamily::ALL
            .iter()
            .position(|f| *f == family)
            .unwrap_or_default();
        &self.bundles[index]
    }

    pub fn bundles(&self) -> &[KeyBundle] {
        &self.bundles
    }

    pub fn address_for(&self, family: ChainFamily) -> &str {
        &self.bundle(family).address
    }

    pub fn short_id(&self) -> ShortId {
        self.bundle(ChainFamily::Exchange).short_id
    }

    pub fn evm_address(&self) -> EvmAddress {
        self.bundle(ChainFamily::Account).evm
    }

    /// Re-derive every bundle from the stored secret.
    pub fn reset(&mut self) -> Result<(), WalletError> {
        self.bundles = derive_bundles(&self.secret, &self.hrp)?;
        Ok(())
    }

    /// Re-derive for another network's human-readable part. Short ids do
    /// not change.
    pub fn rebind(&mut self, hrp: &str) -> Result<(), WalletError> {
        let bundles = derive_bundles(&self.secret, hrp)?;
        self.bundles = bundles;
        self.hrp = hrp.to_string();
        Ok(())
    }

    pub fn owns(&self, owner: &ShortId) -> bool {
        self.bundle_for_owner(owner).is_some()
    }

    pub fn bundle_for_owner(&self, owner: &ShortId) -> Option<&KeyBundle> {
        self.bundles
            .iter()
            .find(|b| b.family != ChainFamily::Account && &b.short_id == owner)
    }

    /// Sign a UTXO-chain digest on behalf of `owner`.
    pub fn sign_for(&self, owner: &ShortId, digest: &[u8; 32]) -> Result<RecoverableSignature, WalletError> {
        if !self.owns(owner) {
            return Err(WalletError::SigningFailure(format!(
                "no key for owner {}",
                hex::encode(owner.as_bytes())
            )));
        }
        self.sign(digest)
    }

    /// Sign an account-chain digest.
    pub fn sign(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, WalletError> {
        sign_digest(digest, &self.secret).map_err(|e| WalletError::SigningFailure(e.to_string()))
    }

    /// Sign an arbitrary message, returning cb58 of the 65-byte signature.
    pub fn sign_message(&self, message: &[u8]) -> Result<String, WalletError> {
        let digest = message_digest(message)?;
        let signature = self.sign(&digest)?;
        Ok(cb58_encode(signature.as_bytes()))
    }

    pub fn export_secret(&self) -> String {
        export_secret(&self.secret)
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("hrp", &self.hrp)
            .field("bundles", &self.bundles)
            .finish_non_exhaustive()
    }
}

/// `SHA-256(0x1A ‖ "Trio Signed Message:\n" ‖ u32-BE(len) ‖ message)`.
pub fn message_digest(message: &[u8]) -> Result<[u8; 32], WalletError> {
    let len = u32::try_from(message.len())
        .map_err(|_| WalletError::InvalidState("message too long to sign".into()))?;
    let mut buf = Vec::with_capacity(MESSAGE_PREFIX.len() + 4 + message.len());
    buf.extend_from_slice(MESSAGE_PREFIX);
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(message);
    Ok(sha256(&buf))
}

fn derive_bundles(secret: &PrivateKey, hrp: &str) -> Result<Vec<KeyBundle>, WalletError> {
    let public = public_from_private(secret).map_err(|e| WalletError::InvalidSecret(e.to_string()))?;
    let short = short_id(&public);
    let evm = evm_address(&public).map_err(|e| WalletError::InvalidSecret(e.to_string()))?;
    ChainFamily::ALL
        .into_iter()
        .map(|family| {
            let address = match family {
                ChainFamily::Account => evm.to_string(),
                utxo => address_string(utxo, hrp, &short)
                    .map_err(|e| WalletError::InvalidAddress(e.to_string()))?,
            };
            Ok(KeyBundle {
                family,
                public: public.clone(),
                short_id: short,
                address,
                evm,
            })
        })
        .collect()
}
