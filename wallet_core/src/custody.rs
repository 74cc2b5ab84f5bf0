//! Who holds the keys.
//!
//! The wallet is generic over [`KeyCustody`] so that the pipeline never
//! touches secret material directly. Software custody comes in two flavours
//! that differ only in how the secret was obtained.

use std::collections::BTreeSet;

use trio_crypto::generate_mnemonic;
use trio_types::{ChainFamily, EvmAddress, RecoverableSignature, ShortId};
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::key_manager::KeyManager;

pub trait KeyCustody: Send + Sync {
    /// Bech32 human-readable part the addresses are rendered with.
    fn hrp(&self) -> &str;

    fn address(&self, family: ChainFamily) -> String;

    /// Owner ids the custody can sign UTXO inputs for.
    fn short_ids(&self) -> BTreeSet<ShortId>;

    fn evm_address(&self) -> EvmAddress;

    fn owns(&self, owner: &ShortId) -> bool {
        self.short_ids().contains(owner)
    }

    fn sign_utxo_digest(&self, owner: &ShortId, digest: &[u8; 32]) -> Result<RecoverableSignature, WalletError>;

    fn sign_account_digest(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, WalletError>;

    /// cb58 signature over a prefixed message digest.
    fn sign_message(&self, message: &[u8]) -> Result<String, WalletError>;

    /// Render addresses for another network. Owner ids stay the same.
    fn rebind(&mut self, hrp: &str) -> Result<(), WalletError>;
}

impl KeyCustody for KeyManager {
    fn hrp(&self) -> &str {
        KeyManager::hrp(self)
    }

    fn address(&self, family: ChainFamily) -> String {
        self.address_for(family).to_string()
    }

    fn short_ids(&self) -> BTreeSet<ShortId> {
        [KeyManager::short_id(self)].into_iter().collect()
    }

    fn evm_address(&self) -> EvmAddress {
        KeyManager::evm_address(self)
    }

    fn owns(&self, owner: &ShortId) -> bool {
        KeyManager::owns(self, owner)
    }

    fn sign_utxo_digest(&self, owner: &ShortId, digest: &[u8; 32]) -> Result<RecoverableSignature, WalletError> {
        self.sign_for(owner, digest)
    }

    fn sign_account_digest(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, WalletError> {
        self.sign(digest)
    }

    fn sign_message(&self, message: &[u8]) -> Result<String, WalletError> {
        KeyManager::sign_message(self, message)
    }

    fn rebind(&mut self, hrp: &str) -> Result<(), WalletError> {
        KeyManager::rebind(self, hrp)
    }
}

/// Custody of one imported secret.
#[derive(Debug)]
pub struct SingleKeyWallet {
    keys: KeyManager,
}

impl SingleKeyWallet {
    pub fn import(secret: &str, hrp: &str) -> Result<Self, WalletError> {
        Ok(Self {
            keys: KeyManager::import_secret(secret, hrp)?,
        })
    }

    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }
}

/// Custody derived from a BIP39 phrase. The phrase is kept so it can be
/// shown for backup, and wiped on drop.
pub struct MnemonicWallet {
    phrase: Zeroizing<String>,
    keys: KeyManager,
}

impl MnemonicWallet {
    pub fn from_phrase(phrase: &str, hrp: &str) -> Result<Self, WalletError> {
        let phrase = Zeroizing::new(phrase.trim().to_string());
        let keys = KeyManager::from_mnemonic(&phrase, hrp)?;
        Ok(Self { phrase, keys })
    }

    /// A fresh 24-word wallet.
    pub fn generate(hrp: &str) -> Result<Self, WalletError> {
        let phrase = Zeroizing::new(
            generate_mnemonic().map_err(|e| WalletError::InvalidSecret(e.to_string()))?,
        );
        let keys = KeyManager::from_mnemonic(&phrase, hrp)?;
        Ok(Self { phrase, keys })
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }
}

impl std::fmt::Debug for MnemonicWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MnemonicWallet")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

macro_rules! delegate_custody {
    ($ty:ty) => {
        impl KeyCustody for $ty {
            fn hrp(&self) -> &str {
                self.keys.hrp()
            }

            fn address(&self, family: ChainFamily) -> String {
                KeyCustody::address(&self.keys, family)
            }

            fn short_ids(&self) -> BTreeSet<ShortId> {
                KeyCustody::short_ids(&self.keys)
            }

            fn evm_address(&self) -> EvmAddress {
                self.keys.evm_address()
            }

            fn owns(&self, owner: &ShortId) -> bool {
                self.keys.owns(owner)
            }

            fn sign_utxo_digest(
                &self,
                owner: &ShortId,
                digest: &[u8; 32],
            ) -> Result<RecoverableSignature, WalletError> {
                self.keys.sign_for(owner, digest)
            }

            fn sign_account_digest(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, WalletError> {
                self.keys.sign(digest)
            }

            fn sign_message(&self, message: &[u8]) -> Result<String, WalletError> {
                self.keys.sign_message(message)
            }

            fn rebind(&mut self, hrp: &str) -> Result<(), WalletError> {
                self.keys.rebind(hrp)
            }
        }
    };
}

delegate_custody!(SingleKeyWallet);
delegate_custody!(MnemonicWallet);

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn mnemonic_custody_is_deterministic() {
        let a = MnemonicWallet::from_phrase(PHRASE, "local").unwrap();
        let b = MnemonicWallet::from_phrase(&format!("  {PHRASE}\n"), "local").unwrap();
        assert_eq!(a.address(ChainFamily::Exchange), b.address(ChainFamily::Exchange));
        assert_eq!(a.evm_address(), b.evm_address());
        assert_eq!(a.phrase(), PHRASE);
        assert!(!format!("{a:?}").contains("abandon"));
    }

    #[test]
    fn mnemonic_custody_matches_bip44_child_key() {
        let phrase = [["abandon"; 23].join(" ").as_str(), "art"].join(" ");
        let hd = MnemonicWallet::from_phrase(&phrase, "local").unwrap();
        let imported = SingleKeyWallet::import(
            "0x8f7bc8f5afef0237ce1ac23152ab785f36d60d875cd479a22ede211057a5bd6a",
            "local",
        )
        .unwrap();
        assert_eq!(hd.short_ids(), imported.short_ids());
        assert_eq!(hd.evm_address(), imported.evm_address());
    }

    #[test]
    fn rebind_renders_new_hrp() {
        let mut w = MnemonicWallet::from_phrase(PHRASE, "local").unwrap();
        let ids = w.short_ids();
        w.rebind("trio").unwrap();
        assert_eq!(w.hrp(), "trio");
        assert!(w.address(ChainFamily::Exchange).starts_with("X-trio1"));
        assert_eq!(w.short_ids(), ids);
    }

    #[test]
    fn generated_wallets_differ() {
        let a = MnemonicWallet::generate("local").unwrap();
        let b = MnemonicWallet::generate("local").unwrap();
        assert_eq!(a.phrase().split_whitespace().count(), 24);
        assert_ne!(a.short_ids(), b.short_ids());
    }

    #[test]
    fn single_key_custody_owns_its_short_id() {
        let w = SingleKeyWallet::import(
            "0x0000000000000000000000000000000000000000000000000000000000000002",
            "local",
        )
        .unwrap();
        let ids = w.short_ids();
        assert_eq!(ids.len(), 1);
        let id = *ids.iter().next().unwrap();
        assert!(w.owns(&id));
        assert!(w.sign_utxo_digest(&id, &[1u8; 32]).is_ok());
        assert!(w.sign_utxo_digest(&ShortId::new([9u8; 20]), &[1u8; 32]).is_err());
        assert!(w.address(ChainFamily::Staking).starts_with("P-local1"));
    }
}
