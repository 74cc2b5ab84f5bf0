use serde::{Deserialize, Serialize};
use trio_transactions::abi::{erc20_transfer, erc721_safe_transfer_from};
use trio_transactions::{EvmTx, UnsignedTx};
use trio_types::{Amount, EvmAddress};

use super::{BuiltTx, TransactionBuilder};
use crate::client::CallRequest;
use crate::error::WalletError;

/// A value or token movement on the account chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountTransfer {
    Native {
        to: EvmAddress,
        value: Amount,
    },
    Erc20 {
        contract: EvmAddress,
        to: EvmAddress,
        amount: Amount,
    },
    Erc721 {
        contract: EvmAddress,
        to: EvmAddress,
        token_id: [u8; 32],
    },
}

impl AccountTransfer {
    /// Destination, attached value and calldata of the transaction.
    fn call(&self, from: &EvmAddress) -> (EvmAddress, Amount, Vec<u8>) {
        match self {
            Self::Native { to, value } => (*to, *value, Vec::new()),
            Self::Erc20 {
                contract,
                to,
                amount,
            } => (*contract, Amount::ZERO, erc20_transfer(to, *amount)),
            Self::Erc721 {
                contract,
                to,
                token_id,
            } => (
                *contract,
                Amount::ZERO,
                erc721_safe_transfer_from(from, to, *token_id),
            ),
        }
    }

    /// The read-only call used to estimate gas for this transfer.
    pub fn call_request(&self, from: EvmAddress) -> CallRequest {
        let (to, value, data) = self.call(&from);
        CallRequest {
            from: Some(from),
            to,
            value,
            data,
        }
    }

    fn check(&self) -> Result<(), WalletError> {
        match self {
            Self::Native { value, .. } if value.is_zero() => {
                Err(WalletError::InvalidState("zero native transfer".into()))
            }
            Self::Erc20 { amount, .. } if amount.is_zero() => {
                Err(WalletError::InvalidState("zero token transfer".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Values the chain supplies for one account transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTxParams {
    pub nonce: u64,
    pub gas_price: Amount,
    pub gas_limit: u64,
    pub chain_id: u64,
}

/// `ceil(estimate × 1.1)`.
pub fn gas_with_margin(estimate: u64) -> u64 {
    let padded = (u128::from(estimate) * 11).div_ceil(10);
    u64::try_from(padded).unwrap_or(u64::MAX)
}

impl TransactionBuilder {
    /// Build a legacy EIP-155 transaction. Never touches UTXO state.
    pub fn account_transfer(
        &self,
        from: EvmAddress,
        transfer: &AccountTransfer,
        params: &AccountTxParams,
    ) -> Result<BuiltTx, WalletError> {
        transfer.check()?;
        if params.gas_limit == 0 {
            return Err(WalletError::InvalidState("gas limit must be positive".into()));
        }
        let fee = params
            .gas_price
            .checked_mul(u128::from(params.gas_limit))
            .ok_or_else(|| WalletError::InvalidState("gas fee overflows".into()))?;
        let (to, value, data) = transfer.call(&from);
        Ok(BuiltTx {
            unsigned: UnsignedTx::Account(EvmTx {
                nonce: params.nonce,
                gas_price: params.gas_price,
                gas_limit: params.gas_limit,
                to,
                value,
                data,
                chain_id: params.chain_id,
            }),
            signers: Vec::new(),
            stamp: None,
            fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::builder;
    use super::*;
    use trio_transactions::account::NATIVE_TRANSFER_GAS;

    fn addr(n: u8) -> EvmAddress {
        EvmAddress::new([n; 20])
    }

    fn params() -> AccountTxParams {
        AccountTxParams {
            nonce: 4,
            gas_price: Amount::new(25_000_000_000),
            gas_limit: NATIVE_TRANSFER_GAS,
            chain_id: 43112,
        }
    }

    #[test]
    fn margin_rounds_up() {
        assert_eq!(gas_with_margin(21_000), 23_100);
        assert_eq!(gas_with_margin(1), 2);
        assert_eq!(gas_with_margin(10), 11);
        assert_eq!(gas_with_margin(0), 0);
        assert_eq!(gas_with_margin(u64::MAX), u64::MAX);
    }

    #[test]
    fn native_transfer_carries_value() {
        let t = AccountTransfer::Native {
            to: addr(2),
            value: Amount::new(5),
        };
        let built = builder().account_transfer(addr(1), &t, &params()).unwrap();
        let UnsignedTx::Account(tx) = &built.unsigned else {
            panic!("expected account tx");
        };
        assert_eq!(tx.to, addr(2));
        assert_eq!(tx.value, Amount::new(5));
        assert!(tx.data.is_empty());
        assert_eq!(built.fee, Amount::new(25_000_000_000 * 21_000));
        assert!(built.stamp.is_none());
        assert!(built.consumed_utxos().is_empty());
    }

    #[test]
    fn erc20_calls_contract() {
        let t = AccountTransfer::Erc20 {
            contract: addr(9),
            to: addr(2),
            amount: Amount::new(1_000),
        };
        let built = builder().account_transfer(addr(1), &t, &params()).unwrap();
        let UnsignedTx::Account(tx) = &built.unsigned else {
            panic!("expected account tx");
        };
        assert_eq!(tx.to, addr(9));
        assert!(tx.value.is_zero());
        assert_eq!(hex::encode(&tx.data[..4]), "a9059cbb");
        assert_eq!(tx.data.len(), 4 + 64);
    }

    #[test]
    fn erc721_names_sender() {
        let t = AccountTransfer::Erc721 {
            contract: addr(9),
            to: addr(2),
            token_id: [0u8; 32],
        };
        let call = t.call_request(addr(1));
        assert_eq!(call.from, Some(addr(1)));
        assert_eq!(hex::encode(&call.data[..4]), "42842e0e");
        assert_eq!(&call.data[4 + 12..4 + 32], addr(1).as_bytes());
    }

    #[test]
    fn rejects_zero_amounts_and_gas() {
        let b = builder();
        let zero = AccountTransfer::Native {
            to: addr(2),
            value: Amount::ZERO,
        };
        assert!(b.account_transfer(addr(1), &zero, &params()).is_err());
        let t = AccountTransfer::Native {
            to: addr(2),
            value: Amount::new(1),
        };
        let mut p = params();
        p.gas_limit = 0;
        assert!(b.account_transfer(addr(1), &t, &p).is_err());
    }
}
