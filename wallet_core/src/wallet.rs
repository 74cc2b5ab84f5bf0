//! The wallet facade.
//!
//! [`Wallet`] owns a key custody, the UTXO tracker, the event bus and
//! optional chain clients, and routes every operation through the shared
//! build → sign → issue pipeline.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};
use trio_utils::format_units;
use trio_types::{Amount, AssetId, ChainFamily, MinStake, ShortId, UtxoChain};

use crate::client::{AccountChainClient, PlatformClient, UtxoChainClient};
use crate::clock::{Clock, SystemClock};
use crate::config::WalletConfig;
use crate::custody::{KeyCustody, MnemonicWallet, SingleKeyWallet};
use crate::error::WalletError;
use crate::events::{EventBus, WalletEvent};
use crate::issuer::{Endpoints, IssuedId};
use crate::pipeline::{self, PipelineContext, Submission};
use crate::rpc::{JsonRpcAccountClient, JsonRpcUtxoClient};
use crate::stake_economics::{CapacityInput, StakeEconomicsCalculator, ValidatorCapacity};
use crate::transaction_builder::{
    gas_with_margin, AccountTransfer, AccountTxParams, BuiltTx, CreateNftFamily, MintNft,
    SpendContext, StakeRequest, TransactionBuilder, TransferRequest, ValidatorRequest,
};
use crate::utxo_tracker::{UtxoSnapshot, UtxoTracker};

/// Decimal places of the native asset on the UTXO chains.
const NATIVE_DECIMALS: u32 = 9;

pub struct Wallet<C: KeyCustody> {
    custody: C,
    config: WalletConfig,
    builder: TransactionBuilder,
    tracker: UtxoTracker,
    calculator: StakeEconomicsCalculator,
    events: EventBus,
    clock: Arc<dyn Clock>,
    utxo_client: Option<Arc<dyn UtxoChainClient>>,
    platform_client: Option<Arc<dyn PlatformClient>>,
    account_client: Option<Arc<dyn AccountChainClient>>,
    account_balance: RwLock<Amount>,
}

impl Wallet<SingleKeyWallet> {
    /// Wallet over an imported `PrivateKey-...` or hex secret.
    pub fn from_secret(secret: &str, config: WalletConfig) -> Result<Self, WalletError> {
        let custody = SingleKeyWallet::import(secret, config.hrp())?;
        Ok(Self::new(custody, config))
    }
}

impl Wallet<MnemonicWallet> {
    pub fn from_mnemonic(phrase: &str, config: WalletConfig) -> Result<Self, WalletError> {
        let custody = MnemonicWallet::from_phrase(phrase, config.hrp())?;
        Ok(Self::new(custody, config))
    }
}

impl<C: KeyCustody> Wallet<C> {
    pub fn new(custody: C, config: WalletConfig) -> Self {
        Self {
            builder: TransactionBuilder::from_config(&config),
            tracker: UtxoTracker::new(config.page_limit),
            calculator: StakeEconomicsCalculator::new(config.staking.clone()),
            events: EventBus::new(),
            clock: Arc::new(SystemClock),
            utxo_client: None,
            platform_client: None,
            account_client: None,
            account_balance: RwLock::new(Amount::ZERO),
            custody,
            config,
        }
    }

    // ── Wiring ─────────────────────────────────────────────────────────

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_utxo_client(mut self, client: Arc<dyn UtxoChainClient>) -> Self {
        self.utxo_client = Some(client);
        self
    }

    pub fn with_platform_client(mut self, client: Arc<dyn PlatformClient>) -> Self {
        self.platform_client = Some(client);
        self
    }

    pub fn with_account_client(mut self, client: Arc<dyn AccountChainClient>) -> Self {
        self.account_client = Some(client);
        self
    }

    /// Talk to the node described by the `rpc` section of the config.
    pub fn connect_rpc(self) -> Result<Self, WalletError> {
        let utxo = Arc::new(JsonRpcUtxoClient::new(&self.config.rpc)?);
        let account = Arc::new(JsonRpcAccountClient::new(&self.config.rpc)?);
        info!(url = %self.config.rpc.base_url, "connected to node");
        Ok(self
            .with_utxo_client(utxo.clone())
            .with_platform_client(utxo)
            .with_account_client(account))
    }

    /// Move to the network described by `config`. Addresses are rendered
    /// with the new hrp and every cached snapshot, reservation and balance is
    /// dropped. Attached clients are kept.
    pub fn switch_network(&mut self, config: WalletConfig) -> Result<(), WalletError> {
        self.custody.rebind(config.hrp())?;
        self.builder = TransactionBuilder::from_config(&config);
        self.tracker.reset(config.page_limit);
        self.calculator = StakeEconomicsCalculator::new(config.staking.clone());
        *self
            .account_balance
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = Amount::ZERO;
        info!(hrp = config.hrp(), network = ?config.network, "switched network");
        self.config = config;
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn custody(&self) -> &C {
        &self.custody
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    pub fn tracker(&self) -> &UtxoTracker {
        &self.tracker
    }

    pub fn calculator(&self) -> &StakeEconomicsCalculator {
        &self.calculator
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn address(&self, family: ChainFamily) -> String {
        self.custody.address(family)
    }

    /// Addresses whose UTXOs the wallet tracks on `chain`.
    pub fn addresses(&self, chain: UtxoChain) -> Vec<String> {
        vec![self.custody.address(chain.family())]
    }

    fn primary_owner(&self) -> Result<ShortId, WalletError> {
        self.custody
            .short_ids()
            .into_iter()
            .next()
            .ok_or_else(|| WalletError::InvalidState("custody holds no keys".into()))
    }

    fn utxo_client(&self) -> Result<&dyn UtxoChainClient, WalletError> {
        self.utxo_client.as_deref().ok_or(WalletError::NoClient("utxo chain"))
    }

    fn platform_client(&self) -> Result<&dyn PlatformClient, WalletError> {
        self.platform_client.as_deref().ok_or(WalletError::NoClient("platform"))
    }

    fn account_client(&self) -> Result<&dyn AccountChainClient, WalletError> {
        self.account_client
            .as_deref()
            .ok_or(WalletError::NoClient("account chain"))
    }

    // ── State refresh ──────────────────────────────────────────────────

    pub async fn refresh(&self, chain: UtxoChain) -> Result<Arc<UtxoSnapshot>, WalletError> {
        let client = self.utxo_client()?;
        let snapshot = self
            .tracker
            .refresh(client, chain, &self.addresses(chain), self.clock.now())
            .await?;
        self.events.emit(&WalletEvent::UtxoSetUpdated {
            chain,
            version: snapshot.version,
            utxos: snapshot.utxos.len(),
        });
        let balance = snapshot.balance(self.config.fee_asset_id, self.clock.now());
        debug!(%chain, balance = %format_units(balance, NATIVE_DECIMALS), "fee asset balance");
        self.events.emit(&WalletEvent::BalanceUpdated {
            family: chain.family(),
            asset: Some(self.config.fee_asset_id),
            balance,
        });
        Ok(snapshot)
    }

    /// Refresh both UTXO chains, stopping at the first failure.
    pub async fn refresh_all(&self) -> Result<(), WalletError> {
        for chain in UtxoChain::ALL {
            self.refresh(chain).await?;
        }
        Ok(())
    }

    pub async fn refresh_account_balance(&self) -> Result<Amount, WalletError> {
        let balance = self
            .account_client()?
            .get_balance(&self.custody.evm_address())
            .await?;
        *self
            .account_balance
            .write()
            .unwrap_or_else(PoisonError::into_inner) = balance;
        self.events.emit(&WalletEvent::BalanceUpdated {
            family: ChainFamily::Account,
            asset: None,
            balance,
        });
        Ok(balance)
    }

    pub async fn refresh_stake(&self) -> Result<Amount, WalletError> {
        let staked = self
            .tracker
            .refresh_stake(self.platform_client()?, &self.addresses(UtxoChain::Staking))
            .await?;
        self.events.emit(&WalletEvent::StakeUpdated { staked });
        Ok(staked)
    }

    /// Spendable balance of `asset` in the current snapshot of `chain`.
    pub fn balance(&self, chain: UtxoChain, asset: AssetId) -> Amount {
        self.tracker.snapshot(chain).balance(asset, self.clock.now())
    }

    pub fn account_balance(&self) -> Amount {
        *self
            .account_balance
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn staked(&self) -> Amount {
        self.tracker.staked()
    }

    // ── Building ───────────────────────────────────────────────────────

    fn with_spend_context<T>(
        &self,
        chain: UtxoChain,
        build: impl FnOnce(&SpendContext<'_>) -> Result<T, WalletError>,
    ) -> Result<T, WalletError> {
        let snapshot = self.tracker.snapshot(chain);
        let owners: BTreeSet<ShortId> = self.custody.short_ids();
        let ctx = SpendContext {
            snapshot: &snapshot,
            owners: &owners,
            change: self.primary_owner()?,
            now: self.clock.now(),
        };
        build(&ctx)
    }

    pub fn build_transfer(&self, request: &TransferRequest) -> Result<BuiltTx, WalletError> {
        self.with_spend_context(UtxoChain::Exchange, |ctx| self.builder.transfer(ctx, request))
    }

    pub fn build_create_nft_family(&self, request: &CreateNftFamily) -> Result<BuiltTx, WalletError> {
        self.with_spend_context(UtxoChain::Exchange, |ctx| {
            self.builder.create_nft_family(ctx, request)
        })
    }

    pub fn build_mint_nft(&self, request: &MintNft) -> Result<BuiltTx, WalletError> {
        self.with_spend_context(UtxoChain::Exchange, |ctx| self.builder.mint_nft(ctx, request))
    }

    pub fn build_add_validator(&self, request: &ValidatorRequest) -> Result<BuiltTx, WalletError> {
        self.with_spend_context(UtxoChain::Staking, |ctx| {
            self.builder.add_validator(ctx, request)
        })
    }

    pub fn build_add_delegator(&self, request: &StakeRequest) -> Result<BuiltTx, WalletError> {
        self.with_spend_context(UtxoChain::Staking, |ctx| {
            self.builder.add_delegator(ctx, request)
        })
    }

    pub fn build_delegation_within_capacity(
        &self,
        request: &StakeRequest,
        capacity: &ValidatorCapacity,
    ) -> Result<BuiltTx, WalletError> {
        self.with_spend_context(UtxoChain::Staking, |ctx| {
            self.builder.delegate_within_capacity(ctx, request, capacity)
        })
    }

    /// Chain gas estimate for `transfer` plus a 10% margin.
    pub async fn estimate_gas(&self, transfer: &AccountTransfer) -> Result<u64, WalletError> {
        let call = transfer.call_request(self.custody.evm_address());
        let estimate = self.account_client()?.estimate_gas(&call).await?;
        Ok(gas_with_margin(estimate))
    }

    /// Fetch nonce, gas price and a gas estimate, then build.
    pub async fn build_account_transfer(&self, transfer: &AccountTransfer) -> Result<BuiltTx, WalletError> {
        let client = self.account_client()?;
        let from = self.custody.evm_address();
        let nonce = client.get_transaction_count(&from).await?;
        let gas_price = client.get_gas_price().await?;
        let gas_limit = self.estimate_gas(transfer).await?;
        self.builder.account_transfer(
            from,
            transfer,
            &AccountTxParams {
                nonce,
                gas_price,
                gas_limit,
                chain_id: self.config.account_chain_id,
            },
        )
    }

    // ── Issuing ────────────────────────────────────────────────────────

    /// Sign, reserve and issue, recording every state the transaction went
    /// through.
    pub async fn submit(&self, built: &BuiltTx) -> Submission {
        let ctx = PipelineContext {
            custody: &self.custody,
            tracker: &self.tracker,
            endpoints: Endpoints {
                utxo: self.utxo_client.as_deref(),
                account: self.account_client.as_deref(),
            },
            events: &self.events,
        };
        pipeline::submit(built, &ctx).await
    }

    pub async fn send(&self, built: &BuiltTx) -> Result<IssuedId, WalletError> {
        self.submit(built).await.into_result()
    }

    // ── Staking economics ──────────────────────────────────────────────

    pub async fn min_stake(&self) -> Result<MinStake, WalletError> {
        Ok(self.platform_client()?.get_min_stake().await?)
    }

    /// Validators currently open to a delegation of at least the chain
    /// minimum.
    pub async fn validator_capacity(&self) -> Result<Vec<ValidatorCapacity>, WalletError> {
        let client = self.platform_client()?;
        let validators = client.get_current_validators().await?;
        let pending = client.get_pending_validators().await?;
        let min = client.get_min_stake().await?;
        Ok(self.calculator.compute_capacity(&CapacityInput {
            validators: &validators,
            pending_delegators: &pending.delegators,
            min_delegation: min.min_delegator_stake,
            now: self.clock.now(),
        }))
    }

    pub fn sign_message(&self, message: &[u8]) -> Result<String, WalletError> {
        self.custody.sign_message(message)
    }
}
