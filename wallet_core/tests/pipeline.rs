//! End-to-end wallet flows against in-memory chain nodes.

use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use trio_nullables::{NullAccountChain, NullClock, NullPlatform, NullUtxoChain};
use trio_transactions::{SignedUtxoTx, UnsignedTx};
use trio_types::{
    Amount, AssetId, ChainFamily, DelegatorRecord, DelegatorStatus, EvmAddress, MinStake, NodeId,
    PendingSet, ShortId, Timestamp, TxId, Utxo, UtxoChain, UtxoId, ValidatorRecord,
};
use trio_wallet_core::{
    AccountTransfer, IssuedId, KeyCustody, PipelineContext, RpcError, SingleKeyWallet,
    TransactionBuilder, TransferRequest, TxState, UtxoSnapshot, Wallet, WalletConfig, WalletError, WalletEvent,
};

const SECRET: &str = "0x00000000000000000000000000000000000000000000000000000000000000aa";
const OTHER_SECRET: &str = "0x00000000000000000000000000000000000000000000000000000000000000bb";
const NOW: u64 = 1_700_000_000;
const UNIT: u128 = 1_000_000_000;

struct Harness {
    wallet: Wallet<SingleKeyWallet>,
    node: Arc<NullUtxoChain>,
    platform: Arc<NullPlatform>,
    account: Arc<NullAccountChain>,
    clock: Arc<NullClock>,
}

fn config(page_limit: u32) -> WalletConfig {
    WalletConfig {
        page_limit,
        ..WalletConfig::default()
    }
}

fn harness_with(config: WalletConfig) -> Harness {
    let node = Arc::new(NullUtxoChain::new());
    let platform = Arc::new(NullPlatform::new());
    let account = Arc::new(NullAccountChain::new());
    let clock = Arc::new(NullClock::new(NOW));
    let wallet = Wallet::from_secret(SECRET, config)
        .unwrap()
        .with_clock(clock.clone())
        .with_utxo_client(node.clone())
        .with_platform_client(platform.clone())
        .with_account_client(account.clone());
    Harness {
        wallet,
        node,
        platform,
        account,
        clock,
    }
}

fn harness() -> Harness {
    harness_with(config(1024))
}

fn me(wallet: &Wallet<SingleKeyWallet>) -> ShortId {
    *wallet.custody().short_ids().iter().next().unwrap()
}

fn fee_asset(wallet: &Wallet<SingleKeyWallet>) -> AssetId {
    wallet.config().fee_asset_id
}

fn coin(n: u8, asset: AssetId, amount: u128, owner: ShortId) -> Utxo {
    Utxo::transfer(UtxoId::new(TxId::new([n; 32]), 0), asset, Amount::new(amount), owner)
}

fn stranger_address(wallet: &Wallet<SingleKeyWallet>) -> String {
    Wallet::from_secret(OTHER_SECRET, wallet.config().clone())
        .unwrap()
        .address(ChainFamily::Exchange)
}

fn record_events(wallet: &mut Wallet<SingleKeyWallet>) -> Arc<Mutex<Vec<WalletEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    wallet
        .events_mut()
        .subscribe(Box::new(move |event| sink.lock().unwrap().push(event.clone())));
    seen
}

// ── Refresh ────────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_follows_pagination_to_the_end() {
    let mut h = harness_with(config(2));
    let owner = me(&h.wallet);
    let asset = fee_asset(&h.wallet);
    h.node.set_utxos(
        UtxoChain::Exchange,
        (1..=5).map(|n| coin(n, asset, UNIT, owner)).collect(),
    );
    let events = record_events(&mut h.wallet);

    let snapshot = h.wallet.refresh(UtxoChain::Exchange).await.unwrap();

    assert_eq!(snapshot.utxos.len(), 5);
    assert_eq!(h.node.page_requests(), 3);
    assert_eq!(
        h.wallet.balance(UtxoChain::Exchange, asset),
        Amount::new(5 * UNIT)
    );
    let events = events.lock().unwrap();
    assert!(events.contains(&WalletEvent::UtxoSetUpdated {
        chain: UtxoChain::Exchange,
        version: snapshot.version,
        utxos: 5,
    }));
    assert!(events.contains(&WalletEvent::BalanceUpdated {
        family: ChainFamily::Exchange,
        asset: Some(asset),
        balance: Amount::new(5 * UNIT),
    }));
}

#[tokio::test]
async fn refresh_is_idempotent_apart_from_version() {
    let h = harness();
    let owner = me(&h.wallet);
    let asset = fee_asset(&h.wallet);
    h.node
        .set_utxos(UtxoChain::Exchange, vec![coin(1, asset, 3 * UNIT, owner)]);

    let first = h.wallet.refresh(UtxoChain::Exchange).await.unwrap();
    let second = h.wallet.refresh(UtxoChain::Exchange).await.unwrap();

    assert_eq!(first.utxos, second.utxos);
    assert!(second.version > first.version);
    assert_eq!(h.wallet.balance(UtxoChain::Exchange, asset), Amount::new(3 * UNIT));
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let h = harness();
    let owner = me(&h.wallet);
    let asset = fee_asset(&h.wallet);
    h.node
        .set_utxos(UtxoChain::Exchange, vec![coin(1, asset, UNIT, owner)]);
    let before = h.wallet.refresh(UtxoChain::Exchange).await.unwrap();

    h.node.fail_get_utxos(Some(RpcError::Status(502)));
    let err = h.wallet.refresh(UtxoChain::Exchange).await.unwrap_err();
    assert!(matches!(err, WalletError::Rpc(RpcError::Status(502))));
    assert_eq!(*h.wallet.tracker().snapshot(UtxoChain::Exchange), *before);
}

#[tokio::test]
async fn locked_outputs_are_not_spendable_until_their_locktime() {
    let h = harness();
    let owner = me(&h.wallet);
    let asset = fee_asset(&h.wallet);
    let mut locked = coin(1, asset, UNIT, owner);
    locked.output = trio_types::Output::Transfer {
        amount: Amount::new(UNIT),
        owners: trio_types::OutputOwners::locked_until(owner, Timestamp::new(NOW + 60)),
    };
    h.node.set_utxos(UtxoChain::Exchange, vec![locked]);
    h.wallet.refresh(UtxoChain::Exchange).await.unwrap();

    assert_eq!(h.wallet.balance(UtxoChain::Exchange, asset), Amount::ZERO);
    h.clock.advance(61);
    assert_eq!(h.wallet.balance(UtxoChain::Exchange, asset), Amount::new(UNIT));
}

// ── Transfers ──────────────────────────────────────────────────────────

#[tokio::test]
async fn transfer_is_signed_issued_and_decodable() {
    let mut h = harness();
    let owner = me(&h.wallet);
    let asset = fee_asset(&h.wallet);
    h.node.set_utxos(
        UtxoChain::Exchange,
        vec![coin(1, asset, 2 * UNIT, owner), coin(2, asset, 2 * UNIT, owner)],
    );
    h.wallet.refresh(UtxoChain::Exchange).await.unwrap();
    let events = record_events(&mut h.wallet);

    let to = stranger_address(&h.wallet);
    let built = h
        .wallet
        .build_transfer(&TransferRequest::single(asset, Amount::new(3 * UNIT), to))
        .unwrap();
    let submission = h.wallet.submit(&built).await;

    assert_eq!(
        submission.history,
        vec![TxState::Draft, TxState::Built, TxState::Signed, TxState::Issued]
    );
    let id = match submission.into_result().unwrap() {
        IssuedId::Utxo(id) => id,
        other => panic!("unexpected id {other}"),
    };

    let issued = h.node.issued();
    assert_eq!(issued.len(), 1);
    let (chain, payload) = &issued[0];
    assert_eq!(*chain, UtxoChain::Exchange);
    let decoded = SignedUtxoTx::from_issue_payload(payload).unwrap();
    assert_eq!(decoded.id(), id);
    assert_eq!(decoded.credentials.len(), decoded.unsigned.base().inputs.len());
    assert_eq!(decoded.unsigned.base().inputs.len(), 2);

    for input in &decoded.unsigned.base().inputs {
        assert!(h.wallet.tracker().is_reserved(UtxoChain::Exchange, &input.utxo_id));
    }
    assert!(events
        .lock()
        .unwrap()
        .contains(&WalletEvent::TransactionIssued {
            family: ChainFamily::Exchange,
            id: IssuedId::Utxo(id),
        }));
}

#[tokio::test]
async fn transfer_beyond_balance_fails_before_the_network() {
    let h = harness();
    let owner = me(&h.wallet);
    let asset = fee_asset(&h.wallet);
    h.node
        .set_utxos(UtxoChain::Exchange, vec![coin(1, asset, UNIT, owner)]);
    h.wallet.refresh(UtxoChain::Exchange).await.unwrap();

    let to = stranger_address(&h.wallet);
    let err = h
        .wallet
        .build_transfer(&TransferRequest::single(asset, Amount::new(UNIT), to))
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientFunds { .. }));
    assert!(h.node.issued().is_empty());
}

#[tokio::test]
async fn transaction_built_from_a_replaced_snapshot_is_refused() {
    let h = harness();
    let owner = me(&h.wallet);
    let asset = fee_asset(&h.wallet);
    h.node
        .set_utxos(UtxoChain::Exchange, vec![coin(1, asset, 5 * UNIT, owner)]);
    h.wallet.refresh(UtxoChain::Exchange).await.unwrap();

    let to = stranger_address(&h.wallet);
    let built = h
        .wallet
        .build_transfer(&TransferRequest::single(asset, Amount::new(UNIT), to))
        .unwrap();
    h.wallet.refresh(UtxoChain::Exchange).await.unwrap();

    let submission = h.wallet.submit(&built).await;
    assert_eq!(submission.state(), TxState::Failed);
    assert!(matches!(
        submission.into_result(),
        Err(WalletError::StaleSnapshot { .. })
    ));
    assert!(h.node.issued().is_empty());
}

#[tokio::test]
async fn same_inputs_cannot_be_issued_twice() {
    let h = harness();
    let owner = me(&h.wallet);
    let asset = fee_asset(&h.wallet);
    h.node
        .set_utxos(UtxoChain::Exchange, vec![coin(1, asset, 5 * UNIT, owner)]);
    h.wallet.refresh(UtxoChain::Exchange).await.unwrap();

    let to = stranger_address(&h.wallet);
    let first = h
        .wallet
        .build_transfer(&TransferRequest::single(asset, Amount::new(UNIT), to.clone()))
        .unwrap();
    let second = h
        .wallet
        .build_transfer(&TransferRequest::single(asset, Amount::new(2 * UNIT), to))
        .unwrap();

    h.wallet.send(&first).await.unwrap();
    let err = h.wallet.send(&second).await.unwrap_err();
    assert!(matches!(err, WalletError::StaleSnapshot { .. }));
    assert_eq!(h.node.issued().len(), 1);
}

#[tokio::test]
async fn failed_issue_releases_the_reservation() {
    let h = harness();
    let owner = me(&h.wallet);
    let asset = fee_asset(&h.wallet);
    h.node
        .set_utxos(UtxoChain::Exchange, vec![coin(1, asset, 5 * UNIT, owner)]);
    h.wallet.refresh(UtxoChain::Exchange).await.unwrap();

    let to = stranger_address(&h.wallet);
    let built = h
        .wallet
        .build_transfer(&TransferRequest::single(asset, Amount::new(UNIT), to))
        .unwrap();

    h.node.fail_next_issue(RpcError::Status(503));
    let failed = h.wallet.submit(&built).await;
    assert_eq!(
        failed.history,
        vec![TxState::Draft, TxState::Built, TxState::Signed, TxState::Failed]
    );
    assert!(failed.signed.is_some());
    for id in built.consumed_utxos() {
        assert!(!h.wallet.tracker().is_reserved(UtxoChain::Exchange, &id));
    }

    h.wallet.send(&built).await.unwrap();
    assert_eq!(h.node.issued().len(), 1);
}

#[tokio::test]
async fn signing_with_the_wrong_custody_fails_without_reserving() {
    let h = harness();
    let owner = me(&h.wallet);
    let asset = fee_asset(&h.wallet);
    h.node
        .set_utxos(UtxoChain::Exchange, vec![coin(1, asset, 5 * UNIT, owner)]);
    h.wallet.refresh(UtxoChain::Exchange).await.unwrap();
    let to = stranger_address(&h.wallet);
    let built = h
        .wallet
        .build_transfer(&TransferRequest::single(asset, Amount::new(UNIT), to))
        .unwrap();

    let intruder = SingleKeyWallet::import(OTHER_SECRET, h.wallet.config().hrp()).unwrap();
    let ctx = PipelineContext {
        custody: &intruder,
        tracker: h.wallet.tracker(),
        endpoints: trio_wallet_core::Endpoints {
            utxo: Some(h.node.as_ref()),
            account: None,
        },
        events: h.wallet.events(),
    };
    let submission = trio_wallet_core::pipeline::submit(&built, &ctx).await;

    assert_eq!(
        submission.history,
        vec![TxState::Draft, TxState::Built, TxState::Failed]
    );
    assert!(matches!(
        submission.into_result(),
        Err(WalletError::SigningFailure(_))
    ));
    assert!(h.node.issued().is_empty());
    for id in built.consumed_utxos() {
        assert!(!h.wallet.tracker().is_reserved(UtxoChain::Exchange, &id));
    }
}

// ── Account chain ──────────────────────────────────────────────────────

#[tokio::test]
async fn account_transfer_uses_node_nonce_and_padded_gas() {
    let h = harness();
    h.account.set_nonce(7);
    h.account.set_gas_estimate(50_000);
    h.account.set_balance(Amount::new(10 * UNIT));

    assert_eq!(h.wallet.refresh_account_balance().await.unwrap(), Amount::new(10 * UNIT));
    assert_eq!(h.wallet.account_balance(), Amount::new(10 * UNIT));

    let transfer = AccountTransfer::Native {
        to: EvmAddress::new([9; 20]),
        value: Amount::new(UNIT),
    };
    let built = h.wallet.build_account_transfer(&transfer).await.unwrap();
    let tx = match &built.unsigned {
        UnsignedTx::Account(tx) => tx.clone(),
        other => panic!("expected account tx, got {other:?}"),
    };
    assert_eq!(tx.nonce, 7);
    assert_eq!(tx.gas_limit, 55_000);
    assert_eq!(tx.chain_id, h.wallet.config().account_chain_id);
    assert!(built.stamp.is_none());

    let calls = h.account.estimate_calls();
    assert_eq!(calls[0].from, Some(h.wallet.custody().evm_address()));

    let id = h.wallet.send(&built).await.unwrap();
    assert!(matches!(id, IssuedId::Account(_)));
    assert_eq!(h.account.sent().len(), 1);
}

#[tokio::test]
async fn account_send_failure_is_reported() {
    let h = harness();
    h.account.fail_next_send(RpcError::Remote {
        code: -32000,
        message: "nonce too low".into(),
    });
    let transfer = AccountTransfer::Native {
        to: EvmAddress::new([9; 20]),
        value: Amount::new(1),
    };
    let built = h.wallet.build_account_transfer(&transfer).await.unwrap();
    let submission = h.wallet.submit(&built).await;
    assert_eq!(submission.state(), TxState::Failed);
    assert!(matches!(
        submission.into_result(),
        Err(WalletError::Rpc(RpcError::Remote { .. }))
    ));
}

// ── Staking ────────────────────────────────────────────────────────────

fn validator(node: u8, stake: u128, end: u64, delegated: &[u128]) -> ValidatorRecord {
    ValidatorRecord {
        node_id: NodeId::new([node; 20]),
        stake_amount: Amount::new(stake),
        start_time: Timestamp::new(NOW - 3600),
        end_time: Timestamp::new(end),
        delegation_fee: 2.0,
        uptime: 0.99,
        delegators: delegated
            .iter()
            .map(|amount| DelegatorRecord {
                node_id: NodeId::new([node; 20]),
                stake_amount: Amount::new(*amount),
                start_time: Timestamp::new(NOW - 60),
                end_time: Timestamp::new(end),
                status: DelegatorStatus::Active,
            })
            .collect(),
    }
}

#[tokio::test]
async fn validator_capacity_combines_active_and_pending_delegations() {
    let h = harness();
    let far = NOW + 60 * 24 * 3600;
    h.platform.set_validators(vec![
        validator(1, 2_000 * UNIT, far, &[1_000 * UNIT]),
        validator(2, 2_000 * UNIT, NOW + 3600, &[]),
    ]);
    h.platform.set_pending(PendingSet {
        validators: Vec::new(),
        delegators: vec![DelegatorRecord {
            node_id: NodeId::new([1; 20]),
            stake_amount: Amount::new(500 * UNIT),
            start_time: Timestamp::new(NOW + 60),
            end_time: Timestamp::new(far),
            status: DelegatorStatus::Pending,
        }],
    });
    h.platform.set_min_stake(MinStake {
        min_validator_stake: Amount::new(2_000 * UNIT),
        min_delegator_stake: Amount::new(25 * UNIT),
    });

    let open = h.wallet.validator_capacity().await.unwrap();
    assert_eq!(open.len(), 1);
    let v = &open[0];
    assert_eq!(v.node_id, NodeId::new([1; 20]));
    assert_eq!(v.delegated, Amount::new(1_500 * UNIT));
    let max = h.wallet.calculator().validator_max_stake(Amount::new(2_000 * UNIT));
    assert_eq!(v.max_stake, max);
    assert_eq!(
        v.remaining_stake,
        max.checked_sub(Amount::new(3_500 * UNIT)).unwrap()
    );
}

#[tokio::test]
async fn stake_refresh_is_cached_and_announced() {
    let mut h = harness();
    let events = record_events(&mut h.wallet);
    h.platform.set_staked(Amount::new(42 * UNIT));

    assert_eq!(h.wallet.refresh_stake().await.unwrap(), Amount::new(42 * UNIT));
    assert_eq!(h.wallet.staked(), Amount::new(42 * UNIT));
    assert!(events.lock().unwrap().contains(&WalletEvent::StakeUpdated {
        staked: Amount::new(42 * UNIT)
    }));
}

// ── Conservation ───────────────────────────────────────────────────────

fn conservation_snapshot(owner: ShortId, asset: AssetId, amounts: &[u64]) -> UtxoSnapshot {
    let mut utxos = trio_types::UtxoSet::new();
    for (i, amount) in amounts.iter().enumerate() {
        let mut tx = [0u8; 32];
        tx[..8].copy_from_slice(&(i as u64).to_be_bytes());
        utxos.insert(Utxo::transfer(
            UtxoId::new(TxId::new(tx), 0),
            asset,
            Amount::new(u128::from(*amount)),
            owner,
        ));
    }
    UtxoSnapshot {
        chain: UtxoChain::Exchange,
        version: 1,
        addresses: Vec::new(),
        utxos,
        fetched_at: Timestamp::new(NOW),
    }
}

proptest! {
    #[test]
    fn built_transfers_conserve_value(
        amounts in prop::collection::vec(1u64..1_000_000_000_000, 1..12),
        fraction in 0.0f64..1.0,
    ) {
        let config = WalletConfig::default();
        let builder = TransactionBuilder::from_config(&config);
        let asset = config.fee_asset_id;
        let owner = ShortId::new([7; 20]);
        let snapshot = conservation_snapshot(owner, asset, &amounts);
        let owners: BTreeSet<ShortId> = [owner].into_iter().collect();
        let ctx = trio_wallet_core::SpendContext {
            snapshot: &snapshot,
            owners: &owners,
            change: owner,
            now: Timestamp::new(NOW),
        };

        let total: u128 = amounts.iter().map(|a| u128::from(*a)).sum();
        let fee = builder.fees().base_fee.raw();
        prop_assume!(total > fee + 1);
        let send = 1 + ((total - fee - 1) as f64 * fraction) as u128;
        let to = trio_crypto::address_string(ChainFamily::Exchange, config.hrp(), &ShortId::new([8; 20]))
            .unwrap();

        let built = builder
            .transfer(&ctx, &TransferRequest::single(asset, Amount::new(send), to))
            .unwrap();
        let tx = match &built.unsigned {
            UnsignedTx::Utxo(tx) => tx.clone(),
            UnsignedTx::Account(_) => unreachable!(),
        };
        let base = tx.base();
        let consumed: u128 = base.inputs.iter().map(|i| i.amount.raw()).sum();
        let produced: u128 = base
            .outputs
            .iter()
            .filter_map(|o| o.output.amount())
            .map(|a| a.raw())
            .sum();
        prop_assert_eq!(consumed, produced + fee);
        prop_assert_eq!(built.signers.len(), base.inputs.len());
    }
}
