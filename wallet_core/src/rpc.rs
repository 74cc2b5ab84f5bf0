//! JSON-RPC 2.0 clients for a node's chain endpoints.
//!
//! [`JsonRpcUtxoClient`] speaks `avm.*` on the exchange endpoint and
//! `platform.*` on the staking endpoint; [`JsonRpcAccountClient`] speaks
//! `eth_*`. UTXOs and transactions travel as `0x`-hex canonical bytes with a
//! 4-byte checksum.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use trio_transactions::Decode;
use trio_types::{
    strip_checksum, Amount, DelegatorRecord, DelegatorStatus, EvmAddress, MinStake, NodeId,
    PendingSet, Timestamp, TxId, Utxo, UtxoChain, ValidatorRecord,
};

use crate::client::{
    AccountChainClient, CallRequest, PlatformClient, RpcError, TxHash, UtxoChainClient, UtxoCursor,
    UtxoPage,
};
use crate::config::RpcConfig;
use crate::error::WalletError;

// ── Transport ──────────────────────────────────────────────────────────

struct Transport {
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl Transport {
    fn new(config: &RpcConfig) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| WalletError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, url: &str, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(%url, method, id, "rpc call");

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RpcError::Status(response.status().as_u16()));
        }
        let json: Value = response
            .json()
            .await
            .map_err(|e| RpcError::Malformed(format!("invalid JSON response: {e}")))?;
        parse_response(json)
    }

    async fn call_as<T: DeserializeOwned>(&self, url: &str, method: &str, params: Value) -> Result<T, RpcError> {
        let result = self.call(url, method, params).await?;
        serde_json::from_value(result).map_err(|e| RpcError::Malformed(format!("{method}: {e}")))
    }
}

/// Extract `result` from a JSON-RPC envelope, or the node's error.
fn parse_response(json: Value) -> Result<Value, RpcError> {
    if let Some(err) = json.get("error").filter(|e| !e.is_null()) {
        return Err(RpcError::Remote {
            code: err.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    json.get("result")
        .cloned()
        .ok_or_else(|| RpcError::Malformed("response has neither result nor error".into()))
}

fn decode_hex_payload(field: &str, text: &str) -> Result<Vec<u8>, RpcError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let raw = hex::decode(digits).map_err(|e| RpcError::Malformed(format!("{field}: {e}")))?;
    strip_checksum(&raw)
        .map(<[u8]>::to_vec)
        .map_err(|e| RpcError::Malformed(format!("{field}: {e}")))
}

fn parse_number<T: std::str::FromStr>(field: &str, text: &str) -> Result<T, RpcError>
where
    T::Err: std::fmt::Display,
{
    text.trim()
        .parse()
        .map_err(|e| RpcError::Malformed(format!("{field} {text:?}: {e}")))
}

/// An `eth_*` quantity: `0x`-prefixed hex.
fn parse_quantity(field: &str, value: &Value) -> Result<u128, RpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Malformed(format!("{field}: expected a hex string")))?;
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::Malformed(format!("{field} {text:?}: missing 0x prefix")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|e| RpcError::Malformed(format!("{field} {text:?}: {e}")))
}

fn quantity(value: u128) -> String {
    format!("0x{value:x}")
}

// ── UTXO and staking chains ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUtxoPage {
    #[serde(default)]
    utxos: Vec<String>,
    #[serde(default)]
    end_index: Option<UtxoCursor>,
}

fn parse_utxo_page(result: Value) -> Result<UtxoPage, RpcError> {
    let raw: RawUtxoPage =
        serde_json::from_value(result).map_err(|e| RpcError::Malformed(format!("getUTXOs: {e}")))?;
    let utxos = raw
        .utxos
        .iter()
        .map(|hex| {
            let bytes = decode_hex_payload("utxo", hex)?;
            Utxo::from_bytes(&bytes).map_err(|e| RpcError::Malformed(format!("utxo: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let end_cursor = raw
        .end_index
        .filter(|c| !c.address.is_empty() || !c.utxo.is_empty());
    Ok(UtxoPage { utxos, end_cursor })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDelegator {
    #[serde(rename = "nodeID")]
    node_id: NodeId,
    start_time: String,
    end_time: String,
    stake_amount: Amount,
}

impl RawDelegator {
    fn into_record(self, status: DelegatorStatus) -> Result<DelegatorRecord, RpcError> {
        Ok(DelegatorRecord {
            node_id: self.node_id,
            stake_amount: self.stake_amount,
            start_time: Timestamp::new(parse_number("startTime", &self.start_time)?),
            end_time: Timestamp::new(parse_number("endTime", &self.end_time)?),
            status,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValidator {
    #[serde(rename = "nodeID")]
    node_id: NodeId,
    start_time: String,
    end_time: String,
    stake_amount: Amount,
    #[serde(default)]
    delegation_fee: Option<String>,
    #[serde(default)]
    uptime: Option<String>,
    #[serde(default)]
    delegators: Option<Vec<RawDelegator>>,
}

impl RawValidator {
    fn into_record(self, status: DelegatorStatus) -> Result<ValidatorRecord, RpcError> {
        let delegators = self
            .delegators
            .unwrap_or_default()
            .into_iter()
            .map(|d| d.into_record(status))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ValidatorRecord {
            node_id: self.node_id,
            stake_amount: self.stake_amount,
            start_time: Timestamp::new(parse_number("startTime", &self.start_time)?),
            end_time: Timestamp::new(parse_number("endTime", &self.end_time)?),
            delegation_fee: match &self.delegation_fee {
                Some(fee) => parse_number("delegationFee", fee)?,
                None => 0.0,
            },
            uptime: match &self.uptime {
                Some(uptime) => parse_number("uptime", uptime)?,
                None => 0.0,
            },
            delegators,
        })
    }
}

#[derive(Deserialize)]
struct RawValidators {
    #[serde(default)]
    validators: Vec<RawValidator>,
    #[serde(default)]
    delegators: Vec<RawDelegator>,
}

fn parse_current_validators(result: Value) -> Result<Vec<ValidatorRecord>, RpcError> {
    let raw: RawValidators = serde_json::from_value(result)
        .map_err(|e| RpcError::Malformed(format!("getCurrentValidators: {e}")))?;
    raw.validators
        .into_iter()
        .map(|v| v.into_record(DelegatorStatus::Active))
        .collect()
}

fn parse_pending(result: Value) -> Result<PendingSet, RpcError> {
    let raw: RawValidators = serde_json::from_value(result)
        .map_err(|e| RpcError::Malformed(format!("getPendingValidators: {e}")))?;
    Ok(PendingSet {
        validators: raw
            .validators
            .into_iter()
            .map(|v| v.into_record(DelegatorStatus::Pending))
            .collect::<Result<_, _>>()?,
        delegators: raw
            .delegators
            .into_iter()
            .map(|d| d.into_record(DelegatorStatus::Pending))
            .collect::<Result<_, _>>()?,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMinStake {
    min_validator_stake: Amount,
    min_delegator_stake: Amount,
}

#[derive(Deserialize)]
struct RawTxId {
    #[serde(rename = "txID")]
    tx_id: TxId,
}

#[derive(Deserialize)]
struct RawSupply {
    supply: Amount,
}

#[derive(Deserialize)]
struct RawStake {
    staked: Amount,
}

/// Exchange- and staking-chain client.
pub struct JsonRpcUtxoClient {
    transport: Transport,
    exchange_url: String,
    staking_url: String,
}

impl JsonRpcUtxoClient {
    pub fn new(config: &RpcConfig) -> Result<Self, WalletError> {
        Ok(Self {
            transport: Transport::new(config)?,
            exchange_url: config.exchange_url(),
            staking_url: config.staking_url(),
        })
    }

    fn route(&self, chain: UtxoChain) -> (&str, &'static str) {
        match chain {
            UtxoChain::Exchange => (self.exchange_url.as_str(), "avm"),
            UtxoChain::Staking => (self.staking_url.as_str(), "platform"),
        }
    }
}

#[async_trait]
impl UtxoChainClient for JsonRpcUtxoClient {
    async fn get_utxos(
        &self,
        chain: UtxoChain,
        addresses: &[String],
        limit: u32,
        cursor: Option<&UtxoCursor>,
    ) -> Result<UtxoPage, RpcError> {
        let (url, namespace) = self.route(chain);
        let mut params = json!({
            "addresses": addresses,
            "limit": limit,
            "encoding": "hex",
        });
        if let (Some(cursor), Some(obj)) = (cursor, params.as_object_mut()) {
            obj.insert(
                "startIndex".into(),
                json!({ "address": cursor.address, "utxo": cursor.utxo }),
            );
        }
        let result = self
            .transport
            .call(url, &format!("{namespace}.getUTXOs"), params)
            .await?;
        parse_utxo_page(result)
    }

    async fn issue_tx(&self, chain: UtxoChain, tx_hex: &str) -> Result<TxId, RpcError> {
        let (url, namespace) = self.route(chain);
        let raw: RawTxId = self
            .transport
            .call_as(
                url,
                &format!("{namespace}.issueTx"),
                json!({ "tx": tx_hex, "encoding": "hex" }),
            )
            .await?;
        Ok(raw.tx_id)
    }
}

#[async_trait]
impl PlatformClient for JsonRpcUtxoClient {
    async fn get_current_validators(&self) -> Result<Vec<ValidatorRecord>, RpcError> {
        let result = self
            .transport
            .call(&self.staking_url, "platform.getCurrentValidators", json!({}))
            .await?;
        parse_current_validators(result)
    }

    async fn get_pending_validators(&self) -> Result<PendingSet, RpcError> {
        let result = self
            .transport
            .call(&self.staking_url, "platform.getPendingValidators", json!({}))
            .await?;
        parse_pending(result)
    }

    async fn get_min_stake(&self) -> Result<MinStake, RpcError> {
        let raw: RawMinStake = self
            .transport
            .call_as(&self.staking_url, "platform.getMinStake", json!({}))
            .await?;
        Ok(MinStake {
            min_validator_stake: raw.min_validator_stake,
            min_delegator_stake: raw.min_delegator_stake,
        })
    }

    async fn get_current_supply(&self) -> Result<Amount, RpcError> {
        let raw: RawSupply = self
            .transport
            .call_as(&self.staking_url, "platform.getCurrentSupply", json!({}))
            .await?;
        Ok(raw.supply)
    }

    async fn get_stake(&self, addresses: &[String]) -> Result<Amount, RpcError> {
        let raw: RawStake = self
            .transport
            .call_as(
                &self.staking_url,
                "platform.getStake",
                json!({ "addresses": addresses }),
            )
            .await?;
        Ok(raw.staked)
    }
}

// ── Account chain ──────────────────────────────────────────────────────

pub struct JsonRpcAccountClient {
    transport: Transport,
    url: String,
}

impl JsonRpcAccountClient {
    pub fn new(config: &RpcConfig) -> Result<Self, WalletError> {
        Ok(Self {
            transport: Transport::new(config)?,
            url: config.account_url(),
        })
    }
}

fn call_object(call: &CallRequest) -> Value {
    let mut obj = json!({
        "to": call.to.to_string(),
        "value": quantity(call.value.raw()),
        "data": format!("0x{}", hex::encode(&call.data)),
    });
    if let (Some(from), Some(map)) = (call.from, obj.as_object_mut()) {
        map.insert("from".into(), json!(from.to_string()));
    }
    obj
}

#[async_trait]
impl AccountChainClient for JsonRpcAccountClient {
    async fn get_balance(&self, address: &EvmAddress) -> Result<Amount, RpcError> {
        let result = self
            .transport
            .call(&self.url, "eth_getBalance", json!([address.to_string(), "latest"]))
            .await?;
        parse_quantity("eth_getBalance", &result).map(Amount::new)
    }

    async fn get_transaction_count(&self, address: &EvmAddress) -> Result<u64, RpcError> {
        let result = self
            .transport
            .call(
                &self.url,
                "eth_getTransactionCount",
                json!([address.to_string(), "pending"]),
            )
            .await?;
        let count = parse_quantity("eth_getTransactionCount", &result)?;
        u64::try_from(count).map_err(|_| RpcError::Malformed(format!("nonce {count} out of range")))
    }

    async fn get_gas_price(&self) -> Result<Amount, RpcError> {
        let result = self.transport.call(&self.url, "eth_gasPrice", json!([])).await?;
        parse_quantity("eth_gasPrice", &result).map(Amount::new)
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, RpcError> {
        let result = self
            .transport
            .call(&self.url, "eth_estimateGas", json!([call_object(call)]))
            .await?;
        let gas = parse_quantity("eth_estimateGas", &result)?;
        u64::try_from(gas).map_err(|_| RpcError::Malformed(format!("gas {gas} out of range")))
    }

    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<TxHash, RpcError> {
        let result = self
            .transport
            .call(&self.url, "eth_sendRawTransaction", json!([raw_hex]))
            .await?;
        result
            .as_str()
            .ok_or_else(|| RpcError::Malformed("eth_sendRawTransaction: expected a hash".into()))?
            .parse()
    }
}
