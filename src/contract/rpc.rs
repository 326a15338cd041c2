//! contract::rpc
//!
//! Goal contract backend over Ethereum JSON-RPC.
//!
//! # Design
//!
//! Reads go through `eth_call` against the latest block. Writes are sent
//! with `eth_sendTransaction` from an account the node manages; the node
//! signs. Each write then polls `eth_getTransactionReceipt` until the
//! transaction is mined or the receipt timeout elapses.
//!
//! A receipt with `status == 0x0` is reported as
//! [`ContractError::TransactionFailed`]. JSON-RPC errors whose message
//! mentions a revert become [`ContractError::Reverted`]; other node errors
//! keep their code.
//!
//! Nothing here retries. Remote failures go back to the caller as-is.
//!
//! # Example
//!
//! ```ignore
//! use akuntabel::contract::rpc::RpcContract;
//!
//! let contract = RpcContract::new("http://127.0.0.1:8545", contract_address)
//!     .with_sender(account);
//! let nonce = contract.user_goal_nonce(&account).await?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::abi::Word;
use super::interface;
use super::traits::{ContractError, GoalContract, GoalEvent, TxReceipt};
use crate::core::goal::{CreateGoalRequest, Goal};
use crate::core::types::{Address, GoalId, Nonce, Wei};

/// Default delay between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default time to wait for a receipt.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(60);

/// JSON-RPC goal contract.
#[derive(Debug)]
pub struct RpcContract {
    /// HTTP client for making requests
    client: Client,
    /// Node endpoint
    url: String,
    /// Deployed contract address
    contract: Address,
    /// Account transactions are sent from
    sender: Option<Address>,
    /// Delay between receipt polls
    poll_interval: Duration,
    /// Give up waiting for a receipt after this long
    receipt_timeout: Duration,
    /// JSON-RPC request id counter
    next_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    topics: Vec<String>,
    data: String,
    block_number: Option<String>,
    #[serde(default)]
    removed: bool,
}

impl RpcContract {
    /// Create a backend for the contract at `contract`, reachable through `url`.
    pub fn new(url: impl Into<String>, contract: Address) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            contract,
            sender: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            next_id: AtomicU64::new(1),
        }
    }

    /// Send transactions from `sender`.
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set receipt polling parameters.
    pub fn with_confirmation(mut self, poll_interval: Duration, receipt_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.receipt_timeout = receipt_timeout;
        self
    }

    /// The node endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The contract address.
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Issue a JSON-RPC request and deserialize its result.
    ///
    /// A `null` result deserializes as-is, so `T = Option<_>` observes it.
    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ContractError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "rpc request");

        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ContractError::NetworkError(e.to_string()))?;

        let result = self.handle_response(response).await?;
        serde_json::from_value(result).map_err(|e| {
            ContractError::Decode(format!("unexpected result for {}: {}", method, e))
        })
    }

    /// Handle an HTTP response, mapping transport and JSON-RPC errors.
    async fn handle_response(&self, response: Response) -> Result<Value, ContractError> {
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .filter(|t| !t.is_empty())
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(ContractError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: RpcResponse = response.json().await.map_err(|e| ContractError::ApiError {
            status: status.as_u16(),
            message: format!("Failed to parse response: {}", e),
        })?;

        if let Some(err) = body.error {
            return Err(map_rpc_error(err));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }

    /// `eth_call` against the latest block.
    async fn call(&self, data: Vec<u8>) -> Result<Vec<u8>, ContractError> {
        let params = json!([
            {
                "to": self.contract.to_checksum(),
                "data": to_hex(&data),
            },
            "latest"
        ]);
        let result: String = self.request("eth_call", params).await?;
        from_hex(&result)
    }

    /// Send a transaction and wait for it to be mined.
    async fn transact(&self, data: Vec<u8>, value: Wei) -> Result<TxReceipt, ContractError> {
        let from = self.sender.ok_or(ContractError::NoSender)?;
        let params = json!([{
            "from": from.to_checksum(),
            "to": self.contract.to_checksum(),
            "data": to_hex(&data),
            "value": format!("{:#x}", value.as_u128()),
        }]);

        let tx_hash: String = self.request("eth_sendTransaction", params).await?;
        info!(tx_hash = %tx_hash, from = %from, "transaction submitted");

        self.wait_for_receipt(tx_hash).await
    }

    /// Poll for a receipt until mined or timed out.
    async fn wait_for_receipt(&self, tx_hash: String) -> Result<TxReceipt, ContractError> {
        let started = tokio::time::Instant::now();

        loop {
            let receipt: Option<RpcReceipt> = self
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if let Some(receipt) = receipt {
                if let Some(block) = receipt.block_number.as_deref() {
                    let block_number = parse_quantity(block)?;
                    if receipt.status.as_deref().map(parse_quantity).transpose()? == Some(0) {
                        warn!(tx_hash = %receipt.transaction_hash, "transaction reverted");
                        return Err(ContractError::TransactionFailed {
                            tx_hash: receipt.transaction_hash,
                        });
                    }
                    debug!(tx_hash = %receipt.transaction_hash, block_number, "transaction confirmed");
                    return Ok(TxReceipt {
                        tx_hash: receipt.transaction_hash,
                        block_number,
                    });
                }
            }

            if started.elapsed() >= self.receipt_timeout {
                return Err(ContractError::Timeout {
                    tx_hash,
                    waited_secs: self.receipt_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn map_rpc_error(err: RpcErrorBody) -> ContractError {
    // Nodes report reverts as code 3 (with data) or -32000/-32603 with a message.
    let mentions_revert = err.message.to_lowercase().contains("revert");
    if err.code == 3 || mentions_revert {
        let reason = err
            .message
            .strip_prefix("execution reverted: ")
            .or_else(|| err.message.strip_prefix("VM Exception while processing transaction: reverted with reason string "))
            .map(|r| r.trim_matches('\'').to_string())
            .unwrap_or_else(|| err.message.clone());
        debug!(code = err.code, data = ?err.data, "call reverted");
        ContractError::Reverted(reason)
    } else {
        ContractError::Rpc {
            code: err.code,
            message: err.message,
        }
    }
}

/// `0x`-prefixed lowercase hex.
fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn from_hex(s: &str) -> Result<Vec<u8>, ContractError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| ContractError::Decode(format!("invalid hex '{}': {}", s, e)))
}

fn from_hex_word(s: &str) -> Result<Word, ContractError> {
    from_hex(s)?
        .try_into()
        .map_err(|_| ContractError::Decode(format!("expected 32-byte topic, got '{}'", s)))
}

/// Parse a JSON-RPC quantity such as `0x1b4`.
fn parse_quantity(s: &str) -> Result<u64, ContractError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| ContractError::Decode(format!("quantity without 0x prefix: '{}'", s)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ContractError::Decode(format!("invalid quantity '{}': {}", s, e)))
}

#[async_trait]
impl GoalContract for RpcContract {
    fn name(&self) -> &'static str {
        "rpc"
    }

    fn sender(&self) -> Option<Address> {
        self.sender
    }

    async fn create_goal(&self, request: &CreateGoalRequest) -> Result<TxReceipt, ContractError> {
        self.transact(interface::encode_create_goal(request), request.stake)
            .await
    }

    async fn approve_goal(&self, goal_id: GoalId) -> Result<TxReceipt, ContractError> {
        self.transact(interface::encode_approve_goal(&goal_id), Wei::ZERO)
            .await
    }

    async fn achieve_milestone(&self, goal_id: GoalId, index: u64) -> Result<TxReceipt, ContractError> {
        self.transact(interface::encode_achieve_milestone(&goal_id, index), Wei::ZERO)
            .await
    }

    async fn get_goal_details(&self, goal_id: GoalId) -> Result<Goal, ContractError> {
        let data = self.call(interface::encode_get_goal_details(&goal_id)).await?;
        Ok(interface::decode_goal_details(&data)?)
    }

    async fn user_goal_nonce(&self, owner: &Address) -> Result<Nonce, ContractError> {
        let data = self.call(interface::encode_user_goal_nonce(owner)).await?;
        Ok(interface::decode_nonce(&data)?)
    }

    async fn block_number(&self) -> Result<u64, ContractError> {
        let result: String = self.request("eth_blockNumber", json!([])).await?;
        parse_quantity(&result)
    }

    async fn goal_events(&self, from_block: u64, to_block: u64) -> Result<Vec<GoalEvent>, ContractError> {
        let params = json!([{
            "address": self.contract.to_checksum(),
            "fromBlock": format!("{:#x}", from_block),
            "toBlock": format!("{:#x}", to_block),
            "topics": [[
                to_hex(&interface::milestone_achieved_topic()),
                to_hex(&interface::goal_approved_topic()),
            ]],
        }]);
        let logs: Vec<RpcLog> = self.request("eth_getLogs", params).await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in logs.into_iter().filter(|l| !l.removed) {
            let Some(block) = log.block_number.as_deref() else {
                continue;
            };
            let topics = log
                .topics
                .iter()
                .map(|t| from_hex_word(t))
                .collect::<Result<Vec<_>, _>>()?;
            let data = from_hex(&log.data)?;
            if let Some(event) = interface::decode_event(&topics, &data, parse_quantity(block)?)? {
                events.push(event);
            }
        }
        Ok(events)
    }
}
