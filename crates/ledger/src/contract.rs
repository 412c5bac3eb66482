use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use dappazon_core::config::LedgerConfig;
use dappazon_core::domain::catalog::{CatalogEntry, EntryId};

use crate::abi;
use crate::{CatalogSource, LedgerError};

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
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Reads marketplace items straight from the deployed contract over
/// Ethereum JSON-RPC.
pub struct ContractCatalog {
    client: reqwest::Client,
    rpc_url: String,
    contract_address: String,
}

impl ContractCatalog {
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LedgerError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            contract_address: config.contract_address.clone(),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<String, LedgerError> {
        let request = RpcRequest { jsonrpc: "2.0", id: 1, method, params };

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                if error.is_connect() || error.is_timeout() {
                    LedgerError::Unavailable(error.to_string())
                } else {
                    LedgerError::Transport(error.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Transport(format!("rpc endpoint returned {status}")));
        }

        let body: RpcResponse =
            response.json().await.map_err(|error| LedgerError::Decode(error.to_string()))?;
        interpret_response(body)
    }
}

fn interpret_response(body: RpcResponse) -> Result<String, LedgerError> {
    if let Some(error) = body.error {
        return Err(LedgerError::Rpc { code: error.code, message: error.message });
    }
    body.result.ok_or_else(|| LedgerError::Decode("rpc response carried no result".to_string()))
}

fn items_call_params(contract_address: &str, id: EntryId) -> Value {
    json!([
        { "to": contract_address, "data": abi::encode_items_call(id.0) },
        "latest"
    ])
}

fn parse_quantity(raw: &str) -> Result<u64, LedgerError> {
    let digits = raw.trim().trim_start_matches("0x");
    u64::from_str_radix(digits, 16)
        .map_err(|error| LedgerError::Decode(format!("invalid quantity `{raw}`: {error}")))
}

#[async_trait]
impl CatalogSource for ContractCatalog {
    async fn get_entry(&self, id: EntryId) -> Result<Option<CatalogEntry>, LedgerError> {
        let raw = self.call("eth_call", items_call_params(&self.contract_address, id)).await?;
        let data = abi::decode_hex(&raw)?;
        Ok(abi::decode_item(&data)?)
    }

    async fn ping(&self) -> Result<u64, LedgerError> {
        let raw = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(&raw)
    }
}
