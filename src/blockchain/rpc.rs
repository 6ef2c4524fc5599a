// src/blockchain/rpc.rs

use ethers_core::types::{Address, Bytes, TransactionRequest, U256};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::providers::{send_json, ProviderError};

/// Minimal Ethereum JSON-RPC client over the shared HTTP client.
#[derive(Clone, Debug)]
pub struct RpcClient {
    http: Client,
    url: String,
}

impl RpcClient {
    pub fn new(http: Client, url: String) -> Self {
        Self { http, url }
    }

    /// Performs one JSON-RPC call and returns its `result`.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        debug!(method, "rpc request");
        let response: Value = send_json("rpc", self.http.post(&self.url).json(&payload)).await?;
        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ProviderError::Rpc(format!("{}: {}", method, message)));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    /// `eth_call` against `latest`, returning the raw return data.
    pub async fn eth_call(&self, to: Address, data: Bytes) -> Result<Vec<u8>, ProviderError> {
        let result = self
            .request(
                "eth_call",
                json!([{ "to": format!("{:?}", to), "data": format!("0x{}", hex::encode(&data)) }, "latest"]),
            )
            .await?;
        let s = result
            .as_str()
            .ok_or_else(|| ProviderError::decode("rpc", "eth_call result is not a string"))?;
        hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ProviderError::decode("rpc", format!("eth_call result is not hex: {}", e)))
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<U256, ProviderError> {
        let result = self.request(method, params).await?;
        parse_quantity(&result)
            .ok_or_else(|| ProviderError::decode("rpc", format!("{} returned {}", method, result)))
    }

    pub async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.quantity("eth_chainId", json!([])).await?.low_u64())
    }

    pub async fn transaction_count(&self, address: Address) -> Result<U256, ProviderError> {
        self.quantity(
            "eth_getTransactionCount",
            json!([format!("{:?}", address), "pending"]),
        )
        .await
    }

    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256, ProviderError> {
        let call = serde_json::to_value(tx)
            .map_err(|e| ProviderError::InvalidInput(format!("unencodable transaction: {}", e)))?;
        self.quantity("eth_estimateGas", json!([call])).await
    }

    pub async fn gas_price(&self) -> Result<U256, ProviderError> {
        self.quantity("eth_gasPrice", json!([])).await
    }

    /// Submits a signed transaction, returning its hash.
    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<String, ProviderError> {
        let result = self
            .request(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(raw))]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::decode("rpc", "missing transaction hash"))
    }

    /// Polls until the transaction is mined. `Ok(true)` means it succeeded,
    /// `Ok(false)` that it reverted.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        poll: Duration,
        limit: Duration,
    ) -> Result<bool, ProviderError> {
        let deadline = Instant::now() + limit;
        loop {
            let receipt = self
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if !receipt.is_null() {
                return Ok(receipt.get("status").and_then(Value::as_str) == Some("0x1"));
            }
            if Instant::now() >= deadline {
                return Err(ProviderError::TimedOut(limit));
            }
            sleep(poll).await;
        }
    }
}

fn parse_quantity(value: &Value) -> Option<U256> {
    let s = value.as_str()?;
    U256::from_str_radix(s.trim_start_matches("0x"), 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_are_hex() {
        assert_eq!(parse_quantity(&json!("0x279f")), Some(U256::from(10143u64)));
        assert_eq!(parse_quantity(&json!(12)), None);
    }

    #[tokio::test]
    async fn rpc_errors_surface_their_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#)
            .create_async()
            .await;

        let rpc = RpcClient::new(Client::new(), server.url());
        let err = rpc.gas_price().await.unwrap_err();
        assert_eq!(err.to_string(), "RPC error: eth_gasPrice: execution reverted");
    }

    #[tokio::test]
    async fn receipt_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"status":"0x0","transactionHash":"0xaa"}}"#)
            .create_async()
            .await;

        let rpc = RpcClient::new(Client::new(), server.url());
        let ok = rpc
            .wait_for_receipt("0xaa", Duration::from_millis(10), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn chain_id_is_decoded() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x279f"}"#)
            .create_async()
            .await;

        let rpc = RpcClient::new(Client::new(), server.url());
        assert_eq!(rpc.chain_id().await.unwrap(), 10143);
    }
}
