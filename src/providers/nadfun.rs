// src/providers/nadfun.rs

//! nad.fun launchpad: REST analytics plus DEX trades signed locally and sent
//! through a Uniswap-V2-style router.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use ethers_core::abi::{ParamType, Token};
use ethers_core::types::{Address, TransactionRequest, U256};
use ethers_signers::{LocalWallet, Signer};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::blockchain::abi::{decode_output, encode_call, next_token, take_array, take_uint};
use crate::blockchain::nonce_manager::NonceManager;
use crate::blockchain::rpc::RpcClient;
use crate::blockchain::transactions::send_evm_transaction;
use crate::providers::{endpoint, send_json, ProviderError};
use crate::utils::to_base_units;

const PROVIDER: &str = "nadfun";

const GET_AMOUNTS_OUT: &str = "getAmountsOut(uint256,address[])";
const SWAP_EXACT_ETH_FOR_TOKENS: &str = "swapExactETHForTokens(uint256,address[],address,uint256)";
const SWAP_EXACT_TOKENS_FOR_ETH: &str =
    "swapExactTokensForETH(uint256,uint256,address[],address,uint256)";
const APPROVE: &str = "approve(address,uint256)";
const DECIMALS: &str = "decimals()";

const SWAP_DEADLINE_SECS: i64 = 20 * 60;
const RECEIPT_POLL: Duration = Duration::from_secs(1);
const RECEIPT_WAIT: Duration = Duration::from_secs(90);

/// Which ranking an order listing uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrder {
    MarketCap,
    CreationTime,
    LatestTrade,
}

impl TokenOrder {
    fn path(self) -> &'static str {
        match self {
            TokenOrder::MarketCap => "/order/market_cap",
            TokenOrder::CreationTime => "/order/creation_time",
            TokenOrder::LatestTrade => "/order/latest_trade",
        }
    }
}

// The listing models name the fields the gateway reads and keep every other
// upstream field in `extra`, so payloads pass through without loss.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenSummary {
    pub name: Option<String>,
    pub symbol: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketInfo {
    pub price: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderToken {
    pub token_info: Option<TokenSummary>,
    pub market_info: Option<MarketInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionInfo {
    pub current_token_amount: Option<Value>,
    pub total_pnl: Option<Value>,
    pub realized_pnl: Option<Value>,
    pub unrealized_pnl: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    pub token: Option<TokenSummary>,
    pub position: Option<PositionInfo>,
    pub market: Option<MarketInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatedToken {
    pub token: Option<TokenSummary>,
    pub price: Option<Value>,
    pub market_cap: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemeToken {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub creator_address: Option<String>,
    pub price: Option<Value>,
    pub total_supply: Option<Value>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenHolder {
    pub account_address: Option<String>,
    #[serde(default)]
    pub is_dev: bool,
    pub balance: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HolderPage {
    #[serde(default)]
    pub holders: Vec<TokenHolder>,
    pub total_count: Option<u64>,
}

#[derive(Deserialize)]
struct OrderListing {
    #[serde(default)]
    order_token: Vec<OrderToken>,
}

#[derive(Deserialize)]
struct PositionListing {
    #[serde(default)]
    positions: Vec<Position>,
}

#[derive(Deserialize)]
struct CreatedListing {
    #[serde(default)]
    tokens: Vec<CreatedToken>,
}

/// A DEX trade. The key never leaves this struct except to build the signer.
pub struct Trade {
    pub private_key: SecretString,
    pub token_address: String,
    /// Human amount: MON for buys, tokens for sells.
    pub amount: String,
    /// Percent, 0..=100.
    pub slippage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeReceipt {
    pub tx_hash: String,
    pub approval_tx_hash: Option<String>,
    pub amount_in: U256,
    pub min_amount_out: U256,
}

#[async_trait]
pub trait Launchpad: Send + Sync {
    async fn tokens_by_order(
        &self,
        order: TokenOrder,
        page: u32,
        limit: u32,
    ) -> Result<Vec<OrderToken>, ProviderError>;

    async fn token(&self, token_address: &str) -> Result<MemeToken, ProviderError>;

    async fn token_holders(
        &self,
        token_address: &str,
        page: u32,
        limit: u32,
    ) -> Result<HolderPage, ProviderError>;

    async fn account_positions(
        &self,
        address: &str,
        position_type: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Position>, ProviderError>;

    async fn created_tokens(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<CreatedToken>, ProviderError>;

    async fn buy_from_dex(&self, trade: &Trade) -> Result<TradeReceipt, ProviderError>;

    async fn sell_to_dex(&self, trade: &Trade) -> Result<TradeReceipt, ProviderError>;
}

pub struct NadFunClient {
    http: Client,
    base_url: String,
    rpc: RpcClient,
    nonces: NonceManager,
    router: Option<String>,
    wmon: Option<String>,
}

impl NadFunClient {
    pub fn new(
        http: Client,
        base_url: String,
        rpc: RpcClient,
        nonces: NonceManager,
        router: Option<String>,
        wmon: Option<String>,
    ) -> Self {
        Self {
            http,
            base_url,
            rpc,
            nonces,
            router,
            wmon,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = endpoint(&self.base_url, path);
        debug!(provider = PROVIDER, %url, "GET");
        send_json(PROVIDER, self.http.get(url).query(query)).await
    }

    fn contract(&self, value: &Option<String>, setting: &'static str) -> Result<Address, ProviderError> {
        let raw = value.as_deref().ok_or(ProviderError::NotConfigured(setting))?;
        parse_address(raw, setting)
    }

    async fn amounts_out(&self, router: Address, amount_in: U256, path: &[Address]) -> Result<U256, ProviderError> {
        let data = encode_call(
            GET_AMOUNTS_OUT,
            &[
                Token::Uint(amount_in),
                Token::Array(path.iter().copied().map(Token::Address).collect()),
            ],
        );
        let out = self.rpc.eth_call(router, data).await?;
        let mut tokens = decode_output(
            GET_AMOUNTS_OUT,
            &[ParamType::Array(Box::new(ParamType::Uint(256)))],
            &out,
        )?
        .into_iter();
        take_array(next_token(&mut tokens)?)?
            .into_iter()
            .last()
            .map(take_uint)
            .transpose()?
            .ok_or_else(|| ProviderError::decode("rpc", "getAmountsOut returned no amounts"))
    }

    async fn token_decimals(&self, token: Address) -> Result<u32, ProviderError> {
        let out = self.rpc.eth_call(token, encode_call(DECIMALS, &[])).await?;
        let mut tokens = decode_output(DECIMALS, &[ParamType::Uint(8)], &out)?.into_iter();
        Ok(take_uint(next_token(&mut tokens)?)?.low_u32())
    }
}

fn parse_address(raw: &str, what: &str) -> Result<Address, ProviderError> {
    Address::from_str(raw)
        .map_err(|_| ProviderError::InvalidInput(format!("{} '{}' is not an EVM address", what, raw)))
}

fn wallet_from(key: &SecretString) -> Result<LocalWallet, ProviderError> {
    // The parse error may quote the input, so it is not forwarded.
    LocalWallet::from_str(key.expose_secret().trim())
        .map_err(|_| ProviderError::InvalidInput("privateKey is not a valid secp256k1 key".into()))
}

/// `expected * (100 - slippage%)`, computed in basis points.
pub fn min_amount_out(expected: U256, slippage_percent: f64) -> U256 {
    let bps = (slippage_percent.clamp(0.0, 100.0) * 100.0).round() as u64;
    expected * U256::from(10_000 - bps) / U256::from(10_000u64)
}

fn swap_deadline() -> U256 {
    U256::from((chrono::Utc::now().timestamp() + SWAP_DEADLINE_SECS) as u64)
}

fn parse_amount(amount: &str, decimals: u32) -> Result<U256, ProviderError> {
    match to_base_units(amount, decimals) {
        Some(v) if !v.is_zero() => Ok(v),
        _ => Err(ProviderError::InvalidInput(format!(
            "amount '{}' must be a positive number with at most {} decimals",
            amount, decimals
        ))),
    }
}

#[async_trait]
impl Launchpad for NadFunClient {
    async fn tokens_by_order(
        &self,
        order: TokenOrder,
        page: u32,
        limit: u32,
    ) -> Result<Vec<OrderToken>, ProviderError> {
        let listing: OrderListing = self
            .get(
                order.path(),
                &[("page", page.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(listing.order_token)
    }

    async fn token(&self, token_address: &str) -> Result<MemeToken, ProviderError> {
        self.get(&format!("/token/{}", token_address), &[]).await
    }

    async fn token_holders(
        &self,
        token_address: &str,
        page: u32,
        limit: u32,
    ) -> Result<HolderPage, ProviderError> {
        self.get(
            &format!("/token/holder/{}", token_address),
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn account_positions(
        &self,
        address: &str,
        position_type: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Position>, ProviderError> {
        let listing: PositionListing = self
            .get(
                &format!("/account/position/{}", address),
                &[
                    ("position_type", position_type.to_string()),
                    ("page", page.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(listing.positions)
    }

    async fn created_tokens(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<CreatedToken>, ProviderError> {
        let listing: CreatedListing = self
            .get(
                &format!("/account/create_token/{}", address),
                &[("page", page.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(listing.tokens)
    }

    async fn buy_from_dex(&self, trade: &Trade) -> Result<TradeReceipt, ProviderError> {
        let router = self.contract(&self.router, "NADFUN_DEX_ROUTER")?;
        let wmon = self.contract(&self.wmon, "WMON_ADDRESS")?;
        let token = parse_address(&trade.token_address, "tokenAddress")?;
        let wallet = wallet_from(&trade.private_key)?;

        let amount_in = parse_amount(&trade.amount, 18)?;
        let path = [wmon, token];
        let expected = self.amounts_out(router, amount_in, &path).await?;
        let min_out = min_amount_out(expected, trade.slippage);

        let data = encode_call(
            SWAP_EXACT_ETH_FOR_TOKENS,
            &[
                Token::Uint(min_out),
                Token::Array(path.iter().copied().map(Token::Address).collect()),
                Token::Address(wallet.address()),
                Token::Uint(swap_deadline()),
            ],
        );
        let tx = TransactionRequest::new().to(router).value(amount_in).data(data);
        let tx_hash = send_evm_transaction(&self.rpc, &wallet, tx, &self.nonces).await?;
        info!(token = ?token, %tx_hash, "dex buy submitted");

        Ok(TradeReceipt {
            tx_hash,
            approval_tx_hash: None,
            amount_in,
            min_amount_out: min_out,
        })
    }

    async fn sell_to_dex(&self, trade: &Trade) -> Result<TradeReceipt, ProviderError> {
        let router = self.contract(&self.router, "NADFUN_DEX_ROUTER")?;
        let wmon = self.contract(&self.wmon, "WMON_ADDRESS")?;
        let token = parse_address(&trade.token_address, "tokenAddress")?;
        let wallet = wallet_from(&trade.private_key)?;

        let decimals = self.token_decimals(token).await?;
        let amount_in = parse_amount(&trade.amount, decimals)?;
        let path = [token, wmon];
        let expected = self.amounts_out(router, amount_in, &path).await?;
        let min_out = min_amount_out(expected, trade.slippage);

        // The router must be allowed to pull the tokens before the swap can
        // even be gas-estimated.
        let approve = TransactionRequest::new().to(token).data(encode_call(
            APPROVE,
            &[Token::Address(router), Token::Uint(amount_in)],
        ));
        let approval_hash = send_evm_transaction(&self.rpc, &wallet, approve, &self.nonces).await?;
        if !self
            .rpc
            .wait_for_receipt(&approval_hash, RECEIPT_POLL, RECEIPT_WAIT)
            .await?
        {
            return Err(ProviderError::Rpc(format!(
                "approval transaction {} reverted",
                approval_hash
            )));
        }

        let data = encode_call(
            SWAP_EXACT_TOKENS_FOR_ETH,
            &[
                Token::Uint(amount_in),
                Token::Uint(min_out),
                Token::Array(path.iter().copied().map(Token::Address).collect()),
                Token::Address(wallet.address()),
                Token::Uint(swap_deadline()),
            ],
        );
        let swap = TransactionRequest::new().to(router).data(data);
        let tx_hash = send_evm_transaction(&self.rpc, &wallet, swap, &self.nonces).await?;
        info!(token = ?token, %tx_hash, "dex sell submitted");

        Ok(TradeReceipt {
            tx_hash,
            approval_tx_hash: Some(approval_hash),
            amount_in,
            min_amount_out: min_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: String) -> NadFunClient {
        NadFunClient::new(
            Client::new(),
            url,
            RpcClient::new(Client::new(), "http://127.0.0.1:9".into()),
            NonceManager::new(),
            None,
            None,
        )
    }

    #[test]
    fn slippage_is_applied_in_basis_points() {
        assert_eq!(min_amount_out(U256::from(10_000u64), 0.5), U256::from(9_950u64));
        assert_eq!(min_amount_out(U256::from(10_000u64), 0.0), U256::from(10_000u64));
        assert_eq!(min_amount_out(U256::from(10_000u64), 100.0), U256::zero());
    }

    #[tokio::test]
    async fn order_listing_passes_unknown_fields_through() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/order/market_cap")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"order_type":"market_cap","order_token":[{"token_info":{"name":"Chog","symbol":"CHOG","token_address":"0xc"},"market_info":{"price":"0.01","market_cap":"100"}}]}"#)
            .create_async()
            .await;

        let tokens = client(server.url())
            .tokens_by_order(TokenOrder::MarketCap, 2, 5)
            .await
            .unwrap();
        let info = tokens[0].token_info.as_ref().unwrap();
        assert_eq!(info.name.as_deref(), Some("Chog"));
        let out = serde_json::to_value(&tokens[0]).unwrap();
        assert_eq!(out["token_info"]["token_address"], "0xc");
        assert_eq!(out["market_info"]["market_cap"], "100");
    }

    #[tokio::test]
    async fn trades_need_a_router() {
        let trade = Trade {
            private_key: SecretString::new("0x01".into()),
            token_address: "0x1111111111111111111111111111111111111111".into(),
            amount: "1".into(),
            slippage: 0.5,
        };
        let err = client("http://unused".into()).buy_from_dex(&trade).await.unwrap_err();
        assert_eq!(err.to_string(), "NADFUN_DEX_ROUTER is not configured");
    }

    #[test]
    fn bad_keys_are_not_echoed() {
        let err = wallet_from(&SecretString::new("not-a-key-deadbeef".into())).unwrap_err();
        assert!(!err.to_string().contains("deadbeef"));
    }
}
