// src/providers/monorail.rs

//! Monorail data API and pathfinder quote API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::providers::{endpoint, send_json, ProviderError};
use crate::utils::lenient_f64;

const PROVIDER: &str = "monorail";
const DEFAULT_SOURCE: &str = "monorail-mcp";

pub const TOKEN_CATEGORIES: &[&str] = &["wallet", "verified", "stable", "lst", "bridged", "meme"];

/// Token as returned by the token, token-list and balance endpoints. The
/// list endpoints send `decimals` as a string, the detail endpoint as a number.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonorailToken {
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<Value>,
    pub balance: Option<String>,
    pub id: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl MonorailToken {
    pub fn decimals(&self) -> Option<u64> {
        self.decimals.as_ref().and_then(lenient_f64).map(|d| d as u64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenSearch {
    pub find: Option<String>,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default)]
pub struct QuoteRequest {
    pub amount: String,
    pub from: String,
    pub to: String,
    pub sender: Option<String>,
    pub slippage: Option<i64>,
    pub deadline: Option<i64>,
    pub max_hops: Option<i64>,
    pub excluded: Option<String>,
    pub source: Option<String>,
}

impl QuoteRequest {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("amount", self.amount.clone()),
            ("from", self.from.clone()),
            ("to", self.to.clone()),
        ];
        if let Some(sender) = &self.sender {
            params.push(("sender", sender.clone()));
        }
        if let Some(slippage) = self.slippage {
            params.push(("slippage", slippage.to_string()));
        }
        if let Some(deadline) = self.deadline {
            params.push(("deadline", deadline.to_string()));
        }
        if let Some(max_hops) = self.max_hops {
            params.push(("max_hops", max_hops.to_string()));
        }
        if let Some(excluded) = &self.excluded {
            params.push(("excluded", excluded.clone()));
        }
        params.push((
            "source",
            self.source.clone().unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        ));
        params
    }
}

/// The fields of a quote the gateway summarizes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteSummary {
    pub from: Option<String>,
    pub to: Option<String>,
    pub input_formatted: Option<String>,
    pub output_formatted: Option<String>,
    pub min_output_formatted: Option<String>,
    pub hops: Option<Value>,
    /// Fraction, e.g. `"0.0123"` for 1.23%.
    pub compound_impact: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct Quote {
    pub summary: QuoteSummary,
    /// The full upstream document, passed through untouched.
    pub raw: Value,
}

#[async_trait]
pub trait SwapRouter: Send + Sync {
    async fn token(&self, contract_address: &str) -> Result<MonorailToken, ProviderError>;

    async fn tokens(&self, search: &TokenSearch) -> Result<Vec<MonorailToken>, ProviderError>;

    async fn tokens_by_category(
        &self,
        category: &str,
        address: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<MonorailToken>, ProviderError>;

    async fn token_count(&self) -> Result<u64, ProviderError>;

    async fn wallet_balances(&self, address: &str) -> Result<Vec<MonorailToken>, ProviderError>;

    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ProviderError>;
}

pub struct MonorailClient {
    http: Client,
    data_url: String,
    quote_url: String,
}

impl MonorailClient {
    pub fn new(http: Client, data_url: String, quote_url: String) -> Self {
        Self {
            http,
            data_url,
            quote_url,
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        base: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = endpoint(base, path);
        debug!(provider = PROVIDER, %url, "GET");
        send_json(PROVIDER, self.http.get(url).query(query)).await
    }
}

#[async_trait]
impl SwapRouter for MonorailClient {
    async fn token(&self, contract_address: &str) -> Result<MonorailToken, ProviderError> {
        self.get(&self.data_url, &format!("/v1/token/{}", contract_address), &[])
            .await
    }

    async fn tokens(&self, search: &TokenSearch) -> Result<Vec<MonorailToken>, ProviderError> {
        let mut query = vec![
            ("offset", search.offset.to_string()),
            ("limit", search.limit.to_string()),
        ];
        if let Some(find) = &search.find {
            query.push(("find", find.clone()));
        }
        self.get(&self.data_url, "/v1/tokens", &query).await
    }

    async fn tokens_by_category(
        &self,
        category: &str,
        address: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<MonorailToken>, ProviderError> {
        let mut query = vec![("offset", offset.to_string()), ("limit", limit.to_string())];
        if let Some(address) = address {
            query.push(("address", address.to_string()));
        }
        self.get(
            &self.data_url,
            &format!("/v1/tokens/category/{}", category),
            &query,
        )
        .await
    }

    async fn token_count(&self) -> Result<u64, ProviderError> {
        let count: Value = self.get(&self.data_url, "/v1/tokens/count", &[]).await?;
        lenient_f64(&count)
            .map(|c| c as u64)
            .ok_or_else(|| ProviderError::decode(PROVIDER, format!("token count was {}", count)))
    }

    async fn wallet_balances(&self, address: &str) -> Result<Vec<MonorailToken>, ProviderError> {
        self.get(
            &self.data_url,
            &format!("/v1/wallet/{}/balances", address),
            &[],
        )
        .await
    }

    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ProviderError> {
        let raw: Value = self.get(&self.quote_url, "/v1/quote", &request.query()).await?;
        let summary: QuoteSummary = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::decode(PROVIDER, e.to_string()))?;
        Ok(Quote { summary, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn quote_source_defaults() {
        let request = QuoteRequest {
            amount: "1".into(),
            from: "MON".into(),
            to: "USDC".into(),
            slippage: Some(50),
            ..Default::default()
        };
        let query = request.query();
        assert!(query.contains(&("source", "monorail-mcp".to_string())));
        assert!(query.contains(&("slippage", "50".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "sender"));
    }

    #[tokio::test]
    async fn quote_keeps_raw_document() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/quote")
            .match_query(Matcher::UrlEncoded("amount".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"from":"MON","to":"USDC","output_formatted":"3.2","compound_impact":"0.01","routes":[]}"#)
            .create_async()
            .await;

        let client = MonorailClient::new(Client::new(), "http://unused".into(), server.url());
        let quote = client
            .quote(&QuoteRequest {
                amount: "1".into(),
                from: "MON".into(),
                to: "USDC".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(quote.summary.output_formatted.as_deref(), Some("3.2"));
        assert!(quote.raw.get("routes").is_some());
    }

    #[tokio::test]
    async fn token_count_accepts_bare_number() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/tokens/count")
            .with_status(200)
            .with_body("1234")
            .create_async()
            .await;
        let client = MonorailClient::new(Client::new(), server.url(), "http://unused".into());
        assert_eq!(client.token_count().await.unwrap(), 1234);
    }

    #[test]
    fn string_decimals_are_read() {
        let token: MonorailToken =
            serde_json::from_str(r#"{"name":"USD Coin","decimals":"6","categories":["stable"]}"#)
                .unwrap();
        assert_eq!(token.decimals(), Some(6));
    }
}
