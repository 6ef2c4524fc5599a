// src/providers/blockvision.rs

//! Blockvision Monad indexer (account tokens, NFTs and token holders).

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::providers::{endpoint, send_json, ProviderError};

const PROVIDER: &str = "blockvision";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountToken {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub balance: Option<String>,
    pub contract_address: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub decimal: Option<Value>,
    pub verified: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftItem {
    pub contract_address: Option<String>,
    pub token_id: Option<Value>,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NftCollection {
    pub name: Option<String>,
    #[serde(default)]
    pub items: Vec<NftItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Holder {
    pub address: Option<String>,
    pub balance: Option<Value>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Page<T> {
    #[serde(default)]
    data: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

/// `{code, message, result: {data: [...]}}`
#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    result: Option<Page<T>>,
}

/// Holder listings have been seen both at the top level and under `result`.
#[derive(Deserialize)]
struct HolderListing {
    #[serde(default)]
    holders: Option<Vec<Holder>>,
    #[serde(default)]
    result: Option<Page<Holder>>,
}

#[async_trait]
pub trait AccountIndexer: Send + Sync {
    async fn account_tokens(
        &self,
        address: &str,
        page_index: u32,
    ) -> Result<Vec<AccountToken>, ProviderError>;

    async fn account_nfts(
        &self,
        address: &str,
        page_index: u32,
    ) -> Result<Vec<NftCollection>, ProviderError>;

    async fn token_holders(
        &self,
        contract_address: &str,
        page_size: u32,
        page_index: u32,
    ) -> Result<Vec<Holder>, ProviderError>;
}

pub struct BlockvisionClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl BlockvisionClient {
    pub fn new(http: Client, base_url: String, api_key: Option<SecretString>) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::NotConfigured("BLOCKVISION_API_KEY"))?;
        let url = endpoint(&self.base_url, path);
        debug!(provider = PROVIDER, %url, "GET");
        let request = self
            .http
            .get(url)
            .header("x-api-key", key.expose_secret())
            .header("Content-Type", "application/json")
            .query(query);
        send_json(PROVIDER, request).await
    }
}

#[async_trait]
impl AccountIndexer for BlockvisionClient {
    async fn account_tokens(
        &self,
        address: &str,
        page_index: u32,
    ) -> Result<Vec<AccountToken>, ProviderError> {
        let body: ApiResponse<AccountToken> = self
            .get(
                "/account/tokens",
                &[("address", address.to_string()), ("pageIndex", page_index.to_string())],
            )
            .await?;
        Ok(body.result.unwrap_or_default().data)
    }

    async fn account_nfts(
        &self,
        address: &str,
        page_index: u32,
    ) -> Result<Vec<NftCollection>, ProviderError> {
        let body: ApiResponse<NftCollection> = self
            .get(
                "/account/nfts",
                &[("address", address.to_string()), ("pageIndex", page_index.to_string())],
            )
            .await?;
        Ok(body.result.unwrap_or_default().data)
    }

    async fn token_holders(
        &self,
        contract_address: &str,
        page_size: u32,
        page_index: u32,
    ) -> Result<Vec<Holder>, ProviderError> {
        let body: HolderListing = self
            .get(
                "/token/holders",
                &[
                    ("contractAddress", contract_address.to_string()),
                    ("pageSize", page_size.to_string()),
                    ("pageIndex", page_index.to_string()),
                ],
            )
            .await?;
        Ok(body
            .holders
            .or_else(|| body.result.map(|page| page.data))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const ADDR: &str = "0x1111111111111111111111111111111111111111";

    fn client(url: String) -> BlockvisionClient {
        BlockvisionClient::new(Client::new(), url, Some(SecretString::new("bv-key".into())))
    }

    #[tokio::test]
    async fn account_tokens_read_result_data() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/account/tokens")
            .match_header("x-api-key", "bv-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("address".into(), ADDR.into()),
                Matcher::UrlEncoded("pageIndex".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"code":0,"result":{"data":[{"name":"Wrapped MON","symbol":"WMON","balance":"1.5","imageURL":"https://img","verified":true}]}}"#)
            .create_async()
            .await;

        let tokens = client(server.url()).account_tokens(ADDR, 2).await.unwrap();
        m.assert_async().await;
        assert_eq!(tokens[0].symbol.as_deref(), Some("WMON"));
        assert_eq!(tokens[0].image_url.as_deref(), Some("https://img"));
        assert_eq!(tokens[0].verified, Some(true));
    }

    #[tokio::test]
    async fn missing_result_is_an_empty_page() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/account/nfts")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":0,"result":null}"#)
            .create_async()
            .await;

        let nfts = client(server.url()).account_nfts(ADDR, 1).await.unwrap();
        assert!(nfts.is_empty());
    }

    #[tokio::test]
    async fn holders_accept_either_layout() {
        let mut server = mockito::Server::new_async().await;
        let _top = server
            .mock("GET", "/token/holders")
            .match_query(Matcher::UrlEncoded("pageIndex".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"holders":[{"address":"0xa","balance":"10"}]}"#)
            .create_async()
            .await;
        let _nested = server
            .mock("GET", "/token/holders")
            .match_query(Matcher::UrlEncoded("pageIndex".into(), "2".into()))
            .with_status(200)
            .with_body(r#"{"result":{"data":[{"address":"0xb","balance":5}]}}"#)
            .create_async()
            .await;

        let c = client(server.url());
        assert_eq!(c.token_holders(ADDR, 20, 1).await.unwrap()[0].address.as_deref(), Some("0xa"));
        assert_eq!(c.token_holders(ADDR, 20, 2).await.unwrap()[0].address.as_deref(), Some("0xb"));
    }

    #[tokio::test]
    async fn result_without_data_is_an_empty_page() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/account/tokens")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":0,"result":{}}"#)
            .create_async()
            .await;

        let tokens = client(server.url()).account_tokens(ADDR, 1).await.unwrap();
        assert!(tokens.is_empty());
    }
}
