// src/providers/codex.rs

//! Codex token analytics over GraphQL. Arguments always travel as GraphQL
//! variables.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::providers::{send_json, ProviderError};

const PROVIDER: &str = "codex";

const NETWORKS_QUERY: &str = "query GetNetworks { getNetworks { id name } }";

const NETWORK_STATUS_QUERY: &str = "query NetworkStatus($networkIds: [Int!]!) {
  getNetworkStatus(networkIds: $networkIds) {
    lastProcessedBlock
    lastProcessedTimestamp
    networkId
    networkName
  }
}";

const TOKEN_QUERY: &str = "query TokenInfo($ids: [TokenInput!]) {
  tokens(ids: $ids) {
    address
    name
    symbol
    totalSupply
    decimals
    info { circulatingSupply description id }
  }
}";

const PAIRS_QUERY: &str = "query TokenPairs($networkId: Int!, $tokenAddress: String!) {
  listPairsForToken(networkId: $networkId, tokenAddress: $tokenAddress) {
    token0Data { name symbol }
    token1Data { name symbol }
    exchangeHash
  }
}";

const NFT_COLLECTION_QUERY: &str = "query NftCollection($networkId: Int!, $address: String!) {
  getNftCollectionMetadata(networkId: $networkId, address: $address) {
    contract { address ercType image name symbol }
  }
}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub last_processed_block: Option<i64>,
    pub last_processed_timestamp: Option<Value>,
    pub network_id: Option<i64>,
    pub network_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetails {
    pub circulating_supply: Option<String>,
    pub description: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodexToken {
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub total_supply: Option<String>,
    pub decimals: Option<i64>,
    pub info: Option<TokenDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairToken {
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token0_data: Option<PairToken>,
    pub token1_data: Option<PairToken>,
    pub exchange_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftContract {
    pub address: Option<String>,
    pub erc_type: Option<String>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworksData {
    get_networks: Vec<Network>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkStatusData {
    #[serde(default)]
    get_network_status: Vec<NetworkStatus>,
}

#[derive(Deserialize)]
struct TokensData {
    #[serde(default)]
    tokens: Vec<Option<CodexToken>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairsData {
    #[serde(default)]
    list_pairs_for_token: Vec<Option<TokenPair>>,
}

#[derive(Deserialize)]
struct NftCollectionMetadata {
    contract: Option<NftContract>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NftCollectionData {
    get_nft_collection_metadata: Option<NftCollectionMetadata>,
}

#[async_trait]
pub trait TokenAnalytics: Send + Sync {
    async fn networks(&self) -> Result<Vec<Network>, ProviderError>;

    async fn network_status(&self, network_id: i64) -> Result<Option<NetworkStatus>, ProviderError>;

    async fn token(&self, address: &str) -> Result<Option<CodexToken>, ProviderError>;

    async fn token_pairs(&self, token_address: &str) -> Result<Vec<TokenPair>, ProviderError>;

    async fn nft_collection(&self, address: &str) -> Result<Option<NftContract>, ProviderError>;

    /// Network the token, pair and NFT queries run against.
    fn network_id(&self) -> i64;
}

pub struct CodexClient {
    http: Client,
    url: String,
    api_key: Option<SecretString>,
    network_id: i64,
}

impl CodexClient {
    pub fn new(http: Client, url: String, api_key: Option<SecretString>, network_id: i64) -> Self {
        Self {
            http,
            url,
            api_key,
            network_id,
        }
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, ProviderError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::NotConfigured("CODEX_API_KEY"))?;
        debug!(provider = PROVIDER, "graphql query");
        let request = self
            .http
            .post(&self.url)
            .header("Authorization", key.expose_secret())
            .json(&json!({ "query": query, "variables": variables }));
        let response: GraphQlResponse<T> = send_json(PROVIDER, request).await?;
        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(ProviderError::GraphQl(messages.join("; ")));
        }
        response
            .data
            .ok_or_else(|| ProviderError::decode(PROVIDER, "response has no data"))
    }
}

#[async_trait]
impl TokenAnalytics for CodexClient {
    async fn networks(&self) -> Result<Vec<Network>, ProviderError> {
        let data: NetworksData = self.query(NETWORKS_QUERY, json!({})).await?;
        Ok(data.get_networks)
    }

    async fn network_status(&self, network_id: i64) -> Result<Option<NetworkStatus>, ProviderError> {
        let data: NetworkStatusData = self
            .query(NETWORK_STATUS_QUERY, json!({ "networkIds": [network_id] }))
            .await?;
        Ok(data.get_network_status.into_iter().next())
    }

    async fn token(&self, address: &str) -> Result<Option<CodexToken>, ProviderError> {
        let data: TokensData = self
            .query(
                TOKEN_QUERY,
                json!({ "ids": [{ "networkId": self.network_id, "address": address }] }),
            )
            .await?;
        Ok(data.tokens.into_iter().flatten().next())
    }

    async fn token_pairs(&self, token_address: &str) -> Result<Vec<TokenPair>, ProviderError> {
        let data: PairsData = self
            .query(
                PAIRS_QUERY,
                json!({ "networkId": self.network_id, "tokenAddress": token_address }),
            )
            .await?;
        Ok(data.list_pairs_for_token.into_iter().flatten().collect())
    }

    async fn nft_collection(&self, address: &str) -> Result<Option<NftContract>, ProviderError> {
        let data: NftCollectionData = self
            .query(
                NFT_COLLECTION_QUERY,
                json!({ "networkId": self.network_id, "address": address }),
            )
            .await?;
        Ok(data.get_nft_collection_metadata.and_then(|m| m.contract))
    }

    fn network_id(&self) -> i64 {
        self.network_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: String) -> CodexClient {
        CodexClient::new(Client::new(), url, Some(SecretString::new("cx-key".into())), 10143)
    }

    #[tokio::test]
    async fn addresses_travel_as_variables() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/")
            .match_header("authorization", "cx-key")
            .match_body(Matcher::PartialJson(json!({
                "variables": { "networkId": 10143, "tokenAddress": "0xabc\"}" }
            })))
            .with_status(200)
            .with_body(r#"{"data":{"listPairsForToken":[{"token0Data":{"name":"A","symbol":"A"},"token1Data":{"name":"B","symbol":"B"},"exchangeHash":"0xex"},null]}}"#)
            .create_async()
            .await;

        let pairs = client(server.url()).token_pairs("0xabc\"}").await.unwrap();
        m.assert_async().await;
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].exchange_hash.as_deref(), Some("0xex"));
    }

    #[tokio::test]
    async fn graphql_errors_are_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":null,"errors":[{"message":"Unauthorized"}]}"#)
            .create_async()
            .await;

        let err = client(server.url()).networks().await.unwrap_err();
        assert_eq!(err.to_string(), "GraphQL error: Unauthorized");
    }

    #[tokio::test]
    async fn unknown_token_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":{"tokens":[null]}}"#)
            .create_async()
            .await;

        assert_eq!(client(server.url()).token("0xdead").await.unwrap(), None);
    }
}
