// src/providers/magiceden.rs

//! Magic Eden RTP API (NFT marketplace).

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::providers::{endpoint, send_json, ProviderError};

const PROVIDER: &str = "magiceden";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NativeAmount {
    pub native: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Price {
    pub amount: Option<NativeAmount>,
}

impl Price {
    pub fn native(&self) -> Option<&Value> {
        self.amount.as_ref()?.native.as_ref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FloorAsk {
    pub price: Option<Price>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub all_time: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub contract: Option<String>,
    pub image_url: Option<String>,
    pub floor_ask: Option<FloorAsk>,
    pub volume: Option<Volume>,
    /// Trending endpoint only: sales in the period.
    pub count: Option<Value>,
    /// Trending endpoint only.
    pub collection_volume: Option<Volume>,
}

impl Collection {
    pub fn floor_price(&self) -> Option<&Value> {
        self.floor_ask.as_ref()?.price.as_ref()?.native()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedCollection {
    pub name: Option<String>,
    pub floor_ask_price: Option<Price>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ownership {
    pub token_count: Option<Value>,
    pub on_sale_count: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserCollection {
    pub collection: Option<OwnedCollection>,
    pub ownership: Option<Ownership>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCollection {
    pub collection_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityToken {
    pub token_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub collection: Option<ActivityCollection>,
    pub token: Option<ActivityToken>,
    pub price: Option<Price>,
    pub timestamp: Option<Value>,
}

/// The collection endpoints answer either `{collections: [...]}` or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum CollectionListing<T> {
    Wrapped { collections: Vec<T> },
    Bare(Vec<T>),
}

impl<T> CollectionListing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            CollectionListing::Wrapped { collections } => collections,
            CollectionListing::Bare(items) => items,
        }
    }
}

#[derive(Deserialize)]
struct ActivityListing {
    #[serde(default)]
    activities: Vec<Activity>,
}

#[derive(Debug, Clone)]
pub struct CollectionQuery {
    pub sort_by: String,
    pub limit: u32,
    pub contract: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TrendingQuery {
    pub period: String,
    pub sort_by: String,
    pub limit: u32,
}

#[async_trait]
pub trait NftMarketplace: Send + Sync {
    async fn collections(
        &self,
        chain: &str,
        query: &CollectionQuery,
    ) -> Result<Vec<Collection>, ProviderError>;

    async fn trending_collections(
        &self,
        chain: &str,
        query: &TrendingQuery,
    ) -> Result<Vec<Collection>, ProviderError>;

    async fn user_collections(
        &self,
        chain: &str,
        user: &str,
    ) -> Result<Vec<UserCollection>, ProviderError>;

    async fn user_activity(&self, chain: &str, users: &str) -> Result<Vec<Activity>, ProviderError>;
}

pub struct MagicEdenClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl MagicEdenClient {
    pub fn new(http: Client, base_url: String, api_key: Option<SecretString>) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::NotConfigured("MAGICEDEN_API_KEY"))?;
        let url = endpoint(&self.base_url, path);
        debug!(provider = PROVIDER, %url, "GET");
        let request = self
            .http
            .get(url)
            .bearer_auth(key.expose_secret())
            .header("Content-Type", "application/json")
            .query(query);
        send_json(PROVIDER, request).await
    }
}

#[async_trait]
impl NftMarketplace for MagicEdenClient {
    async fn collections(
        &self,
        chain: &str,
        query: &CollectionQuery,
    ) -> Result<Vec<Collection>, ProviderError> {
        let mut params = vec![
            ("sortBy", query.sort_by.clone()),
            ("limit", query.limit.to_string()),
            ("includeMintStages", "false".to_string()),
            ("includeSecurityConfigs", "false".to_string()),
            ("normalizeRoyalties", "false".to_string()),
            ("useNonFlaggedFloorAsk", "false".to_string()),
        ];
        if let Some(contract) = &query.contract {
            params.push(("contract", contract.clone()));
        }
        let listing: CollectionListing<Collection> = self
            .get(&format!("/{}/collections/v7", chain), &params)
            .await?;
        Ok(listing.into_vec())
    }

    async fn trending_collections(
        &self,
        chain: &str,
        query: &TrendingQuery,
    ) -> Result<Vec<Collection>, ProviderError> {
        let params = [
            ("period", query.period.clone()),
            ("sortBy", query.sort_by.clone()),
            ("limit", query.limit.to_string()),
            ("normalizeRoyalties", "false".to_string()),
            ("useNonFlaggedFloorAsk", "false".to_string()),
        ];
        let listing: CollectionListing<Collection> = self
            .get(&format!("/{}/collections/trending/v1", chain), &params)
            .await?;
        Ok(listing.into_vec())
    }

    async fn user_collections(
        &self,
        chain: &str,
        user: &str,
    ) -> Result<Vec<UserCollection>, ProviderError> {
        let listing: CollectionListing<UserCollection> = self
            .get(&format!("/{}/users/{}/collections/v3", chain, user), &[])
            .await?;
        Ok(listing.into_vec())
    }

    async fn user_activity(&self, chain: &str, users: &str) -> Result<Vec<Activity>, ProviderError> {
        let listing: ActivityListing = self
            .get(
                &format!("/{}/users/activity/v6", chain),
                &[("users", users.to_string())],
            )
            .await?;
        Ok(listing.activities)
    }
}
