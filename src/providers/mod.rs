// src/providers/mod.rs

//! Provider adapters.
//!
//! Each upstream service sits behind an `async_trait` so tools receive an
//! `Arc<dyn Trait>` at catalog construction and tests can substitute stubs.
//! Every adapter shares the one `reqwest::Client` built in [`Providers::from_config`].

pub mod alldomains;
pub mod blockvision;
pub mod codex;
pub mod magiceden;
pub mod monorail;
pub mod nadfun;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::blockchain::nonce_manager::NonceManager;
use crate::blockchain::rpc::RpcClient;
use crate::config::Config;

use self::alldomains::{DomainRegistry, RegistryContract};
use self::blockvision::{AccountIndexer, BlockvisionClient};
use self::codex::{CodexClient, TokenAnalytics};
use self::magiceden::{MagicEdenClient, NftMarketplace};
use self::monorail::{MonorailClient, SwapRouter};
use self::nadfun::{Launchpad, NadFunClient};

/// Failure of a single upstream call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Unexpected response from {provider}: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No response within {}s", .0.as_secs())]
    TimedOut(Duration),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Transport("upstream request timed out".into());
        }
        // Strip the URL so query strings never end up in envelopes.
        ProviderError::Transport(e.without_url().to_string())
    }
}

impl ProviderError {
    pub(crate) fn decode(provider: &'static str, message: impl Into<String>) -> Self {
        ProviderError::Decode {
            provider,
            message: message.into(),
        }
    }
}

/// Joins a base URL (which may carry a path such as `/v3/rtp`) and a path.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Sends a request and decodes a JSON body, mapping non-2xx statuses to
/// [`ProviderError::Http`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(provider, status = status.as_u16(), "upstream returned an error status");
        debug!(provider, body = %body, "error body");
        let message = upstream_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string()
        });
        return Err(ProviderError::Http {
            status: status.as_u16(),
            message,
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::decode(provider, e.to_string()))
}

/// Pulls `message` (or `error`) out of a JSON error body.
fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|k| value.get(*k).and_then(|v| v.as_str()))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Every adapter the catalog is built from.
#[derive(Clone)]
pub struct Providers {
    pub alldomains: Arc<dyn DomainRegistry>,
    pub magiceden: Arc<dyn NftMarketplace>,
    pub monorail: Arc<dyn SwapRouter>,
    pub blockvision: Arc<dyn AccountIndexer>,
    pub codex: Arc<dyn TokenAnalytics>,
    pub nadfun: Arc<dyn Launchpad>,
}

impl Providers {
    /// Builds the live adapters. One HTTP client and one nonce manager are
    /// shared by all of them for the life of the process.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("monad-mcp-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let rpc = RpcClient::new(http.clone(), config.monad_rpc_url.clone());
        let nonces = NonceManager::new();

        Ok(Self {
            alldomains: Arc::new(RegistryContract::new(
                rpc.clone(),
                config.alldomains_registry_address.clone(),
            )),
            magiceden: Arc::new(MagicEdenClient::new(
                http.clone(),
                config.magiceden_api_url.clone(),
                config.magiceden_api_key.clone(),
            )),
            monorail: Arc::new(MonorailClient::new(
                http.clone(),
                config.monorail_data_api_url.clone(),
                config.monorail_quote_api_url.clone(),
            )),
            blockvision: Arc::new(BlockvisionClient::new(
                http.clone(),
                config.blockvision_api_url.clone(),
                config.blockvision_api_key.clone(),
            )),
            codex: Arc::new(CodexClient::new(
                http.clone(),
                config.codex_api_url.clone(),
                config.codex_api_key.clone(),
                config.codex_network_id,
            )),
            nadfun: Arc::new(NadFunClient::new(
                http,
                config.nadfun_api_url.clone(),
                rpc,
                nonces,
                config.nadfun_dex_router.clone(),
                config.wmon_address.clone(),
            )),
        })
    }
}
