// src/config.rs

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use secrecy::SecretString;
use url::Url;

pub const DEFAULT_RPC_URL: &str = "https://testnet-rpc.monad.xyz";
pub const DEFAULT_MAGICEDEN_API_URL: &str = "https://api-mainnet.magiceden.dev/v3/rtp";
pub const DEFAULT_BLOCKVISION_API_URL: &str = "https://api.blockvision.org/v2/monad";
pub const DEFAULT_MONORAIL_DATA_API_URL: &str = "https://testnet-api.monorail.xyz";
pub const DEFAULT_MONORAIL_QUOTE_API_URL: &str = "https://testnet-pathfinder-v2.monorail.xyz";
pub const DEFAULT_CODEX_API_URL: &str = "https://graph.codex.io/graphql";
pub const DEFAULT_NADFUN_API_URL: &str = "https://testnet-bot-api-server.nad.fun";

/// Monad testnet.
pub const MONAD_TESTNET_CHAIN_ID: u64 = 10143;

// All configuration, loaded once at startup from the environment (and .env).
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,
    pub tcp_port: u16,

    // Chain
    pub monad_rpc_url: String,
    pub monad_chain_id: u64,

    // Providers. A missing key or address only disables the operations
    // that need it.
    pub magiceden_api_url: String,
    pub magiceden_api_key: Option<SecretString>,
    pub blockvision_api_url: String,
    pub blockvision_api_key: Option<SecretString>,
    pub monorail_data_api_url: String,
    pub monorail_quote_api_url: String,
    pub codex_api_url: String,
    pub codex_api_key: Option<SecretString>,
    pub codex_network_id: i64,
    pub nadfun_api_url: String,
    pub nadfun_dex_router: Option<String>,
    pub wmon_address: Option<String>,
    pub alldomains_registry_address: Option<String>,

    // Timeouts
    pub http_timeout_secs: u64,
    /// `None` leaves tool calls unbounded (the HTTP timeout still applies).
    pub tool_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            tcp_port: 8090,
            monad_rpc_url: DEFAULT_RPC_URL.to_string(),
            monad_chain_id: MONAD_TESTNET_CHAIN_ID,
            magiceden_api_url: DEFAULT_MAGICEDEN_API_URL.to_string(),
            magiceden_api_key: None,
            blockvision_api_url: DEFAULT_BLOCKVISION_API_URL.to_string(),
            blockvision_api_key: None,
            monorail_data_api_url: DEFAULT_MONORAIL_DATA_API_URL.to_string(),
            monorail_quote_api_url: DEFAULT_MONORAIL_QUOTE_API_URL.to_string(),
            codex_api_url: DEFAULT_CODEX_API_URL.to_string(),
            codex_api_key: None,
            codex_network_id: MONAD_TESTNET_CHAIN_ID as i64,
            nadfun_api_url: DEFAULT_NADFUN_API_URL.to_string(),
            nadfun_dex_router: None,
            wmon_address: None,
            alldomains_registry_address: None,
            http_timeout_secs: 30,
            tool_timeout_secs: None,
        }
    }
}

/// Reads an optional variable; empty values count as unset.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a valid number, got '{}'", name, raw)),
        None => Ok(default),
    }
}

fn url_var(name: &str, default: &str) -> Result<String> {
    let raw = var(name).unwrap_or_else(|| default.to_string());
    Url::parse(&raw).with_context(|| format!("{} is not a valid URL: '{}'", name, raw))?;
    Ok(raw)
}

fn secret_var(name: &str) -> Option<SecretString> {
    var(name).map(SecretString::new)
}

fn address_var(name: &str) -> Result<Option<String>> {
    match var(name) {
        Some(raw) if crate::utils::is_evm_address(&raw) => Ok(Some(raw)),
        Some(raw) => anyhow::bail!("{} must be a 0x-prefixed EVM address, got '{}'", name, raw),
        None => Ok(None),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let defaults = Config::default();
        let tool_timeout_secs = match var("TOOL_TIMEOUT_SECS") {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("TOOL_TIMEOUT_SECS must be a valid number, got '{}'", raw))?,
            )
            .filter(|secs| *secs > 0),
            None => None,
        };

        Ok(Config {
            port: parsed("PORT", defaults.port)?,
            tcp_port: parsed("TCP_PORT", defaults.tcp_port)?,

            monad_rpc_url: url_var("MONAD_RPC_URL", DEFAULT_RPC_URL)?,
            monad_chain_id: parsed("MONAD_CHAIN_ID", defaults.monad_chain_id)?,

            magiceden_api_url: url_var("MAGICEDEN_API_URL", DEFAULT_MAGICEDEN_API_URL)?,
            magiceden_api_key: secret_var("MAGICEDEN_API_KEY"),
            blockvision_api_url: url_var("BLOCKVISION_API_URL", DEFAULT_BLOCKVISION_API_URL)?,
            blockvision_api_key: secret_var("BLOCKVISION_API_KEY"),
            monorail_data_api_url: url_var("MONORAIL_DATA_API_URL", DEFAULT_MONORAIL_DATA_API_URL)?,
            monorail_quote_api_url: url_var("MONORAIL_QUOTE_API_URL", DEFAULT_MONORAIL_QUOTE_API_URL)?,
            codex_api_url: url_var("CODEX_API_URL", DEFAULT_CODEX_API_URL)?,
            codex_api_key: secret_var("CODEX_API_KEY"),
            codex_network_id: parsed("CODEX_NETWORK_ID", defaults.codex_network_id)?,
            nadfun_api_url: url_var("NADFUN_API_URL", DEFAULT_NADFUN_API_URL)?,
            nadfun_dex_router: address_var("NADFUN_DEX_ROUTER")?,
            wmon_address: address_var("WMON_ADDRESS")?,
            alldomains_registry_address: address_var("ALLDOMAINS_REGISTRY_ADDRESS")?,

            http_timeout_secs: parsed("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            tool_timeout_secs,
        })
    }

    /// Names of the optional settings that are not set, for the startup log.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.magiceden_api_key.is_none() {
            missing.push("MAGICEDEN_API_KEY");
        }
        if self.blockvision_api_key.is_none() {
            missing.push("BLOCKVISION_API_KEY");
        }
        if self.codex_api_key.is_none() {
            missing.push("CODEX_API_KEY");
        }
        if self.nadfun_dex_router.is_none() {
            missing.push("NADFUN_DEX_ROUTER");
        }
        if self.wmon_address.is_none() {
            missing.push("WMON_ADDRESS");
        }
        if self.alldomains_registry_address.is_none() {
            missing.push("ALLDOMAINS_REGISTRY_ADDRESS");
        }
        missing
    }
}
