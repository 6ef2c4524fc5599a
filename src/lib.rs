// src/lib.rs

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

pub mod api;
pub mod blockchain;
pub mod config;
pub mod gateway;
pub mod mcp;
pub mod providers;
pub mod tools;
pub mod utils;

use crate::config::Config;
use crate::gateway::Gateway;
use crate::providers::Providers;

/// Application state shared across all request handlers and sessions.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// The catalog and the single invocation path for every tool call
    pub gateway: Arc<Gateway>,
}

impl AppState {
    /// Wires an already-built gateway (tests use stub adapters this way).
    pub fn new(config: Config, gateway: Gateway) -> Self {
        Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
        }
    }

    /// Builds the live adapters and the full catalog from configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let providers = Providers::from_config(&config).context("Failed to build provider clients")?;
        Self::with_providers(config, &providers)
    }

    pub fn with_providers(config: Config, providers: &Providers) -> Result<Self> {
        let catalog = tools::build_catalog(providers).context("Failed to build the tool catalog")?;
        let gateway = Gateway::new(catalog).with_timeout(config.tool_timeout_secs.map(Duration::from_secs));
        Ok(Self::new(config, gateway))
    }
}
