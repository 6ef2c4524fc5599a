// src/tools/mod.rs

//! The operation catalog.
//!
//! Each submodule turns one provider adapter into a set of
//! [`OperationDescriptor`]s: a contract for the arguments, a typed argument
//! struct and a handler that reshapes the adapter's answer into an
//! [`Outcome`](crate::gateway::Outcome).
//!
//! ### Providers
//! - `alldomains` - on-chain name registry
//! - `magiceden` - NFT marketplace
//! - `monorail` - swap router and token data
//! - `blockvision` - account and NFT indexer
//! - `codex` - token analytics
//! - `nadfun` - launchpad analytics and DEX trades

pub mod alldomains;
pub mod blockvision;
pub mod codex;
pub mod magiceden;
pub mod monorail;
pub mod nadfun;

use serde_json::Value;

use crate::gateway::{Catalog, CatalogError};
use crate::providers::Providers;
use crate::utils::lenient_f64;

/// Registers every operation, in the order `tools/list` reports them.
pub fn build_catalog(providers: &Providers) -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::new();
    catalog.register_all(alldomains::descriptors(providers.alldomains.clone()))?;
    catalog.register_all(magiceden::descriptors(providers.magiceden.clone()))?;
    catalog.register_all(monorail::descriptors(providers.monorail.clone()))?;
    catalog.register_all(blockvision::descriptors(providers.blockvision.clone()))?;
    catalog.register_all(codex::descriptors(providers.codex.clone()))?;
    catalog.register_all(nadfun::descriptors(providers.nadfun.clone()))?;
    Ok(catalog)
}

/// Numeric upstream values (sent as numbers or strings) as JSON numbers,
/// `null` when absent or unparseable.
pub(crate) fn number_or_null(value: Option<&Value>) -> Value {
    value
        .and_then(lenient_f64)
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_are_lenient() {
        assert_eq!(number_or_null(Some(&json!("1.5"))), json!(1.5));
        assert_eq!(number_or_null(Some(&json!(3))), json!(3.0));
        assert_eq!(number_or_null(Some(&json!("N/A"))), Value::Null);
        assert_eq!(number_or_null(None), Value::Null);
    }
}
