// src/gateway/error.rs

use thiserror::Error;

use crate::gateway::contract::Violation;
use crate::providers::ProviderError;

/// Every way a call can fail to produce a payload.
///
/// `Validation` and `NotFound` are caller mistakes detected before any
/// handler runs; `Upstream` and `Internal` come out of handler invocation.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid arguments: {}", join_violations(.0))]
    Validation(Vec<Violation>),
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] ProviderError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable machine-readable discriminant carried in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "validation",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Upstream(_) => "upstream",
            GatewayError::Internal(_) => "internal",
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Raised at startup when the catalog is built incorrectly.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::contract::ViolationReason;

    #[test]
    fn validation_message_lists_all_fields() {
        let err = GatewayError::Validation(vec![
            Violation {
                field: "address".into(),
                reason: ViolationReason::Missing,
            },
            Violation {
                field: "page".into(),
                reason: ViolationReason::Unparseable {
                    expected: "integer",
                    value: "x".into(),
                },
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("'address' is required"));
        assert!(msg.contains("'page' could not parse 'x' as integer"));
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn upstream_errors_keep_their_message() {
        let err = GatewayError::from(ProviderError::Http {
            status: 400,
            message: "Bad Request".into(),
        });
        assert_eq!(err.to_string(), "HTTP 400: Bad Request");
        assert_eq!(err.kind(), "upstream");
    }
}
