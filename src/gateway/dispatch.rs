// src/gateway/dispatch.rs

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::gateway::catalog::Catalog;
use crate::gateway::descriptor::OperationDescriptor;
use crate::gateway::envelope::Envelope;
use crate::gateway::error::GatewayError;
use crate::providers::ProviderError;

/// Binds the catalog to the transports. Every call resolves to exactly one
/// [`Envelope`]; nothing a handler does can escape as a panic or error.
#[derive(Debug)]
pub struct Gateway {
    catalog: Catalog,
    timeout: Option<Duration>,
}

impl Gateway {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            timeout: None,
        }
    }

    /// Bounds every handler invocation. Expiry yields an `upstream` error.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Looks up, validates and invokes one operation.
    pub async fn call(&self, name: &str, raw_args: &Value) -> Envelope {
        let descriptor = match self.catalog.lookup(name) {
            Ok(d) => d,
            Err(e) => {
                warn!(tool = name, "call to unknown tool");
                return e.into();
            }
        };

        let args = match descriptor.contract().validate(raw_args) {
            Ok(args) => args,
            Err(violations) => {
                debug!(tool = name, violations = violations.len(), "arguments rejected");
                return GatewayError::Validation(violations).into();
            }
        };

        self.invoke(&descriptor, args).await
    }

    /// Runs a handler with already-validated arguments and normalizes
    /// whatever happens into an envelope.
    pub async fn invoke(&self, descriptor: &OperationDescriptor, args: Map<String, Value>) -> Envelope {
        let started = Instant::now();
        let name = descriptor.name();

        // Panics can happen while building the future as well as while polling it.
        let future = match panic::catch_unwind(AssertUnwindSafe(|| descriptor.call(args))) {
            Ok(future) => future,
            Err(payload) => return panicked(name, payload),
        };
        let guarded = AssertUnwindSafe(future).catch_unwind();

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(tool = name, timeout_secs = limit.as_secs(), "handler timed out");
                    return GatewayError::Upstream(ProviderError::TimedOut(limit)).into();
                }
            },
            None => guarded.await,
        };

        let envelope = match result {
            Ok(Ok(outcome)) => Envelope::from(outcome),
            Ok(Err(e)) => {
                warn!(tool = name, kind = e.kind(), error = %e, "call failed");
                Envelope::from(e)
            }
            Err(payload) => return panicked(name, payload),
        };

        info!(
            tool = name,
            status = envelope.status().as_str(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "call finished"
        );
        envelope
    }

    /// `tools/list` entries in registration order.
    pub fn tool_listing(&self) -> Vec<Value> {
        self.catalog
            .list()
            .iter()
            .map(|d| {
                json!({
                    "name": d.name(),
                    "description": d.description(),
                    "inputSchema": d.contract().json_schema(),
                    "annotations": { "provider": d.provider() },
                })
            })
            .collect()
    }
}

fn panicked(name: &str, payload: Box<dyn Any + Send>) -> Envelope {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(tool = name, panic = %detail, "handler panicked");
    GatewayError::Internal(format!("handler for '{}' panicked: {}", name, detail)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::contract::{Field, InputContract, Refinement};
    use crate::gateway::envelope::{Outcome, Status};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct NoArgs {}

    #[derive(Deserialize)]
    struct Paging {
        page: u32,
        limit: u32,
    }

    fn paging_op() -> OperationDescriptor {
        OperationDescriptor::new(
            "paged",
            "test",
            "echoes paging",
            InputContract::new()
                .field(Field::integer("page", "page").default(json!(1)).refine(Refinement::Min(1.0)))
                .field(Field::integer("limit", "limit").default(json!(10))),
            |args: Paging| async move {
                Ok(Outcome::success(
                    "echo",
                    json!({"page": args.page, "limit": args.limit}),
                    json!([]),
                ))
            },
        )
    }

    fn gateway(ops: Vec<OperationDescriptor>) -> Gateway {
        let mut catalog = Catalog::new();
        catalog.register_all(ops).unwrap();
        Gateway::new(catalog)
    }

    #[tokio::test]
    async fn handler_sees_coerced_arguments() {
        let gw = gateway(vec![paging_op()]);
        let env = gw.call("paged", &json!({"page": "2", "limit": "5"})).await;
        assert_eq!(env.status(), Status::Success);
        assert_eq!(env.to_json()["metadata"], json!({"page": 2, "limit": 5}));
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_handler() {
        let op = OperationDescriptor::new(
            "strict",
            "test",
            "must not run",
            InputContract::new().field(Field::string("address", "a").refine(Refinement::EvmAddress)),
            |_: NoArgs| async { Err(GatewayError::Internal("handler ran".into())) },
        );
        let env = gateway(vec![op]).call("strict", &json!({"address": "0x1"})).await;
        assert_eq!(env.to_json()["kind"], "validation");
    }

    #[tokio::test]
    async fn panics_become_error_envelopes() {
        let sync_panic = OperationDescriptor::new("sync", "test", "", InputContract::new(), |_: NoArgs| {
            if true {
                panic!("boom before future");
            }
            async { Ok(Outcome::success("x", json!({}), json!(null))) }
        });
        let async_panic = OperationDescriptor::new("async", "test", "", InputContract::new(), |_: NoArgs| async {
            let items: Vec<u32> = Vec::new();
            let third = items[3];
            Ok(Outcome::success("x", json!({}), json!(third)))
        });
        let gw = gateway(vec![sync_panic, async_panic]);

        let env = gw.call("sync", &json!({})).await;
        assert_eq!(env.to_json()["kind"], "internal");
        assert!(env.message().unwrap().contains("boom before future"));

        let env = gw.call("async", &json!({})).await;
        assert_eq!(env.status(), Status::Error);
        assert!(env.message().unwrap().contains("panicked"));
    }

    #[tokio::test]
    async fn timeout_converts_to_error() {
        let slow = OperationDescriptor::new("slow", "test", "", InputContract::new(), |_: NoArgs| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Outcome::success("x", json!({}), json!(null)))
        });
        let gw = gateway(vec![slow]).with_timeout(Some(Duration::from_millis(20)));
        let env = gw.call("slow", &json!({})).await;
        assert_eq!(env.to_json()["kind"], "upstream");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_envelope() {
        let env = gateway(vec![paging_op()]).call("nope", &json!({})).await;
        let body = env.to_json();
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "not_found");
    }

    #[test]
    fn listing_carries_schema_and_provider() {
        let listing = gateway(vec![paging_op()]).tool_listing();
        assert_eq!(listing[0]["name"], "paged");
        assert_eq!(listing[0]["annotations"]["provider"], "test");
        assert_eq!(listing[0]["inputSchema"]["properties"]["page"]["default"], 1);
    }
}
