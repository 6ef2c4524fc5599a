// src/gateway/descriptor.rs

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::gateway::contract::InputContract;
use crate::gateway::envelope::Outcome;
use crate::gateway::error::GatewayError;

pub type HandlerFuture = BoxFuture<'static, Result<Outcome, GatewayError>>;
type Handler = Arc<dyn Fn(Map<String, Value>) -> HandlerFuture + Send + Sync>;

/// Static registration record for one callable operation.
#[derive(Clone)]
pub struct OperationDescriptor {
    name: &'static str,
    provider: &'static str,
    description: &'static str,
    contract: InputContract,
    handler: Handler,
}

impl OperationDescriptor {
    /// Binds a typed handler to a contract.
    ///
    /// The handler receives the validated argument object deserialized into
    /// `A`, so field names and types in `A` must agree with the contract.
    pub fn new<A, F, Fut>(
        name: &'static str,
        provider: &'static str,
        description: &'static str,
        contract: InputContract,
        handler: F,
    ) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Outcome, GatewayError>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |args: Map<String, Value>| {
            match serde_json::from_value::<A>(Value::Object(args)) {
                Ok(typed) => handler(typed).boxed(),
                Err(e) => {
                    let message = format!("validated arguments did not decode: {}", e);
                    async move { Err(GatewayError::Internal(message)) }.boxed()
                }
            }
        });
        Self {
            name,
            provider,
            description,
            contract,
            handler,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn contract(&self) -> &InputContract {
        &self.contract
    }

    /// Starts the handler. Arguments must already be validated.
    pub fn call(&self, args: Map<String, Value>) -> HandlerFuture {
        (self.handler)(args)
    }
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}
