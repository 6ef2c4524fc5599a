//! A small catalog of hand-written operations used by the transport tests.

#![allow(dead_code)]

use std::time::Duration;

use monad_mcp_gateway::config::Config;
use monad_mcp_gateway::gateway::{
    Catalog, Field, Gateway, GatewayError, InputContract, OperationDescriptor, Outcome, Refinement,
};
use monad_mcp_gateway::providers::ProviderError;
use monad_mcp_gateway::AppState;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct Sleep {
    pub ms: u64,
}

#[derive(Deserialize)]
pub struct Echo {
    pub text: String,
    pub times: i64,
}

#[derive(Deserialize)]
pub struct Nothing {}

async fn sleep(args: Sleep) -> Result<Outcome, GatewayError> {
    tokio::time::sleep(Duration::from_millis(args.ms)).await;
    Ok(Outcome::success("slept", json!({}), json!(args.ms)))
}

async fn echo(args: Echo) -> Result<Outcome, GatewayError> {
    let repeated = vec![args.text; args.times as usize];
    Ok(Outcome::list("echoes", json!({ "times": args.times }), repeated.into_iter().map(|s| json!(s)).collect(), "Nothing to echo."))
}

async fn fail(_args: Nothing) -> Result<Outcome, GatewayError> {
    Err(ProviderError::Http {
        status: 400,
        message: "Bad Request".into(),
    }
    .into())
}

async fn explode(_args: Nothing) -> Result<Outcome, GatewayError> {
    let items: Vec<u32> = Vec::new();
    let first = items[0];
    Ok(Outcome::success("never", json!({}), json!(first)))
}

pub fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog
        .register_all(vec![
            OperationDescriptor::new(
                "sleep",
                "test",
                "Sleeps for a while.",
                InputContract::new().field(Field::integer("ms", "Milliseconds").refine(Refinement::Min(0.0))),
                sleep,
            ),
            OperationDescriptor::new(
                "echo",
                "test",
                "Repeats a string.",
                InputContract::new()
                    .field(Field::string("text", "What to repeat"))
                    .field(
                        Field::integer("times", "How often")
                            .default(json!(1))
                            .refine(Refinement::Min(0.0)),
                    ),
                echo,
            ),
            OperationDescriptor::new("fail", "test", "Always fails upstream.", InputContract::new(), fail),
            OperationDescriptor::new("explode", "test", "Panics while reshaping.", InputContract::new(), explode),
        ])
        .expect("unique names");
    catalog
}

pub fn state() -> AppState {
    AppState::new(Config::default(), Gateway::new(catalog()))
}
