// src/tools/monorail.rs

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::{Field, GatewayError, InputContract, OperationDescriptor, Outcome, Refinement};
use crate::providers::monorail::{MonorailToken, QuoteRequest, SwapRouter, TokenSearch, TOKEN_CATEGORIES};
use crate::utils::lenient_f64;

const PROVIDER: &str = "monorail";

/// Compound price impact (as a fraction) above which a quote carries a warning.
const HIGH_IMPACT: f64 = 0.2;

type Router = Arc<dyn SwapRouter>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenArgs {
    contract_address: String,
}

#[derive(Deserialize)]
struct TokensArgs {
    find: Option<String>,
    offset: u64,
    limit: u64,
}

#[derive(Deserialize)]
struct CategoryArgs {
    category: String,
    address: Option<String>,
    offset: u64,
    limit: u64,
}

#[derive(Deserialize)]
struct BalancesArgs {
    address: String,
}

#[derive(Deserialize)]
struct NoArgs {}

#[derive(Deserialize)]
struct QuoteArgs {
    amount: String,
    from: String,
    to: String,
    sender: Option<String>,
    slippage: Option<i64>,
    deadline: Option<i64>,
    max_hops: Option<i64>,
    excluded: Option<String>,
    source: Option<String>,
}

fn token_json(token: &MonorailToken) -> Value {
    json!({
        "name": token.name,
        "symbol": token.symbol,
        "decimals": token.decimals(),
        "address": token.address,
        "balance": token.balance,
        "categories": token.categories,
    })
}

fn offset_field() -> Field {
    Field::integer("offset", "Pagination offset")
        .default(json!(0))
        .refine(Refinement::Min(0.0))
}

fn limit_field() -> Field {
    Field::integer("limit", "Maximum number of tokens to fetch")
        .default(json!(10))
        .refine(Refinement::Min(1.0))
}

async fn token_info(router: Router, args: TokenArgs) -> Result<Outcome, GatewayError> {
    let token = router.token(&args.contract_address).await?;
    let metadata = json!({ "contractAddress": args.contract_address });
    // The API answers unknown addresses with a nameless placeholder.
    if token.name.as_deref().map_or(true, str::is_empty) {
        return Ok(Outcome::empty_record(
            "token",
            metadata,
            format!("Token not found for address: {}", args.contract_address),
        ));
    }
    Ok(Outcome::success("token", metadata, token_json(&token)))
}

async fn tokens(router: Router, args: TokensArgs) -> Result<Outcome, GatewayError> {
    let search = TokenSearch {
        find: args.find.clone(),
        offset: args.offset,
        limit: args.limit,
    };
    let found = router.tokens(&search).await?;
    Ok(Outcome::list(
        "tokens",
        json!({ "find": args.find, "offset": args.offset, "limit": args.limit, "count": found.len() }),
        found.iter().map(token_json).collect(),
        "No tokens found matching the criteria.",
    ))
}

async fn tokens_by_category(router: Router, args: CategoryArgs) -> Result<Outcome, GatewayError> {
    let found = router
        .tokens_by_category(&args.category, args.address.as_deref(), args.offset, args.limit)
        .await?;
    Ok(Outcome::list(
        "tokens",
        json!({
            "category": args.category,
            "address": args.address,
            "offset": args.offset,
            "limit": args.limit,
            "count": found.len(),
        }),
        found.iter().map(token_json).collect(),
        format!("No {} tokens found.", args.category),
    ))
}

async fn token_count(router: Router, _args: NoArgs) -> Result<Outcome, GatewayError> {
    let count = router.token_count().await?;
    Ok(Outcome::success("tokenCount", json!({}), json!(count)))
}

async fn wallet_balances(router: Router, args: BalancesArgs) -> Result<Outcome, GatewayError> {
    let balances = router.wallet_balances(&args.address).await?;
    Ok(Outcome::list(
        "balances",
        json!({ "address": args.address, "count": balances.len() }),
        balances.iter().map(token_json).collect(),
        format!("No token balances found for address {}.", args.address),
    ))
}

/// Impact fraction as a percentage rounded to two decimals.
fn impact_percent(impact: f64) -> f64 {
    (impact * 100.0 * 100.0).round() / 100.0
}

async fn quote(router: Router, args: QuoteArgs) -> Result<Outcome, GatewayError> {
    let request = QuoteRequest {
        amount: args.amount,
        from: args.from,
        to: args.to,
        sender: args.sender,
        slippage: args.slippage,
        deadline: args.deadline,
        max_hops: args.max_hops,
        excluded: args.excluded,
        source: args.source,
    };
    let quote = router.quote(&request).await?;
    let summary = &quote.summary;
    let impact = summary
        .compound_impact
        .as_ref()
        .and_then(lenient_f64)
        .unwrap_or(0.0);
    let warning = if impact > HIGH_IMPACT {
        json!("High price impact detected (> 20%)")
    } else {
        Value::Null
    };
    Ok(Outcome::success(
        "rawQuote",
        json!({
            "from": summary.from,
            "to": summary.to,
            "amountInput": summary.input_formatted,
            "expectedOutput": summary.output_formatted,
            "minimumGuaranteedOutput": summary.min_output_formatted,
            "hops": summary.hops,
            "priceImpactPercent": impact_percent(impact),
            "warning": warning,
        }),
        quote.raw,
    ))
}

pub fn descriptors(router: Router) -> Vec<OperationDescriptor> {
    let r1 = router.clone();
    let r2 = router.clone();
    let r3 = router.clone();
    let r4 = router.clone();
    let r5 = router.clone();
    let r6 = router;
    vec![
        OperationDescriptor::new(
            "monorail_get_token_info",
            PROVIDER,
            "Fetch detailed information about a token on Monad using the Monorail Data API.",
            InputContract::new().field(
                Field::string("contractAddress", "Token contract address").refine(Refinement::EvmAddress),
            ),
            move |args| token_info(r1.clone(), args),
        ),
        OperationDescriptor::new(
            "monorail_get_tokens",
            PROVIDER,
            "Fetch tokens available on Monad using the Monorail Data API, with optional search and pagination.",
            InputContract::new()
                .field(Field::string("find", "Partial name or ticker of the token to search for").optional())
                .field(offset_field())
                .field(limit_field()),
            move |args| tokens(r2.clone(), args),
        ),
        OperationDescriptor::new(
            "monorail_get_tokens_by_category",
            PROVIDER,
            "Fetch tokens in one Monorail category, optionally with balances for an address.",
            InputContract::new()
                .field(Field::string("category", "Token category").refine(Refinement::OneOf(TOKEN_CATEGORIES)))
                .field(
                    Field::string("address", "Wallet address to include balances for")
                        .optional()
                        .refine(Refinement::EvmAddress),
                )
                .field(offset_field())
                .field(limit_field()),
            move |args| tokens_by_category(r3.clone(), args),
        ),
        OperationDescriptor::new(
            "monorail_get_token_count",
            PROVIDER,
            "Fetch the number of tokens Monorail knows about.",
            InputContract::new(),
            move |args| token_count(r4.clone(), args),
        ),
        OperationDescriptor::new(
            "monorail_get_wallet_balances",
            PROVIDER,
            "Fetch the list of token balances for a specific wallet address using Monorail Data API.",
            InputContract::new()
                .field(Field::string("address", "Monad wallet address").refine(Refinement::EvmAddress)),
            move |args| wallet_balances(r5.clone(), args),
        ),
        OperationDescriptor::new(
            "monorail_get_quote",
            PROVIDER,
            "Fetch the best quote for swapping one token to another using the Monorail API on Monad Testnet.",
            InputContract::new()
                .field(Field::string("amount", "Amount to swap (human readable, e.g., 1)").refine(Refinement::Decimal))
                .field(Field::string("from", "Token address to swap from").refine(Refinement::MinLength(1)))
                .field(Field::string("to", "Token address to swap to").refine(Refinement::MinLength(1)))
                .field(Field::string("sender", "Wallet address that will execute the swap").optional())
                .field(
                    Field::integer("slippage", "Allowed slippage in basis points (e.g., 50 = 0.5%)")
                        .optional()
                        .refine(Refinement::Min(0.0)),
                )
                .field(
                    Field::integer("deadline", "Transaction deadline in seconds")
                        .optional()
                        .refine(Refinement::Min(1.0)),
                )
                .field(
                    Field::integer("max_hops", "Maximum number of hops allowed")
                        .optional()
                        .refine(Refinement::Min(1.0)),
                )
                .field(Field::string("excluded", "Comma-separated list of protocols to exclude").optional())
                .field(Field::string("source", "Request source identifier").optional()),
            move |args| quote(r6.clone(), args),
        ),
    ]
}
