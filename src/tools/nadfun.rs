// src/tools/nadfun.rs

use std::sync::Arc;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::gateway::{Field, GatewayError, InputContract, OperationDescriptor, Outcome, Refinement};
use crate::providers::nadfun::{Launchpad, TokenOrder, Trade};

const PROVIDER: &str = "nadfun";

const POSITION_TYPES: &[&str] = &["all", "open", "close"];

type Pad = Arc<dyn Launchpad>;

#[derive(Deserialize)]
struct PageArgs {
    page: u32,
    limit: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionArgs {
    address: String,
    position_type: String,
    page: u32,
    limit: u32,
}

#[derive(Deserialize)]
struct CreatorArgs {
    address: String,
    page: u32,
    limit: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenArgs {
    token_address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPageArgs {
    token_address: String,
    page: u32,
    limit: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyArgs {
    private_key: SecretString,
    token_address: String,
    #[serde(rename = "amountMON")]
    amount_mon: String,
    slippage: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SellArgs {
    private_key: SecretString,
    token_address: String,
    amount_tokens: String,
    slippage: f64,
}

fn page_fields(contract: InputContract) -> InputContract {
    contract
        .field(
            Field::integer("page", "Page number")
                .default(json!(1))
                .refine(Refinement::Min(1.0))
                .refine(Refinement::Max(u32::MAX as f64)),
        )
        .field(
            Field::integer("limit", "Items per page")
                .default(json!(10))
                .refine(Refinement::Min(1.0))
                .refine(Refinement::Max(u32::MAX as f64)),
        )
}

fn address_field(name: &'static str, description: &'static str) -> Field {
    Field::string(name, description).refine(Refinement::EvmAddress)
}

fn trade_contract(amount: &'static str, amount_description: &'static str) -> InputContract {
    InputContract::new()
        .field(Field::string("privateKey", "Private key of the wallet").refine(Refinement::MinLength(1)))
        .field(address_field("tokenAddress", "Address of the token to trade"))
        .field(Field::string(amount, amount_description).refine(Refinement::Decimal))
        .field(
            Field::number("slippage", "Slippage percentage")
                .default(json!(0.5))
                .refine(Refinement::Min(0.0))
                .refine(Refinement::Max(100.0)),
        )
}

fn to_values<T: Serialize>(items: &[T]) -> Result<Vec<Value>, GatewayError> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(|e| GatewayError::Internal(e.to_string())))
        .collect()
}

async fn tokens_by_order(pad: Pad, order: TokenOrder, args: PageArgs) -> Result<Outcome, GatewayError> {
    let tokens = pad.tokens_by_order(order, args.page, args.limit).await?;
    Ok(Outcome::list(
        "tokens",
        json!({ "page": args.page, "limit": args.limit, "count": tokens.len() }),
        to_values(&tokens)?,
        "No tokens found on this page.",
    ))
}

async fn account_positions(pad: Pad, args: PositionArgs) -> Result<Outcome, GatewayError> {
    let positions = pad
        .account_positions(&args.address, &args.position_type, args.page, args.limit)
        .await?;
    Ok(Outcome::list(
        "positions",
        json!({
            "address": args.address,
            "positionType": args.position_type,
            "page": args.page,
            "limit": args.limit,
            "count": positions.len(),
        }),
        to_values(&positions)?,
        "No positions found for this account.",
    ))
}

async fn created_tokens(pad: Pad, args: CreatorArgs) -> Result<Outcome, GatewayError> {
    let tokens = pad.created_tokens(&args.address, args.page, args.limit).await?;
    Ok(Outcome::list(
        "tokens",
        json!({
            "address": args.address,
            "page": args.page,
            "limit": args.limit,
            "count": tokens.len(),
        }),
        to_values(&tokens)?,
        "This account has not created any tokens.",
    ))
}

async fn meme_token(pad: Pad, args: TokenArgs) -> Result<Outcome, GatewayError> {
    let token = pad.token(&args.token_address).await?;
    Ok(Outcome::success(
        "token",
        json!({ "address": args.token_address }),
        json!({
            "name": token.name,
            "symbol": token.symbol,
            "creator": token.creator_address,
            "price": token.price,
            "totalSupply": token.total_supply,
            "description": token.description,
        }),
    ))
}

async fn token_holders(pad: Pad, args: TokenPageArgs) -> Result<Outcome, GatewayError> {
    let page = pad
        .token_holders(&args.token_address, args.page, args.limit)
        .await?;
    let holders: Vec<Value> = page
        .holders
        .iter()
        .map(|h| {
            json!({
                "accountAddress": h.account_address,
                "isDev": h.is_dev,
                "balance": h.balance,
            })
        })
        .collect();
    Ok(Outcome::list(
        "holders",
        json!({
            "address": args.token_address,
            "page": args.page,
            "limit": args.limit,
            "totalCount": page.total_count,
            "count": holders.len(),
        }),
        holders,
        "No holders found for this token.",
    ))
}

async fn buy(pad: Pad, args: BuyArgs) -> Result<Outcome, GatewayError> {
    let trade = Trade {
        private_key: args.private_key,
        token_address: args.token_address,
        amount: args.amount_mon,
        slippage: args.slippage,
    };
    let receipt = pad.buy_from_dex(&trade).await?;
    Ok(Outcome::success(
        "transaction",
        json!({
            "tokenAddress": trade.token_address,
            "amountMON": trade.amount,
            "slippage": trade.slippage,
            "minAmountOut": receipt.min_amount_out.to_string(),
        }),
        json!({ "txHash": receipt.tx_hash }),
    ))
}

async fn sell(pad: Pad, args: SellArgs) -> Result<Outcome, GatewayError> {
    let trade = Trade {
        private_key: args.private_key,
        token_address: args.token_address,
        amount: args.amount_tokens,
        slippage: args.slippage,
    };
    let receipt = pad.sell_to_dex(&trade).await?;
    Ok(Outcome::success(
        "transaction",
        json!({
            "tokenAddress": trade.token_address,
            "amountTokens": trade.amount,
            "slippage": trade.slippage,
            "minAmountOut": receipt.min_amount_out.to_string(),
        }),
        json!({ "txHash": receipt.tx_hash, "approvalTxHash": receipt.approval_tx_hash }),
    ))
}

pub fn descriptors(pad: Pad) -> Vec<OperationDescriptor> {
    let ordered = |name: &'static str, description: &'static str, order: TokenOrder| {
        let pad = pad.clone();
        OperationDescriptor::new(
            name,
            PROVIDER,
            description,
            page_fields(InputContract::new()),
            move |args| tokens_by_order(pad.clone(), order, args),
        )
    };
    let p1 = pad.clone();
    let p2 = pad.clone();
    let p3 = pad.clone();
    let p4 = pad.clone();
    let p5 = pad.clone();
    let p6 = pad.clone();

    vec![
        OperationDescriptor::new(
            "nadfun_get_account_positions",
            PROVIDER,
            "Get the token positions held by an account on nad.fun.",
            page_fields(
                InputContract::new()
                    .field(address_field("address", "Account address"))
                    .field(
                        Field::string("positionType", "Which positions to include")
                            .default(json!("all"))
                            .refine(Refinement::OneOf(POSITION_TYPES)),
                    ),
            ),
            move |args| account_positions(p1.clone(), args),
        ),
        OperationDescriptor::new(
            "nadfun_get_created_tokens",
            PROVIDER,
            "Get the tokens an account has created on nad.fun.",
            page_fields(InputContract::new().field(address_field("address", "Creator address"))),
            move |args| created_tokens(p2.clone(), args),
        ),
        OperationDescriptor::new(
            "nadfun_get_meme_token_info",
            PROVIDER,
            "Get detailed metadata about a token.",
            InputContract::new().field(address_field("tokenAddress", "Token address")),
            move |args| meme_token(p3.clone(), args),
        ),
        OperationDescriptor::new(
            "nadfun_get_token_holders",
            PROVIDER,
            "Get list of holders for a given token.",
            page_fields(InputContract::new().field(address_field("tokenAddress", "Token address"))),
            move |args| token_holders(p4.clone(), args),
        ),
        ordered(
            "nadfun_get_tokens_by_creation_time",
            "Get tokens ordered by creation time (newest first).",
            TokenOrder::CreationTime,
        ),
        ordered(
            "nadfun_get_tokens_by_latest_trade",
            "Get tokens ordered by their most recent trade.",
            TokenOrder::LatestTrade,
        ),
        ordered(
            "nadfun_get_tokens_by_market_cap",
            "Get tokens ordered by their market capitalization (highest first).",
            TokenOrder::MarketCap,
        ),
        OperationDescriptor::new(
            "nadfun_buy_from_dex",
            PROVIDER,
            "Buy tokens from the DEX (Uniswap V2) after they are listed.",
            trade_contract("amountMON", "Amount of MON to spend (e.g., '1.0')"),
            move |args| buy(p5.clone(), args),
        ),
        OperationDescriptor::new(
            "nadfun_sell_to_dex",
            PROVIDER,
            "Sell tokens to the DEX (Uniswap V2) for MON.",
            trade_contract("amountTokens", "Amount of tokens to sell (e.g., '100')"),
            move |args| sell(p6.clone(), args),
        ),
    ]
}
