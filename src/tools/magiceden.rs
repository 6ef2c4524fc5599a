// src/tools/magiceden.rs

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::{Field, GatewayError, InputContract, OperationDescriptor, Outcome, Refinement};
use crate::providers::magiceden::{CollectionQuery, NftMarketplace, TrendingQuery};
use crate::tools::number_or_null;

const PROVIDER: &str = "magiceden";

const COLLECTION_SORTS: &[&str] = &["allTimeVolume", "1DayVolume", "7DayVolume", "30DayVolume"];
const TRENDING_PERIODS: &[&str] = &["5m", "10m", "30m", "1h", "6h", "1d", "24h", "7d", "30d"];
const TRENDING_SORTS: &[&str] = &["sales", "volume"];

type Marketplace = Arc<dyn NftMarketplace>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionsArgs {
    chain: String,
    sort_by: String,
    limit: u32,
    contract: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendingArgs {
    chain: String,
    period: String,
    sort_by: String,
    limit: u32,
}

#[derive(Deserialize)]
struct UserArgs {
    chain: String,
    user: String,
}

#[derive(Deserialize)]
struct ActivityArgs {
    chain: String,
    users: String,
}

fn chain_field() -> Field {
    Field::string(
        "chain",
        "Blockchain network (e.g., ethereum, monad-testnet, arbitrum, base)",
    )
    .refine(Refinement::MinLength(1))
}

fn limit_field() -> Field {
    Field::integer("limit", "Number of collections to fetch")
        .default(json!(10))
        .refine(Refinement::Min(1.0))
        .refine(Refinement::Max(u32::MAX as f64))
}

async fn collections(market: Marketplace, args: CollectionsArgs) -> Result<Outcome, GatewayError> {
    let query = CollectionQuery {
        sort_by: args.sort_by.clone(),
        limit: args.limit,
        contract: args.contract,
    };
    let found = market.collections(&args.chain, &query).await?;
    let items = found
        .iter()
        .map(|c| {
            json!({
                "name": c.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Unnamed"),
                "symbol": c.symbol.as_deref().filter(|s| !s.is_empty()).unwrap_or("N/A"),
                "floorPrice": c.floor_price().cloned().unwrap_or(Value::Null),
                "volumeAllTime": c.volume.as_ref().and_then(|v| v.all_time.clone()).unwrap_or(Value::Null),
                "contractAddress": c.contract,
                "imageUrl": c.image_url.clone().unwrap_or_default(),
            })
        })
        .collect();
    Ok(Outcome::list(
        "collections",
        json!({ "chain": args.chain, "sortBy": args.sort_by, "limit": args.limit }),
        items,
        "No collections found for this chain.",
    ))
}

async fn trending(market: Marketplace, args: TrendingArgs) -> Result<Outcome, GatewayError> {
    let query = TrendingQuery {
        period: args.period.clone(),
        sort_by: args.sort_by.clone(),
        limit: args.limit,
    };
    let found = market.trending_collections(&args.chain, &query).await?;
    let items = found
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            json!({
                "rank": idx + 1,
                "name": c.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Unnamed Collection"),
                "floorPrice": number_or_null(c.floor_price()),
                "salesCount": number_or_null(c.count.as_ref()),
                "allTimeVolume": number_or_null(
                    c.collection_volume.as_ref().and_then(|v| v.all_time.as_ref())
                ),
            })
        })
        .collect();
    Ok(Outcome::list(
        "collections",
        json!({
            "chain": args.chain.to_uppercase(),
            "period": args.period,
            "sortBy": args.sort_by,
        }),
        items,
        format!("No trending collections found for {}.", args.chain),
    ))
}

async fn user_collections(market: Marketplace, args: UserArgs) -> Result<Outcome, GatewayError> {
    let found = market.user_collections(&args.chain, &args.user).await?;
    let items = found
        .iter()
        .map(|entry| {
            let collection = entry.collection.as_ref();
            let ownership = entry.ownership.as_ref();
            json!({
                "name": collection
                    .and_then(|c| c.name.as_deref())
                    .filter(|n| !n.is_empty())
                    .unwrap_or("Unnamed Collection"),
                "floorPrice": number_or_null(
                    collection.and_then(|c| c.floor_ask_price.as_ref()).and_then(|p| p.native())
                ),
                "tokensOwned": number_or_null(ownership.and_then(|o| o.token_count.as_ref())),
                "tokensOnSale": number_or_null(ownership.and_then(|o| o.on_sale_count.as_ref())),
            })
        })
        .collect();
    Ok(Outcome::list(
        "collections",
        json!({ "chain": args.chain.to_uppercase(), "user": args.user }),
        items,
        format!("No collections found for user {} on {}.", args.user, args.chain),
    ))
}

async fn user_activity(market: Marketplace, args: ActivityArgs) -> Result<Outcome, GatewayError> {
    let found = market.user_activity(&args.chain, &args.users).await?;
    let items = found
        .iter()
        .map(|a| {
            json!({
                "type": a.kind.as_deref().filter(|k| !k.is_empty()).unwrap_or("unknown"),
                "collectionName": a
                    .collection
                    .as_ref()
                    .and_then(|c| c.collection_name.as_deref())
                    .filter(|n| !n.is_empty())
                    .unwrap_or("Unknown Collection"),
                "tokenName": a
                    .token
                    .as_ref()
                    .and_then(|t| t.token_name.as_deref())
                    .filter(|n| !n.is_empty())
                    .unwrap_or("Unknown Token"),
                "price": number_or_null(a.price.as_ref().and_then(|p| p.native())),
                "timestamp": a.timestamp.clone().unwrap_or(Value::Null),
            })
        })
        .collect();
    Ok(Outcome::list(
        "activities",
        json!({ "chain": args.chain.to_uppercase(), "users": args.users }),
        items,
        format!("No recent activity found for the provided users on {}.", args.chain),
    ))
}

pub fn descriptors(market: Marketplace) -> Vec<OperationDescriptor> {
    let m1 = market.clone();
    let m2 = market.clone();
    let m3 = market.clone();
    let m4 = market;
    vec![
        OperationDescriptor::new(
            "magiceden_get_collections",
            PROVIDER,
            "Fetch a list of NFT collections from Magic Eden RTP API, sorted by volume.",
            InputContract::new()
                .field(chain_field())
                .field(
                    Field::string("sortBy", "Sorting method")
                        .default(json!("allTimeVolume"))
                        .refine(Refinement::OneOf(COLLECTION_SORTS)),
                )
                .field(limit_field())
                .field(Field::string("contract", "Filter by collection contract").optional()),
            move |args| collections(m1.clone(), args),
        ),
        OperationDescriptor::new(
            "magiceden_get_trending_collections",
            PROVIDER,
            "Fetch trending NFT collections from Magic Eden RTP API, based on sales or volume.",
            InputContract::new()
                .field(chain_field())
                .field(
                    Field::string("period", "Time window to aggregate")
                        .default(json!("1d"))
                        .refine(Refinement::OneOf(TRENDING_PERIODS)),
                )
                .field(
                    Field::string("sortBy", "Sort by sales or volume")
                        .default(json!("sales"))
                        .refine(Refinement::OneOf(TRENDING_SORTS)),
                )
                .field(limit_field()),
            move |args| trending(m2.clone(), args),
        ),
        OperationDescriptor::new(
            "magiceden_get_user_collections",
            PROVIDER,
            "Fetch NFT collections owned by a user from Magic Eden RTP API.",
            InputContract::new()
                .field(chain_field())
                .field(Field::string("user", "Wallet address starting with 0x").refine(Refinement::EvmAddress)),
            move |args| user_collections(m3.clone(), args),
        ),
        OperationDescriptor::new(
            "magiceden_get_user_activity",
            PROVIDER,
            "Fetch recent activity (mint, sale, transfer) for a user on Magic Eden RTP API.",
            InputContract::new()
                .field(chain_field())
                .field(Field::string("users", "User wallet address").refine(Refinement::EvmAddress)),
            move |args| user_activity(m4.clone(), args),
        ),
    ]
}
