// src/tools/blockvision.rs

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::{Field, GatewayError, InputContract, OperationDescriptor, Outcome, Refinement};
use crate::providers::blockvision::AccountIndexer;

const PROVIDER: &str = "blockvision";

type Indexer = Arc<dyn AccountIndexer>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountArgs {
    address: String,
    page_index: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HoldersArgs {
    contract_address: String,
    page_size: u32,
    page_index: u32,
}

fn page_index_field() -> Field {
    Field::integer("pageIndex", "Page number to fetch")
        .default(json!(1))
        .refine(Refinement::Min(1.0))
        .refine(Refinement::Max(u32::MAX as f64))
}

fn account_contract() -> InputContract {
    InputContract::new()
        .field(Field::string("address", "User wallet address (0x...)").refine(Refinement::EvmAddress))
        .field(page_index_field())
}

fn non_empty(value: Option<&str>, fallback: &'static str) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback).to_string()
}

async fn account_tokens(indexer: Indexer, args: AccountArgs) -> Result<Outcome, GatewayError> {
    let tokens = indexer.account_tokens(&args.address, args.page_index).await?;
    let items = tokens
        .iter()
        .map(|t| {
            json!({
                "name": non_empty(t.name.as_deref(), "Unknown"),
                "symbol": non_empty(t.symbol.as_deref(), "Unknown"),
                "balance": non_empty(t.balance.as_deref(), "0"),
                "contractAddress": non_empty(t.contract_address.as_deref(), ""),
                "imageURL": non_empty(t.image_url.as_deref(), ""),
                "decimal": t.decimal.clone().unwrap_or(Value::Null),
                "verified": t.verified,
            })
        })
        .collect();
    Ok(Outcome::list(
        "tokens",
        json!({ "address": args.address, "pageIndex": args.page_index }),
        items,
        "No tokens found for this address.",
    ))
}

async fn account_nfts(indexer: Indexer, args: AccountArgs) -> Result<Outcome, GatewayError> {
    let collections = indexer.account_nfts(&args.address, args.page_index).await?;
    let items = collections
        .iter()
        .flat_map(|collection| {
            collection.items.iter().map(move |item| {
                json!({
                    "collectionName": collection.name,
                    "contractAddress": item.contract_address,
                    "tokenId": item.token_id.clone().unwrap_or(Value::Null),
                    "name": non_empty(item.name.as_deref(), "Unnamed NFT"),
                    "image": item.image.as_deref().filter(|i| !i.is_empty()),
                })
            })
        })
        .collect();
    Ok(Outcome::list(
        "nfts",
        json!({ "address": args.address, "pageIndex": args.page_index }),
        items,
        "No NFTs found for this address.",
    ))
}

async fn token_holders(indexer: Indexer, args: HoldersArgs) -> Result<Outcome, GatewayError> {
    let holders = indexer
        .token_holders(&args.contract_address, args.page_size, args.page_index)
        .await?;
    // Ranks continue across pages.
    let first_rank = (args.page_index.saturating_sub(1) as usize) * args.page_size as usize + 1;
    let items = holders
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            json!({
                "rank": first_rank + idx,
                "address": h.address,
                "balance": h.balance.clone().unwrap_or(Value::Null),
            })
        })
        .collect();
    Ok(Outcome::list(
        "holders",
        json!({
            "contractAddress": args.contract_address,
            "pageSize": args.page_size,
            "pageIndex": args.page_index,
        }),
        items,
        "No holders found for this token.",
    ))
}

pub fn descriptors(indexer: Indexer) -> Vec<OperationDescriptor> {
    let i1 = indexer.clone();
    let i2 = indexer.clone();
    let i3 = indexer;
    vec![
        OperationDescriptor::new(
            "monad_get_account_tokens",
            PROVIDER,
            "Fetch all ERC-20 tokens owned by a specific wallet address from Blockvision API.",
            account_contract(),
            move |args| account_tokens(i1.clone(), args),
        ),
        OperationDescriptor::new(
            "monad_get_account_nfts",
            PROVIDER,
            "Fetches all NFTs owned by a specific wallet address from Blockvision API.",
            account_contract(),
            move |args| account_nfts(i2.clone(), args),
        ),
        OperationDescriptor::new(
            "monad_get_token_holders",
            PROVIDER,
            "Fetch token holders for a specific ERC-20 token using Blockvision API.",
            InputContract::new()
                .field(
                    Field::string("contractAddress", "ERC-20 token contract address (0x...)")
                        .refine(Refinement::EvmAddress),
                )
                .field(
                    Field::integer("pageSize", "Number of holders per page")
                        .default(json!(20))
                        .refine(Refinement::Min(1.0))
                        .refine(Refinement::Max(50.0)),
                )
                .field(page_index_field()),
            move |args| token_holders(i3.clone(), args),
        ),
    ]
}
