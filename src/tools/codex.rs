// src/tools/codex.rs

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::{Field, GatewayError, InputContract, OperationDescriptor, Outcome, Refinement};
use crate::providers::codex::TokenAnalytics;

const PROVIDER: &str = "codex";

type Analytics = Arc<dyn TokenAnalytics>;

#[derive(Deserialize)]
struct NoArgs {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkArgs {
    network_id: i64,
}

#[derive(Deserialize)]
struct AddressArgs {
    address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairArgs {
    token_address: String,
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(value).map_err(|e| GatewayError::Internal(e.to_string()))
}

async fn networks(codex: Analytics, _args: NoArgs) -> Result<Outcome, GatewayError> {
    let networks = codex.networks().await?;
    let count = networks.len();
    let items = networks.iter().map(to_value).collect::<Result<Vec<_>, _>>()?;
    Ok(Outcome::list(
        "data",
        json!({ "count": count }),
        items,
        "Codex returned no networks.",
    ))
}

async fn network_status(codex: Analytics, args: NetworkArgs) -> Result<Outcome, GatewayError> {
    let metadata = json!({ "networkId": args.network_id });
    Ok(match codex.network_status(args.network_id).await? {
        Some(status) => Outcome::success("networkStatus", metadata, to_value(&status)?),
        None => Outcome::empty_record(
            "networkStatus",
            metadata,
            format!("No status reported for network {}.", args.network_id),
        ),
    })
}

async fn token_info(codex: Analytics, args: AddressArgs) -> Result<Outcome, GatewayError> {
    let metadata = json!({ "address": args.address, "networkId": codex.network_id() });
    Ok(match codex.token(&args.address).await? {
        Some(token) => Outcome::success("token", metadata, to_value(&token)?),
        None => Outcome::empty_record(
            "token",
            metadata,
            format!("No token found at {}.", args.address),
        ),
    })
}

async fn token_pairs(codex: Analytics, args: PairArgs) -> Result<Outcome, GatewayError> {
    let pairs = codex.token_pairs(&args.token_address).await?;
    let items = pairs.iter().map(to_value).collect::<Result<Vec<_>, _>>()?;
    Ok(Outcome::list(
        "pairs",
        json!({
            "tokenAddress": args.token_address,
            "networkId": codex.network_id(),
            "count": items.len(),
        }),
        items,
        "No trading pairs found for this token.",
    ))
}

async fn nft_collection(codex: Analytics, args: AddressArgs) -> Result<Outcome, GatewayError> {
    let metadata = json!({ "address": args.address, "networkId": codex.network_id() });
    Ok(match codex.nft_collection(&args.address).await? {
        Some(contract) => Outcome::success("collection", metadata, to_value(&contract)?),
        None => Outcome::empty_record(
            "collection",
            metadata,
            format!("No NFT collection metadata found for {}.", args.address),
        ),
    })
}

pub fn descriptors(codex: Analytics) -> Vec<OperationDescriptor> {
    let c1 = codex.clone();
    let c2 = codex.clone();
    let c3 = codex.clone();
    let c4 = codex.clone();
    let c5 = codex;
    vec![
        OperationDescriptor::new(
            "codex_get_networks",
            PROVIDER,
            "Fetches all networks supported by Codex.",
            InputContract::new(),
            move |args| networks(c1.clone(), args),
        ),
        OperationDescriptor::new(
            "codex_get_network_status",
            PROVIDER,
            "Fetch the latest block and timestamp for a given networkId from Codex.",
            InputContract::new().field(Field::integer(
                "networkId",
                "The network ID to fetch the status for (e.g., 10143 for Monad Testnet)",
            )),
            move |args| network_status(c2.clone(), args),
        ),
        OperationDescriptor::new(
            "codex_get_token_info",
            PROVIDER,
            "Fetch detailed token info from Codex by token address.",
            InputContract::new()
                .field(Field::string("address", "Token address").refine(Refinement::MinLength(1))),
            move |args| token_info(c3.clone(), args),
        ),
        OperationDescriptor::new(
            "codex_get_token_pairs",
            PROVIDER,
            "Fetch trading pairs for a given token on Monad Testnet.",
            InputContract::new().field(
                Field::string("tokenAddress", "Token address to find trading pairs for")
                    .refine(Refinement::StartsWith("0x")),
            ),
            move |args| token_pairs(c4.clone(), args),
        ),
        OperationDescriptor::new(
            "codex_get_nft_collection_metadata",
            PROVIDER,
            "Fetch NFT collection metadata from Codex by address on Monad Testnet.",
            InputContract::new().field(
                Field::string("address", "NFT collection contract address")
                    .refine(Refinement::StartsWith("0x"))
                    .refine(Refinement::Length(42)),
            ),
            move |args| nft_collection(c5.clone(), args),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Catalog, Gateway, Status};
    use crate::providers::codex::{CodexToken, Network, NetworkStatus, NftContract, TokenPair};
    use crate::providers::ProviderError;
    use async_trait::async_trait;

    struct StubCodex;

    #[async_trait]
    impl TokenAnalytics for StubCodex {
        async fn networks(&self) -> Result<Vec<Network>, ProviderError> {
            Ok(vec![Network {
                id: 10143,
                name: "Monad Testnet".into(),
            }])
        }

        async fn network_status(&self, network_id: i64) -> Result<Option<NetworkStatus>, ProviderError> {
            Ok(Some(NetworkStatus {
                last_processed_block: Some(1234),
                last_processed_timestamp: Some(json!(1_700_000_000)),
                network_id: Some(network_id),
                network_name: Some("Monad Testnet".into()),
            }))
        }

        async fn token(&self, _address: &str) -> Result<Option<CodexToken>, ProviderError> {
            Ok(None)
        }

        async fn token_pairs(&self, _token_address: &str) -> Result<Vec<TokenPair>, ProviderError> {
            Err(ProviderError::GraphQl("Unauthorized".into()))
        }

        async fn nft_collection(&self, address: &str) -> Result<Option<NftContract>, ProviderError> {
            Ok(Some(NftContract {
                address: Some(address.into()),
                erc_type: Some("ERC721".into()),
                image: None,
                name: Some("Chogs".into()),
                symbol: Some("CHOG".into()),
            }))
        }

        fn network_id(&self) -> i64 {
            10143
        }
    }

    fn gateway() -> Gateway {
        let mut catalog = Catalog::new();
        catalog.register_all(descriptors(Arc::new(StubCodex))).unwrap();
        Gateway::new(catalog)
    }

    #[tokio::test]
    async fn networks_are_listed_under_data() {
        let out = gateway().call("codex_get_networks", &json!({})).await.to_json();
        assert_eq!(out["status"], "success");
        assert_eq!(out["data"], json!([{ "id": 10143, "name": "Monad Testnet" }]));
    }

    #[tokio::test]
    async fn network_id_accepts_a_string() {
        let out = gateway()
            .call("codex_get_network_status", &json!({ "networkId": "10143" }))
            .await
            .to_json();
        assert_eq!(out["networkStatus"]["lastProcessedBlock"], 1234);
        assert_eq!(out["networkStatus"]["networkId"], 10143);
    }

    #[tokio::test]
    async fn unknown_token_is_empty() {
        let env = gateway()
            .call("codex_get_token_info", &json!({ "address": "0xdead" }))
            .await;
        assert_eq!(env.status(), Status::Empty);
    }

    #[tokio::test]
    async fn graphql_failure_is_an_error_envelope() {
        let env = gateway()
            .call("codex_get_token_pairs", &json!({ "tokenAddress": "0xabc" }))
            .await;
        assert!(env.is_error());
        assert_eq!(env.message(), Some("GraphQL error: Unauthorized"));
    }

    #[tokio::test]
    async fn nft_address_must_be_full_length() {
        let env = gateway()
            .call("codex_get_nft_collection_metadata", &json!({ "address": "0xabc" }))
            .await;
        assert_eq!(env.to_json()["kind"], "validation");

        let env = gateway()
            .call(
                "codex_get_nft_collection_metadata",
                &json!({ "address": "0x1111111111111111111111111111111111111111" }),
            )
            .await;
        assert_eq!(env.payload().unwrap()["ercType"], "ERC721");
    }
}
