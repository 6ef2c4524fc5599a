//! End-to-end calls through the live adapters against a mock upstream.

use mockito::{Matcher, Server};
use monad_mcp_gateway::config::Config;
use monad_mcp_gateway::AppState;
use serde_json::json;

const TOKEN: &str = "0x760AfE86e5de5fa0Ee542fc7B7B713e1c5425701";

fn state_for(server: &Server) -> AppState {
    let config = Config {
        monorail_data_api_url: server.url(),
        monorail_quote_api_url: server.url(),
        nadfun_api_url: server.url(),
        codex_api_url: format!("{}/graphql", server.url()),
        ..Config::default()
    };
    AppState::from_config(config).unwrap()
}

#[tokio::test]
async fn full_catalog_is_registered() {
    let server = Server::new_async().await;
    let state = state_for(&server);
    let listing = state.gateway.tool_listing();
    assert_eq!(listing.len(), 32);
    assert_eq!(listing[0]["name"], "get_all_user_domains");
    assert_eq!(listing[31]["name"], "nadfun_sell_to_dex");
}

#[tokio::test]
async fn monorail_token_info_round_trip() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", format!("/v1/token/{}", TOKEN).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"address":"0x760afe86e5de5fa0ee542fc7b7b713e1c5425701","name":"Wrapped Monad","symbol":"WMON","decimals":"18","categories":["wrapped"]}"#)
        .create_async()
        .await;

    let state = state_for(&server);
    let envelope = state
        .gateway
        .call("monorail_get_token_info", &json!({ "contractAddress": TOKEN }))
        .await
        .to_json();

    mock.assert_async().await;
    assert_eq!(envelope["status"], "success");
    assert_eq!(envelope["token"]["symbol"], "WMON");
    assert_eq!(envelope["token"]["decimals"], 18);
    assert_eq!(envelope["metadata"]["contractAddress"], TOKEN);
}

#[tokio::test]
async fn upstream_status_becomes_an_upstream_envelope() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/tokens/count")
        .with_status(503)
        .with_body(r#"{"message":"maintenance"}"#)
        .create_async()
        .await;

    let envelope = state_for(&server)
        .gateway
        .call("monorail_get_token_count", &json!({}))
        .await
        .to_json();
    assert_eq!(envelope["kind"], "upstream");
    assert_eq!(envelope["message"], "HTTP 503: maintenance");
}

#[tokio::test]
async fn nadfun_holders_pass_paging_through() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", format!("/token/holder/{}", TOKEN).as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "holders": [
                    { "account_address": "0x00000000000000000000000000000000000000aa", "is_dev": false, "balance": "42" }
                ],
                "total_count": 6
            })
            .to_string(),
        )
        .create_async()
        .await;

    let envelope = state_for(&server)
        .gateway
        .call(
            "nadfun_get_token_holders",
            &json!({ "tokenAddress": TOKEN, "page": "2", "limit": 5 }),
        )
        .await
        .to_json();

    mock.assert_async().await;
    assert_eq!(envelope["status"], "success");
    assert_eq!(envelope["metadata"]["totalCount"], 6);
    assert_eq!(envelope["holders"][0]["balance"], "42");
}

#[tokio::test]
async fn codex_without_a_key_never_calls_out() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", "/graphql").expect(0).create_async().await;

    let envelope = state_for(&server)
        .gateway
        .call("codex_get_networks", &json!({}))
        .await
        .to_json();

    mock.assert_async().await;
    assert_eq!(envelope["kind"], "upstream");
    assert_eq!(envelope["message"], "CODEX_API_KEY is not configured");
}
