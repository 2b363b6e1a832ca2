use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod crypto;
mod error;
mod models;
mod services;
mod utils;

use config::Config;
use constants::API_VERSION;
use services::{ContractRegistry, EthNode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "txspeak_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting TXSPEAK Backend on {} network", config.network);
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);
    if config.is_testnet() {
        tracing::info!("Running against a testnet");
    }

    // Chain node and contract registry
    let node = EthNode::from_config(&config)?;
    let registry = ContractRegistry::from_config(&config)?;
    let app_state = api::AppState::new(config.clone(), Arc::new(node), registry);

    match app_state.facade.block_number().await {
        Ok(block) => tracing::info!("Connected to chain node, latest block {}", block),
        Err(e) => tracing::warn!("Chain node not reachable yet: {}", e),
    }

    // Build router
    let app = build_router(app_state.clone());

    // Start background services
    let background = services::start_background_services(app_state.cache.clone());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for handle in background {
        handle.abort();
    }
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/api/health", get(api::health::health_check))
        // Contract addresses
        .route(
            "/api/contracts",
            get(api::contracts::get_contracts).post(api::contracts::set_contracts),
        )
        // Token
        .route("/api/token/stats", get(api::token::get_token_stats))
        .route(
            "/api/token/balance/{address}",
            get(api::token::get_token_balance),
        )
        // Users & messages
        .route("/api/user/profile/{address}", get(api::profile::get_profile))
        .route(
            "/api/messages/inbox/{address}",
            get(api::messages::get_inbox),
        )
        // Presale
        .route("/api/presale/stats", get(api::presale::get_presale_stats))
        // Leaderboard
        .route("/api/leaderboard", get(api::leaderboard::get_leaderboard))
        .route(
            "/api/leaderboard/user/{address}",
            get(api::leaderboard::get_user_activity),
        )
        // Authentication
        .route("/api/auth/nonce/{address}", get(api::auth::get_nonce))
        .route("/api/auth/verify", post(api::auth::verify_signature))
        .route("/api/auth/session", get(api::auth::get_session))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::contract_facade::tests::{
        message_tokens, stub_token_stats, user_address, USER,
    };
    use crate::services::onchain::mock::MockNode;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use ethers::abi::Token;
    use ethers::signers::{LocalWallet, Signer};
    use ethers::types::{Address, U256};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_config(extra: &[(&str, &str)]) -> Config {
        let extra: Vec<(String, String)> = extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| match key {
            "ETH_RPC_URL" => Some("http://localhost:8545".to_string()),
            "JWT_SECRET" => Some("a-sufficiently-long-secret".to_string()),
            other => extra
                .iter()
                .find(|(k, _)| k == other)
                .map(|(_, v)| v.clone()),
        })
        .expect("config")
    }

    fn app_with(node: Arc<MockNode>, config: Config) -> Router {
        let state = api::AppState::new(config, node, ContractRegistry::default());
        build_router(state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn token_address() -> String {
        format!("{:?}", Address::repeat_byte(0x11))
    }

    #[tokio::test]
    async fn health_reports_block_number_and_empty_cache() {
        let node = Arc::new(MockNode::new());
        node.set_block_number(Some(6_123_456));
        let app = app_with(node, test_config(&[]));

        let (status, body) = send(&app, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], true);
        assert_eq!(body["block_number"], 6_123_456);
        assert_eq!(body["network"], "sepolia");
        assert!(body["cache"]["token_stats_age_secs"].is_null());
    }

    #[tokio::test]
    async fn health_survives_unreachable_node() {
        let app = app_with(Arc::new(MockNode::new()), test_config(&[]));

        let (status, body) = send(&app, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], false);
        assert!(body["block_number"].is_null());
    }

    #[tokio::test]
    async fn reads_fail_until_contracts_are_configured() {
        let node = Arc::new(MockNode::new());
        node.respond(
            "balanceOf",
            vec![Token::Address(user_address())],
            vec![Token::Uint(U256::from(77u64))],
        );
        let app = app_with(node.clone(), test_config(&[]));

        let (status, body) = send(&app, get(&format!("/api/token/balance/{USER}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "CONTRACT_NOT_CONFIGURED");

        let (status, body) = send(
            &app,
            post_json("/api/contracts", json!({ "txspk_token": token_address() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["contracts"]["txspk_token"], token_address());

        let (status, body) = send(&app, get(&format!("/api/token/balance/{USER}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["balance"], "77");
        assert_eq!(node.last_contract("balanceOf"), Some(Address::repeat_byte(0x11)));

        let (_, body) = send(&app, get("/api/contracts")).await;
        assert_eq!(body["data"]["contracts"]["txspk_token"], token_address());
        assert!(body["data"]["contracts"]["presale"].is_null());
    }

    #[tokio::test]
    async fn address_update_redirects_cached_stats() {
        let node = Arc::new(MockNode::new());
        stub_token_stats(&node, 5);
        let app = app_with(node.clone(), test_config(&[]));

        send(&app, post_json("/api/contracts", json!({ "token": token_address() }))).await;
        let (status, body) = send(&app, get("/api/token/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_supply"], "5");

        let moved = format!("{:?}", Address::repeat_byte(0x44));
        send(&app, post_json("/api/contracts", json!({ "token": moved }))).await;
        send(&app, get("/api/token/stats")).await;

        assert_eq!(node.calls("totalSupply"), 2);
        assert_eq!(node.last_contract("totalSupply"), Some(Address::repeat_byte(0x44)));
    }

    #[tokio::test]
    async fn invalid_address_is_bad_request() {
        let node = Arc::new(MockNode::new());
        let app = app_with(node, test_config(&[]));
        send(&app, post_json("/api/contracts", json!({ "token": token_address() }))).await;

        let (status, body) = send(&app, get("/api/user/profile/0xnothex")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_ADDRESS");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn contract_updates_require_admin_key_when_configured() {
        let app = app_with(
            Arc::new(MockNode::new()),
            test_config(&[("ADMIN_API_KEY", "letmein")]),
        );
        let body = json!({ "messaging": token_address() });

        let (status, _) = send(&app, post_json("/api/contracts", body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut request = post_json("/api/contracts", body);
        request
            .headers_mut()
            .insert("x-admin-key", "letmein".parse().expect("header"));
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn inbox_endpoint_degrades_to_partial_list() {
        let node = Arc::new(MockNode::new());
        node.respond(
            "getUserInbox",
            vec![Token::Address(user_address())],
            vec![Token::Array(
                (1..=15u64).map(|id| Token::Uint(U256::from(id))).collect(),
            )],
        );
        for id in 1..=15u64 {
            node.respond("getMessage", vec![Token::Uint(U256::from(id))], message_tokens(id));
        }
        node.fail("getMessage", vec![Token::Uint(U256::from(6u64))]);
        node.fail("getMessage", vec![Token::Uint(U256::from(15u64))]);
        let app = app_with(node, test_config(&[]));
        send(
            &app,
            post_json(
                "/api/contracts",
                json!({ "messaging": format!("{:?}", Address::repeat_byte(0x22)) }),
            ),
        )
        .await;

        let (status, body) = send(&app, get(&format!("/api/messages/inbox/{USER}"))).await;
        assert_eq!(status, StatusCode::OK);
        let messages = body["data"]["messages"].as_array().expect("array");
        assert_eq!(messages.len(), 8);
        assert_eq!(messages[0]["id"], "7");
        assert_eq!(messages[7]["id"], "14");
    }

    #[tokio::test]
    async fn leaderboard_stub_needs_messaging_contract() {
        let app = app_with(Arc::new(MockNode::new()), test_config(&[]));

        let (status, _) = send(&app, get("/api/leaderboard")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(
            &app,
            post_json(
                "/api/contracts",
                json!({ "messaging": format!("{:?}", Address::repeat_byte(0x22)) }),
            ),
        )
        .await;
        let (status, body) = send(&app, get("/api/leaderboard")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["top_earners"][0]["earned"], 12_000);
    }

    #[tokio::test]
    async fn wallet_login_issues_session_token() {
        let app = app_with(Arc::new(MockNode::new()), test_config(&[]));
        let wallet: LocalWallet = DEV_KEY.parse().expect("wallet");
        let address = format!("{:?}", wallet.address());

        let (status, body) = send(&app, get(&format!("/api/auth/nonce/{address}"))).await;
        assert_eq!(status, StatusCode::OK);
        let nonce = body["data"]["nonce"].as_str().expect("nonce").to_string();

        let signature = wallet.sign_message(nonce.as_str()).await.expect("sign");
        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/verify",
                json!({
                    "address": address.to_uppercase().replacen("0X", "0x", 1),
                    "message": nonce,
                    "signature": format!("0x{signature}"),
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["data"]["token"].as_str().expect("token").to_string();
        let checksummed = ethers::utils::to_checksum(&wallet.address(), None);
        assert_eq!(body["data"]["address"], checksummed);

        let request = Request::builder()
            .uri("/api/auth/session")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request");
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["address"], checksummed);
    }

    #[tokio::test]
    async fn signature_from_other_wallet_is_rejected() {
        let app = app_with(Arc::new(MockNode::new()), test_config(&[]));
        let wallet: LocalWallet = DEV_KEY.parse().expect("wallet");
        let nonce = api::auth::nonce_message(crate::utils::unix_now());
        let signature = wallet.sign_message(nonce.as_str()).await.expect("sign");

        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/verify",
                json!({
                    "address": USER,
                    "message": nonce,
                    "signature": format!("0x{signature}"),
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_SIGNATURE");

        let (status, _) = send(
            &app,
            post_json("/api/auth/verify", json!({ "address": USER })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn session_without_token_is_unauthorized() {
        let app = app_with(Arc::new(MockNode::new()), test_config(&[]));
        let (status, _) = send(&app, get("/api/auth/session")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/health")
            .header("origin", origin)
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn cors_allows_only_listed_origins() {
        let app = app_with(
            Arc::new(MockNode::new()),
            test_config(&[("CORS_ALLOWED_ORIGINS", "http://localhost:3000, ")]),
        );

        let allowed = app
            .clone()
            .oneshot(preflight("http://localhost:3000"))
            .await
            .expect("response");
        assert_eq!(
            allowed.headers().get("access-control-allow-origin"),
            Some(&HeaderValue::from_static("http://localhost:3000"))
        );

        let denied = app
            .clone()
            .oneshot(preflight("http://elsewhere.example"))
            .await
            .expect("response");
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn recased_claimed_address_still_verifies() {
        let app = app_with(Arc::new(MockNode::new()), test_config(&[]));
        let wallet: LocalWallet = DEV_KEY.parse().expect("wallet");
        let nonce = api::auth::nonce_message(crate::utils::unix_now());
        let signature = wallet.sign_message(nonce.as_str()).await.expect("sign");

        // Flip the case of one letter of the checksummed form.
        let checksummed = ethers::utils::to_checksum(&wallet.address(), None);
        let position = checksummed[2..]
            .find(|c: char| c.is_ascii_alphabetic())
            .map(|i| i + 2)
            .expect("letter");
        let mut recased = checksummed.clone();
        let flipped = if checksummed.as_bytes()[position].is_ascii_uppercase() {
            checksummed[position..=position].to_ascii_lowercase()
        } else {
            checksummed[position..=position].to_ascii_uppercase()
        };
        recased.replace_range(position..=position, &flipped);
        assert!(crate::utils::parse_address(&recased).is_err());

        let (status, body) = send(
            &app,
            post_json(
                "/api/auth/verify",
                json!({
                    "address": recased,
                    "message": nonce,
                    "signature": format!("0x{signature}"),
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["address"], checksummed);
    }

    #[tokio::test(start_paused = true)]
    async fn health_does_not_wait_for_refresh_in_flight() {
        let node = Arc::new(MockNode::new());
        node.set_block_number(Some(1));
        stub_token_stats(&node, 5);
        let app = app_with(node.clone(), test_config(&[]));
        send(&app, post_json("/api/contracts", json!({ "token": token_address() }))).await;
        send(&app, get("/api/token/stats")).await;

        node.set_delay(Duration::from_secs(60));
        tokio::time::advance(Duration::from_secs(31)).await;
        let refreshing = {
            let app = app.clone();
            tokio::spawn(async move { send(&app, get("/api/token/stats")).await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;

        let started = tokio::time::Instant::now();
        let (status, body) = send(&app, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(body["cache"]["token_stats_age_secs"], 31);

        let (status, _) = refreshing.await.expect("join");
        assert_eq!(status, StatusCode::OK);
    }
}
