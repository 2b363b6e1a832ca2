use axum::{extract::State, Json};
use serde::Serialize;
use tokio::time::Instant;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub network: String,
    pub connected: bool,
    pub block_number: Option<u64>,
    pub cache: CacheHealth,
}

#[derive(Serialize)]
pub struct CacheHealth {
    pub refresh_interval_secs: u64,
    pub token_stats_age_secs: Option<u64>,
    pub presale_stats_age_secs: Option<u64>,
}

fn age_secs(fetched_at: Option<Instant>) -> Option<u64> {
    fetched_at.map(|at| at.elapsed().as_secs())
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let block_number = match state.facade.block_number().await {
        Ok(number) => Some(number),
        Err(e) => {
            tracing::warn!("Chain node health check failed: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: state.config.network.clone(),
        connected: block_number.is_some(),
        block_number,
        cache: CacheHealth {
            refresh_interval_secs: state.cache.interval().as_secs(),
            token_stats_age_secs: age_secs(state.cache.token_stats_fetched_at()),
            presale_stats_age_secs: age_secs(state.cache.presale_stats_fetched_at()),
        },
    })
}
