use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, ContractKind, UserActivity},
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct EarnerEntry {
    pub address: String,
    pub earned: u64,
    pub messages: u64,
}

#[derive(Debug, Serialize)]
pub struct SenderEntry {
    pub address: String,
    pub spent: u64,
    pub messages: u64,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub top_earners: Vec<EarnerEntry>,
    pub top_senders: Vec<SenderEntry>,
}

// Placeholder rankings until on-chain aggregation across users exists.
fn placeholder_leaderboard() -> LeaderboardResponse {
    let address = |suffix: u8| format!("0x742d35cc6ba9a8c0c1b0c4e2e0b9b8a2b1b7e8e{suffix}");
    LeaderboardResponse {
        top_earners: vec![
            EarnerEntry { address: address(1), earned: 12_000, messages: 156 },
            EarnerEntry { address: address(2), earned: 8_600, messages: 98 },
            EarnerEntry { address: address(3), earned: 6_800, messages: 145 },
        ],
        top_senders: vec![
            SenderEntry { address: address(4), spent: 15_000, messages: 203 },
            SenderEntry { address: address(5), spent: 11_200, messages: 89 },
            SenderEntry { address: address(6), spent: 9_800, messages: 167 },
        ],
    }
}

/// GET /api/leaderboard
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LeaderboardResponse>>> {
    if !state.contracts.is_configured(ContractKind::Messaging).await {
        return Err(AppError::ContractNotConfigured(ContractKind::Messaging));
    }
    Ok(Json(ApiResponse::success(placeholder_leaderboard())))
}

/// GET /api/leaderboard/user/{address}
pub async fn get_user_activity(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<UserActivity>>> {
    let activity = state.facade.user_activity(&address).await?;
    Ok(Json(ApiResponse::success(activity)))
}
