use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::Result,
    models::{ApiResponse, TokenBalance, TokenStats},
};

use super::AppState;

/// GET /api/token/stats
pub async fn get_token_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TokenStats>>> {
    let stats = state.cache.token_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /api/token/balance/{address}
pub async fn get_token_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<TokenBalance>>> {
    let balance = state.facade.balance_of(&address).await?;
    Ok(Json(ApiResponse::success(balance)))
}
