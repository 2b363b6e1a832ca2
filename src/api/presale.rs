use axum::{extract::State, Json};

use crate::{
    error::Result,
    models::{ApiResponse, PresaleStats},
};

use super::AppState;

/// GET /api/presale/stats
pub async fn get_presale_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PresaleStats>>> {
    let stats = state.cache.presale_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}
