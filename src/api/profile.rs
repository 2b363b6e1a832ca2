use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::Result,
    models::{ApiResponse, UserProfile},
};

use super::AppState;

/// GET /api/user/profile/{address}
///
/// Always read live; profiles are address-keyed and never cached.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let profile = state.facade.user_profile(&address).await?;
    Ok(Json(ApiResponse::success(profile)))
}
