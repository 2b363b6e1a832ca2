use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{error::Result, models::{ApiResponse, InboxMessage}};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct InboxResponse {
    pub messages: Vec<InboxMessage>,
}

/// GET /api/messages/inbox/{address}
pub async fn get_inbox(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<InboxResponse>>> {
    let messages = state
        .facade
        .inbox(&address, state.config.inbox_limit)
        .await?;
    Ok(Json(ApiResponse::success(InboxResponse { messages })))
}
