use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, ContractAddresses},
    utils::parse_address,
};

use super::{require_admin_key, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct UpdateContractsRequest {
    #[serde(alias = "token")]
    pub txspk_token: Option<String>,
    pub messaging: Option<String>,
    pub presale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContractsResponse {
    pub contracts: ContractAddresses,
    pub network: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateContractsResponse {
    pub message: String,
    pub contracts: ContractAddresses,
}

impl UpdateContractsRequest {
    fn into_addresses(self) -> Result<ContractAddresses> {
        let parse = |value: Option<String>| value.as_deref().map(parse_address).transpose();
        let addresses = ContractAddresses {
            txspk_token: parse(self.txspk_token)?,
            messaging: parse(self.messaging)?,
            presale: parse(self.presale)?,
        };
        if addresses == ContractAddresses::default() {
            return Err(AppError::BadRequest(
                "No contract addresses supplied".to_string(),
            ));
        }
        Ok(addresses)
    }
}

/// GET /api/contracts
pub async fn get_contracts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ContractsResponse>>> {
    Ok(Json(ApiResponse::success(ContractsResponse {
        contracts: state.contracts.snapshot().await,
        network: state.config.network.clone(),
    })))
}

/// POST /api/contracts
pub async fn set_contracts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateContractsRequest>,
) -> Result<Json<ApiResponse<UpdateContractsResponse>>> {
    require_admin_key(&headers, &state)?;
    let update = req.into_addresses()?;

    let contracts = state.contracts.update(&update).await;
    state.cache.invalidate().await;
    tracing::info!("Contract addresses updated: {:?}", contracts);

    Ok(Json(ApiResponse::success(UpdateContractsResponse {
        message: "Contract addresses updated".to_string(),
        contracts,
    })))
}
