// src/api/mod.rs

pub mod auth;
pub mod contracts;
pub mod health;
pub mod leaderboard;
pub mod messages;
pub mod presale;
pub mod profile;
pub mod token;

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderName};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    constants::ADMIN_KEY_HEADER,
    error::{AppError, Result},
    services::{ChainNode, ContractFacade, ContractRegistry, RefreshCache},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub contracts: Arc<ContractRegistry>,
    pub facade: Arc<ContractFacade>,
    pub cache: Arc<RefreshCache>,
}

impl AppState {
    pub fn new(config: Config, node: Arc<dyn ChainNode>, contracts: ContractRegistry) -> Self {
        let contracts = Arc::new(contracts);
        let facade = Arc::new(ContractFacade::new(
            node,
            contracts.clone(),
            Duration::from_secs(config.rpc_timeout_secs),
        ));
        let cache = Arc::new(RefreshCache::new(
            facade.clone(),
            Duration::from_secs(config.cache_refresh_secs),
        ));

        Self {
            config,
            contracts,
            facade,
            cache,
        }
    }
}

/// Resolves the wallet address behind a `Bearer` session token.
pub fn require_user(headers: &HeaderMap, state: &AppState) -> Result<String> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("Missing Authorization header".to_string()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid Authorization header".to_string()))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthError("Invalid Authorization scheme".to_string()))?;

    auth::extract_user_from_token(token.trim(), &state.config.jwt_secret)
}

/// Guards administrative writes when `ADMIN_API_KEY` is configured.
pub fn require_admin_key(headers: &HeaderMap, state: &AppState) -> Result<()> {
    let Some(expected) = state
        .config
        .admin_api_key
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    else {
        return Ok(());
    };

    let header_name = HeaderName::from_static(ADMIN_KEY_HEADER);
    let provided = headers
        .get(&header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::AuthError(format!(
                "Missing admin key. Send header '{}' to access this endpoint.",
                ADMIN_KEY_HEADER
            ))
        })?;

    if provided != expected {
        return Err(AppError::AuthError("Invalid admin key".to_string()));
    }
    Ok(())
}
