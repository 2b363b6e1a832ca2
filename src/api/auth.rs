use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::{Duration, Utc};
use ethers::utils::to_checksum;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{AUTH_NONCE_CLOCK_SKEW_SECS, AUTH_NONCE_PREFIX},
    crypto::signature::SignatureVerifier,
    error::{AppError, Result},
    models::ApiResponse,
    utils::{parse_address, parse_address_ignoring_case, unix_now},
};

use super::{require_user, AppState};

// ==================== REQUEST/RESPONSE TYPES ====================

#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub nonce: String,
    pub issued_at: i64,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub address: Option<String>,
    pub message: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub token: String,
    pub address: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // wallet address
    pub exp: usize,  // expiry
    pub iat: usize,  // issued at
}

// ==================== HANDLERS ====================

/// GET /api/auth/nonce/{address}
///
/// The challenge is stateless: it only embeds the issue time, which
/// `verify` checks against the configured TTL.
pub async fn get_nonce(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<NonceResponse>>> {
    parse_address(&address)?;
    let issued_at = unix_now();

    Ok(Json(ApiResponse::success(NonceResponse {
        nonce: nonce_message(issued_at),
        issued_at,
        expires_in: state.config.auth_nonce_ttl_secs,
    })))
}

/// POST /api/auth/verify
pub async fn verify_signature(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<ApiResponse<VerifyResponse>>> {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let (Some(address), Some(message), Some(signature)) = (
        non_empty(req.address),
        non_empty(req.message),
        non_empty(req.signature),
    ) else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    // Claimed and recovered addresses compare case-insensitively.
    let claimed = parse_address_ignoring_case(&address)?;
    check_nonce_freshness(&message, unix_now(), state.config.auth_nonce_ttl_secs)?;
    SignatureVerifier::verify_signature(&claimed, &message, &signature)?;

    let address = to_checksum(&claimed, None);
    let token = generate_jwt_token(&address, &state.config.jwt_secret, state.config.jwt_expiry_hours)?;
    tracing::info!("Issued session for {}", address);

    Ok(Json(ApiResponse::success(VerifyResponse {
        token,
        address,
        expires_in: (state.config.jwt_expiry_hours * 3600) as i64,
    })))
}

/// GET /api/auth/session
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<SessionResponse>>> {
    let address = require_user(&headers, &state)?;
    Ok(Json(ApiResponse::success(SessionResponse { address })))
}

// ==================== HELPER FUNCTIONS ====================

pub fn nonce_message(issued_at: i64) -> String {
    format!("{AUTH_NONCE_PREFIX}{issued_at}")
}

/// Accepts only challenges issued by `get_nonce` within the last `ttl_secs`.
fn check_nonce_freshness(message: &str, now: i64, ttl_secs: i64) -> Result<()> {
    let issued_at = message
        .strip_prefix(AUTH_NONCE_PREFIX)
        .and_then(|rest| rest.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::BadRequest("Message is not a TXSPEAK nonce".to_string()))?;

    if issued_at > now + AUTH_NONCE_CLOCK_SKEW_SECS {
        return Err(AppError::AuthError("Nonce issued in the future".to_string()));
    }
    if now - issued_at > ttl_secs {
        return Err(AppError::AuthError("Nonce expired".to_string()));
    }
    Ok(())
}

fn generate_jwt_token(address: &str, secret: &str, expiry_hours: u64) -> Result<String> {
    let now = Utc::now();
    let expiration = i64::try_from(expiry_hours)
        .ok()
        .and_then(Duration::try_hours)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| AppError::Internal("Token expiry out of range".to_string()))?
        .timestamp();

    let claims = Claims {
        sub: address.to_string(),
        exp: expiration as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

pub fn extract_user_from_token(token: &str, secret: &str) -> Result<String> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid or expired token".to_string()))?;

    Ok(token_data.claims.sub)
}
