// Utility helpers shared by handlers and services

use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use rust_decimal::Decimal;
use serde::Serializer;
use std::str::FromStr;

use crate::{
    constants::{DISPLAY_NAME_ELLIPSIS, DISPLAY_NAME_FALLBACK_CHARS},
    error::{AppError, Result},
};

/// Parses an EVM address, accepting all-lowercase, all-uppercase or a
/// correctly checksummed mixed-case hex string.
pub fn parse_address(value: &str) -> Result<Address> {
    let (trimmed, hex_part) = split_address(value)?;
    let address = Address::from_str(trimmed).map_err(|_| invalid_address(trimmed))?;

    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&address, None) != trimmed {
        return Err(invalid_address(trimmed));
    }

    Ok(address)
}

/// Parses an EVM address without enforcing the mixed-case checksum.
pub fn parse_address_ignoring_case(value: &str) -> Result<Address> {
    let (trimmed, hex_part) = split_address(value)?;
    Address::from_str(&hex_part.to_ascii_lowercase()).map_err(|_| invalid_address(trimmed))
}

fn invalid_address(value: &str) -> AppError {
    AppError::InvalidAddress(value.to_string())
}

// Returns the trimmed input and its 40 hex digits.
fn split_address(value: &str) -> Result<(&str, &str)> {
    let trimmed = value.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| invalid_address(trimmed))?;
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid_address(trimmed));
    }
    Ok((trimmed, hex_part))
}

/// Fallback display name: the leading characters of the address plus an ellipsis.
pub fn short_address(address: &str) -> String {
    let prefix: String = address.chars().take(DISPLAY_NAME_FALLBACK_CHARS).collect();
    format!("{prefix}{DISPLAY_NAME_ELLIPSIS}")
}

/// Scales an integer amount in smallest units down to display units.
pub fn to_display_units(value: U256, decimals: u32) -> Result<Decimal> {
    if value > U256::from(u128::MAX) {
        return Err(AppError::Internal(format!(
            "Amount {} exceeds display range",
            value
        )));
    }
    let raw = i128::try_from(value.as_u128())
        .map_err(|_| AppError::Internal(format!("Amount {} exceeds display range", value)))?;
    Decimal::try_from_i128_with_scale(raw, decimals)
        .map(|amount| amount.normalize())
        .map_err(|e| AppError::Internal(format!("Amount {} exceeds display range: {}", value, e)))
}

pub fn serialize_u256<S>(value: &U256, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
