use serde::Deserialize;
use std::env;

use crate::constants::{
    AUTH_NONCE_TTL_SECS, CACHE_REFRESH_INTERVAL_SECS, DEFAULT_NETWORK, DEFAULT_PORT,
    INBOX_MESSAGE_LIMIT, JWT_EXPIRY_HOURS, MAX_JWT_EXPIRY_HOURS, PLACEHOLDER_MESSAGING_ADDRESS,
    PLACEHOLDER_PRESALE_ADDRESS, PLACEHOLDER_TOKEN_ADDRESS, RPC_TIMEOUT_SECS,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub network: String,

    // Blockchain
    pub rpc_url: String,
    pub rpc_timeout_secs: u64,

    // Cache
    pub cache_refresh_secs: u64,
    pub inbox_limit: usize,

    // Contract addresses seeded at startup
    pub txspk_token_address: Option<String>,
    pub messaging_address: Option<String>,
    pub presale_address: Option<String>,

    // Auth
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub auth_nonce_ttl_secs: i64,
    pub admin_api_key: Option<String>,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so parsing can be
    /// exercised without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let or_default = |key: &str, default: String| optional(key).unwrap_or(default);

        let rpc_url = optional("ETH_RPC_URL")
            .or_else(|| optional("INFURA_URL"))
            .ok_or_else(|| anyhow::anyhow!("ETH_RPC_URL (or INFURA_URL) must be set"))?;

        Ok(Config {
            host: or_default("HOST", "0.0.0.0".to_string()),
            port: or_default("PORT", DEFAULT_PORT.to_string()).parse()?,
            environment: or_default("ENVIRONMENT", "development".to_string()),
            network: or_default("NETWORK", DEFAULT_NETWORK.to_string()),

            rpc_url,
            rpc_timeout_secs: or_default("RPC_TIMEOUT_SECS", RPC_TIMEOUT_SECS.to_string())
                .parse()?,

            cache_refresh_secs: or_default(
                "CACHE_REFRESH_SECS",
                CACHE_REFRESH_INTERVAL_SECS.to_string(),
            )
            .parse()?,
            inbox_limit: or_default("INBOX_LIMIT", INBOX_MESSAGE_LIMIT.to_string()).parse()?,

            txspk_token_address: optional("TXSPK_TOKEN_ADDRESS"),
            messaging_address: optional("MESSAGING_ADDRESS"),
            presale_address: optional("PRESALE_ADDRESS"),

            jwt_secret: optional("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?,
            jwt_expiry_hours: or_default("JWT_EXPIRY_HOURS", JWT_EXPIRY_HOURS.to_string())
                .parse()?,
            auth_nonce_ttl_secs: or_default(
                "AUTH_NONCE_TTL_SECS",
                AUTH_NONCE_TTL_SECS.to_string(),
            )
            .parse()?,
            admin_api_key: optional("ADMIN_API_KEY"),

            cors_allowed_origins: or_default("CORS_ALLOWED_ORIGINS", "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if url::Url::parse(&self.rpc_url).is_err() {
            anyhow::bail!("ETH_RPC_URL is not a valid URL");
        }
        if self.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET is empty");
        }
        if self.cache_refresh_secs == 0 {
            anyhow::bail!("CACHE_REFRESH_SECS must be > 0");
        }
        if self.rpc_timeout_secs == 0 {
            anyhow::bail!("RPC_TIMEOUT_SECS must be > 0");
        }
        if self.inbox_limit == 0 {
            anyhow::bail!("INBOX_LIMIT must be > 0");
        }
        if self.jwt_expiry_hours == 0 || self.jwt_expiry_hours > MAX_JWT_EXPIRY_HOURS {
            anyhow::bail!(
                "JWT_EXPIRY_HOURS must be between 1 and {}",
                MAX_JWT_EXPIRY_HOURS
            );
        }
        if self.auth_nonce_ttl_secs <= 0 {
            anyhow::bail!("AUTH_NONCE_TTL_SECS must be > 0");
        }

        let placeholders = [
            PLACEHOLDER_TOKEN_ADDRESS,
            PLACEHOLDER_MESSAGING_ADDRESS,
            PLACEHOLDER_PRESALE_ADDRESS,
        ];
        let seeded = [
            &self.txspk_token_address,
            &self.messaging_address,
            &self.presale_address,
        ];
        for address in seeded.into_iter().flatten() {
            if placeholders
                .iter()
                .any(|placeholder| placeholder.eq_ignore_ascii_case(address))
            {
                tracing::warn!("Using placeholder contract address {}", address);
            }
        }

        if self.jwt_secret.contains("change_me") || self.jwt_secret.len() < 16 {
            tracing::warn!("Detected weak JWT_SECRET in config");
        }
        if self.admin_api_key.is_none() {
            tracing::warn!("ADMIN_API_KEY not set; contract address updates are unauthenticated");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_testnet(&self) -> bool {
        if self.environment == "development" || self.environment == "testnet" {
            return true;
        }
        let network = self.network.to_ascii_lowercase();
        network.contains("sepolia") || network.contains("holesky") || network.contains("goerli")
    }
}
