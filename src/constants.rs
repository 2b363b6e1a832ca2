/// Application constants

// API version
pub const API_VERSION: &str = "v1";

// Server defaults
pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_NETWORK: &str = "sepolia";

// Chain access
pub const RPC_TIMEOUT_SECS: u64 = 5;
pub const TOKEN_DECIMALS: u32 = 18;

// Cache: one interval drives both the on-demand staleness check and the background timer
pub const CACHE_REFRESH_INTERVAL_SECS: u64 = 30;
// Reads within this window of a failed refresh serve the stale value without retrying
pub const CACHE_RETRY_BACKOFF_SECS: u64 = 5;

// Messaging
pub const INBOX_MESSAGE_LIMIT: usize = 10;
pub const DISPLAY_NAME_FALLBACK_CHARS: usize = 10;
pub const DISPLAY_NAME_ELLIPSIS: &str = "...";

// Authentication
pub const AUTH_NONCE_PREFIX: &str = "Please sign this message to authenticate with TXSPEAK: ";
pub const AUTH_NONCE_TTL_SECS: i64 = 300;
pub const AUTH_NONCE_CLOCK_SKEW_SECS: i64 = 60;
pub const JWT_EXPIRY_HOURS: u64 = 24;
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

// Placeholder deployment addresses
pub const PLACEHOLDER_TOKEN_ADDRESS: &str = "0x1111111111111111111111111111111111111111";
pub const PLACEHOLDER_MESSAGING_ADDRESS: &str = "0x2222222222222222222222222222222222222222";
pub const PLACEHOLDER_PRESALE_ADDRESS: &str = "0x3333333333333333333333333333333333333333";
