use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::serialize_u256;

// ==================== CONTRACTS ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Token,
    Messaging,
    Presale,
}

impl ContractKind {
    pub fn key(&self) -> &'static str {
        match self {
            ContractKind::Token => "txspk_token",
            ContractKind::Messaging => "messaging",
            ContractKind::Presale => "presale",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContractKind::Token => "Token",
            ContractKind::Messaging => "Messaging",
            ContractKind::Presale => "Presale",
        };
        f.write_str(label)
    }
}

/// Known on-chain addresses, one optional slot per contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContractAddresses {
    pub txspk_token: Option<Address>,
    pub messaging: Option<Address>,
    pub presale: Option<Address>,
}

impl ContractAddresses {
    pub fn get(&self, kind: ContractKind) -> Option<Address> {
        match kind {
            ContractKind::Token => self.txspk_token,
            ContractKind::Messaging => self.messaging,
            ContractKind::Presale => self.presale,
        }
    }

    /// Overwrites only the slots that are set in `update`.
    pub fn merge(&mut self, update: &ContractAddresses) {
        if let Some(address) = update.txspk_token {
            self.txspk_token = Some(address);
        }
        if let Some(address) = update.messaging {
            self.messaging = Some(address);
        }
        if let Some(address) = update.presale {
            self.presale = Some(address);
        }
    }
}

// ==================== TOKEN ====================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenStats {
    pub name: String,
    pub symbol: String,
    #[serde(serialize_with = "serialize_u256")]
    pub total_supply: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBalance {
    pub address: Address,
    #[serde(serialize_with = "serialize_u256")]
    pub balance: U256,
    pub balance_formatted: Decimal,
}

// ==================== PRESALE ====================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresaleStats {
    pub total_eth_raised: Decimal,
    #[serde(serialize_with = "serialize_u256")]
    pub total_tokens_sold: U256,
    #[serde(serialize_with = "serialize_u256")]
    pub participant_count: U256,
    #[serde(serialize_with = "serialize_u256")]
    pub current_phase: U256,
    pub presale_active: bool,
    pub phase: PhaseInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseInfo {
    #[serde(serialize_with = "serialize_u256")]
    pub price: U256,
    pub price_eth: Decimal,
    pub start_time: u64,
    pub end_time: u64,
    #[serde(serialize_with = "serialize_u256")]
    pub max_tokens: U256,
    #[serde(serialize_with = "serialize_u256")]
    pub sold_tokens: U256,
    pub active: bool,
}

// ==================== USER ====================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub address: String,
    pub display_name: String,
    #[serde(serialize_with = "serialize_u256")]
    pub inbox_price: U256,
    #[serde(serialize_with = "serialize_u256")]
    pub balance: U256,
    pub balance_formatted: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserActivity {
    pub address: Address,
    #[serde(serialize_with = "serialize_u256")]
    pub earned: U256,
    #[serde(serialize_with = "serialize_u256")]
    pub spent: U256,
    #[serde(serialize_with = "serialize_u256")]
    pub messages_received: U256,
    #[serde(serialize_with = "serialize_u256")]
    pub messages_sent: U256,
    #[serde(serialize_with = "serialize_u256")]
    pub avg_response_time: U256,
}

// ==================== MESSAGES ====================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboxMessage {
    #[serde(serialize_with = "serialize_u256")]
    pub id: U256,
    pub sender: Address,
    pub recipient: Address,
    pub subject: String,
    pub content: String,
    pub attachment_ref: String,
    #[serde(serialize_with = "serialize_u256")]
    pub amount: U256,
    pub timestamp: u64,
    pub status: u8,
    pub message_type: String,
    pub encrypted: bool,
}

// ==================== API ====================
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_sets_flag() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, "ok");
    }

    #[test]
    fn merge_only_overwrites_supplied_slots() {
        let token = Address::repeat_byte(0x11);
        let messaging = Address::repeat_byte(0x22);
        let mut current = ContractAddresses {
            txspk_token: Some(token),
            ..Default::default()
        };

        current.merge(&ContractAddresses {
            messaging: Some(messaging),
            ..Default::default()
        });

        assert_eq!(current.get(ContractKind::Token), Some(token));
        assert_eq!(current.get(ContractKind::Messaging), Some(messaging));
        assert_eq!(current.get(ContractKind::Presale), None);
    }

    #[test]
    fn token_stats_serialize_supply_as_decimal_string() {
        let stats = TokenStats {
            name: "TXSPEAK".to_string(),
            symbol: "TXSPK".to_string(),
            total_supply: U256::exp10(27),
        };
        let value = serde_json::to_value(&stats).expect("serialize");
        assert_eq!(value["total_supply"], "1000000000000000000000000000");
        assert_eq!(value["symbol"], "TXSPK");
    }
}
