// src/models/mod.rs
pub mod chain;

pub use chain::{
    ApiResponse,
    ContractAddresses,
    ContractKind,
    InboxMessage,
    PhaseInfo,
    PresaleStats,
    TokenBalance,
    TokenStats,
    UserActivity,
    UserProfile,
};
