//! Contract interface descriptors and tuple decoding for the TXSPEAK
//! token, messaging and presale contracts.

use ethers::abi::{Abi, Function, Token};
use ethers::types::{Address, U256};
use std::sync::OnceLock;

use crate::{
    error::{AppError, Result},
    models::ContractKind,
};

const TXSPK_TOKEN_ABI: &str = r#"[
    {"inputs":[],"name":"name","outputs":[{"internalType":"string","name":"","type":"string"}],"stateMutability":"view","type":"function"},
    {"inputs":[],"name":"symbol","outputs":[{"internalType":"string","name":"","type":"string"}],"stateMutability":"view","type":"function"},
    {"inputs":[],"name":"totalSupply","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"view","type":"function"},
    {"inputs":[{"internalType":"address","name":"account","type":"address"}],"name":"balanceOf","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"view","type":"function"},
    {"inputs":[{"internalType":"address","name":"user","type":"address"}],"name":"getUserProfile","outputs":[{"internalType":"string","name":"","type":"string"}],"stateMutability":"view","type":"function"},
    {"inputs":[{"internalType":"address","name":"user","type":"address"}],"name":"getUserInboxPrice","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"view","type":"function"}
]"#;

const MESSAGING_ABI: &str = r#"[
    {"inputs":[{"internalType":"uint256","name":"messageId","type":"uint256"}],"name":"getMessage","outputs":[
        {"internalType":"address","name":"sender","type":"address"},
        {"internalType":"address","name":"recipient","type":"address"},
        {"internalType":"string","name":"subject","type":"string"},
        {"internalType":"string","name":"content","type":"string"},
        {"internalType":"string","name":"ipfsHash","type":"string"},
        {"internalType":"uint256","name":"amount","type":"uint256"},
        {"internalType":"uint256","name":"timestamp","type":"uint256"},
        {"internalType":"uint8","name":"status","type":"uint8"},
        {"internalType":"string","name":"messageType","type":"string"},
        {"internalType":"bool","name":"encrypted","type":"bool"}
    ],"stateMutability":"view","type":"function"},
    {"inputs":[{"internalType":"address","name":"user","type":"address"}],"name":"getUserInbox","outputs":[{"internalType":"uint256[]","name":"","type":"uint256[]"}],"stateMutability":"view","type":"function"},
    {"inputs":[{"internalType":"address","name":"user","type":"address"}],"name":"getLeaderboardData","outputs":[
        {"internalType":"uint256","name":"earned","type":"uint256"},
        {"internalType":"uint256","name":"spent","type":"uint256"},
        {"internalType":"uint256","name":"messagesReceived","type":"uint256"},
        {"internalType":"uint256","name":"messagesSent","type":"uint256"},
        {"internalType":"uint256","name":"avgResponseTime","type":"uint256"}
    ],"stateMutability":"view","type":"function"}
]"#;

const PRESALE_ABI: &str = r#"[
    {"inputs":[],"name":"getPresaleStats","outputs":[
        {"internalType":"uint256","name":"_totalEthRaised","type":"uint256"},
        {"internalType":"uint256","name":"_totalTokensSold","type":"uint256"},
        {"internalType":"uint256","name":"_participantCount","type":"uint256"},
        {"internalType":"uint256","name":"_currentPhase","type":"uint256"},
        {"internalType":"bool","name":"_presaleActive","type":"bool"}
    ],"stateMutability":"view","type":"function"},
    {"inputs":[],"name":"getCurrentPhaseInfo","outputs":[
        {"internalType":"uint256","name":"price","type":"uint256"},
        {"internalType":"uint256","name":"startTime","type":"uint256"},
        {"internalType":"uint256","name":"endTime","type":"uint256"},
        {"internalType":"uint256","name":"maxTokens","type":"uint256"},
        {"internalType":"uint256","name":"soldTokens","type":"uint256"},
        {"internalType":"bool","name":"active","type":"bool"}
    ],"stateMutability":"view","type":"function"}
]"#;

type ParsedAbi = std::result::Result<Abi, String>;

static TOKEN_INTERFACE: OnceLock<ParsedAbi> = OnceLock::new();
static MESSAGING_INTERFACE: OnceLock<ParsedAbi> = OnceLock::new();
static PRESALE_INTERFACE: OnceLock<ParsedAbi> = OnceLock::new();

fn parse_abi(raw: &str) -> ParsedAbi {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

pub fn interface(kind: ContractKind) -> Result<&'static Abi> {
    let parsed = match kind {
        ContractKind::Token => TOKEN_INTERFACE.get_or_init(|| parse_abi(TXSPK_TOKEN_ABI)),
        ContractKind::Messaging => MESSAGING_INTERFACE.get_or_init(|| parse_abi(MESSAGING_ABI)),
        ContractKind::Presale => PRESALE_INTERFACE.get_or_init(|| parse_abi(PRESALE_ABI)),
    };
    parsed
        .as_ref()
        .map_err(|e| AppError::Internal(format!("{} interface is malformed: {}", kind, e)))
}

pub fn function(kind: ContractKind, name: &str) -> Result<&'static Function> {
    interface(kind)?.function(name).map_err(|e| {
        AppError::Internal(format!("{} interface has no function {}: {}", kind, name, e))
    })
}

/// Sequential reader over the tokens returned by a view function.
pub struct TupleReader {
    function: String,
    tokens: std::vec::IntoIter<Token>,
}

impl TupleReader {
    pub fn new(function: &str, tokens: Vec<Token>) -> Self {
        Self {
            function: function.to_string(),
            tokens: tokens.into_iter(),
        }
    }

    fn next(&mut self, field: &str) -> Result<Token> {
        self.tokens.next().ok_or_else(|| {
            AppError::RemoteCallFailed(format!(
                "{} returned too few values (missing {})",
                self.function, field
            ))
        })
    }

    fn mismatch(&self, field: &str, expected: &str, got: &Token) -> AppError {
        AppError::RemoteCallFailed(format!(
            "{} returned {:?} for {}, expected {}",
            self.function, got, field, expected
        ))
    }

    pub fn uint(&mut self, field: &str) -> Result<U256> {
        match self.next(field)? {
            Token::Uint(value) | Token::Int(value) => Ok(value),
            other => Err(self.mismatch(field, "uint", &other)),
        }
    }

    pub fn u64(&mut self, field: &str) -> Result<u64> {
        let value = self.uint(field)?;
        if value > U256::from(u64::MAX) {
            return Err(AppError::RemoteCallFailed(format!(
                "{} returned out-of-range {} ({})",
                self.function, field, value
            )));
        }
        Ok(value.as_u64())
    }

    pub fn u8(&mut self, field: &str) -> Result<u8> {
        let value = self.uint(field)?;
        if value > U256::from(u8::MAX) {
            return Err(AppError::RemoteCallFailed(format!(
                "{} returned out-of-range {} ({})",
                self.function, field, value
            )));
        }
        Ok(value.low_u32() as u8)
    }

    pub fn string(&mut self, field: &str) -> Result<String> {
        match self.next(field)? {
            Token::String(value) => Ok(value),
            other => Err(self.mismatch(field, "string", &other)),
        }
    }

    pub fn address(&mut self, field: &str) -> Result<Address> {
        match self.next(field)? {
            Token::Address(value) => Ok(value),
            other => Err(self.mismatch(field, "address", &other)),
        }
    }

    pub fn bool(&mut self, field: &str) -> Result<bool> {
        match self.next(field)? {
            Token::Bool(value) => Ok(value),
            other => Err(self.mismatch(field, "bool", &other)),
        }
    }

    pub fn uint_array(&mut self, field: &str) -> Result<Vec<U256>> {
        match self.next(field)? {
            Token::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Token::Uint(value) => values.push(value),
                        other => return Err(self.mismatch(field, "uint[]", &other)),
                    }
                }
                Ok(values)
            }
            other => Err(self.mismatch(field, "uint[]", &other)),
        }
    }
}
