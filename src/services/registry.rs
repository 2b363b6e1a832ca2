use ethers::types::Address;
use tokio::sync::RwLock;

use crate::{
    config::Config,
    error::{AppError, Result},
    models::{ContractAddresses, ContractKind},
    utils::parse_address,
};

/// Process-wide set of contract addresses. Slots are only ever overwritten.
#[derive(Default)]
pub struct ContractRegistry {
    addresses: RwLock<ContractAddresses>,
}

impl ContractRegistry {
    pub fn new(initial: ContractAddresses) -> Self {
        Self {
            addresses: RwLock::new(initial),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let parse = |value: &Option<String>| value.as_deref().map(parse_address).transpose();
        Ok(Self::new(ContractAddresses {
            txspk_token: parse(&config.txspk_token_address)?,
            messaging: parse(&config.messaging_address)?,
            presale: parse(&config.presale_address)?,
        }))
    }

    pub async fn snapshot(&self) -> ContractAddresses {
        self.addresses.read().await.clone()
    }

    pub async fn require(&self, kind: ContractKind) -> Result<Address> {
        self.addresses
            .read()
            .await
            .get(kind)
            .ok_or(AppError::ContractNotConfigured(kind))
    }

    pub async fn is_configured(&self, kind: ContractKind) -> bool {
        self.addresses.read().await.get(kind).is_some()
    }

    pub async fn update(&self, update: &ContractAddresses) -> ContractAddresses {
        let mut addresses = self.addresses.write().await;
        addresses.merge(update);
        addresses.clone()
    }
}
