use async_trait::async_trait;
use ethers::abi::{Function, Token};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{transaction::eip2718::TypedTransaction, Address, TransactionRequest};

use crate::{
    config::Config,
    error::{AppError, Result},
};

/// Read-only view of a JSON-RPC chain node.
#[async_trait]
pub trait ChainNode: Send + Sync {
    async fn block_number(&self) -> Result<u64>;

    /// Invokes a view function on `contract` and returns its decoded outputs.
    async fn call_view(
        &self,
        contract: Address,
        function: &Function,
        args: &[Token],
    ) -> Result<Vec<Token>>;
}

pub struct EthNode {
    provider: Provider<Http>,
}

impl EthNode {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| AppError::Internal(format!("Invalid RPC URL: {}", e)))?;
        Ok(Self { provider })
    }
}

#[async_trait]
impl ChainNode for EthNode {
    async fn block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .map(|number| number.as_u64())
            .map_err(|e| AppError::RemoteCallFailed(e.to_string()))
    }

    async fn call_view(
        &self,
        contract: Address,
        function: &Function,
        args: &[Token],
    ) -> Result<Vec<Token>> {
        let data = function.encode_input(args).map_err(|e| {
            AppError::Internal(format!("Failed to encode {} call: {}", function.name, e))
        })?;
        let tx: TypedTransaction = TransactionRequest::new().to(contract).data(data).into();

        let raw = self
            .provider
            .call(&tx, None)
            .await
            .map_err(|e| AppError::RemoteCallFailed(format!("{}: {}", function.name, e)))?;

        function.decode_output(raw.as_ref()).map_err(|e| {
            AppError::RemoteCallFailed(format!(
                "{} returned undecodable output: {}",
                function.name, e
            ))
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_rpc(rpc_url: &str) -> Config {
        Config::from_lookup(|key| match key {
            "ETH_RPC_URL" => Some(rpc_url.to_string()),
            "JWT_SECRET" => Some("a-sufficiently-long-secret".to_string()),
            _ => None,
        })
        .expect("config")
    }

    #[test]
    fn eth_node_accepts_http_url() {
        assert!(EthNode::from_config(&config_with_rpc("http://localhost:8545")).is_ok());
    }

    #[test]
    fn eth_node_rejects_malformed_url() {
        assert!(matches!(
            EthNode::from_config(&config_with_rpc("not a url")),
            Err(AppError::Internal(_))
        ));
    }
}
