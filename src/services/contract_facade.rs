use ethers::abi::Token;
use ethers::types::{Address, U256};
use futures_util::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    constants::TOKEN_DECIMALS,
    error::{AppError, Result},
    models::{
        ContractKind, InboxMessage, PhaseInfo, PresaleStats, TokenBalance, TokenStats,
        UserActivity, UserProfile,
    },
    utils::{parse_address, short_address, to_display_units},
};

use super::{
    abi::{self, TupleReader},
    onchain::ChainNode,
    registry::ContractRegistry,
};

/// Typed read operations over the TXSPEAK contracts.
///
/// Every call resolves the contract address from the registry at call time
/// and is bounded by `call_timeout`. No retries are attempted.
pub struct ContractFacade {
    node: Arc<dyn ChainNode>,
    registry: Arc<ContractRegistry>,
    call_timeout: Duration,
}

impl ContractFacade {
    pub fn new(
        node: Arc<dyn ChainNode>,
        registry: Arc<ContractRegistry>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            node,
            registry,
            call_timeout,
        }
    }

    async fn with_timeout<T, F>(&self, label: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::RemoteCallFailed(format!(
                "{} timed out after {}s",
                label,
                self.call_timeout.as_secs_f64()
            ))),
        }
    }

    async fn call(
        &self,
        kind: ContractKind,
        contract: Address,
        name: &str,
        args: Vec<Token>,
    ) -> Result<TupleReader> {
        let function = abi::function(kind, name)?;
        let label = format!("{}.{}", kind.key(), name);
        let tokens = self
            .with_timeout(&label, self.node.call_view(contract, function, &args))
            .await?;
        Ok(TupleReader::new(name, tokens))
    }

    pub async fn block_number(&self) -> Result<u64> {
        self.with_timeout("eth_blockNumber", self.node.block_number())
            .await
    }

    pub async fn token_stats(&self) -> Result<TokenStats> {
        let token = self.registry.require(ContractKind::Token).await?;

        let (mut name, mut symbol, mut supply) = tokio::try_join!(
            self.call(ContractKind::Token, token, "name", vec![]),
            self.call(ContractKind::Token, token, "symbol", vec![]),
            self.call(ContractKind::Token, token, "totalSupply", vec![]),
        )?;

        Ok(TokenStats {
            name: name.string("name")?,
            symbol: symbol.string("symbol")?,
            total_supply: supply.uint("totalSupply")?,
        })
    }

    pub async fn balance_of(&self, address: &str) -> Result<TokenBalance> {
        let token = self.registry.require(ContractKind::Token).await?;
        let account = parse_address(address)?;

        let balance = self.raw_balance(token, account).await?;
        Ok(TokenBalance {
            address: account,
            balance,
            balance_formatted: to_display_units(balance, TOKEN_DECIMALS)?,
        })
    }

    async fn raw_balance(&self, token: Address, account: Address) -> Result<U256> {
        self.call(
            ContractKind::Token,
            token,
            "balanceOf",
            vec![Token::Address(account)],
        )
        .await?
        .uint("balance")
    }

    pub async fn user_profile(&self, address: &str) -> Result<UserProfile> {
        let token = self.registry.require(ContractKind::Token).await?;
        let account = parse_address(address)?;
        let user = vec![Token::Address(account)];

        let (mut profile, mut price, balance) = tokio::try_join!(
            self.call(ContractKind::Token, token, "getUserProfile", user.clone()),
            self.call(ContractKind::Token, token, "getUserInboxPrice", user),
            self.raw_balance(token, account),
        )?;

        let address = address.trim().to_string();
        let profile = profile.string("profile")?;
        let display_name = if profile.is_empty() {
            short_address(&address)
        } else {
            profile
        };

        Ok(UserProfile {
            display_name,
            inbox_price: price.uint("inboxPrice")?,
            balance,
            balance_formatted: to_display_units(balance, TOKEN_DECIMALS)?,
            address,
        })
    }

    pub async fn presale_stats(&self) -> Result<PresaleStats> {
        let presale = self.registry.require(ContractKind::Presale).await?;

        let (mut stats, mut phase) = tokio::try_join!(
            self.call(ContractKind::Presale, presale, "getPresaleStats", vec![]),
            self.call(ContractKind::Presale, presale, "getCurrentPhaseInfo", vec![]),
        )?;

        let raised = stats.uint("totalEthRaised")?;
        let total_tokens_sold = stats.uint("totalTokensSold")?;
        let participant_count = stats.uint("participantCount")?;
        let current_phase = stats.uint("currentPhase")?;
        let presale_active = stats.bool("presaleActive")?;

        let price = phase.uint("price")?;
        let phase = PhaseInfo {
            price,
            price_eth: to_display_units(price, TOKEN_DECIMALS)?,
            start_time: phase.u64("startTime")?,
            end_time: phase.u64("endTime")?,
            max_tokens: phase.uint("maxTokens")?,
            sold_tokens: phase.uint("soldTokens")?,
            active: phase.bool("active")?,
        };

        Ok(PresaleStats {
            total_eth_raised: to_display_units(raised, TOKEN_DECIMALS)?,
            total_tokens_sold,
            participant_count,
            current_phase,
            presale_active,
            phase,
        })
    }

    /// Fetches the most recent `limit` messages of an inbox.
    ///
    /// Unlike the other reads this degrades: a message that cannot be
    /// fetched or decoded is logged and left out of the result.
    pub async fn inbox(&self, address: &str, limit: usize) -> Result<Vec<InboxMessage>> {
        let messaging = self.registry.require(ContractKind::Messaging).await?;
        let account = parse_address(address)?;

        let ids = self
            .call(
                ContractKind::Messaging,
                messaging,
                "getUserInbox",
                vec![Token::Address(account)],
            )
            .await?
            .uint_array("messageIds")?;

        let recent = &ids[ids.len().saturating_sub(limit)..];
        let fetched = join_all(
            recent
                .iter()
                .map(|id| self.message(messaging, *id)),
        )
        .await;

        let mut messages = Vec::with_capacity(fetched.len());
        for (id, result) in recent.iter().zip(fetched) {
            match result {
                Ok(message) => messages.push(message),
                Err(e) => tracing::warn!("Skipping message {} for {:?}: {}", id, account, e),
            }
        }
        Ok(messages)
    }

    async fn message(&self, messaging: Address, id: U256) -> Result<InboxMessage> {
        let mut fields = self
            .call(
                ContractKind::Messaging,
                messaging,
                "getMessage",
                vec![Token::Uint(id)],
            )
            .await?;

        Ok(InboxMessage {
            id,
            sender: fields.address("sender")?,
            recipient: fields.address("recipient")?,
            subject: fields.string("subject")?,
            content: fields.string("content")?,
            attachment_ref: fields.string("ipfsHash")?,
            amount: fields.uint("amount")?,
            timestamp: fields.u64("timestamp")?,
            status: fields.u8("status")?,
            message_type: fields.string("messageType")?,
            encrypted: fields.bool("encrypted")?,
        })
    }

    pub async fn user_activity(&self, address: &str) -> Result<UserActivity> {
        let messaging = self.registry.require(ContractKind::Messaging).await?;
        let account = parse_address(address)?;

        let mut fields = self
            .call(
                ContractKind::Messaging,
                messaging,
                "getLeaderboardData",
                vec![Token::Address(account)],
            )
            .await?;

        Ok(UserActivity {
            address: account,
            earned: fields.uint("earned")?,
            spent: fields.uint("spent")?,
            messages_received: fields.uint("messagesReceived")?,
            messages_sent: fields.uint("messagesSent")?,
            avg_response_time: fields.uint("avgResponseTime")?,
        })
    }
}
