use alloy::primitives::U256;
use tracing::{debug, info};

use super::backend::{HttpBackend, RpcBackend};
use super::transaction::ContractService;
use crate::abi::IReputationRegistry;
use crate::config::ContractConfig;
use crate::encoding::{coerce_bytes, coerce_fixed32, normalize_address};
use crate::types::{FeedbackArgs, ResponseArgs, RevokeFeedbackArgs, SdkError};

/// Reputation Registry client
///
/// Based on EIP-8004 reputation system:
/// - Feedback carries a score, two bytes32 tags and an off-chain URI/hash pair
/// - Each submission needs a feedback authorization signed by the agent owner
/// - Agents may append responses; clients may revoke their own feedback
pub struct ReputationRegistryService<B = HttpBackend> {
    service: ContractService<B>,
}

impl ReputationRegistryService<HttpBackend> {
    pub async fn connect(config: &ContractConfig) -> Result<Self, SdkError> {
        Ok(Self::new(ContractService::connect(config).await?))
    }
}

impl<B: RpcBackend> ReputationRegistryService<B> {
    pub fn new(service: ContractService<B>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ContractService<B> {
        &self.service
    }

    /// Submit feedback for an agent
    ///
    /// `feedback_auth` is passed through to the contract as-is.
    pub async fn give_feedback(&self, args: &FeedbackArgs) -> Result<String, SdkError> {
        let call = IReputationRegistry::giveFeedbackCall {
            agentId: args.agent_id,
            score: args.score,
            tag1: coerce_fixed32(args.tag1.clone())?,
            tag2: coerce_fixed32(args.tag2.clone())?,
            feedbackUri: args.feedback_uri.clone(),
            feedbackHash: coerce_fixed32(args.feedback_hash.clone())?,
            feedbackAuth: coerce_bytes(args.feedback_auth.clone())?.into(),
        };

        info!(
            "Submitting feedback for agent {}: score={}, uri={}",
            args.agent_id, args.score, args.feedback_uri
        );
        debug!("Feedback authorization: {} bytes", call.feedbackAuth.len());

        self.service.send_call(&call, &args.options).await
    }

    pub async fn append_response(&self, args: &ResponseArgs) -> Result<String, SdkError> {
        let call = IReputationRegistry::appendResponseCall {
            agentId: args.agent_id,
            clientAddress: normalize_address(&args.client_address)?,
            feedbackIndex: args.feedback_index,
            responseUri: args.response_uri.clone(),
            responseHash: coerce_fixed32(args.response_hash.clone())?,
        };

        info!(
            "Appending response to feedback {} from {} for agent {}",
            args.feedback_index, call.clientAddress, args.agent_id
        );

        self.service.send_call(&call, &args.options).await
    }

    pub async fn revoke_feedback(&self, args: &RevokeFeedbackArgs) -> Result<String, SdkError> {
        info!(
            "Revoking feedback {} for agent {}",
            args.feedback_index, args.agent_id
        );

        let call = IReputationRegistry::revokeFeedbackCall {
            agentId: args.agent_id,
            feedbackIndex: args.feedback_index,
        };
        self.service.send_call(&call, &args.options).await
    }

    /// Latest feedback index `client_address` has submitted for `agent_id`
    pub async fn get_last_index(&self, agent_id: U256, client_address: &str) -> Result<u64, SdkError> {
        let call = IReputationRegistry::getLastIndexCall {
            agentId: agent_id,
            clientAddress: normalize_address(client_address)?,
        };
        let last = self.service.call_static(&call, U256::ZERO).await?;
        Ok(last._0)
    }
}
