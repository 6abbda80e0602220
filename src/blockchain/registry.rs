use std::time::Duration;

use alloy::{
    primitives::{Address, U256},
    rpc::types::Log,
    sol_types::{SolCall, SolEvent},
};
use tracing::{debug, info, warn};

use super::backend::{HttpBackend, RpcBackend};
use super::transaction::{ContractService, TxOptions};
use crate::abi::IIdentityRegistry;
use crate::config::ContractConfig;
use crate::encoding::{coerce_bytes, normalize_address, ByteInput};
use crate::fallback::{self, Strategy};
use crate::types::{
    normalize_metadata_entries, RegisteredEvent, RegistrationArgs, RegistrationReceipt,
    RegistrationResult, SdkError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentIdStrategy {
    /// Simulate the registration with `eth_call` before sending it
    StaticCall,
}

impl Strategy for AgentIdStrategy {
    fn name(&self) -> &'static str {
        match self {
            AgentIdStrategy::StaticCall => "static_call",
        }
    }
}

const AGENT_ID_STRATEGIES: [AgentIdStrategy; 1] = [AgentIdStrategy::StaticCall];

/// EIP-8004 Identity Registry client
pub struct IdentityRegistryService<B = HttpBackend> {
    service: ContractService<B>,
}

impl IdentityRegistryService<HttpBackend> {
    pub async fn connect(config: &ContractConfig) -> Result<Self, SdkError> {
        Ok(Self::new(ContractService::connect(config).await?))
    }
}

impl<B: RpcBackend> IdentityRegistryService<B> {
    pub fn new(service: ContractService<B>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ContractService<B> {
        &self.service
    }

    pub fn registry_address(&self) -> Address {
        self.service.address()
    }

    /// Register a new agent (mints NFT with empty URI)
    pub async fn register_minimal(&self, options: &TxOptions) -> Result<RegistrationResult, SdkError> {
        info!("Registering new agent (empty URI)");
        self.submit_registration(&IIdentityRegistry::register_0Call {}, options, |ret| ret.agentId)
            .await
    }

    pub async fn register_with_uri(
        &self,
        token_uri: &str,
        options: &TxOptions,
    ) -> Result<RegistrationResult, SdkError> {
        info!("Registering new agent with URI ({} bytes)", token_uri.len());
        let call = IIdentityRegistry::register_1Call {
            tokenUri: token_uri.to_string(),
        };
        self.submit_registration(&call, options, |ret| ret.agentId).await
    }

    /// Register with a URI and initial metadata entries
    pub async fn register_agent(&self, args: &RegistrationArgs) -> Result<RegistrationResult, SdkError> {
        let metadata = normalize_metadata_entries(args.metadata.iter().cloned())?;

        info!(
            "Registering new agent with URI and {} metadata entr{}",
            metadata.len(),
            if metadata.len() == 1 { "y" } else { "ies" }
        );

        let call = IIdentityRegistry::register_2Call {
            tokenUri: args.token_uri.clone(),
            metadata: metadata.into_iter().map(Into::into).collect(),
        };
        self.submit_registration(&call, &args.options, |ret| ret.agentId)
            .await
    }

    async fn submit_registration<C: SolCall>(
        &self,
        call: &C,
        options: &TxOptions,
        agent_id: fn(C::Return) -> U256,
    ) -> Result<RegistrationResult, SdkError> {
        let service = &self.service;
        let predicted = fallback::resolve("agent id", &AGENT_ID_STRATEGIES, |strategy| async move {
            match strategy {
                AgentIdStrategy::StaticCall => service
                    .call_static(call, options.value)
                    .await
                    .map(agent_id),
            }
        })
        .await;

        let agent_id = match predicted {
            Ok(resolved) => Some(resolved.value),
            Err(exhausted) => {
                debug!("Agent id not predicted before submission: {}", exhausted);
                None
            }
        };

        let tx_hash = self.service.send_call(call, options).await?;

        Ok(RegistrationResult { tx_hash, agent_id })
    }

    /// Update the metadata URI for an existing agent
    pub async fn set_agent_uri(
        &self,
        agent_id: U256,
        new_uri: &str,
        options: &TxOptions,
    ) -> Result<String, SdkError> {
        info!("Updating URI for agent {} ({} bytes)", agent_id, new_uri.len());

        let call = IIdentityRegistry::setAgentUriCall {
            agentId: agent_id,
            newUri: new_uri.to_string(),
        };
        self.service.send_call(&call, options).await
    }

    pub async fn set_metadata(
        &self,
        agent_id: U256,
        key: &str,
        value: impl Into<ByteInput>,
        options: &TxOptions,
    ) -> Result<String, SdkError> {
        let value = coerce_bytes(value)?;
        debug!("Setting metadata '{}' for agent {} ({} bytes)", key, agent_id, value.len());

        let call = IIdentityRegistry::setMetadataCall {
            agentId: agent_id,
            key: key.to_string(),
            value: value.into(),
        };
        self.service.send_call(&call, options).await
    }

    /// Approve `to` to manage a single agent token
    pub async fn approve(&self, to: &str, token_id: U256, options: &TxOptions) -> Result<String, SdkError> {
        let to = normalize_address(to)?;
        info!("Approving {} for agent {}", to, token_id);

        let call = IIdentityRegistry::approveCall {
            to,
            tokenId: token_id,
        };
        self.service.send_call(&call, options).await
    }

    pub async fn set_approval_for_all(
        &self,
        operator: &str,
        approved: bool,
        options: &TxOptions,
    ) -> Result<String, SdkError> {
        let operator = normalize_address(operator)?;
        info!("Setting approval for all to {} for operator {}", approved, operator);

        let call = IIdentityRegistry::setApprovalForAllCall { operator, approved };
        self.service.send_call(&call, options).await
    }

    pub async fn get_approved(&self, token_id: U256) -> Result<Address, SdkError> {
        let call = IIdentityRegistry::getApprovedCall { tokenId: token_id };
        let approved = self
            .service
            .call_static(&call, U256::ZERO)
            .await
            .map_err(|e| {
                SdkError::Interaction(format!("Failed to query approval information: {}", e))
            })?;

        Ok(approved._0)
    }

    pub async fn is_approved_for_all(&self, owner: &str, operator: &str) -> Result<bool, SdkError> {
        let call = IIdentityRegistry::isApprovedForAllCall {
            owner: normalize_address(owner)?,
            operator: normalize_address(operator)?,
        };
        let approved = self
            .service
            .call_static(&call, U256::ZERO)
            .await
            .map_err(|e| SdkError::Interaction(format!("Failed to query approval status: {}", e)))?;

        Ok(approved._0)
    }

    /// Get the owner of an agent
    pub async fn owner_of(&self, agent_id: U256) -> Result<Address, SdkError> {
        debug!("Fetching owner for agent {}", agent_id);
        let owner = self
            .service
            .call_static(&IIdentityRegistry::ownerOfCall { tokenId: agent_id }, U256::ZERO)
            .await?;
        Ok(owner._0)
    }

    /// Get the metadata URI for an agent
    pub async fn token_uri(&self, agent_id: U256) -> Result<String, SdkError> {
        debug!("Fetching tokenURI for agent {}", agent_id);
        let uri = self
            .service
            .call_static(&IIdentityRegistry::tokenURICall { tokenId: agent_id }, U256::ZERO)
            .await?;
        Ok(uri._0)
    }

    /// Get metadata value for a key
    pub async fn get_metadata(&self, agent_id: U256, key: &str) -> Result<Vec<u8>, SdkError> {
        debug!("Fetching metadata '{}' for agent {}", key, agent_id);
        let call = IIdentityRegistry::getMetadataCall {
            agentId: agent_id,
            key: key.to_string(),
        };
        let metadata = self.service.call_static(&call, U256::ZERO).await?;
        Ok(metadata._0.to_vec())
    }

    /// Wait for a registration to be mined and decode its `Registered` events
    pub async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        timeout: Duration,
    ) -> Result<RegistrationReceipt, SdkError> {
        let receipt = self.service.wait_for_receipt(tx_hash, timeout).await?;
        let events = decode_registration_logs(self.registry_address(), &receipt.logs);

        let agent_id = events.first().map(|event| event.agent_id);
        match agent_id {
            Some(id) => info!("Agent registered: ID {} (tx: {})", id, tx_hash),
            None if receipt.status => warn!("No Registered event found in {}", tx_hash),
            None => {}
        }

        Ok(RegistrationReceipt {
            tx_hash: tx_hash.to_string(),
            status: receipt.status,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            events,
            agent_id,
        })
    }
}

/// Decode `Registered` events emitted by `registry`; other logs are skipped
pub fn decode_registration_logs(registry: Address, logs: &[Log]) -> Vec<RegisteredEvent> {
    logs.iter()
        .filter(|log| log.address() == registry)
        .filter(|log| log.topic0() == Some(&IIdentityRegistry::Registered::SIGNATURE_HASH))
        .filter_map(|log| {
            match IIdentityRegistry::Registered::decode_log_data(log.data(), true) {
                Ok(event) => Some(RegisteredEvent {
                    agent_id: event.agentId,
                    token_uri: event.tokenURI,
                    owner: event.owner,
                    log_index: log.log_index,
                }),
                Err(e) => {
                    debug!("Skipping undecodable Registered log: {}", e);
                    None
                }
            }
        })
        .collect()
}
