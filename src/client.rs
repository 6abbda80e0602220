//! High-level client combining both registries, IPFS storage and the
//! feedback authorization signer

use std::path::Path;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use serde::Serialize;
use tracing::{debug, info};

use crate::auth::{AuthorizationPayload, AuthorizationSigner, FeedbackAuthRequest};
use crate::blockchain::{
    ContractService, HttpBackend, IdentityRegistryService, ReceiptSummary,
    ReputationRegistryService, RpcBackend, TxOptions,
};
use crate::config::{ClientConfig, StorageConfig};
use crate::encoding::ByteInput;
use crate::ipfs::IpfsStorage;
use crate::types::{
    AgentProfile, FeedbackArgs, RegistrationArgs, RegistrationReceipt, RegistrationResult,
    ResponseArgs, RevokeFeedbackArgs, SdkError,
};

/// Receipt wait used by the workflow binary
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

pub struct Erc8004Client<B = HttpBackend> {
    identity: IdentityRegistryService<B>,
    reputation: ReputationRegistryService<B>,
    storage: Option<IpfsStorage>,
    auth_signer: Option<AuthorizationSigner>,
}

fn require_addresses(config: &ClientConfig) -> Result<(), SdkError> {
    if config.identity_registry.trim().is_empty() {
        return Err(SdkError::Interaction(
            "identity_registry must be provided.".to_string(),
        ));
    }
    if config.reputation_registry.trim().is_empty() {
        return Err(SdkError::Interaction(
            "reputation_registry must be provided.".to_string(),
        ));
    }
    Ok(())
}

impl Erc8004Client<HttpBackend> {
    /// Connect both registries over HTTP JSON-RPC
    pub async fn connect(config: &ClientConfig) -> Result<Self, SdkError> {
        require_addresses(config)?;
        let identity = IdentityRegistryService::connect(&config.identity_contract()).await?;
        let reputation = ReputationRegistryService::connect(&config.reputation_contract()).await?;
        Self::from_services(identity, reputation, config)
    }
}

impl<B: RpcBackend + Clone> Erc8004Client<B> {
    /// Build a client over a caller-supplied backend shared by both registries
    pub async fn with_backend(backend: B, config: &ClientConfig) -> Result<Self, SdkError> {
        require_addresses(config)?;
        let identity = ContractService::with_backend(backend.clone(), &config.identity_contract()).await?;
        let reputation = ContractService::with_backend(backend, &config.reputation_contract()).await?;
        Self::from_services(
            IdentityRegistryService::new(identity),
            ReputationRegistryService::new(reputation),
            config,
        )
    }
}

impl<B: RpcBackend> Erc8004Client<B> {
    fn from_services(
        identity: IdentityRegistryService<B>,
        reputation: ReputationRegistryService<B>,
        config: &ClientConfig,
    ) -> Result<Self, SdkError> {
        let auth_signer = config
            .effective_auth_key()
            .map(AuthorizationSigner::new)
            .transpose()?;

        let storage = config.storage.as_ref().map(IpfsStorage::new);

        info!(
            "ERC-8004 client ready (identity: {}, reputation: {}, account: {}, storage: {}, auth signer: {})",
            identity.registry_address(),
            reputation.service().address(),
            identity.service().account(),
            storage.as_ref().map(|s| s.api_url()).unwrap_or("none"),
            auth_signer
                .as_ref()
                .map(|s| s.address().to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(Self {
            identity,
            reputation,
            storage,
            auth_signer,
        })
    }

    pub fn identity(&self) -> &IdentityRegistryService<B> {
        &self.identity
    }

    pub fn reputation(&self) -> &ReputationRegistryService<B> {
        &self.reputation
    }

    pub fn identity_registry_address(&self) -> Address {
        self.identity.registry_address()
    }

    /// Account transactions are sent from
    pub fn account(&self) -> Address {
        self.identity.service().account()
    }

    pub fn chain_id(&self) -> u64 {
        self.identity.service().chain_id()
    }

    pub fn storage(&self) -> Option<&IpfsStorage> {
        self.storage.as_ref()
    }

    pub fn auth_signer(&self) -> Option<&AuthorizationSigner> {
        self.auth_signer.as_ref()
    }

    /// Configure or replace the IPFS storage helper
    pub fn set_storage(&mut self, config: &StorageConfig) -> &IpfsStorage {
        debug!("IPFS storage set to {}", config.api_url);
        self.storage.insert(IpfsStorage::new(config))
    }

    /// Configure or replace the feedback authorization signer
    pub fn set_auth_signer(&mut self, signer: AuthorizationSigner) -> &AuthorizationSigner {
        debug!("Feedback auth signer set to {}", signer.address());
        self.auth_signer.insert(signer)
    }

    fn require_storage(&self) -> Result<&IpfsStorage, SdkError> {
        self.storage.as_ref().ok_or_else(|| {
            SdkError::Storage(
                "IPFS storage is not configured. Provide a storage configuration.".to_string(),
            )
        })
    }

    fn require_auth_signer(&self) -> Result<&AuthorizationSigner, SdkError> {
        self.auth_signer.as_ref().ok_or_else(|| {
            SdkError::Signing(
                "Feedback auth signer is not configured. Provide a signer or a private key."
                    .to_string(),
            )
        })
    }

    // Storage helpers

    pub async fn store_agent_profile(&self, profile: &AgentProfile, pin: bool) -> Result<String, SdkError> {
        self.require_storage()?.store_agent_profile(profile, pin).await
    }

    pub async fn store_json<T: Serialize + ?Sized>(&self, data: &T, pin: bool) -> Result<String, SdkError> {
        self.require_storage()?.store_json(data, pin).await
    }

    pub async fn store_file(&self, file_path: impl AsRef<Path>, pin: bool) -> Result<String, SdkError> {
        self.require_storage()?.store_file(file_path, pin).await
    }

    pub async fn store_bytes(&self, content: Vec<u8>, pin: bool) -> Result<String, SdkError> {
        self.require_storage()?.store_bytes(content, pin).await
    }

    // Feedback authorization

    pub fn build_feedback_auth(&self, request: &FeedbackAuthRequest) -> Result<AuthorizationPayload, SdkError> {
        self.require_auth_signer()?.build(request)
    }

    // Identity registry

    pub async fn register_minimal(&self, options: &TxOptions) -> Result<RegistrationResult, SdkError> {
        self.identity.register_minimal(options).await
    }

    pub async fn register_with_uri(
        &self,
        token_uri: &str,
        options: &TxOptions,
    ) -> Result<RegistrationResult, SdkError> {
        self.identity.register_with_uri(token_uri, options).await
    }

    pub async fn register_agent(&self, args: &RegistrationArgs) -> Result<RegistrationResult, SdkError> {
        self.identity.register_agent(args).await
    }

    pub async fn set_agent_uri(
        &self,
        agent_id: U256,
        new_uri: &str,
        options: &TxOptions,
    ) -> Result<String, SdkError> {
        self.identity.set_agent_uri(agent_id, new_uri, options).await
    }

    pub async fn set_metadata(
        &self,
        agent_id: U256,
        key: &str,
        value: impl Into<ByteInput>,
        options: &TxOptions,
    ) -> Result<String, SdkError> {
        self.identity.set_metadata(agent_id, key, value, options).await
    }

    pub async fn approve(&self, to: &str, token_id: U256, options: &TxOptions) -> Result<String, SdkError> {
        self.identity.approve(to, token_id, options).await
    }

    pub async fn set_approval_for_all(
        &self,
        operator: &str,
        approved: bool,
        options: &TxOptions,
    ) -> Result<String, SdkError> {
        self.identity
            .set_approval_for_all(operator, approved, options)
            .await
    }

    pub async fn get_approved(&self, token_id: U256) -> Result<Address, SdkError> {
        self.identity.get_approved(token_id).await
    }

    pub async fn is_approved_for_all(&self, owner: &str, operator: &str) -> Result<bool, SdkError> {
        self.identity.is_approved_for_all(owner, operator).await
    }

    pub async fn owner_of(&self, agent_id: U256) -> Result<Address, SdkError> {
        self.identity.owner_of(agent_id).await
    }

    pub async fn token_uri(&self, agent_id: U256) -> Result<String, SdkError> {
        self.identity.token_uri(agent_id).await
    }

    pub async fn get_metadata(&self, agent_id: U256, key: &str) -> Result<Vec<u8>, SdkError> {
        self.identity.get_metadata(agent_id, key).await
    }

    pub async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        timeout: Duration,
    ) -> Result<RegistrationReceipt, SdkError> {
        self.identity.wait_for_receipt(tx_hash, timeout).await
    }

    /// Wait for any transaction sent by this client
    pub async fn wait_for_transaction(
        &self,
        tx_hash: &str,
        timeout: Duration,
    ) -> Result<ReceiptSummary, SdkError> {
        self.identity.service().wait_for_receipt(tx_hash, timeout).await
    }

    // Reputation registry

    pub async fn give_feedback(&self, args: &FeedbackArgs) -> Result<String, SdkError> {
        self.reputation.give_feedback(args).await
    }

    pub async fn append_response(&self, args: &ResponseArgs) -> Result<String, SdkError> {
        self.reputation.append_response(args).await
    }

    pub async fn revoke_feedback(&self, args: &RevokeFeedbackArgs) -> Result<String, SdkError> {
        self.reputation.revoke_feedback(args).await
    }

    pub async fn get_last_index(&self, agent_id: U256, client_address: &str) -> Result<u64, SdkError> {
        self.reputation.get_last_index(agent_id, client_address).await
    }
}
