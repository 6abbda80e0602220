use anyhow::{Context, Result};
use std::env;
use std::fmt;

use crate::wallet::{private_key_from_env, KeyMode};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_IPFS_API_URL: &str = "http://127.0.0.1:5001";

/// Content store connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// IPFS HTTP API of the local (primary) node
    pub api_url: String,
    /// Pinning service base URL, e.g. `https://api.pinata.cloud`
    pub gateway_url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(DEFAULT_IPFS_API_URL)
    }
}

impl StorageConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            gateway_url: None,
            api_key: None,
            api_secret: None,
        }
    }

    pub fn with_pinning_service(
        mut self,
        gateway_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: Option<String>,
    ) -> Self {
        self.gateway_url = Some(gateway_url.into());
        self.api_key = Some(api_key.into());
        self.api_secret = api_secret;
        self
    }

    /// The pinning service is only tried with both a gateway and an API key
    pub fn pinning_enabled(&self) -> bool {
        matches!(
            (self.gateway_url.as_deref(), self.api_key.as_deref()),
            (Some(gateway), Some(key)) if !gateway.is_empty() && !key.is_empty()
        )
    }
}

/// Connection settings for one deployed contract
#[derive(Clone)]
pub struct ContractConfig {
    pub rpc_url: String,
    pub contract_address: String,
    pub default_account: Option<String>,
    pub private_key: Option<String>,
    pub enable_poa: bool,
}

impl fmt::Debug for ContractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractConfig")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("default_account", &self.default_account)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("enable_poa", &self.enable_poa)
            .finish()
    }
}

/// SDK client configuration
///
/// Everything is passed explicitly; [`ClientConfig::from_env`] is a convenience
/// for binaries.
#[derive(Clone)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub identity_registry: String,
    pub reputation_registry: String,
    pub default_account: Option<String>,
    /// Signs transactions locally when set
    pub private_key: Option<String>,
    /// Key for feedback authorizations; falls back to `private_key`
    pub auth_private_key: Option<String>,
    pub enable_poa: bool,
    pub storage: Option<StorageConfig>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("rpc_url", &self.rpc_url)
            .field("identity_registry", &self.identity_registry)
            .field("reputation_registry", &self.reputation_registry)
            .field("default_account", &self.default_account)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field(
                "auth_private_key",
                &self.auth_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("enable_poa", &self.enable_poa)
            .field("storage", &self.storage)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(
        rpc_url: impl Into<String>,
        identity_registry: impl Into<String>,
        reputation_registry: impl Into<String>,
    ) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            identity_registry: identity_registry.into(),
            reputation_registry: reputation_registry.into(),
            default_account: None,
            private_key: None,
            auth_private_key: None,
            enable_poa: false,
            storage: None,
        }
    }

    pub fn with_default_account(mut self, account: impl Into<String>) -> Self {
        self.default_account = Some(account.into());
        self
    }

    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    pub fn with_auth_private_key(mut self, key: impl Into<String>) -> Self {
        self.auth_private_key = Some(key.into());
        self
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_poa(mut self, enable_poa: bool) -> Self {
        self.enable_poa = enable_poa;
        self
    }

    fn contract(&self, contract_address: &str) -> ContractConfig {
        ContractConfig {
            rpc_url: self.rpc_url.clone(),
            contract_address: contract_address.to_string(),
            default_account: self.default_account.clone(),
            private_key: self.private_key.clone(),
            enable_poa: self.enable_poa,
        }
    }

    pub fn identity_contract(&self) -> ContractConfig {
        self.contract(&self.identity_registry)
    }

    pub fn reputation_contract(&self) -> ContractConfig {
        self.contract(&self.reputation_registry)
    }

    /// Key used for feedback authorizations, if any
    pub fn effective_auth_key(&self) -> Option<&str> {
        self.auth_private_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.private_key.as_deref().filter(|k| !k.trim().is_empty()))
    }

    pub fn from_env() -> Result<Self> {
        let identity_registry = env::var("IDENTITY_REGISTRY_ADDRESS")
            .context("IDENTITY_REGISTRY_ADDRESS env var is required")?;
        let reputation_registry = env::var("REPUTATION_REGISTRY_ADDRESS")
            .context("REPUTATION_REGISTRY_ADDRESS env var is required")?;

        let storage = match env::var("IPFS_API_URL").ok() {
            Some(api_url) => Some(StorageConfig {
                api_url,
                gateway_url: env::var("IPFS_GATEWAY_URL").ok(),
                api_key: env::var("IPFS_API_KEY").ok(),
                api_secret: env::var("IPFS_API_SECRET").ok(),
            }),
            // A pinning service alone still gets the default local node as fallback
            None if env::var("IPFS_GATEWAY_URL").is_ok() => Some(StorageConfig {
                gateway_url: env::var("IPFS_GATEWAY_URL").ok(),
                api_key: env::var("IPFS_API_KEY").ok(),
                api_secret: env::var("IPFS_API_SECRET").ok(),
                ..StorageConfig::default()
            }),
            None => None,
        };

        Ok(Self {
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            identity_registry,
            reputation_registry,
            default_account: env::var("DEFAULT_ACCOUNT").ok(),
            private_key: private_key_from_env()?,
            auth_private_key: env::var("AUTH_PRIVATE_KEY").ok(),
            enable_poa: parse_flag(env::var("ENABLE_POA").ok().as_deref()),
            storage,
        })
    }

    /// Key mode the environment selected
    pub fn key_mode() -> KeyMode {
        KeyMode::from_env()
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
