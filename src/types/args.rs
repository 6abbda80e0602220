use alloy::primitives::{Address, U256};

use crate::blockchain::TxOptions;
use crate::encoding::ByteInput;
use crate::types::{InputShape, MetadataEntry};

/// Arguments for `register(string, MetadataEntry[])`
#[derive(Debug, Clone, Default)]
pub struct RegistrationArgs {
    pub token_uri: String,
    pub metadata: Vec<InputShape<MetadataEntry>>,
    pub options: TxOptions,
}

impl RegistrationArgs {
    pub fn new(token_uri: impl Into<String>) -> Self {
        Self {
            token_uri: token_uri.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, entry: impl Into<InputShape<MetadataEntry>>) -> Self {
        self.metadata.push(entry.into());
        self
    }

    pub fn with_options(mut self, options: TxOptions) -> Self {
        self.options = options;
        self
    }
}

/// Returned as soon as a registration is submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResult {
    pub tx_hash: String,
    /// Id predicted by simulating the call; `None` if the simulation failed
    pub agent_id: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredEvent {
    pub agent_id: U256,
    pub token_uri: String,
    pub owner: Address,
    pub log_index: Option<u64>,
}

/// Mined registration transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReceipt {
    pub tx_hash: String,
    pub status: bool,
    pub block_number: Option<u64>,
    pub gas_used: u128,
    pub events: Vec<RegisteredEvent>,
    /// Agent id from the first `Registered` event
    pub agent_id: Option<U256>,
}

#[derive(Debug, Clone)]
pub struct FeedbackArgs {
    pub agent_id: U256,
    pub score: u8,
    pub tag1: ByteInput,
    pub tag2: ByteInput,
    pub feedback_uri: String,
    pub feedback_hash: ByteInput,
    /// 289-byte signed authorization
    pub feedback_auth: ByteInput,
    pub options: TxOptions,
}

#[derive(Debug, Clone)]
pub struct ResponseArgs {
    pub agent_id: U256,
    pub client_address: String,
    pub feedback_index: u64,
    pub response_uri: String,
    pub response_hash: ByteInput,
    pub options: TxOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RevokeFeedbackArgs {
    pub agent_id: U256,
    pub feedback_index: u64,
    pub options: TxOptions,
}
