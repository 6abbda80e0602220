//! Client SDK for the ERC-8004 identity and reputation registries
//!
//! - [`auth`] builds the signed 289-byte feedback authorization
//! - [`blockchain`] submits registry transactions and decodes receipts
//! - [`ipfs`] uploads agent profiles and documents
//! - [`client::Erc8004Client`] ties them together

pub mod abi;
pub mod auth;
pub mod blockchain;
pub mod client;
pub mod config;
pub mod encoding;
pub mod fallback;
pub mod ipfs;
pub mod types;
pub mod wallet;

pub use auth::{AuthorizationPayload, AuthorizationSigner, FeedbackAuthRequest, FeedbackAuthorization};
pub use blockchain::{IdentityRegistryService, ReputationRegistryService, TxOptions};
pub use client::Erc8004Client;
pub use config::{ClientConfig, ContractConfig, StorageConfig};
pub use encoding::{coerce_bytes, coerce_fixed32, normalize_address, ByteInput};
pub use ipfs::IpfsStorage;
pub use types::SdkError;
