pub mod backend;
#[cfg(test)]
pub(crate) mod mock;
pub mod registry;
pub mod reputation;
pub mod transaction;

pub use backend::{HttpBackend, ReceiptSummary, RpcBackend};
pub use registry::{decode_registration_logs, AgentIdStrategy, IdentityRegistryService};
pub use reputation::ReputationRegistryService;
pub use transaction::{
    fees_from_history, ContractService, FeeParams, FeeStrategy, GasStrategy, TxOptions,
    DEFAULT_GAS_LIMIT,
};
