//! In-memory [`RpcBackend`] for service tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::{
    primitives::{keccak256, Address, Bytes, LogData, B256},
    rpc::types::{FeeHistory, Log, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::{TransportErrorKind, TransportResult},
};

use super::backend::{ReceiptSummary, RpcBackend};
use crate::config::ContractConfig;

/// First anvil development key
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Node-managed account used when no key is configured
pub fn default_account() -> Address {
    Address::repeat_byte(0x11)
}

pub fn test_key_address() -> Address {
    TEST_PRIVATE_KEY
        .parse::<PrivateKeySigner>()
        .unwrap()
        .address()
}

pub fn contract_config(private_key: Option<&str>) -> ContractConfig {
    ContractConfig {
        rpc_url: "http://127.0.0.1:8545".to_string(),
        contract_address: CONTRACT_ADDRESS.to_string(),
        default_account: Some(default_account().to_string()),
        private_key: private_key.map(str::to_string),
        enable_poa: false,
    }
}

pub fn fee_history(base_fee: u128, priority_fee: u128) -> FeeHistory {
    FeeHistory {
        base_fee_per_gas: vec![base_fee],
        reward: Some(vec![vec![priority_fee]]),
        ..Default::default()
    }
}

pub fn log(address: Address, data: LogData, log_index: u64) -> Log {
    Log {
        inner: alloy::primitives::Log { address, data },
        log_index: Some(log_index),
        ..Default::default()
    }
}

/// Hash reported for node-signed submissions
pub fn node_tx_hash() -> B256 {
    B256::repeat_byte(0xaa)
}

pub struct MockState {
    pub chain_id: u64,
    pub offline: bool,
    pub nonce: u64,
    /// `None` makes `eth_feeHistory` fail
    pub fee_history: Option<FeeHistory>,
    pub gas_price: Option<u128>,
    pub gas_estimate: Option<u128>,
    /// `None` makes `eth_call` revert
    pub call_result: Option<Bytes>,
    pub receipts: HashMap<B256, ReceiptSummary>,
    pub nonce_queries: Vec<Address>,
    pub calls: Vec<TransactionRequest>,
    pub sent: Vec<TransactionRequest>,
    pub sent_raw: Vec<Vec<u8>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            chain_id: 31337,
            offline: false,
            nonce: 0,
            fee_history: Some(fee_history(1, 1)),
            gas_price: Some(1),
            gas_estimate: Some(21_000),
            call_result: None,
            receipts: HashMap::new(),
            nonce_queries: Vec::new(),
            calls: Vec::new(),
            sent: Vec::new(),
            sent_raw: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Calldata of the last node-signed submission
    pub fn last_input(&self) -> Option<Bytes> {
        let state = self.state();
        state
            .sent
            .last()
            .and_then(|tx| tx.input.input().cloned())
    }
}

fn unavailable(what: &str) -> alloy::transports::TransportError {
    TransportErrorKind::custom_str(&format!("{} unavailable", what))
}

impl RpcBackend for MockBackend {
    async fn chain_id(&self) -> TransportResult<u64> {
        let state = self.state();
        if state.offline {
            return Err(unavailable("node"));
        }
        Ok(state.chain_id)
    }

    async fn pending_nonce(&self, account: Address) -> TransportResult<u64> {
        let mut state = self.state();
        state.nonce_queries.push(account);
        Ok(state.nonce)
    }

    async fn fee_history(&self) -> TransportResult<FeeHistory> {
        self.state()
            .fee_history
            .clone()
            .ok_or_else(|| unavailable("eth_feeHistory"))
    }

    async fn gas_price(&self) -> TransportResult<u128> {
        self.state()
            .gas_price
            .ok_or_else(|| unavailable("eth_gasPrice"))
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> TransportResult<u128> {
        self.state()
            .gas_estimate
            .ok_or_else(|| unavailable("eth_estimateGas"))
    }

    async fn call(&self, tx: &TransactionRequest) -> TransportResult<Bytes> {
        let mut state = self.state();
        state.calls.push(tx.clone());
        state
            .call_result
            .clone()
            .ok_or_else(|| TransportErrorKind::custom_str("execution reverted"))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> TransportResult<B256> {
        self.state().sent.push(tx);
        Ok(node_tx_hash())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> TransportResult<B256> {
        self.state().sent_raw.push(raw.to_vec());
        Ok(keccak256(raw))
    }

    async fn transaction_receipt(&self, hash: B256) -> TransportResult<Option<ReceiptSummary>> {
        Ok(self.state().receipts.get(&hash).cloned())
    }
}
