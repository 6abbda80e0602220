//! JSON-RPC access used by the registry services
//!
//! [`RpcBackend`] is the narrow set of node calls the transaction pipeline needs.
//! [`HttpBackend`] serves it from an alloy HTTP provider.

use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    network::Ethereum,
    primitives::{Address, Bytes, B256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{FeeHistory, Log, TransactionRequest},
    transports::{
        http::{Client, Http},
        TransportResult,
    },
};
use tracing::debug;
use url::Url;

use crate::types::SdkError;

type HttpProvider = RootProvider<Http<Client>, Ethereum>;

/// Reward percentile requested from `eth_feeHistory`
pub const PRIORITY_FEE_PERCENTILE: f64 = 50.0;

/// The subset of a transaction receipt the SDK reads
#[derive(Debug, Clone, Default)]
pub struct ReceiptSummary {
    pub transaction_hash: B256,
    pub status: bool,
    pub block_number: Option<u64>,
    pub gas_used: u128,
    pub logs: Vec<Log>,
}

#[allow(async_fn_in_trait)]
pub trait RpcBackend: Send + Sync {
    async fn chain_id(&self) -> TransportResult<u64>;

    /// Transaction count including the pending block
    async fn pending_nonce(&self, account: Address) -> TransportResult<u64>;

    /// Fee history of the latest block
    async fn fee_history(&self) -> TransportResult<FeeHistory>;

    async fn gas_price(&self) -> TransportResult<u128>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> TransportResult<u128>;

    /// `eth_call` against the latest block; no state change
    async fn call(&self, tx: &TransactionRequest) -> TransportResult<Bytes>;

    /// `eth_sendTransaction`; the node signs with its unlocked account
    async fn send_transaction(&self, tx: TransactionRequest) -> TransportResult<B256>;

    async fn send_raw_transaction(&self, raw: &[u8]) -> TransportResult<B256>;

    async fn transaction_receipt(&self, hash: B256) -> TransportResult<Option<ReceiptSummary>>;
}

/// [`RpcBackend`] over HTTP JSON-RPC
#[derive(Clone)]
pub struct HttpBackend {
    rpc_url: Url,
    provider: HttpProvider,
}

impl HttpBackend {
    pub fn new(rpc_url: &str) -> Result<Self, SdkError> {
        let url = Url::parse(rpc_url)
            .map_err(|e| SdkError::Interaction(format!("Invalid RPC URL: {}", e)))?;

        Ok(Self {
            provider: ProviderBuilder::new().on_http(url.clone()),
            rpc_url: url,
        })
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }
}

impl RpcBackend for HttpBackend {
    async fn chain_id(&self) -> TransportResult<u64> {
        self.provider.get_chain_id().await
    }

    async fn pending_nonce(&self, account: Address) -> TransportResult<u64> {
        self.provider
            .get_transaction_count(account)
            .block_id(BlockId::pending())
            .await
    }

    async fn fee_history(&self) -> TransportResult<FeeHistory> {
        self.provider
            .get_fee_history(1, BlockNumberOrTag::Latest, &[PRIORITY_FEE_PERCENTILE])
            .await
    }

    async fn gas_price(&self) -> TransportResult<u128> {
        self.provider.get_gas_price().await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> TransportResult<u128> {
        self.provider.estimate_gas(tx).await
    }

    async fn call(&self, tx: &TransactionRequest) -> TransportResult<Bytes> {
        self.provider.call(tx).await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> TransportResult<B256> {
        let pending = self.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> TransportResult<B256> {
        let pending = self.provider.send_raw_transaction(raw).await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: B256) -> TransportResult<Option<ReceiptSummary>> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        debug!("Receipt lookup for {}: found={}", hash, receipt.is_some());

        Ok(receipt.map(|receipt| ReceiptSummary {
            transaction_hash: receipt.transaction_hash,
            status: receipt.status(),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            logs: receipt.inner.logs().to_vec(),
        }))
    }
}
