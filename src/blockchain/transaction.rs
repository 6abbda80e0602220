//! Shared transaction pipeline for the registry services
//!
//! Every mutating call goes through the same steps: pending nonce, fee
//! selection, gas limit selection, local signing (or node signing), submission.

use std::time::Duration;

use alloy::{
    eips::eip2718::Encodable2718,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, B256, U256},
    rpc::types::{FeeHistory, TransactionRequest},
    sol_types::SolCall,
};
use tracing::{debug, info, warn};

use super::backend::{HttpBackend, ReceiptSummary, RpcBackend};
use crate::config::ContractConfig;
use crate::encoding::normalize_address;
use crate::fallback::{self, Resolved, Strategy};
use crate::types::SdkError;
use crate::wallet::parse_private_key;

/// Gas limit used when the caller gives none and estimation fails
pub const DEFAULT_GAS_LIMIT: u128 = 200_000;

pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Per-call overrides for a mutating contract call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// Explicit gas limit; `None` (or zero) means estimate
    pub gas_limit: Option<u128>,
    /// Wei attached to the call
    pub value: U256,
}

impl TxOptions {
    pub fn with_gas_limit(mut self, gas_limit: u128) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeParams {
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
    Legacy {
        gas_price: u128,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeStrategy {
    /// Priority fee from `eth_feeHistory` rewards, max fee = base fee + 2 x priority
    FeeHistory,
    /// `eth_gasPrice`
    LegacyGasPrice,
}

impl Strategy for FeeStrategy {
    fn name(&self) -> &'static str {
        match self {
            FeeStrategy::FeeHistory => "fee_history",
            FeeStrategy::LegacyGasPrice => "legacy_gas_price",
        }
    }
}

pub const DEFAULT_FEE_STRATEGIES: [FeeStrategy; 2] =
    [FeeStrategy::FeeHistory, FeeStrategy::LegacyGasPrice];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasStrategy {
    CallerOverride,
    Estimate,
    FixedDefault,
}

impl Strategy for GasStrategy {
    fn name(&self) -> &'static str {
        match self {
            GasStrategy::CallerOverride => "caller_override",
            GasStrategy::Estimate => "estimate",
            GasStrategy::FixedDefault => "fixed_default",
        }
    }
}

const GAS_STRATEGIES: [GasStrategy; 3] = [
    GasStrategy::CallerOverride,
    GasStrategy::Estimate,
    GasStrategy::FixedDefault,
];

/// Derive EIP-1559 fees from the latest block's fee history
pub fn fees_from_history(history: &FeeHistory) -> Result<FeeParams, String> {
    let priority = history
        .reward
        .as_ref()
        .and_then(|rewards| rewards.first())
        .and_then(|block| block.first())
        .copied()
        .ok_or_else(|| "fee history has no priority fee rewards".to_string())?;

    let base_fee = history
        .base_fee_per_gas
        .last()
        .copied()
        .ok_or_else(|| "fee history has no base fee".to_string())?;

    Ok(FeeParams::Eip1559 {
        max_fee_per_gas: base_fee.saturating_add(priority.saturating_mul(2)),
        max_priority_fee_per_gas: priority,
    })
}

/// Base client for one deployed contract
pub struct ContractService<B> {
    backend: B,
    address: Address,
    account: Address,
    wallet: Option<EthereumWallet>,
    chain_id: u64,
    fee_strategies: Vec<FeeStrategy>,
    receipt_poll_interval: Duration,
}

impl ContractService<HttpBackend> {
    /// Connect over HTTP, failing if the node does not answer
    pub async fn connect(config: &ContractConfig) -> Result<Self, SdkError> {
        let backend = HttpBackend::new(&config.rpc_url)?;
        Self::with_backend(backend, config).await
    }
}

impl<B: RpcBackend> ContractService<B> {
    pub async fn with_backend(backend: B, config: &ContractConfig) -> Result<Self, SdkError> {
        if config.contract_address.trim().is_empty() {
            return Err(SdkError::Interaction(
                "A contract address must be provided.".to_string(),
            ));
        }
        let address = normalize_address(&config.contract_address)?;

        let signer = match config.private_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Some(parse_private_key(key)?),
            _ => None,
        };

        let default_account = config
            .default_account
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .map(normalize_address)
            .transpose()?;

        let account = match (&signer, default_account) {
            (Some(signer), Some(default)) => {
                if default != signer.address() {
                    warn!(
                        "Default account {} differs from signing key address {}; using the key address",
                        default,
                        signer.address()
                    );
                }
                signer.address()
            }
            (Some(signer), None) => signer.address(),
            (None, Some(default)) => default,
            (None, None) => {
                return Err(SdkError::Interaction(
                    "A default account address or private key must be provided.".to_string(),
                ))
            }
        };

        let chain_id = backend.chain_id().await.map_err(|e| {
            SdkError::Interaction(format!(
                "Failed to connect to the specified RPC endpoint: {}",
                e
            ))
        })?;

        if config.enable_poa {
            debug!("Proof-of-authority compatibility requested for chain {}", chain_id);
        }

        debug!(
            "Contract service ready (contract: {}, account: {}, chain: {}, local signing: {})",
            address,
            account,
            chain_id,
            signer.is_some()
        );

        Ok(Self {
            backend,
            address,
            account,
            wallet: signer.map(EthereumWallet::from),
            chain_id,
            fee_strategies: DEFAULT_FEE_STRATEGIES.to_vec(),
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        })
    }

    /// Replace the ordered fee strategies
    pub fn with_fee_strategies(mut self, strategies: Vec<FeeStrategy>) -> Self {
        self.fee_strategies = strategies;
        self
    }

    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Account transactions are sent from
    pub fn account(&self) -> Address {
        self.account
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn signs_locally(&self) -> bool {
        self.wallet.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn call_request<C: SolCall>(&self, call: &C, value: U256) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.account)
            .with_to(self.address)
            .with_input(call.abi_encode())
            .with_value(value)
    }

    /// Run the fee chain
    pub async fn resolve_fees(&self) -> Result<Resolved<FeeParams>, SdkError> {
        fallback::resolve("fees", &self.fee_strategies, |strategy| async move {
            match strategy {
                FeeStrategy::FeeHistory => {
                    let history = self
                        .backend
                        .fee_history()
                        .await
                        .map_err(|e| e.to_string())?;
                    fees_from_history(&history)
                }
                FeeStrategy::LegacyGasPrice => self
                    .backend
                    .gas_price()
                    .await
                    .map(|gas_price| FeeParams::Legacy { gas_price })
                    .map_err(|e| e.to_string()),
            }
        })
        .await
        .map_err(|exhausted| {
            SdkError::Interaction(format!("Failed to determine transaction fees: {}", exhausted))
        })
    }

    /// Run the gas limit chain; always yields a value
    pub async fn resolve_gas_limit(
        &self,
        tx: &TransactionRequest,
        gas_override: Option<u128>,
    ) -> Resolved<u128> {
        let gas_override = gas_override.filter(|gas| *gas > 0);
        let resolved = fallback::resolve("gas limit", &GAS_STRATEGIES, |strategy| async move {
            match strategy {
                GasStrategy::CallerOverride => {
                    gas_override.ok_or_else(|| "no gas limit supplied".to_string())
                }
                GasStrategy::Estimate => {
                    self.backend.estimate_gas(tx).await.map_err(|e| e.to_string())
                }
                GasStrategy::FixedDefault => Ok(DEFAULT_GAS_LIMIT),
            }
        })
        .await;

        match resolved {
            Ok(resolved) => resolved,
            Err(exhausted) => Resolved {
                strategy: GasStrategy::FixedDefault.name(),
                value: DEFAULT_GAS_LIMIT,
                skipped: exhausted
                    .failures
                    .into_iter()
                    .map(|(strategy, reason)| fallback::Skipped { strategy, reason })
                    .collect(),
            },
        }
    }

    /// Build, sign and submit a call; returns the `0x`-prefixed transaction hash
    pub async fn send_call<C: SolCall>(&self, call: &C, options: &TxOptions) -> Result<String, SdkError> {
        let base = self.call_request(call, options.value);

        let nonce = self
            .backend
            .pending_nonce(self.account)
            .await
            .map_err(|e| SdkError::Interaction(format!("Failed to fetch nonce: {}", e)))?;

        let fees = self.resolve_fees().await?;
        let gas = self.resolve_gas_limit(&base, options.gas_limit).await;

        debug!(
            "Prepared {} (nonce: {}, fees: {}, gas: {} via {})",
            C::SIGNATURE,
            nonce,
            fees.strategy,
            gas.value,
            gas.strategy
        );

        let request = base.with_nonce(nonce).with_gas_limit(gas.value);
        let request = match fees.value {
            FeeParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => request
                .with_max_fee_per_gas(max_fee_per_gas)
                .with_max_priority_fee_per_gas(max_priority_fee_per_gas),
            FeeParams::Legacy { gas_price } => request.with_gas_price(gas_price),
        };

        let tx_hash = match &self.wallet {
            Some(wallet) => {
                let envelope = request
                    .with_chain_id(self.chain_id)
                    .build(wallet)
                    .await
                    .map_err(|e| {
                        SdkError::Interaction(format!("Failed to build transaction: {}", e))
                    })?;
                self.backend
                    .send_raw_transaction(&envelope.encoded_2718())
                    .await
            }
            None => self.backend.send_transaction(request).await,
        }
        .map_err(|e| {
            SdkError::Interaction(format!("Failed to send {}: {}", C::SIGNATURE, e))
        })?;

        let tx_hash = format!("0x{}", hex::encode(tx_hash.as_slice()));
        info!("{} transaction sent: {}", C::SIGNATURE, tx_hash);

        Ok(tx_hash)
    }

    /// Execute a call without changing state and decode its return value
    pub async fn call_static<C: SolCall>(&self, call: &C, value: U256) -> Result<C::Return, SdkError> {
        let request = self.call_request(call, value);

        let output = self.backend.call(&request).await.map_err(|e| {
            SdkError::Interaction(format!("Contract execution reverted: {}", e))
        })?;

        C::abi_decode_returns(&output, true).map_err(|e| {
            SdkError::Interaction(format!(
                "Failed to decode {} return data: {}",
                C::SIGNATURE,
                e
            ))
        })
    }

    /// Poll for a receipt until it appears or `timeout` elapses
    pub async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        timeout: Duration,
    ) -> Result<ReceiptSummary, SdkError> {
        let hash: B256 = tx_hash
            .trim()
            .parse()
            .map_err(|e| SdkError::Validation(format!("Invalid transaction hash '{}': {}", tx_hash, e)))?;

        let poll = async {
            loop {
                match self.backend.transaction_receipt(hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => tokio::time::sleep(self.receipt_poll_interval).await,
                    Err(e) => {
                        return Err(SdkError::Interaction(format!(
                            "Failed to get receipt for {}: {}",
                            tx_hash, e
                        )))
                    }
                }
            }
        };

        let receipt = tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| SdkError::ReceiptTimeout {
                tx_hash: tx_hash.to_string(),
                timeout,
            })??;

        if receipt.status {
            info!(
                "Transaction {} confirmed in block {} (gas used: {})",
                tx_hash,
                receipt.block_number.unwrap_or_default(),
                receipt.gas_used
            );
        } else {
            warn!("Transaction {} reverted", tx_hash);
        }

        Ok(receipt)
    }
}
