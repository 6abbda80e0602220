//! Signing key sources
//!
//! The SDK signs with exactly one key. It can come from:
//! - `private_key`: a hex-encoded secp256k1 key, with or without `0x`
//! - `mnemonic`: a BIP-39 phrase derived at `m/44'/60'/0'/0/{index}`

use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use std::env;
use tracing::info;

use crate::types::SdkError;

/// Where the signing key comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMode {
    PrivateKey,
    Mnemonic,
    None,
}

impl KeyMode {
    /// Detect key mode from environment
    pub fn from_env() -> Self {
        if let Ok(mode) = env::var("KEY_MODE") {
            match mode.to_lowercase().as_str() {
                "mnemonic" => return KeyMode::Mnemonic,
                "private_key" | "privatekey" | "key" => return KeyMode::PrivateKey,
                _ => {}
            }
        }

        if env::var("MNEMONIC").is_ok() {
            KeyMode::Mnemonic
        } else if env::var("PRIVATE_KEY").is_ok() {
            KeyMode::PrivateKey
        } else {
            KeyMode::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyMode::PrivateKey => "private_key",
            KeyMode::Mnemonic => "mnemonic",
            KeyMode::None => "none",
        }
    }
}

/// Resolve the configured key to a hex private key, if any
///
/// Supported env vars: `KEY_MODE`, `PRIVATE_KEY`, `MNEMONIC`, `DERIVATION_INDEX`.
pub fn private_key_from_env() -> anyhow::Result<Option<String>> {
    let mode = KeyMode::from_env();

    match mode {
        KeyMode::Mnemonic => {
            let mnemonic = env::var("MNEMONIC")
                .map_err(|_| anyhow::anyhow!("MNEMONIC env var required for mnemonic mode"))?;

            let index: u32 = env::var("DERIVATION_INDEX")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid DERIVATION_INDEX: {}", e))?;

            let signer = derive_from_mnemonic(&mnemonic, index)?;
            info!(
                "Signing key derived from mnemonic (index: {}, address: {})",
                index,
                signer.address()
            );

            Ok(Some(format!(
                "0x{}",
                hex::encode(signer.credential().to_bytes())
            )))
        }
        KeyMode::PrivateKey => {
            let private_key = env::var("PRIVATE_KEY")
                .map_err(|_| anyhow::anyhow!("PRIVATE_KEY env var required for private_key mode"))?;

            let signer = parse_private_key(&private_key)?;
            info!("Signing key loaded (address: {})", signer.address());

            Ok(Some(private_key))
        }
        KeyMode::None => {
            info!("No signing key configured; transactions will be signed by the node");
            Ok(None)
        }
    }
}

/// Parse a hex private key into a local signer
pub fn parse_private_key(private_key: &str) -> Result<PrivateKeySigner, SdkError> {
    let trimmed = private_key.trim();
    let key = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    key.parse::<PrivateKeySigner>()
        .map_err(|e| SdkError::Signing(format!("Invalid private key: {}", e)))
}

/// Derive a signer from a BIP-39 mnemonic at the standard Ethereum path
pub fn derive_from_mnemonic(mnemonic: &str, index: u32) -> Result<PrivateKeySigner, SdkError> {
    MnemonicBuilder::<English>::default()
        .phrase(mnemonic)
        .index(index)
        .map_err(|e| SdkError::Signing(format!("Invalid derivation index: {}", e)))?
        .build()
        .map_err(|e| SdkError::Signing(format!("Failed to derive from mnemonic: {}", e)))
}
