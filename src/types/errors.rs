use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Contract interaction failed: {0}")]
    Interaction(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Timed out after {timeout:?} waiting for receipt of {tx_hash}")]
    ReceiptTimeout { tx_hash: String, timeout: Duration },
}

impl SdkError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            SdkError::Validation(_) => "validation_error",
            SdkError::Interaction(_) => "interaction_error",
            SdkError::Signing(_) => "signing_error",
            SdkError::Encoding(_) => "encoding_error",
            SdkError::Storage(_) => "storage_error",
            SdkError::ReceiptTimeout { .. } => "receipt_timeout",
        }
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(err: reqwest::Error) -> Self {
        SdkError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Storage(format!("Failed to serialize data to JSON: {}", err))
    }
}
