//! Byte coercion and address normalization
//!
//! Contract arguments arrive as text, `0x`-prefixed hex or raw bytes. Everything is
//! reduced to canonical bytes here before it reaches an ABI encoder.

use alloy::primitives::{Address, Bytes, B256};
use serde_json::Value;

use crate::types::SdkError;

/// Width of a fixed `bytes32` argument
pub const FIXED_WIDTH: usize = 32;

/// A value that can be coerced into raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteInput {
    /// UTF-8 text, or hex when it starts with `0x`
    Text(String),
    /// Raw bytes, passed through unchanged
    Raw(Vec<u8>),
}

impl From<&str> for ByteInput {
    fn from(value: &str) -> Self {
        ByteInput::Text(value.to_string())
    }
}

impl From<String> for ByteInput {
    fn from(value: String) -> Self {
        ByteInput::Text(value)
    }
}

impl From<&String> for ByteInput {
    fn from(value: &String) -> Self {
        ByteInput::Text(value.clone())
    }
}

impl From<Vec<u8>> for ByteInput {
    fn from(value: Vec<u8>) -> Self {
        ByteInput::Raw(value)
    }
}

impl From<&[u8]> for ByteInput {
    fn from(value: &[u8]) -> Self {
        ByteInput::Raw(value.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for ByteInput {
    fn from(value: [u8; N]) -> Self {
        ByteInput::Raw(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for ByteInput {
    fn from(value: &[u8; N]) -> Self {
        ByteInput::Raw(value.to_vec())
    }
}

impl From<Bytes> for ByteInput {
    fn from(value: Bytes) -> Self {
        ByteInput::Raw(value.to_vec())
    }
}

impl From<B256> for ByteInput {
    fn from(value: B256) -> Self {
        ByteInput::Raw(value.to_vec())
    }
}

/// Convert text, hex text or raw bytes into raw bytes
pub fn coerce_bytes(input: impl Into<ByteInput>) -> Result<Vec<u8>, SdkError> {
    match input.into() {
        ByteInput::Raw(bytes) => Ok(bytes),
        ByteInput::Text(text) => coerce_text(&text),
    }
}

/// Convert into exactly 32 bytes, right-padding with zeros
pub fn coerce_fixed32(input: impl Into<ByteInput>) -> Result<B256, SdkError> {
    let raw = coerce_bytes(input)?;
    if raw.len() > FIXED_WIDTH {
        return Err(SdkError::Encoding(format!(
            "bytes32 values cannot exceed 32 bytes (got {})",
            raw.len()
        )));
    }

    let mut padded = [0u8; FIXED_WIDTH];
    padded[..raw.len()].copy_from_slice(&raw);
    Ok(B256::from(padded))
}

/// Coerce a loosely-typed JSON value; only strings are accepted
pub fn coerce_json_value(value: &Value) -> Result<Vec<u8>, SdkError> {
    match value {
        Value::String(text) => coerce_text(text),
        other => Err(SdkError::Encoding(format!(
            "Expected bytes-like value, got {}",
            json_kind(other)
        ))),
    }
}

fn coerce_text(text: &str) -> Result<Vec<u8>, SdkError> {
    let trimmed = text.trim();
    match trimmed.strip_prefix("0x") {
        Some(body) => decode_hex_body(body)
            .map_err(|_| SdkError::Encoding(format!("Invalid hexadecimal string: {}", trimmed))),
        None => Ok(trimmed.as_bytes().to_vec()),
    }
}

fn decode_hex_body(body: &str) -> Result<Vec<u8>, hex::FromHexError> {
    // Odd-length hex is read as if it had a leading zero nibble
    if body.len() % 2 == 1 {
        hex::decode(format!("0{}", body))
    } else {
        hex::decode(body)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a 20-byte account address, ignoring letter case
pub fn normalize_address(input: &str) -> Result<Address, SdkError> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if body.len() != 40 {
        return Err(SdkError::Validation(format!(
            "Invalid address '{}': expected 20 bytes of hex",
            input
        )));
    }

    let bytes = hex::decode(body)
        .map_err(|e| SdkError::Validation(format!("Invalid address '{}': {}", input, e)))?;

    Ok(Address::from_slice(&bytes))
}

/// EIP-55 checksummed rendering of an address
pub fn to_checksum(address: &Address) -> String {
    address.to_checksum(None)
}
