//! Fixed-layout encoding of the feedback authorization struct
//!
//! Seven fields, one 32-byte big-endian slot each, in declaration order. The
//! reputation registry rebuilds the same bytes to check the signature, so the
//! layout is a wire contract: `uint256 agentId`, `address clientAddress`,
//! `uint64 indexLimit`, `uint256 expiry`, `uint256 chainId`,
//! `address identityRegistry`, `address signerAddress`.

use alloy::primitives::{Address, U256};

use crate::types::SdkError;

pub const SLOT_LEN: usize = 32;
pub const FIELD_COUNT: usize = 7;
pub const STRUCT_LEN: usize = SLOT_LEN * FIELD_COUNT;

/// The struct a registry owner signs to let a client leave feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackAuthorization {
    pub agent_id: U256,
    pub client_address: Address,
    pub index_limit: u64,
    pub expiry: U256,
    pub chain_id: U256,
    pub identity_registry: Address,
    pub signer_address: Address,
}

impl FeedbackAuthorization {
    pub fn encode(&self) -> [u8; STRUCT_LEN] {
        let mut out = [0u8; STRUCT_LEN];
        write_uint(&mut out, 0, self.agent_id);
        write_address(&mut out, 1, &self.client_address);
        write_uint(&mut out, 2, U256::from(self.index_limit));
        write_uint(&mut out, 3, self.expiry);
        write_uint(&mut out, 4, self.chain_id);
        write_address(&mut out, 5, &self.identity_registry);
        write_address(&mut out, 6, &self.signer_address);
        out
    }

    /// Parse an encoded struct, rejecting dirty padding
    pub fn decode(bytes: &[u8]) -> Result<Self, SdkError> {
        if bytes.len() != STRUCT_LEN {
            return Err(SdkError::Encoding(format!(
                "Feedback authorization struct must be {} bytes, got {}",
                STRUCT_LEN,
                bytes.len()
            )));
        }

        let index_limit = read_uint(bytes, 2);
        if index_limit > U256::from(u64::MAX) {
            return Err(SdkError::Encoding(
                "indexLimit does not fit in uint64".to_string(),
            ));
        }

        Ok(Self {
            agent_id: read_uint(bytes, 0),
            client_address: read_address(bytes, 1)?,
            index_limit: index_limit.to::<u64>(),
            expiry: read_uint(bytes, 3),
            chain_id: read_uint(bytes, 4),
            identity_registry: read_address(bytes, 5)?,
            signer_address: read_address(bytes, 6)?,
        })
    }
}

fn slot(index: usize) -> std::ops::Range<usize> {
    index * SLOT_LEN..(index + 1) * SLOT_LEN
}

fn write_uint(out: &mut [u8; STRUCT_LEN], index: usize, value: U256) {
    out[slot(index)].copy_from_slice(&value.to_be_bytes::<SLOT_LEN>());
}

fn write_address(out: &mut [u8; STRUCT_LEN], index: usize, address: &Address) {
    let range = slot(index);
    out[range.start + 12..range.end].copy_from_slice(address.as_slice());
}

fn read_uint(bytes: &[u8], index: usize) -> U256 {
    U256::from_be_slice(&bytes[slot(index)])
}

fn read_address(bytes: &[u8], index: usize) -> Result<Address, SdkError> {
    let word = &bytes[slot(index)];
    if word[..12].iter().any(|b| *b != 0) {
        return Err(SdkError::Encoding(format!(
            "Slot {} is not a left-padded address",
            index
        )));
    }
    Ok(Address::from_slice(&word[12..]))
}
