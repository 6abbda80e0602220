use alloy::primitives::{keccak256, Address, Signature, B256, U256};

use super::encoding::{FeedbackAuthorization, STRUCT_LEN};
use crate::encoding::ByteInput;
use crate::types::SdkError;

pub const SIGNATURE_LEN: usize = 65;
pub const PAYLOAD_LEN: usize = STRUCT_LEN + SIGNATURE_LEN;

/// Signed feedback authorization: the encoded struct followed by `r || s || v`
///
/// This is the opaque `feedbackAuth` argument of `giveFeedback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPayload {
    authorization: FeedbackAuthorization,
    signature: [u8; SIGNATURE_LEN],
}

impl AuthorizationPayload {
    pub(crate) fn new(authorization: FeedbackAuthorization, signature: [u8; SIGNATURE_LEN]) -> Self {
        Self {
            authorization,
            signature,
        }
    }

    /// Parse a payload received from elsewhere (e.g. from a hex string)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SdkError> {
        if bytes.len() != PAYLOAD_LEN {
            return Err(SdkError::Encoding(format!(
                "Feedback auth payload must be {} bytes, got {}",
                PAYLOAD_LEN,
                bytes.len()
            )));
        }

        let authorization = FeedbackAuthorization::decode(&bytes[..STRUCT_LEN])?;
        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&bytes[STRUCT_LEN..]);

        Ok(Self::new(authorization, signature))
    }

    pub fn authorization(&self) -> &FeedbackAuthorization {
        &self.authorization
    }

    pub fn agent_id(&self) -> U256 {
        self.authorization.agent_id
    }

    pub fn client_address(&self) -> Address {
        self.authorization.client_address
    }

    pub fn index_limit(&self) -> u64 {
        self.authorization.index_limit
    }

    pub fn expiry(&self) -> U256 {
        self.authorization.expiry
    }

    pub fn chain_id(&self) -> U256 {
        self.authorization.chain_id
    }

    pub fn identity_registry(&self) -> Address {
        self.authorization.identity_registry
    }

    pub fn signer_address(&self) -> Address {
        self.authorization.signer_address
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }

    /// keccak256 of the encoded struct; the value that gets personal-signed
    pub fn struct_hash(&self) -> B256 {
        keccak256(self.authorization.encode())
    }

    /// Encoded struct followed by the signature, always 289 bytes
    pub fn encoded(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PAYLOAD_LEN);
        out.extend_from_slice(&self.authorization.encode());
        out.extend_from_slice(&self.signature);
        out
    }

    pub fn hex(&self) -> String {
        format!("0x{}", hex::encode(self.encoded()))
    }

    /// Recover the address whose key produced the signature
    pub fn recover_signer(&self) -> Result<Address, SdkError> {
        let signature = Signature::try_from(&self.signature[..])
            .map_err(|e| SdkError::Signing(format!("Invalid signature: {}", e)))?;

        signature
            .recover_address_from_msg(self.struct_hash())
            .map_err(|e| SdkError::Signing(format!("Signature recovery failed: {}", e)))
    }
}

impl From<&AuthorizationPayload> for ByteInput {
    fn from(payload: &AuthorizationPayload) -> Self {
        ByteInput::Raw(payload.encoded())
    }
}

impl From<AuthorizationPayload> for ByteInput {
    fn from(payload: AuthorizationPayload) -> Self {
        ByteInput::Raw(payload.encoded())
    }
}
