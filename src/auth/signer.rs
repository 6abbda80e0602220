use alloy::primitives::{keccak256, Address, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use tracing::debug;

use super::encoding::FeedbackAuthorization;
use super::payload::{AuthorizationPayload, SIGNATURE_LEN};
use crate::encoding::normalize_address;
use crate::types::SdkError;
use crate::wallet::parse_private_key;

/// Fields of a feedback authorization before normalization
#[derive(Debug, Clone)]
pub struct FeedbackAuthRequest {
    pub agent_id: U256,
    pub client_address: String,
    pub index_limit: u64,
    /// Unix timestamp after which the authorization is rejected
    pub expiry: U256,
    pub chain_id: U256,
    pub identity_registry: String,
    /// Delegated signer; defaults to the key's own address
    pub signer_address: Option<String>,
}

/// Builds signed `feedbackAuth` payloads from a single private key
///
/// Holds no mutable state, so one instance can be shared across threads.
#[derive(Clone)]
pub struct AuthorizationSigner {
    signer: PrivateKeySigner,
}

impl std::fmt::Debug for AuthorizationSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationSigner")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

impl AuthorizationSigner {
    pub fn new(private_key: &str) -> Result<Self, SdkError> {
        if private_key.trim().is_empty() {
            return Err(SdkError::Signing("A private key is required.".to_string()));
        }
        Ok(Self {
            signer: parse_private_key(private_key)?,
        })
    }

    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// Default `signerAddress` written into payloads
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn build(&self, request: &FeedbackAuthRequest) -> Result<AuthorizationPayload, SdkError> {
        let client_address = normalize_address(&request.client_address)?;
        let identity_registry = normalize_address(&request.identity_registry)?;
        let signer_address = match &request.signer_address {
            Some(addr) => normalize_address(addr)?,
            None => self.address(),
        };

        let authorization = FeedbackAuthorization {
            agent_id: request.agent_id,
            client_address,
            index_limit: request.index_limit,
            expiry: request.expiry,
            chain_id: request.chain_id,
            identity_registry,
            signer_address,
        };

        let struct_hash = keccak256(authorization.encode());

        // EIP-191 personal message over the 32-byte hash
        let signature = self
            .signer
            .sign_message_sync(struct_hash.as_slice())
            .map_err(|e| {
                SdkError::Signing(format!("Failed to sign feedback authorization: {}", e))
            })?;

        let sig_bytes = signature.as_bytes();
        let signature: [u8; SIGNATURE_LEN] = sig_bytes[..].try_into().map_err(|_| {
            SdkError::Signing(format!(
                "Derived signature must be {} bytes long, got {}",
                SIGNATURE_LEN,
                sig_bytes.len()
            ))
        })?;

        debug!(
            "Built feedback auth for agent {} (client: {}, index limit: {}, signer: {})",
            authorization.agent_id,
            authorization.client_address,
            authorization.index_limit,
            authorization.signer_address
        );

        Ok(AuthorizationPayload::new(authorization, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::payload::PAYLOAD_LEN;

    fn request() -> FeedbackAuthRequest {
        FeedbackAuthRequest {
            agent_id: U256::from(123u64),
            client_address: format!("0x{}", "1".repeat(40)),
            index_limit: 5,
            expiry: U256::from(chrono::Utc::now().timestamp() as u64 + 3600),
            chain_id: U256::from(1u64),
            identity_registry: format!("0x{}", "2".repeat(40)),
            signer_address: None,
        }
    }

    #[test]
    fn test_build_and_recover() {
        let builder = AuthorizationSigner::from_signer(PrivateKeySigner::random());
        let req = request();
        let payload = builder.build(&req).unwrap();

        let encoded = payload.encoded();
        assert_eq!(encoded.len(), 289);
        assert_eq!(encoded.len(), PAYLOAD_LEN);

        let decoded = AuthorizationPayload::from_bytes(&encoded).unwrap();
        assert_eq!(decoded.agent_id(), U256::from(123u64));
        assert_eq!(decoded.chain_id(), U256::from(1u64));
        assert_eq!(decoded.index_limit(), 5);
        assert_eq!(decoded.expiry(), req.expiry);
        assert_eq!(decoded.client_address(), Address::from([0x11; 20]));
        assert_eq!(decoded.identity_registry(), Address::from([0x22; 20]));
        assert_eq!(decoded.signer_address(), builder.address());

        assert_eq!(decoded.recover_signer().unwrap(), builder.address());
    }

    #[test]
    fn test_signature_is_personal_sign_over_struct_hash() {
        let builder = AuthorizationSigner::from_signer(PrivateKeySigner::random());
        let payload = builder.build(&request()).unwrap();

        let encoded = payload.encoded();
        let struct_hash = keccak256(&encoded[..224]);
        let signature = alloy::primitives::Signature::try_from(&encoded[224..]).unwrap();
        let recovered = signature.recover_address_from_msg(struct_hash).unwrap();

        assert_eq!(recovered, builder.address());
        assert!(encoded[288] == 27 || encoded[288] == 28);
    }

    #[test]
    fn test_custom_signer_address() {
        let builder = AuthorizationSigner::from_signer(PrivateKeySigner::random());
        let req = FeedbackAuthRequest {
            signer_address: Some(format!("0x{}", "5".repeat(40))),
            ..request()
        };

        let payload = builder.build(&req).unwrap();

        assert_eq!(payload.signer_address(), Address::from([0x55; 20]));
        let hex = payload.hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len() - 2, 289 * 2);

        // The signature still comes from the builder's key
        assert_eq!(payload.recover_signer().unwrap(), builder.address());
    }

    #[test]
    fn test_mixed_case_addresses_encode_identically() {
        let builder = AuthorizationSigner::from_signer(PrivateKeySigner::random());
        let lower = FeedbackAuthRequest {
            client_address: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
            ..request()
        };
        let upper = FeedbackAuthRequest {
            client_address: "0XF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266".to_string(),
            ..lower.clone()
        };

        let a = builder.build(&lower).unwrap();
        let b = builder.build(&upper).unwrap();
        assert_eq!(a.encoded()[..224], b.encoded()[..224]);
    }

    #[test]
    fn test_build_is_deterministic_for_a_key() {
        let builder = AuthorizationSigner::from_signer(PrivateKeySigner::random());
        let req = request();
        assert_eq!(builder.build(&req).unwrap(), builder.build(&req).unwrap());
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            AuthorizationSigner::new(""),
            Err(SdkError::Signing(_))
        ));
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(matches!(
            AuthorizationSigner::new("0xnot-a-key"),
            Err(SdkError::Signing(_))
        ));
    }

    #[test]
    fn test_key_with_and_without_prefix() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let plain = AuthorizationSigner::new(key).unwrap();
        let prefixed = AuthorizationSigner::new(&format!("0x{}", key)).unwrap();

        assert_eq!(plain.address(), prefixed.address());
        assert_eq!(
            format!("{:?}", plain.address()).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_client_address_rejected() {
        let builder = AuthorizationSigner::from_signer(PrivateKeySigner::random());
        let req = FeedbackAuthRequest {
            client_address: "0x1234".to_string(),
            ..request()
        };

        assert!(matches!(builder.build(&req), Err(SdkError::Validation(_))));
    }

    #[test]
    fn test_payload_rejects_wrong_length() {
        assert!(matches!(
            AuthorizationPayload::from_bytes(&[0u8; 288]),
            Err(SdkError::Encoding(_))
        ));
        assert!(AuthorizationPayload::from_bytes(&[0u8; 290]).is_err());
    }
}
