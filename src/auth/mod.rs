//! Off-chain feedback authorization
//!
//! An agent owner (or approved operator) signs a [`FeedbackAuthorization`] for one
//! client; the client submits the resulting [`AuthorizationPayload`] with
//! `giveFeedback`, and the reputation registry verifies it on-chain.

pub mod encoding;
pub mod payload;
pub mod signer;

pub use encoding::{FeedbackAuthorization, STRUCT_LEN};
pub use payload::{AuthorizationPayload, PAYLOAD_LEN, SIGNATURE_LEN};
pub use signer::{AuthorizationSigner, FeedbackAuthRequest};
