//! End-to-end feedback workflow against a live node
//!
//! 1. The owner registers an agent and sets its URI
//! 2. The owner approves the client account for the agent
//! 3. The client signs a feedback authorization and submits feedback

use alloy::primitives::{keccak256, U256};
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::env;
use tracing::{info, warn};

use erc8004_sdk::client::DEFAULT_RECEIPT_TIMEOUT;
use erc8004_sdk::types::{AgentEndpoint, AgentProfile, AgentRegistration, FeedbackArgs};
use erc8004_sdk::{ClientConfig, Erc8004Client, FeedbackAuthRequest, TxOptions};

/// Lifetime of the feedback authorization
const AUTH_VALIDITY_SECS: i64 = 3600;

async fn confirm(client: &Erc8004Client, tx_hash: &str, step: &str) -> Result<()> {
    let receipt = client
        .wait_for_transaction(tx_hash, DEFAULT_RECEIPT_TIMEOUT)
        .await?;
    if !receipt.status {
        bail!("{} transaction {} reverted", step, tx_hash);
    }
    info!("{} confirmed in block {}", step, receipt.block_number.unwrap_or_default());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("erc8004_sdk=debug".parse()?)
                .add_directive("erc8004_workflow=info".parse()?),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = ClientConfig::from_env()?;
    let client_key =
        env::var("CLIENT_PRIVATE_KEY").context("CLIENT_PRIVATE_KEY env var is required")?;

    info!("Starting ERC-8004 workflow v{}", env!("CARGO_PKG_VERSION"));
    info!("Key mode: {}", ClientConfig::key_mode().as_str());
    if config.enable_poa {
        info!("Proof-of-authority compatibility enabled");
    }

    let owner = Erc8004Client::connect(&config).await?;
    info!("Owner account: {} (chain {})", owner.account(), owner.chain_id());

    // Step 1: register an empty agent, then point it at its profile
    let registration = owner.register_minimal(&TxOptions::default()).await?;
    let receipt = owner
        .wait_for_receipt(&registration.tx_hash, DEFAULT_RECEIPT_TIMEOUT)
        .await?;
    let agent_id = match registration.agent_id.or(receipt.agent_id) {
        Some(id) => id,
        None => bail!("Failed to get agent ID from registration {}", registration.tx_hash),
    };
    info!("Agent registered: ID {} (tx: {})", agent_id, registration.tx_hash);

    let registry_ref = format!("eip155:{}:{}", owner.chain_id(), owner.identity_registry_address());
    let profile = AgentProfile::new("workflowAgent", "Agent registered by the ERC-8004 workflow")
        .with_endpoint(
            AgentEndpoint::new("agentWallet", format!("eip155:{}:{}", owner.chain_id(), owner.account())),
        )
        .with_registration(AgentRegistration::new(
            agent_id.try_into().unwrap_or(u64::MAX),
            registry_ref,
        ))
        .with_supported_trust("reputation");

    let token_uri = match owner.storage() {
        Some(_) => owner.store_agent_profile(&profile, true).await?,
        None => {
            warn!("No IPFS storage configured; embedding the profile as a data URI");
            profile.to_data_uri()?
        }
    };

    let set_uri_tx = owner
        .set_agent_uri(agent_id, &token_uri, &TxOptions::default())
        .await?;
    confirm(&owner, &set_uri_tx, "setAgentUri").await?;

    // Step 2: approve the client account
    let client_config = ClientConfig {
        private_key: Some(client_key),
        auth_private_key: None,
        default_account: None,
        ..config.clone()
    };
    let client = Erc8004Client::connect(&client_config).await?;
    info!("Client account: {}", client.account());

    let approve_tx = owner
        .approve(&client.account().to_string(), agent_id, &TxOptions::default())
        .await?;
    confirm(&owner, &approve_tx, "approve").await?;

    // Step 3: authorize and submit feedback
    let last_index = client
        .get_last_index(agent_id, &client.account().to_string())
        .await?;
    let expiry = chrono::Utc::now().timestamp() + AUTH_VALIDITY_SECS;

    let feedback_auth = client.build_feedback_auth(&FeedbackAuthRequest {
        agent_id,
        client_address: client.account().to_string(),
        index_limit: last_index + 1,
        expiry: U256::from(expiry.max(0) as u64),
        chain_id: U256::from(client.chain_id()),
        identity_registry: config.identity_registry.clone(),
        signer_address: None,
    })?;
    info!("Feedback authorization: {}", feedback_auth.hex());

    let feedback = serde_json::json!({
        "agentRegistry": format!("eip155:{}:{}", client.chain_id(), client.identity_registry_address()),
        "agentId": agent_id.to_string(),
        "clientAddress": client.account().to_string(),
        "score": 9,
        "tag1": "excellent",
        "tag2": "helpful",
    });
    let feedback_bytes = serde_json::to_vec_pretty(&feedback)?;
    let feedback_hash = keccak256(&feedback_bytes);

    let feedback_uri = match client.storage() {
        Some(_) => client.store_bytes(feedback_bytes, true).await?,
        None => format!("data:application/json;base64,{}", STANDARD.encode(&feedback_bytes)),
    };

    let feedback_tx = client
        .give_feedback(&FeedbackArgs {
            agent_id,
            score: 9,
            tag1: "excellent".into(),
            tag2: "helpful".into(),
            feedback_uri,
            feedback_hash: feedback_hash.into(),
            feedback_auth: feedback_auth.into(),
            options: TxOptions::default(),
        })
        .await?;
    confirm(&client, &feedback_tx, "giveFeedback").await?;

    info!("Workflow finished (agent {}, feedback tx {})", agent_id, feedback_tx);
    Ok(())
}
