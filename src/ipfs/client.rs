use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::fallback::{self, Strategy};
use crate::types::{AgentProfile, SdkError};

const LOCAL_NODE_TIMEOUT: Duration = Duration::from_secs(30);
const PINNING_SERVICE_TIMEOUT: Duration = Duration::from_secs(60);

/// File name sent with every multipart upload
const UPLOAD_FILE_NAME: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStrategy {
    /// Pinata-compatible `pinFileToIPFS`
    PinningService,
    /// IPFS HTTP API `add`
    LocalNode,
}

impl Strategy for StorageStrategy {
    fn name(&self) -> &'static str {
        match self {
            StorageStrategy::PinningService => "pinning_service",
            StorageStrategy::LocalNode => "local_node",
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpfsAddResponse {
    #[serde(rename = "Hash")]
    hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PinataResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: Option<String>,
}

/// IPFS uploads for agent profiles and feedback documents
///
/// Supports two providers, tried in order:
/// - A pinning service such as Pinata (https://api.pinata.cloud), when configured
/// - The IPFS node HTTP API (http://127.0.0.1:5001)
pub struct IpfsStorage {
    http_client: reqwest::Client,
    api_url: String,
    gateway_url: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    pinning_enabled: bool,
}

impl IpfsStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            gateway_url: config
                .gateway_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string()),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            pinning_enabled: config.pinning_enabled(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn strategies(&self) -> Vec<StorageStrategy> {
        if self.pinning_enabled {
            vec![StorageStrategy::PinningService, StorageStrategy::LocalNode]
        } else {
            vec![StorageStrategy::LocalNode]
        }
    }

    /// Serialize `data` as pretty-printed JSON and upload it
    ///
    /// Returns an `ipfs://<cid>` URI.
    pub async fn store_json<T: Serialize + ?Sized>(&self, data: &T, pin: bool) -> Result<String, SdkError> {
        let json_bytes = serde_json::to_vec_pretty(data)?;
        self.store_bytes(json_bytes, pin).await
    }

    pub async fn store_agent_profile(&self, profile: &AgentProfile, pin: bool) -> Result<String, SdkError> {
        let document = profile.to_document()?;
        debug!("Uploading agent profile '{}'", document.name);
        self.store_json(&document, pin).await
    }

    pub async fn store_file(&self, file_path: impl AsRef<Path>, pin: bool) -> Result<String, SdkError> {
        let path = file_path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                SdkError::Storage(format!("File not found: {}", path.display()))
            }
            _ => SdkError::Storage(format!("Failed to read file: {}", e)),
        })?;

        self.store_bytes(content, pin).await
    }

    /// Upload raw bytes; a failing pinning service falls back to the local node
    pub async fn store_bytes(&self, content: Vec<u8>, pin: bool) -> Result<String, SdkError> {
        debug!("Uploading {} bytes to IPFS", content.len());

        let content = content.as_slice();
        let resolved = fallback::resolve("ipfs upload", &self.strategies(), |strategy| async move {
            match strategy {
                StorageStrategy::PinningService => self.store_via_pinning_service(content).await,
                StorageStrategy::LocalNode => self.store_via_local_node(content, pin).await,
            }
        })
        .await
        .map_err(|exhausted| {
            exhausted
                .into_last()
                .unwrap_or_else(|| SdkError::Storage("No IPFS backend configured".to_string()))
        })?;

        let uri = format!("ipfs://{}", resolved.value);
        info!("Uploaded to IPFS via {}: {}", resolved.strategy, uri);

        Ok(uri)
    }

    async fn store_via_local_node(&self, content: &[u8], pin: bool) -> Result<String, SdkError> {
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(content.to_vec()).file_name(UPLOAD_FILE_NAME),
        );

        let response = self
            .http_client
            .post(format!("{}/api/v0/add", self.api_url))
            .query(&[("pin", if pin { "true" } else { "false" })])
            .multipart(form)
            .timeout(LOCAL_NODE_TIMEOUT)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                SdkError::Storage(format!(
                    "Failed to connect to IPFS node at {}: {}",
                    self.api_url, e
                ))
            })?;

        let add_response: IpfsAddResponse = response
            .json()
            .await
            .map_err(|e| SdkError::Storage(format!("Invalid response from IPFS API: {}", e)))?;

        add_response
            .hash
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| SdkError::Storage("IPFS API did not return a CID".to_string()))
    }

    async fn store_via_pinning_service(&self, content: &[u8]) -> Result<String, SdkError> {
        let (gateway_url, api_key) = match (&self.gateway_url, &self.api_key) {
            (Some(gateway_url), Some(api_key)) => (gateway_url, api_key),
            _ => {
                return Err(SdkError::Storage(
                    "Pinning service credentials not configured".to_string(),
                ))
            }
        };

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(content.to_vec()).file_name(UPLOAD_FILE_NAME),
            )
            .text("pinataOptions", serde_json::json!({ "cidVersion": 1 }).to_string());

        let mut request = self
            .http_client
            .post(format!("{}/pinning/pinFileToIPFS", gateway_url))
            .header("pinata_api_key", api_key)
            .multipart(form)
            .timeout(PINNING_SERVICE_TIMEOUT);

        if let Some(secret) = &self.api_secret {
            request = request.header("pinata_secret_api_key", secret);
        }

        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                SdkError::Storage(format!("Failed to upload to IPFS pinning service: {}", e))
            })?;

        let pinata_response: PinataResponse = response.json().await.map_err(|e| {
            SdkError::Storage(format!("Invalid response from pinning service: {}", e))
        })?;

        pinata_response
            .ipfs_hash
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| SdkError::Storage("Pinning service did not return a CID".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentEndpoint, AgentRegistration};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn local(server: &MockServer) -> IpfsStorage {
        IpfsStorage::new(&StorageConfig::new(server.uri()))
    }

    fn pinning(server: &MockServer) -> IpfsStorage {
        IpfsStorage::new(
            &StorageConfig::new(server.uri()).with_pinning_service(
                server.uri(),
                "test_key",
                Some("test_secret".to_string()),
            ),
        )
    }

    async fn mount_local(server: &MockServer, cid: &str) {
        Mock::given(method("POST"))
            .and(path("/api/v0/add"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Hash": cid })))
            .mount(server)
            .await;
    }

    async fn request_body(server: &MockServer) -> String {
        let requests = server.received_requests().await.unwrap();
        String::from_utf8_lossy(&requests.last().unwrap().body).to_string()
    }

    #[tokio::test]
    async fn test_store_json_uploads_pretty_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/add"))
            .and(query_param("pin", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Hash": "QmTest123"})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = local(&server)
            .store_json(
                &json!({
                    "type": "https://eips.ethereum.org/EIPS/eip-8004#registration-v1",
                    "name": "testAgent",
                }),
                true,
            )
            .await
            .unwrap();

        assert_eq!(uri, "ipfs://QmTest123");
        let body = request_body(&server).await;
        assert!(body.contains("\n  \"name\": \"testAgent\""));
        assert!(body.contains("filename=\"data\""));
    }

    #[tokio::test]
    async fn test_unpinned_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/add"))
            .and(query_param("pin", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Hash": "QmLoose"})))
            .expect(1)
            .mount(&server)
            .await;

        let uri = local(&server).store_bytes(b"hello".to_vec(), false).await.unwrap();
        assert_eq!(uri, "ipfs://QmLoose");
    }

    #[tokio::test]
    async fn test_pinning_service_preferred() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinFileToIPFS"))
            .and(header("pinata_api_key", "test_key"))
            .and(header("pinata_secret_api_key", "test_secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"IpfsHash": "QmPinata123"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v0/add"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Hash": "QmLocal"})))
            .expect(0)
            .mount(&server)
            .await;

        let uri = pinning(&server)
            .store_json(&json!({"test": "data"}), true)
            .await
            .unwrap();

        assert_eq!(uri, "ipfs://QmPinata123");
        assert!(request_body(&server).await.contains("cidVersion"));
    }

    #[tokio::test]
    async fn test_pinning_failure_falls_back_to_local_node() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinFileToIPFS"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        mount_local(&server, "QmLocal").await;

        let uri = pinning(&server)
            .store_json(&json!({"test": "data"}), true)
            .await
            .unwrap();

        assert_eq!(uri, "ipfs://QmLocal");
    }

    #[tokio::test]
    async fn test_local_node_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/add"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = local(&server).store_bytes(b"x".to_vec(), true).await.unwrap_err();
        assert!(matches!(err, SdkError::Storage(_)));
        assert!(err.to_string().contains("Failed to connect to IPFS node"));
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        let storage = IpfsStorage::new(&StorageConfig::new("http://127.0.0.1:1"));
        let err = storage.store_bytes(b"x".to_vec(), true).await.unwrap_err();
        assert!(err.to_string().contains("Failed to connect to IPFS node at http://127.0.0.1:1"));
    }

    #[tokio::test]
    async fn test_missing_cid_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/add"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Name": "data"})))
            .mount(&server)
            .await;

        let err = local(&server).store_bytes(b"x".to_vec(), true).await.unwrap_err();
        assert!(err.to_string().contains("did not return a CID"));
    }

    #[tokio::test]
    async fn test_store_file_reads_and_uploads() {
        let server = MockServer::start().await;
        mount_local(&server, "QmFile123").await;

        let file = std::env::temp_dir().join(format!("erc8004-sdk-upload-{}.txt", std::process::id()));
        tokio::fs::write(&file, b"test content").await.unwrap();

        let result = local(&server).store_file(&file, true).await;
        tokio::fs::remove_file(&file).await.unwrap();

        assert_eq!(result.unwrap(), "ipfs://QmFile123");
        assert!(request_body(&server).await.contains("test content"));
    }

    #[tokio::test]
    async fn test_store_file_missing() {
        let storage = IpfsStorage::new(&StorageConfig::default());
        let err = storage
            .store_file("/nonexistent/file.txt", true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[tokio::test]
    async fn test_store_agent_profile() {
        let server = MockServer::start().await;
        mount_local(&server, "QmProfile123").await;

        let profile = AgentProfile::new("myAgentName", "A natural language description of the Agent")
            .with_endpoint(
                AgentEndpoint::new("A2A", "https://agent.example/.well-known/agent-card.json")
                    .with_version("0.3.0"),
            )
            .with_registration(AgentRegistration::new(22, "eip155:1:0xRegistry"))
            .with_supported_trust("reputation");

        let uri = local(&server).store_agent_profile(&profile, true).await.unwrap();

        assert_eq!(uri, "ipfs://QmProfile123");
        let body = request_body(&server).await;
        assert!(body.contains("\"supportedTrust\""));
        assert!(body.contains("\"agentId\": 22"));
    }
}
