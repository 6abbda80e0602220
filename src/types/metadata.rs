use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::abi::IIdentityRegistry;
use crate::encoding::{coerce_bytes, coerce_json_value, json_kind, ByteInput};
use crate::types::SdkError;

pub const REGISTRATION_TYPE: &str = "https://eips.ethereum.org/EIPS/eip-8004#registration-v1";

/// Caller input that is either a typed value or a loose JSON mapping
///
/// Every shape is normalized into one canonical representation before use.
#[derive(Debug, Clone, PartialEq)]
pub enum InputShape<T> {
    Structured(T),
    RawMapping(Map<String, Value>),
}

impl<T> From<Map<String, Value>> for InputShape<T> {
    fn from(map: Map<String, Value>) -> Self {
        InputShape::RawMapping(map)
    }
}

/// Metadata item supplied during registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub key: String,
    pub value: ByteInput,
}

impl MetadataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<ByteInput>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<MetadataEntry> for InputShape<MetadataEntry> {
    fn from(entry: MetadataEntry) -> Self {
        InputShape::Structured(entry)
    }
}

/// Normalized metadata item, ready for the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub key: String,
    pub value: Vec<u8>,
}

impl From<MetadataRecord> for IIdentityRegistry::MetadataEntry {
    fn from(record: MetadataRecord) -> Self {
        IIdentityRegistry::MetadataEntry {
            key: record.key,
            value: record.value.into(),
        }
    }
}

/// Reduce mixed metadata inputs to key/byte records
pub fn normalize_metadata_entries<I>(entries: I) -> Result<Vec<MetadataRecord>, SdkError>
where
    I: IntoIterator<Item = InputShape<MetadataEntry>>,
{
    entries.into_iter().map(normalize_metadata_entry).collect()
}

fn normalize_metadata_entry(entry: InputShape<MetadataEntry>) -> Result<MetadataRecord, SdkError> {
    match entry {
        InputShape::Structured(entry) => Ok(MetadataRecord {
            key: entry.key,
            value: coerce_bytes(entry.value)?,
        }),
        InputShape::RawMapping(map) => {
            let (key, value) = match (map.get("key"), map.get("value")) {
                (Some(key), Some(value)) => (key, value),
                _ => {
                    return Err(SdkError::Interaction(
                        "Metadata entries must include 'key' and 'value'.".to_string(),
                    ))
                }
            };

            let key = key.as_str().ok_or_else(|| {
                SdkError::Interaction(format!("metadata.key must be a string, got {}", json_kind(key)))
            })?;

            let value = match value {
                Value::String(_) => coerce_json_value(value)?,
                other => {
                    return Err(SdkError::Interaction(format!(
                        "metadata.value must be bytes or a string, got {}",
                        json_kind(other)
                    )))
                }
            };

            Ok(MetadataRecord {
                key: key.to_string(),
                value,
            })
        }
    }
}

/// Service endpoint advertised by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEndpoint {
    pub name: String,

    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Protocol-specific fields kept as given
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentEndpoint {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            version: None,
            extra: Map::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl From<AgentEndpoint> for InputShape<AgentEndpoint> {
    fn from(endpoint: AgentEndpoint) -> Self {
        InputShape::Structured(endpoint)
    }
}

/// Registration of the agent in an identity registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRegistration {
    #[serde(rename = "agentId", alias = "agent_id")]
    pub agent_id: u64,

    /// CAIP-10 style registry reference, e.g. `eip155:1:0x...`
    #[serde(rename = "agentRegistry", alias = "agent_registry")]
    pub agent_registry: String,
}

impl AgentRegistration {
    pub fn new(agent_id: u64, agent_registry: impl Into<String>) -> Self {
        Self {
            agent_id,
            agent_registry: agent_registry.into(),
        }
    }
}

impl From<AgentRegistration> for InputShape<AgentRegistration> {
    fn from(registration: AgentRegistration) -> Self {
        InputShape::Structured(registration)
    }
}

fn normalize_shape<T>(input: &InputShape<T>, what: &str) -> Result<T, SdkError>
where
    T: Clone + for<'de> Deserialize<'de>,
{
    match input {
        InputShape::Structured(value) => Ok(value.clone()),
        InputShape::RawMapping(map) => serde_json::from_value(Value::Object(map.clone()))
            .map_err(|e| SdkError::Validation(format!("Invalid {} entry: {}", what, e))),
    }
}

/// EIP-8004 agent registration file (off-chain JSON)
#[derive(Debug, Clone, PartialEq)]
pub struct AgentProfile {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub endpoints: Vec<InputShape<AgentEndpoint>>,
    pub registrations: Vec<InputShape<AgentRegistration>>,
    pub supported_trust: Vec<String>,
}

/// Serialized form of [`AgentProfile`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfileDocument {
    #[serde(rename = "type")]
    pub profile_type: String,

    pub name: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    pub endpoints: Vec<AgentEndpoint>,

    #[serde(default)]
    pub registrations: Vec<AgentRegistration>,

    #[serde(rename = "supportedTrust", alias = "supported_trust", default)]
    pub supported_trust: Vec<String>,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: None,
            endpoints: Vec::new(),
            registrations: Vec::new(),
            supported_trust: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<InputShape<AgentEndpoint>>) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }

    pub fn with_registration(mut self, registration: impl Into<InputShape<AgentRegistration>>) -> Self {
        self.registrations.push(registration.into());
        self
    }

    pub fn with_supported_trust(mut self, trust: impl Into<String>) -> Self {
        self.supported_trust.push(trust.into());
        self
    }

    /// Normalize every endpoint and registration into the document form
    pub fn to_document(&self) -> Result<AgentProfileDocument, SdkError> {
        let endpoints = self
            .endpoints
            .iter()
            .map(|e| normalize_shape(e, "endpoint"))
            .collect::<Result<Vec<_>, _>>()?;

        let registrations = self
            .registrations
            .iter()
            .map(|r| normalize_shape(r, "registration"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AgentProfileDocument {
            profile_type: REGISTRATION_TYPE.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            endpoints,
            registrations,
            supported_trust: self.supported_trust.clone(),
        })
    }

    /// Pretty-printed JSON document
    pub fn to_json(&self) -> Result<String, SdkError> {
        Ok(serde_json::to_string_pretty(&self.to_document()?)?)
    }

    /// `data:` URI usable directly as an on-chain agent URI
    pub fn to_data_uri(&self) -> Result<String, SdkError> {
        let json = serde_json::to_vec(&self.to_document()?)?;
        Ok(format!("data:application/json;base64,{}", STANDARD.encode(json)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_metadata_hex_mapping_is_decoded() {
        let records =
            normalize_metadata_entries(vec![mapping(json!({"key": "k", "value": "0x1234"})).into()])
                .unwrap();

        assert_eq!(
            records,
            vec![MetadataRecord {
                key: "k".to_string(),
                value: vec![0x12, 0x34]
            }]
        );
    }

    #[test]
    fn test_metadata_mixed_shapes() {
        let records = normalize_metadata_entries(vec![
            MetadataEntry::new("agentName", "Alice").into(),
            MetadataEntry::new("raw", vec![0u8, 1, 2]).into(),
            mapping(json!({"key": "wallet", "value": "0xabcd"})).into(),
        ])
        .unwrap();

        assert_eq!(records[0].value, b"Alice".to_vec());
        assert_eq!(records[1].value, vec![0, 1, 2]);
        assert_eq!(records[2].key, "wallet");
        assert_eq!(records[2].value, vec![0xab, 0xcd]);
    }

    #[test]
    fn test_metadata_missing_value_rejected() {
        let err = normalize_metadata_entries(vec![mapping(json!({"key": "k"})).into()]).unwrap_err();
        assert!(matches!(err, SdkError::Interaction(_)));
    }

    #[test]
    fn test_metadata_missing_key_rejected() {
        let err =
            normalize_metadata_entries(vec![mapping(json!({"value": "x"})).into()]).unwrap_err();
        assert!(matches!(err, SdkError::Interaction(_)));
    }

    #[test]
    fn test_metadata_numeric_value_rejected() {
        let err = normalize_metadata_entries(vec![mapping(json!({"key": "k", "value": 5})).into()])
            .unwrap_err();
        assert!(matches!(err, SdkError::Interaction(_)));
    }

    #[test]
    fn test_metadata_bad_hex_is_an_encoding_error() {
        let err = normalize_metadata_entries(vec![MetadataEntry::new("k", "0xzz").into()]).unwrap_err();
        assert!(matches!(err, SdkError::Encoding(_)));
    }

    #[test]
    fn test_record_into_contract_entry() {
        let entry: IIdentityRegistry::MetadataEntry = MetadataRecord {
            key: "k".to_string(),
            value: vec![1, 2],
        }
        .into();
        assert_eq!(entry.key, "k");
        assert_eq!(entry.value.to_vec(), vec![1, 2]);
    }

    fn sample_profile() -> AgentProfile {
        AgentProfile::new("myAgentName", "A natural language description of the Agent")
            .with_image("https://example.com/agentimage.png")
            .with_endpoint(
                AgentEndpoint::new("A2A", "https://agent.example/.well-known/agent-card.json")
                    .with_version("0.3.0"),
            )
            .with_endpoint(mapping(json!({
                "name": "agentWallet",
                "endpoint": "eip155:1:0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb7",
            })))
            .with_registration(AgentRegistration::new(22, "eip155:1:0xRegistry"))
            .with_supported_trust("reputation")
            .with_supported_trust("crypto-economic")
            .with_supported_trust("tee-attestation")
    }

    #[test]
    fn test_profile_document_keys() {
        let json: Value = serde_json::from_str(&sample_profile().to_json().unwrap()).unwrap();

        assert_eq!(json["type"], REGISTRATION_TYPE);
        assert_eq!(json["name"], "myAgentName");
        assert_eq!(json["image"], "https://example.com/agentimage.png");
        assert_eq!(json["endpoints"][0]["name"], "A2A");
        assert_eq!(json["endpoints"][0]["version"], "0.3.0");
        assert_eq!(json["endpoints"][1]["name"], "agentWallet");
        assert!(json["endpoints"][1].get("version").is_none());
        assert_eq!(json["registrations"][0]["agentId"], 22);
        assert_eq!(json["registrations"][0]["agentRegistry"], "eip155:1:0xRegistry");
        assert_eq!(
            json["supportedTrust"],
            json!(["reputation", "crypto-economic", "tee-attestation"])
        );
    }

    #[test]
    fn test_profile_without_image_omits_key() {
        let json: Value =
            serde_json::from_str(&AgentProfile::new("a", "b").to_json().unwrap()).unwrap();
        assert!(json.get("image").is_none());
        assert_eq!(json["endpoints"], json!([]));
    }

    #[test]
    fn test_endpoint_extra_fields_are_kept() {
        let profile = AgentProfile::new("a", "b").with_endpoint(mapping(json!({
            "name": "MCP",
            "endpoint": "https://mcp.example",
            "capabilities": {"tools": true},
        })));

        let doc = profile.to_document().unwrap();
        assert_eq!(doc.endpoints[0].extra["capabilities"], json!({"tools": true}));
    }

    #[test]
    fn test_malformed_endpoint_mapping_rejected() {
        let profile =
            AgentProfile::new("a", "b").with_endpoint(mapping(json!({"name": "missing endpoint"})));
        assert!(matches!(profile.to_document(), Err(SdkError::Validation(_))));
    }

    #[test]
    fn test_registration_mapping_accepts_snake_case() {
        let profile = AgentProfile::new("a", "b")
            .with_registration(mapping(json!({"agent_id": 3, "agent_registry": "eip155:1:0x1"})));
        assert_eq!(
            profile.to_document().unwrap().registrations,
            vec![AgentRegistration::new(3, "eip155:1:0x1")]
        );
    }

    #[test]
    fn test_data_uri_round_trips() {
        let profile = sample_profile();
        let uri = profile.to_data_uri().unwrap();
        let body = uri.strip_prefix("data:application/json;base64,").unwrap();

        let decoded: AgentProfileDocument =
            serde_json::from_slice(&STANDARD.decode(body).unwrap()).unwrap();
        assert_eq!(decoded, profile.to_document().unwrap());
    }
}
