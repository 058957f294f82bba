//! Vendor extensions
//!
//! Known AWS API Gateway extensions are parsed into typed shapes; every other
//! key (including known keys whose payload does not fit the typed shape) is
//! kept verbatim in [`Extensions::other`] so documents round-trip unchanged.

use apigw_publisher_common::{AUTHORIZER_EXTENSION, AUTH_TYPE_EXTENSION, INTEGRATION_EXTENSION};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Extension bag attached to documents, operations, schemas and schemes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    /// `x-amazon-apigateway-integration`
    pub integration: Option<Integration>,

    /// `x-amazon-apigateway-authorizer`
    pub authorizer: Option<Authorizer>,

    /// `x-amazon-apigateway-authtype`
    pub auth_type: Option<String>,

    /// Everything else, keyed by the original field name
    pub other: BTreeMap<String, Value>,
}

impl Extensions {
    /// Raw value of an unrecognised extension
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.other.get(key)
    }

    /// Read a boolean marker such as `x-publish: "false"`
    ///
    /// Returns `None` when the key is absent and `Some(Err(value))` when the
    /// value is neither a JSON boolean nor a boolean-like string.
    pub fn flag(&self, key: &str) -> Option<Result<bool, &Value>> {
        let value = self.other.get(key)?;
        Some(match value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(value),
            },
            _ => Err(value),
        })
    }

    fn from_map(raw: BTreeMap<String, Value>) -> Self {
        let mut extensions = Extensions::default();
        for (key, value) in raw {
            match key.as_str() {
                INTEGRATION_EXTENSION => match serde_json::from_value(value.clone()) {
                    Ok(integration) => extensions.integration = Some(integration),
                    Err(_) => {
                        extensions.other.insert(key, value);
                    }
                },
                AUTHORIZER_EXTENSION => match serde_json::from_value(value.clone()) {
                    Ok(authorizer) => extensions.authorizer = Some(authorizer),
                    Err(_) => {
                        extensions.other.insert(key, value);
                    }
                },
                AUTH_TYPE_EXTENSION => match value {
                    Value::String(auth_type) => extensions.auth_type = Some(auth_type),
                    value => {
                        extensions.other.insert(key, value);
                    }
                },
                _ => {
                    extensions.other.insert(key, value);
                }
            }
        }
        extensions
    }
}

impl Serialize for Extensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(auth_type) = &self.auth_type {
            map.serialize_entry(AUTH_TYPE_EXTENSION, auth_type)?;
        }
        if let Some(authorizer) = &self.authorizer {
            map.serialize_entry(AUTHORIZER_EXTENSION, authorizer)?;
        }
        if let Some(integration) = &self.integration {
            map.serialize_entry(INTEGRATION_EXTENSION, integration)?;
        }
        for (key, value) in &self.other {
            let shadowed = match key.as_str() {
                INTEGRATION_EXTENSION => self.integration.is_some(),
                AUTHORIZER_EXTENSION => self.authorizer.is_some(),
                AUTH_TYPE_EXTENSION => self.auth_type.is_some(),
                _ => false,
            };
            if !shadowed {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Extensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(Extensions::from_map(raw))
    }
}

/// `x-amazon-apigateway-integration` payload, tagged by its `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Integration {
    /// Proxy the call to an HTTP backend
    Http(HttpIntegration),

    /// Answer from the gateway itself
    Mock(MockIntegration),
}

/// How the gateway passes unmapped request bodies through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassthroughBehavior {
    WhenNoMatch,
    WhenNoTemplates,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpIntegration {
    pub uri: String,

    pub connection_type: String,

    /// VPC link id, only set for private connections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,

    pub http_method: String,

    pub passthrough_behavior: PassthroughBehavior,

    #[serde(default)]
    pub request_parameters: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_templates: BTreeMap<String, String>,

    #[serde(default)]
    pub responses: BTreeMap<String, IntegrationResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockIntegration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    pub passthrough_behavior: PassthroughBehavior,

    #[serde(default)]
    pub request_templates: BTreeMap<String, String>,

    #[serde(default)]
    pub responses: BTreeMap<String, IntegrationResponse>,
}

/// Integration response keyed by status pattern (or `default`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResponse {
    pub status_code: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_parameters: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_templates: BTreeMap<String, String>,
}

/// `x-amazon-apigateway-authorizer` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorizer {
    pub authorizer_uri: String,

    #[serde(default)]
    pub authorizer_result_ttl_in_seconds: u32,

    #[serde(rename = "type")]
    pub authorizer_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_source: Option<String>,
}
