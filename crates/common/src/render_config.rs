//! Render configuration
//!
//! Built once at process start and passed by reference through the pipeline.

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Connection type used when none is configured
pub const DEFAULT_CONNECTION_TYPE: &str = "PUBLIC";

/// Backend header carrying the authorizer's context value
pub const DEFAULT_AUTHORIZER_CONTEXT_HEADER: &str = "X-JWT-Assertion";

/// Authorizer context value forwarded to the backend
pub const DEFAULT_AUTHORIZER_CONTEXT_KEY: &str = "context.authorizer.stringKey";

/// How operations are authorized at the gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    /// No security definitions are emitted
    #[default]
    #[serde(rename = "none")]
    None,

    /// Custom token authorizer exposed as an API key scheme
    #[serde(rename = "apiKey")]
    ApiKey,

    /// Custom token authorizer exposed as an OAuth2 scheme
    #[serde(rename = "oauth2")]
    OAuth2,
}

impl AuthMode {
    /// Whether the mode installs an authorizer
    pub fn is_enabled(self) -> bool {
        !matches!(self, AuthMode::None)
    }

    /// Swagger security scheme type for the mode
    pub fn scheme_type(self) -> Option<&'static str> {
        match self {
            AuthMode::None => None,
            AuthMode::ApiKey => Some("apiKey"),
            AuthMode::OAuth2 => Some("oauth2"),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::None => write!(f, "none"),
            AuthMode::ApiKey => write!(f, "apiKey"),
            AuthMode::OAuth2 => write!(f, "oauth2"),
        }
    }
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(AuthMode::None),
            "apikey" | "api_key" | "api-key" => Ok(AuthMode::ApiKey),
            "oauth2" | "oauth" => Ok(AuthMode::OAuth2),
            _ => Err(ConfigError::Invalid {
                setting: "AUTH_TYPE",
                value: s.to_string(),
            }),
        }
    }
}

/// Everything the renderer needs to know about the target gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// Display name forced onto the document title
    pub gateway_name: String,

    /// Fixed backend base URL; derived from `host` + `basePath` when absent
    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default)]
    pub auth_mode: AuthMode,

    /// Security scheme name operations are secured with
    #[serde(default)]
    pub authorizer_name: String,

    /// Lambda invocation URI of the custom authorizer
    #[serde(default)]
    pub authorizer_uri: String,

    /// Backend header set from the authorizer context on secured operations;
    /// blank disables the mapping
    #[serde(default = "default_authorizer_context_header")]
    pub authorizer_context_header: String,

    #[serde(default = "default_authorizer_context_key")]
    pub authorizer_context_key: String,

    #[serde(default)]
    pub cors_enabled: bool,

    /// Header names propagated from the method request to the backend
    #[serde(default)]
    pub custom_headers: Vec<String>,

    #[serde(default)]
    pub vpc_link_id: Option<String>,

    #[serde(default = "default_connection_type")]
    pub connection_type: String,
}

fn default_connection_type() -> String {
    DEFAULT_CONNECTION_TYPE.to_string()
}

fn default_authorizer_context_header() -> String {
    DEFAULT_AUTHORIZER_CONTEXT_HEADER.to_string()
}

fn default_authorizer_context_key() -> String {
    DEFAULT_AUTHORIZER_CONTEXT_KEY.to_string()
}

/// Drop blank and repeated header names, keeping the first spelling
fn dedupe_headers(headers: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for header in headers {
        let header = header.trim();
        if header.is_empty() || unique.iter().any(|h| h.eq_ignore_ascii_case(header)) {
            continue;
        }
        unique.push(header.to_string());
    }
    unique
}

impl RenderConfig {
    /// Create a configuration with no auth, no CORS and a public connection
    pub fn new(gateway_name: impl Into<String>) -> Self {
        Self {
            gateway_name: gateway_name.into(),
            endpoint_url: None,
            auth_mode: AuthMode::None,
            authorizer_name: String::new(),
            authorizer_uri: String::new(),
            authorizer_context_header: default_authorizer_context_header(),
            authorizer_context_key: default_authorizer_context_key(),
            cors_enabled: false,
            custom_headers: Vec::new(),
            vpc_link_id: None,
            connection_type: default_connection_type(),
        }
    }

    /// Secure operations with a custom authorizer
    pub fn with_auth(
        mut self,
        mode: AuthMode,
        authorizer_name: impl Into<String>,
        authorizer_uri: impl Into<String>,
    ) -> Self {
        self.auth_mode = mode;
        self.authorizer_name = authorizer_name.into();
        self.authorizer_uri = authorizer_uri.into();
        self
    }

    /// Forward an authorizer context value to the backend as a header
    pub fn with_authorizer_context(
        mut self,
        header: impl Into<String>,
        context_key: impl Into<String>,
    ) -> Self {
        self.authorizer_context_header = header.into();
        self.authorizer_context_key = context_key.into();
        self
    }

    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.cors_enabled = enabled;
        self
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Header names are trimmed and deduplicated case-insensitively
    pub fn with_custom_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_headers = dedupe_headers(headers.into_iter().map(Into::into));
        self
    }

    pub fn with_vpc_link(mut self, connection_id: impl Into<String>) -> Self {
        self.vpc_link_id = Some(connection_id.into());
        self
    }

    pub fn with_connection_type(mut self, connection_type: impl Into<String>) -> Self {
        self.connection_type = connection_type.into();
        self
    }

    /// Check the settings the renderer cannot work around
    pub fn validate(&self) -> Result<()> {
        if self.gateway_name.trim().is_empty() {
            return Err(ConfigError::Missing("API_GATEWAY_NAME"));
        }
        if self.auth_mode.is_enabled() {
            if self.authorizer_name.trim().is_empty() {
                return Err(ConfigError::Missing("AUTH_NAME"));
            }
            if self.authorizer_uri.trim().is_empty() {
                return Err(ConfigError::Missing("AUTH_URL"));
            }
        }
        if self.custom_headers.iter().any(|h| h.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                setting: "CUSTOM_HEADERS",
                value: self.custom_headers.join(","),
            });
        }
        Ok(())
    }

    /// Connection type as the gateway expects it (upper case)
    pub fn normalized_connection_type(&self) -> String {
        let trimmed = self.connection_type.trim();
        if trimmed.is_empty() {
            default_connection_type()
        } else {
            trimmed.to_ascii_uppercase()
        }
    }

    /// Backend base URL, falling back to the document's own host and base path
    pub fn resolve_endpoint(&self, host: Option<&str>, base_path: Option<&str>) -> String {
        match self.endpoint_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("{}{}", host.unwrap_or_default(), base_path.unwrap_or_default()),
        }
    }

    /// Split a comma-separated header list, dropping blanks and repeats
    pub fn parse_header_list(raw: &str) -> Vec<String> {
        dedupe_headers(raw.split(',').map(String::from))
    }

    /// `(header, context key)` to forward when the authorizer is active
    pub fn authorizer_context(&self) -> Option<(&str, &str)> {
        let header = self.authorizer_context_header.trim();
        let key = self.authorizer_context_key.trim();
        if !self.auth_mode.is_enabled() || header.is_empty() || key.is_empty() {
            return None;
        }
        Some((header, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_mode_from_str() {
        assert_eq!("apiKey".parse::<AuthMode>().unwrap(), AuthMode::ApiKey);
        assert_eq!("OAUTH2".parse::<AuthMode>().unwrap(), AuthMode::OAuth2);
        assert_eq!("".parse::<AuthMode>().unwrap(), AuthMode::None);
        assert!("basic".parse::<AuthMode>().is_err());
    }

    #[test]
    fn test_auth_mode_round_trips_through_display() {
        for mode in [AuthMode::None, AuthMode::ApiKey, AuthMode::OAuth2] {
            assert_eq!(mode.to_string().parse::<AuthMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_validate_requires_authorizer_when_enabled() {
        let config = RenderConfig::new("api-gw-dev").with_auth(AuthMode::ApiKey, "", "arn");
        assert_eq!(config.validate(), Err(ConfigError::Missing("AUTH_NAME")));

        let config = RenderConfig::new("api-gw-dev").with_auth(AuthMode::ApiKey, "gw", " ");
        assert_eq!(config.validate(), Err(ConfigError::Missing("AUTH_URL")));

        let config = RenderConfig::new("api-gw-dev").with_auth(AuthMode::OAuth2, "gw", "arn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_gateway_name() {
        assert_eq!(
            RenderConfig::new("  ").validate(),
            Err(ConfigError::Missing("API_GATEWAY_NAME"))
        );
    }

    #[test]
    fn test_resolve_endpoint() {
        let config = RenderConfig::new("gw");
        assert_eq!(
            config.resolve_endpoint(Some("petstore.io"), Some("/v2")),
            "petstore.io/v2"
        );

        let config = config.with_endpoint_url("backend.internal:8080");
        assert_eq!(
            config.resolve_endpoint(Some("petstore.io"), Some("/v2")),
            "backend.internal:8080"
        );
    }

    #[test]
    fn test_parse_header_list() {
        assert_eq!(
            RenderConfig::parse_header_list("X-JWT-Assertion, organisation-id,,"),
            vec!["X-JWT-Assertion".to_string(), "organisation-id".to_string()]
        );
        assert!(RenderConfig::parse_header_list("").is_empty());
    }

    #[test]
    fn test_repeated_headers_collapse() {
        assert_eq!(
            RenderConfig::parse_header_list("organisation-id, Organisation-Id,organisation-id"),
            vec!["organisation-id".to_string()]
        );

        let config = RenderConfig::new("gw").with_custom_headers(["X-Tenant", " x-tenant ", "X-Trace"]);
        assert_eq!(config.custom_headers, vec!["X-Tenant", "X-Trace"]);
    }

    #[test]
    fn test_authorizer_context_needs_auth() {
        let config = RenderConfig::new("gw");
        assert_eq!(config.authorizer_context(), None);

        let config = config.with_auth(AuthMode::ApiKey, "gw", "arn");
        assert_eq!(
            config.authorizer_context(),
            Some(("X-JWT-Assertion", "context.authorizer.stringKey"))
        );

        let config = config.with_authorizer_context(" ", "context.authorizer.principalId");
        assert_eq!(config.authorizer_context(), None);
    }

    #[test]
    fn test_connection_type_is_upper_cased() {
        let config = RenderConfig::new("gw").with_connection_type("vpc_link");
        assert_eq!(config.normalized_connection_type(), "VPC_LINK");
        assert_eq!(
            RenderConfig::new("gw").with_connection_type("").normalized_connection_type(),
            "PUBLIC"
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"gatewayName": "gw", "authMode": "apiKey"}"#).unwrap();
        assert_eq!(config.auth_mode, AuthMode::ApiKey);
        assert_eq!(config.connection_type, "PUBLIC");
        assert!(config.custom_headers.is_empty());
        assert_eq!(config.authorizer_context_header, "X-JWT-Assertion");
        assert_eq!(config.authorizer_context_key, "context.authorizer.stringKey");
    }
}
