//! Security definitions and operation security

use apigw_publisher_common::{AuthMode, RenderConfig, AUTH_DISABLED_EXTENSION};
use apigw_publisher_parser::swagger::{
    Authorizer, Extensions, Operation, SecurityRequirement, SecurityScheme, Swagger,
};
use std::collections::BTreeMap;
use tracing::warn;

/// Header the token authorizer reads
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Security definitions for the configured auth mode
///
/// Both modes install a custom token authorizer; they differ only in the
/// scheme type the gateway sees. `none` yields an empty map.
pub fn build_security_definitions(config: &RenderConfig) -> BTreeMap<String, SecurityScheme> {
    let Some(scheme_type) = config.auth_mode.scheme_type() else {
        return BTreeMap::new();
    };

    let scheme = SecurityScheme {
        scheme_type: scheme_type.to_string(),
        name: Some(AUTHORIZATION_HEADER.to_string()),
        location: Some("header".to_string()),
        extensions: Extensions {
            auth_type: Some("custom".to_string()),
            authorizer: Some(Authorizer {
                authorizer_uri: config.authorizer_uri.clone(),
                authorizer_result_ttl_in_seconds: 0,
                authorizer_type: "token".to_string(),
                identity_source: None,
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    BTreeMap::from([(config.authorizer_name.clone(), scheme)])
}

/// Replace the document's security definitions
///
/// The document-level requirement list is dropped as well: it can only name
/// schemes that no longer exist.
pub fn apply_security_definitions(doc: &mut Swagger, config: &RenderConfig) {
    doc.security_definitions = build_security_definitions(config);
    doc.security = None;
}

/// Whether the operation should sit behind the authorizer
pub fn is_security_enabled(path: &str, op: &Operation) -> bool {
    match op.extensions.flag(AUTH_DISABLED_EXTENSION) {
        Some(Ok(disabled)) => !disabled,
        Some(Err(value)) => {
            warn!(
                path,
                value = %value,
                "Ignoring unparsable {} marker",
                AUTH_DISABLED_EXTENSION
            );
            true
        }
        None => true,
    }
}

/// Requirement naming the configured authorizer
pub fn authorizer_requirement(config: &RenderConfig) -> Option<Vec<SecurityRequirement>> {
    match config.auth_mode {
        AuthMode::None => None,
        AuthMode::ApiKey | AuthMode::OAuth2 => Some(vec![BTreeMap::from([(
            config.authorizer_name.clone(),
            Vec::new(),
        )])]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_key_definition() {
        let config = RenderConfig::new("api-gw-dev").with_auth(
            AuthMode::ApiKey,
            "wave-api-gw-dev",
            "arn:aws:apigateway:eu-west-2:lambda:path/auth/invocations",
        );

        let definitions = build_security_definitions(&config);
        let value = serde_json::to_value(&definitions).unwrap();

        assert_eq!(
            value,
            json!({
                "wave-api-gw-dev": {
                    "type": "apiKey",
                    "name": "Authorization",
                    "in": "header",
                    "x-amazon-apigateway-authtype": "custom",
                    "x-amazon-apigateway-authorizer": {
                        "authorizerUri": "arn:aws:apigateway:eu-west-2:lambda:path/auth/invocations",
                        "authorizerResultTtlInSeconds": 0,
                        "type": "token"
                    }
                }
            })
        );
    }

    #[test]
    fn test_oauth2_definition_uses_oauth2_type() {
        let config = RenderConfig::new("gw").with_auth(AuthMode::OAuth2, "jwt", "arn");
        let definitions = build_security_definitions(&config);
        assert_eq!(definitions["jwt"].scheme_type, "oauth2");
        assert_eq!(definitions["jwt"].extensions.auth_type.as_deref(), Some("custom"));
    }

    #[test]
    fn test_none_mode_has_no_definitions() {
        let config = RenderConfig::new("gw");
        assert!(build_security_definitions(&config).is_empty());
        assert!(authorizer_requirement(&config).is_none());
    }

    #[test]
    fn test_auth_disabled_marker() {
        let op: Operation =
            serde_json::from_value(json!({"responses": {}, "x-auth-disabled": "true"})).unwrap();
        assert!(!is_security_enabled("/health", &op));

        let op: Operation =
            serde_json::from_value(json!({"responses": {}, "x-auth-disabled": "false"})).unwrap();
        assert!(is_security_enabled("/health", &op));

        let op: Operation = serde_json::from_value(json!({"responses": {}})).unwrap();
        assert!(is_security_enabled("/health", &op));
    }
}
