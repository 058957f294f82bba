//! CORS preflight support
//!
//! Each path gets an OPTIONS operation answered by the gateway itself.

use crate::integration::{ALLOW_ORIGIN_HEADER, JSON_MIME_TYPE};
use apigw_publisher_common::RenderConfig;
use apigw_publisher_parser::swagger::{
    Header, HttpMethod, Integration, IntegrationResponse, MockIntegration, Operation,
    PassthroughBehavior, Response, Swagger,
};
use std::collections::BTreeMap;
use tracing::info;

pub const ALLOW_METHODS_HEADER: &str = "Access-Control-Allow-Methods";
pub const ALLOW_HEADERS_HEADER: &str = "Access-Control-Allow-Headers";

/// Methods advertised in the preflight answer
pub const ALLOWED_METHODS: &str = "GET,OPTIONS,PATCH,PUT,POST,DELETE";

/// Request headers allowed before any configured custom header
pub const BASE_ALLOWED_HEADERS: [&str; 12] = [
    "Content-Type",
    "X-Amz-Date",
    "Authorization",
    "X-Api-Key",
    "X-Amz-Security-Token",
    "DNT",
    "Origin",
    "Referer",
    "Sec-Fetch-Mode",
    "User-Agent",
    "Access-Control-Request-Headers",
    "Access-Control-Request-Method",
];

/// Comma-separated allow list, custom headers appended once each
pub fn allowed_headers(custom_headers: &[String]) -> String {
    let mut headers: Vec<&str> = BASE_ALLOWED_HEADERS.to_vec();
    for header in custom_headers {
        if !headers.iter().any(|h| h.eq_ignore_ascii_case(header)) {
            headers.push(header.as_str());
        }
    }
    headers.join(",")
}

/// Mock OPTIONS operation for a path
pub fn options_operation(config: &RenderConfig) -> Operation {
    let media_types = vec!["text/json".to_string(), JSON_MIME_TYPE.to_string()];

    let headers = [ALLOW_ORIGIN_HEADER, ALLOW_METHODS_HEADER, ALLOW_HEADERS_HEADER]
        .into_iter()
        .map(|name| (name.to_string(), Header::string()))
        .collect();

    let response_parameters = BTreeMap::from([
        (
            response_header(ALLOW_METHODS_HEADER),
            quoted(ALLOWED_METHODS),
        ),
        (
            response_header(ALLOW_HEADERS_HEADER),
            quoted(&allowed_headers(&config.custom_headers)),
        ),
        (response_header(ALLOW_ORIGIN_HEADER), quoted("*")),
    ]);

    let mut op = Operation {
        summary: Some("CORS Support".to_string()),
        description: Some("Enable CORS Support by returning correct headers".to_string()),
        consumes: media_types.clone(),
        produces: media_types,
        responses: BTreeMap::from([(
            "200".to_string(),
            Response {
                description: Some("Default response for CORS method".to_string()),
                headers,
                ..Default::default()
            },
        )]),
        ..Default::default()
    };
    op.extensions.integration = Some(Integration::Mock(MockIntegration {
        http_method: Some(HttpMethod::Options.as_str().to_string()),
        passthrough_behavior: PassthroughBehavior::WhenNoMatch,
        request_templates: BTreeMap::from([(
            JSON_MIME_TYPE.to_string(),
            r#"{"statusCode": 200}"#.to_string(),
        )]),
        responses: BTreeMap::from([(
            "default".to_string(),
            IntegrationResponse {
                status_code: "200".to_string(),
                response_parameters,
                response_templates: BTreeMap::new(),
            },
        )]),
    }));
    op
}

/// Install the OPTIONS operation on every path; returns how many were set
pub fn add_options_support(doc: &mut Swagger, config: &RenderConfig) -> usize {
    let mut count = 0;
    for (path, item) in doc.paths.iter_mut() {
        info!(url = %path, "Adding CORS Support to endpoint");
        item.set_operation(HttpMethod::Options, options_operation(config));
        count += 1;
    }
    count
}

fn response_header(name: &str) -> String {
    format!("method.response.header.{}", name)
}

fn quoted(value: &str) -> String {
    format!("'{}'", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_headers_appends_custom_once() {
        let custom = vec!["organisation-id".to_string(), "authorization".to_string()];
        let headers = allowed_headers(&custom);
        assert!(headers.starts_with("Content-Type,X-Amz-Date,Authorization,"));
        assert!(headers.ends_with("Access-Control-Request-Method,organisation-id"));
        assert_eq!(headers.matches("uthorization").count(), 1);
    }

    #[test]
    fn test_options_operation_shape() {
        let config = RenderConfig::new("gw").with_custom_headers(["X-JWT-Assertion"]);
        let value = serde_json::to_value(options_operation(&config)).unwrap();

        assert_eq!(value["summary"], "CORS Support");
        assert_eq!(value["produces"], serde_json::json!(["text/json", "application/json"]));
        assert_eq!(value["responses"]["200"]["headers"].as_object().unwrap().len(), 3);

        let integration = &value["x-amazon-apigateway-integration"];
        assert_eq!(integration["type"], "mock");
        assert_eq!(integration["passthroughBehavior"], "when_no_match");
        assert_eq!(
            integration["requestTemplates"]["application/json"],
            "{\"statusCode\": 200}"
        );
        let params = &integration["responses"]["default"]["responseParameters"];
        assert_eq!(
            params["method.response.header.Access-Control-Allow-Methods"],
            "'GET,OPTIONS,PATCH,PUT,POST,DELETE'"
        );
        assert_eq!(params["method.response.header.Access-Control-Allow-Origin"], "'*'");
        assert!(params["method.response.header.Access-Control-Allow-Headers"]
            .as_str()
            .unwrap()
            .ends_with(",X-JWT-Assertion'"));
    }
}
