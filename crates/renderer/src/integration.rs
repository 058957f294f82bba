//! Per-operation gateway integration
//!
//! Every GET/PUT/POST/PATCH/DELETE operation is proxied to the backend over
//! HTTP. Request parameters are mapped one to one, the integration answers
//! for a fixed set of status codes, and every response carries the CORS
//! origin header.

use crate::refs::DefinitionRenames;
use crate::security::{authorizer_requirement, is_security_enabled};
use apigw_publisher_common::RenderConfig;
use apigw_publisher_parser::swagger::{
    Header, HttpIntegration, HttpMethod, Integration, IntegrationResponse, Operation, Parameter,
    ParameterLocation, ParameterOrRef, PassthroughBehavior, Swagger,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Status codes the integration maps back to method responses
pub const MAPPED_STATUS_CODES: [&str; 11] = [
    "200", "201", "202", "204", "400", "401", "403", "404", "409", "424", "500",
];

/// Response header exposing the CORS origin
pub const ALLOW_ORIGIN_HEADER: &str = "Access-Control-Allow-Origin";

/// Media type every integrated operation produces
pub const JSON_MIME_TYPE: &str = "application/json";

/// Optional headers forwarded to the backend on every operation
const FORWARDED_HEADERS: [(&str, &str); 2] = [("content-type", "content type"), ("accept", "accept")];

/// Outcome of the integration phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrationReport {
    /// Number of operations that received an integration
    pub integrated: usize,

    /// `METHOD path` of operations opted out of authorization
    pub unsecured: Vec<String>,
}

/// Target of every backend integration
pub struct IntegrationTarget<'a> {
    config: &'a RenderConfig,
    endpoint: String,
    connection_type: String,
}

impl<'a> IntegrationTarget<'a> {
    pub fn new(config: &'a RenderConfig, endpoint: impl Into<String>) -> Self {
        Self {
            config,
            endpoint: endpoint.into(),
            connection_type: config.normalized_connection_type(),
        }
    }

    /// Backend URI for a path
    ///
    /// `http://` is prepended unless the endpoint already names a scheme.
    pub fn uri(&self, path: &str) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.contains("://") {
            format!("{}{}", endpoint, path)
        } else {
            format!("http://{}{}", endpoint, path)
        }
    }
}

/// Inject the integration extension into every remaining operation
pub fn integrate_paths(
    doc: &mut Swagger,
    target: &IntegrationTarget<'_>,
    renames: &DefinitionRenames,
) -> IntegrationReport {
    let Swagger {
        paths, parameters, ..
    } = doc;
    let mut report = IntegrationReport::default();

    for (path, item) in paths.iter_mut() {
        for param in item.parameters.iter_mut() {
            if let ParameterOrRef::Parameter(param) = param {
                if let Some(schema) = param.schema.as_mut() {
                    renames.rewrite_schema(schema);
                }
            }
        }
        let shared = item.parameters.clone();

        for (method, op) in item.operations_mut() {
            info!(endpoint = %path, method = %method, "Processing endpoint");
            let secured = integrate_operation(path, method, op, &shared, parameters, target);
            rewrite_operation_refs(op, renames);
            add_response_cors_headers(op);

            report.integrated += 1;
            if !secured {
                report.unsecured.push(format!("{} {}", method, path));
            }
        }
    }

    report
}

/// Returns whether the operation stays behind the authorizer
fn integrate_operation(
    path: &str,
    method: HttpMethod,
    op: &mut Operation,
    shared: &[ParameterOrRef],
    globals: &BTreeMap<String, Parameter>,
    target: &IntegrationTarget<'_>,
) -> bool {
    let config = target.config;
    let secured = is_security_enabled(path, op);

    let declared: Vec<Parameter> = shared
        .iter()
        .chain(op.parameters.iter())
        .filter_map(|param| resolve(param, globals))
        .cloned()
        .collect();

    let mut request_parameters = request_parameter_mapping(&declared);
    let mut headers: BTreeSet<String> = declared
        .iter()
        .filter(|p| p.location == ParameterLocation::Header)
        .map(|p| p.name.to_ascii_lowercase())
        .collect();

    let custom = config
        .custom_headers
        .iter()
        .map(|name| (name.as_str(), true, name.as_str()));
    let forwarded = FORWARDED_HEADERS
        .into_iter()
        .map(|(name, description)| (name, false, description));
    let mut injected = BTreeSet::new();
    for (name, required, description) in custom.chain(forwarded) {
        let key = name.to_ascii_lowercase();
        if !injected.insert(key.clone()) {
            continue;
        }
        if headers.insert(key) {
            op.parameters.push(Parameter::header(name, required, description).into());
        }
        request_parameters.insert(header_target(name), header_source(name));
    }

    if secured {
        if let Some((header, context_key)) = config.authorizer_context() {
            request_parameters.insert(header_target(header), context_key.to_string());
        }
    }

    op.produces = vec![JSON_MIME_TYPE.to_string()];
    op.extensions.integration = Some(Integration::Http(HttpIntegration {
        uri: target.uri(path),
        connection_type: target.connection_type.clone(),
        connection_id: config
            .vpc_link_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from),
        http_method: method.as_str().to_string(),
        passthrough_behavior: PassthroughBehavior::WhenNoTemplates,
        request_parameters,
        request_templates: BTreeMap::new(),
        responses: integration_responses(),
    }));

    if secured {
        op.security = authorizer_requirement(config);
    } else {
        warn!(endpoint = %path, method = %method, "Endpoint is marked as having no required authentication");
        op.security = None;
    }
    secured
}

fn resolve<'a>(
    param: &'a ParameterOrRef,
    globals: &'a BTreeMap<String, Parameter>,
) -> Option<&'a Parameter> {
    let resolved = param.resolve(globals);
    if resolved.is_none() {
        debug!(parameter = ?param, "Unresolved parameter reference");
    }
    resolved
}

/// `integration.request.*` <- `method.request.*` for path, query and header params
pub fn request_parameter_mapping(params: &[Parameter]) -> BTreeMap<String, String> {
    params
        .iter()
        .filter_map(|param| {
            let location = match param.location {
                ParameterLocation::Path => "path",
                ParameterLocation::Query => "querystring",
                ParameterLocation::Header => "header",
                ParameterLocation::Body | ParameterLocation::FormData => return None,
            };
            Some((
                format!("integration.request.{}.{}", location, param.name),
                format!("method.request.{}.{}", location, param.name),
            ))
        })
        .collect()
}

fn header_target(name: &str) -> String {
    format!("integration.request.header.{}", name)
}

fn header_source(name: &str) -> String {
    format!("method.request.header.{}", name)
}

/// Responses for every mapped status code
pub fn integration_responses() -> BTreeMap<String, IntegrationResponse> {
    MAPPED_STATUS_CODES
        .iter()
        .map(|code| {
            let response = IntegrationResponse {
                status_code: code.to_string(),
                response_parameters: BTreeMap::from([(
                    format!("method.response.header.{}", ALLOW_ORIGIN_HEADER),
                    "'*'".to_string(),
                )]),
                response_templates: BTreeMap::new(),
            };
            (code.to_string(), response)
        })
        .collect()
}

fn rewrite_operation_refs(op: &mut Operation, renames: &DefinitionRenames) {
    for param in op.parameters.iter_mut() {
        if let ParameterOrRef::Parameter(param) = param {
            if let Some(schema) = param.schema.as_mut() {
                renames.rewrite_schema(schema);
            }
        }
    }
    for schema in op.responses.values_mut().filter_map(|r| r.schema.as_mut()) {
        renames.rewrite_schema(schema);
    }
}

/// Declare the CORS origin header on every inline response
fn add_response_cors_headers(op: &mut Operation) {
    for response in op.responses.values_mut() {
        if response.ref_path.is_some() {
            continue;
        }
        response
            .headers
            .insert(ALLOW_ORIGIN_HEADER.to_string(), Header::string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apigw_publisher_common::AuthMode;
    use serde_json::json;

    #[test]
    fn test_uri_scheme_handling() {
        let config = RenderConfig::new("gw");

        let target = IntegrationTarget::new(&config, "backend.internal/api/");
        assert_eq!(target.uri("/pets"), "http://backend.internal/api/pets");

        let target = IntegrationTarget::new(&config, "https://backend.internal");
        assert_eq!(target.uri("/pets"), "https://backend.internal/pets");
    }

    #[test]
    fn test_request_parameter_mapping() {
        let params: Vec<Parameter> = serde_json::from_value(json!([
            {"name": "id", "in": "path", "required": true, "type": "string"},
            {"name": "limit", "in": "query", "type": "integer"},
            {"name": "X-Trace", "in": "header", "type": "string"},
            {"name": "body", "in": "body", "schema": {"type": "object"}}
        ]))
        .unwrap();

        let mapping = request_parameter_mapping(&params);

        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping["integration.request.path.id"], "method.request.path.id");
        assert_eq!(
            mapping["integration.request.querystring.limit"],
            "method.request.querystring.limit"
        );
        assert_eq!(
            mapping["integration.request.header.X-Trace"],
            "method.request.header.X-Trace"
        );
    }

    #[test]
    fn test_integration_responses_cover_mapped_codes() {
        let responses = integration_responses();
        let codes: Vec<&str> = responses.keys().map(String::as_str).collect();
        assert_eq!(codes, MAPPED_STATUS_CODES.to_vec());
        assert_eq!(
            responses["424"].response_parameters["method.response.header.Access-Control-Allow-Origin"],
            "'*'"
        );
    }

    #[test]
    fn test_declared_headers_are_not_duplicated() {
        let mut doc: Swagger = serde_json::from_value(json!({
            "swagger": "2.0",
            "info": {"title": "t", "version": "1"},
            "parameters": {
                "org": {"name": "Organisation-Id", "in": "header", "type": "string"}
            },
            "paths": {
                "/accounts": {
                    "get": {
                        "parameters": [
                            {"$ref": "#/parameters/org"},
                            {"name": "Accept", "in": "header", "type": "string"}
                        ],
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        }))
        .unwrap();

        let config = RenderConfig::new("gw").with_custom_headers(["organisation-id"]);
        let target = IntegrationTarget::new(&config, "backend");
        let report = integrate_paths(&mut doc, &target, &DefinitionRenames::default());

        assert_eq!(report.integrated, 1);
        let get = doc.paths["/accounts"].get.as_ref().unwrap();
        let names: Vec<&str> = get.inline_parameters().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Accept", "content-type"]);

        let Some(Integration::Http(http)) = &get.extensions.integration else {
            panic!("expected http integration");
        };
        assert_eq!(
            http.request_parameters["integration.request.header.organisation-id"],
            "method.request.header.organisation-id"
        );
        assert_eq!(
            http.request_parameters["integration.request.header.accept"],
            "method.request.header.accept"
        );
    }

    fn accounts_doc() -> Swagger {
        serde_json::from_value(json!({
            "swagger": "2.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/accounts": {
                    "get": {"responses": {"200": {"description": "ok"}}},
                    "post": {
                        "x-auth-disabled": true,
                        "responses": {"201": {"description": "created"}}
                    }
                }
            }
        }))
        .unwrap()
    }

    fn http_integration(op: &Operation) -> &HttpIntegration {
        match &op.extensions.integration {
            Some(Integration::Http(http)) => http,
            other => panic!("expected http integration, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_injected_headers_added_once() {
        let mut doc = accounts_doc();
        let mut config = RenderConfig::new("gw");
        config.custom_headers = vec![
            "organisation-id".to_string(),
            "Organisation-Id".to_string(),
            "Content-Type".to_string(),
        ];
        let target = IntegrationTarget::new(&config, "backend");
        integrate_paths(&mut doc, &target, &DefinitionRenames::default());

        let get = doc.paths["/accounts"].get.as_ref().unwrap();
        let names: Vec<&str> = get.inline_parameters().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["organisation-id", "Content-Type", "accept"]);
        assert!(get.inline_parameters().all(|p| p.location == ParameterLocation::Header));
        let http = http_integration(get);
        assert!(http
            .request_parameters
            .contains_key("integration.request.header.Content-Type"));
        assert!(!http
            .request_parameters
            .contains_key("integration.request.header.Organisation-Id"));
        assert!(!http
            .request_parameters
            .contains_key("integration.request.header.content-type"));

        integrate_paths(&mut doc, &target, &DefinitionRenames::default());
        let get = doc.paths["/accounts"].get.as_ref().unwrap();
        assert_eq!(get.parameters.len(), 3);
    }

    #[test]
    fn test_authorizer_context_forwarded_on_secured_operations() {
        let mut doc = accounts_doc();
        let config = RenderConfig::new("gw").with_auth(AuthMode::ApiKey, "gw-auth", "arn:auth");
        let target = IntegrationTarget::new(&config, "backend");
        let report = integrate_paths(&mut doc, &target, &DefinitionRenames::default());

        assert_eq!(report.unsecured, vec!["POST /accounts".to_string()]);
        let item = &doc.paths["/accounts"];
        let get = http_integration(item.get.as_ref().unwrap());
        assert_eq!(
            get.request_parameters["integration.request.header.X-JWT-Assertion"],
            "context.authorizer.stringKey"
        );
        let post = http_integration(item.post.as_ref().unwrap());
        assert!(!post
            .request_parameters
            .contains_key("integration.request.header.X-JWT-Assertion"));

        let mut doc = accounts_doc();
        let config = config.with_authorizer_context("X-Principal", "context.authorizer.principalId");
        integrate_paths(
            &mut doc,
            &IntegrationTarget::new(&config, "backend"),
            &DefinitionRenames::default(),
        );
        let get = http_integration(doc.paths["/accounts"].get.as_ref().unwrap());
        assert_eq!(
            get.request_parameters["integration.request.header.X-Principal"],
            "context.authorizer.principalId"
        );
        assert!(!get
            .request_parameters
            .contains_key("integration.request.header.X-JWT-Assertion"));
    }

    #[test]
    fn test_no_authorizer_context_without_auth() {
        let mut doc = accounts_doc();
        let config = RenderConfig::new("gw");
        integrate_paths(
            &mut doc,
            &IntegrationTarget::new(&config, "backend"),
            &DefinitionRenames::default(),
        );
        let get = http_integration(doc.paths["/accounts"].get.as_ref().unwrap());
        assert!(get
            .request_parameters
            .keys()
            .all(|key| !key.contains("X-JWT-Assertion")));
    }

    #[test]
    fn test_ref_responses_get_no_cors_header() {
        let mut op: Operation = serde_json::from_value(json!({
            "responses": {
                "200": {"description": "ok", "headers": {"X-Rate": {"type": "integer"}}},
                "404": {"$ref": "#/responses/NotFound"}
            }
        }))
        .unwrap();

        add_response_cors_headers(&mut op);

        let ok = &op.responses["200"];
        assert_eq!(ok.headers.len(), 2);
        assert_eq!(ok.headers[ALLOW_ORIGIN_HEADER].header_type, "string");
        assert_eq!(ok.description.as_deref(), Some("ok"));
        assert!(op.responses["404"].headers.is_empty());
    }
}
