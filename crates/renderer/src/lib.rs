//! Swagger to API Gateway rendering
//!
//! This crate rewrites a vanilla Swagger 2.0 document into the form the
//! AWS API Gateway importer accepts: hidden paths are dropped, the custom
//! authorizer is installed, models are cleaned up, every operation gets a
//! backend integration and, optionally, a CORS preflight operation.

pub mod cors;
pub mod definitions;
pub mod integration;
pub mod refs;
pub mod security;
pub mod visibility;

use apigw_publisher_common::RenderConfig;
use apigw_publisher_parser::swagger::Swagger;
use integration::IntegrationTarget;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

pub use refs::DefinitionRenames;

/// Error types for rendering
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to serialize rendered document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for rendering
pub type Result<T> = std::result::Result<T, RenderError>;

/// What rendering changed, for reporting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub published_paths: Vec<String>,
    pub skipped_paths: Vec<String>,
    pub removed_definitions: Vec<String>,
    pub renamed_definitions: BTreeMap<String, String>,
    pub integrated_operations: usize,

    /// `METHOD path` of operations published without the authorizer
    pub unsecured_operations: Vec<String>,

    /// Paths that received a CORS preflight operation
    pub cors_paths: usize,
}

/// Apply every rendering phase to the document in place
///
/// Phases run strictly in sequence over the same document, so paths removed
/// by the visibility filter are never integrated.
pub fn render_document(doc: &mut Swagger, config: &RenderConfig) -> RenderSummary {
    let mut summary = RenderSummary::default();

    doc.info.title = config.gateway_name.clone();

    summary.skipped_paths = visibility::filter_paths(doc);
    summary.published_paths = doc.paths.keys().cloned().collect();

    security::apply_security_definitions(doc, config);

    let cleanup = definitions::apply_filters(doc);
    summary.removed_definitions = cleanup.removed;
    summary.renamed_definitions = cleanup.renames.renamed().clone();

    let endpoint = config.resolve_endpoint(doc.host.as_deref(), doc.base_path.as_deref());
    debug!(endpoint = %endpoint, "Resolved backend endpoint");
    let target = IntegrationTarget::new(config, endpoint);
    let report = integration::integrate_paths(doc, &target, &cleanup.renames);
    summary.integrated_operations = report.integrated;
    summary.unsecured_operations = report.unsecured;

    if config.cors_enabled {
        summary.cors_paths = cors::add_options_support(doc, config);
    }

    info!(
        published = summary.published_paths.len(),
        skipped = summary.skipped_paths.len(),
        operations = summary.integrated_operations,
        "Rendered swagger for API Gateway"
    );
    summary
}

/// Render the document and serialize it as canonical JSON
pub fn render(mut doc: Swagger, config: &RenderConfig) -> Result<Vec<u8>> {
    render_document(&mut doc, config);
    to_json(&doc)
}

/// Serialize a rendered document
pub fn to_json(doc: &Swagger) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(doc)?;
    debug!(bytes = body.len(), "Serialized rendered swagger");
    Ok(body)
}
