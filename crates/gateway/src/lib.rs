//! API Gateway publishing
//!
//! Publishing is two remote calls: import the rendered document into an
//! existing REST API, then create a deployment for a stage. The calls sit
//! behind [`GatewayApi`] so the orchestration can be tested without AWS.

mod aws;

pub use aws::{AwsApiGateway, AwsSettings, DEFAULT_REGION};

use apigw_publisher_common::ConfigError;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, info};

/// Error types for publishing
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("API Gateway {operation} failed: {message}")]
    RemoteApi {
        operation: &'static str,
        message: String,
    },
}

/// Result type for publishing
pub type Result<T> = std::result::Result<T, PublishError>;

/// How an import treats the API's existing definition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Merge into the existing definition
    #[default]
    Merge,

    /// Replace the existing definition
    Overwrite,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Merge => write!(f, "merge"),
            ImportMode::Overwrite => write!(f, "overwrite"),
        }
    }
}

impl FromStr for ImportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "merge" => Ok(ImportMode::Merge),
            "overwrite" => Ok(ImportMode::Overwrite),
            _ => Err(ConfigError::Invalid {
                setting: "IMPORT_MODE",
                value: s.to_string(),
            }),
        }
    }
}

/// Result of importing a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub rest_api_id: String,
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Result of deploying a stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentReport {
    pub deployment_id: Option<String>,
    pub stage: String,
}

/// Remote API Gateway operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Import a rendered document into an existing REST API
    async fn import(&self, body: &[u8], rest_api_id: &str) -> Result<ImportReport>;

    /// Deploy the REST API's current definition to a stage
    async fn deploy(&self, stage: &str, rest_api_id: &str) -> Result<DeploymentReport>;
}

/// Import the document, then deploy it
///
/// A failed import leaves the stage untouched.
pub async fn publish<G>(
    gateway: &G,
    body: &[u8],
    rest_api_id: &str,
    stage: &str,
) -> Result<(ImportReport, DeploymentReport)>
where
    G: GatewayApi + ?Sized,
{
    info!(rest_api_id, bytes = body.len(), "Importing swagger into API Gateway");
    let imported = gateway.import(body, rest_api_id).await.map_err(|e| {
        error!(rest_api_id, error = %e, "Failed to import swagger");
        e
    })?;

    info!(rest_api_id, stage, "Deploying API Gateway stage");
    let deployed = gateway.deploy(stage, rest_api_id).await.map_err(|e| {
        error!(rest_api_id, stage, error = %e, "Failed to deploy stage");
        e
    })?;

    info!(
        rest_api_id,
        stage,
        deployment_id = deployed.deployment_id.as_deref().unwrap_or("unknown"),
        "Published swagger"
    );
    Ok((imported, deployed))
}
