//! AWS SDK backed gateway

use crate::{DeploymentReport, GatewayApi, ImportMode, ImportReport, PublishError, Result};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_apigateway::error::DisplayErrorContext;
use aws_sdk_apigateway::primitives::Blob;
use aws_sdk_apigateway::types::PutMode;
use aws_sdk_apigateway::Client;
use tracing::{debug, info};

/// Region used when neither the settings nor the environment name one
pub const DEFAULT_REGION: &str = "eu-west-1";

const SESSION_NAME: &str = "apigw-publisher";

/// Connection settings for [`AwsApiGateway`]
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    pub region: Option<String>,

    /// Role ARN to assume through STS before calling API Gateway
    pub assume_role: Option<String>,

    pub import_mode: ImportMode,
}

/// [`GatewayApi`] implementation using `aws-sdk-apigateway`
pub struct AwsApiGateway {
    client: Client,
    import_mode: ImportMode,
}

impl AwsApiGateway {
    /// Load credentials from the default chain, assuming a role if configured
    pub async fn connect(settings: &AwsSettings) -> Self {
        let explicit = settings
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| Region::new(r.to_string()));
        let region = RegionProviderChain::first_try(explicit)
            .or_default_provider()
            .or_else(Region::new(DEFAULT_REGION));

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        debug!(region = ?shared.region(), "Loaded AWS configuration");

        let role = settings
            .assume_role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        let client = match role {
            Some(role_arn) => {
                info!(role = role_arn, "Assuming role for API Gateway calls");
                let provider = AssumeRoleProvider::builder(role_arn)
                    .session_name(SESSION_NAME)
                    .configure(&shared)
                    .build()
                    .await;
                let config = aws_sdk_apigateway::config::Builder::from(&shared)
                    .credentials_provider(provider)
                    .build();
                Client::from_conf(config)
            }
            None => Client::new(&shared),
        };

        Self {
            client,
            import_mode: settings.import_mode,
        }
    }
}

#[async_trait]
impl GatewayApi for AwsApiGateway {
    async fn import(&self, body: &[u8], rest_api_id: &str) -> Result<ImportReport> {
        let mode = match self.import_mode {
            ImportMode::Merge => PutMode::Merge,
            ImportMode::Overwrite => PutMode::Overwrite,
        };

        let output = self
            .client
            .put_rest_api()
            .rest_api_id(rest_api_id)
            .mode(mode)
            .fail_on_warnings(false)
            .body(Blob::new(body.to_vec()))
            .send()
            .await
            .map_err(|e| PublishError::RemoteApi {
                operation: "import",
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(ImportReport {
            rest_api_id: output.id().unwrap_or(rest_api_id).to_string(),
            name: output.name().map(String::from),
            version: output.version().map(String::from),
        })
    }

    async fn deploy(&self, stage: &str, rest_api_id: &str) -> Result<DeploymentReport> {
        let output = self
            .client
            .create_deployment()
            .rest_api_id(rest_api_id)
            .stage_name(stage)
            .send()
            .await
            .map_err(|e| PublishError::RemoteApi {
                operation: "deploy",
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(DeploymentReport {
            deployment_id: output.id().map(String::from),
            stage: stage.to_string(),
        })
    }
}
