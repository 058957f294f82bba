//! Swagger document fetcher
//!
//! Downloads the vanilla document from the live service, e.g.
//! `http://internal-api.dev.example.com/account-service/v2/api-docs`.

use crate::swagger::{Swagger, SwaggerParser};
use crate::{FetchError, Result};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error, info};

/// Deadline applied to the whole request when none is configured
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for Swagger documents
pub struct SwaggerFetcher {
    client: reqwest::Client,
}

impl SwaggerFetcher {
    /// Create a fetcher whose requests fail after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("apigw-publisher/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Fetch and parse the document served at `url`
    ///
    /// Anything other than `200 OK` is reported as [`FetchError::HttpStatus`].
    pub async fn fetch(&self, url: &str) -> Result<Swagger> {
        info!(url, "Fetching vanilla swagger");

        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json, application/yaml;q=0.9")
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(url, status = status.as_u16(), "Got error from the server");
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(network)?;
        let spec = SwaggerParser::from_slice(&body)?.into_spec();
        debug!(
            url,
            paths = spec.paths.len(),
            definitions = spec.definitions.len(),
            "Parsed swagger document"
        );
        Ok(spec)
    }
}
