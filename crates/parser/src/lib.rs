//! Swagger loading for the API Gateway publisher
//!
//! This crate holds the Swagger 2.0 document model and the two ways of
//! obtaining a document:
//! - [`SwaggerParser`] parses JSON or YAML from bytes or a local file
//! - [`SwaggerFetcher`] downloads a document from the running service

mod fetcher;
pub mod swagger;

pub use fetcher::{SwaggerFetcher, DEFAULT_FETCH_TIMEOUT};
pub use swagger::{Swagger, SwaggerParser};

use thiserror::Error;

/// Errors that can occur while obtaining a Swagger document
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to fetch swagger doc from {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Got error from the server {url} with http code {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fetch and parse operations
pub type Result<T> = std::result::Result<T, FetchError>;
