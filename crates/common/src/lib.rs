//! Common types and utilities for the API Gateway publisher
//!
//! This crate contains the render configuration, the vendor extension names
//! shared by the parser and the renderer, and the configuration error type.

mod render_config;

pub use render_config::{
    AuthMode, RenderConfig, DEFAULT_AUTHORIZER_CONTEXT_HEADER, DEFAULT_AUTHORIZER_CONTEXT_KEY,
    DEFAULT_CONNECTION_TYPE,
};

use thiserror::Error;

/// Operation extension that controls whether a path is published.
pub const PUBLISH_EXTENSION: &str = "x-publish";

/// Operation extension that opts an operation out of the authorizer.
pub const AUTH_DISABLED_EXTENSION: &str = "x-auth-disabled";

/// AWS integration block attached to every operation.
pub const INTEGRATION_EXTENSION: &str = "x-amazon-apigateway-integration";

/// AWS custom authorizer block attached to a security scheme.
pub const AUTHORIZER_EXTENSION: &str = "x-amazon-apigateway-authorizer";

/// AWS authorizer type marker attached to a security scheme.
pub const AUTH_TYPE_EXTENSION: &str = "x-amazon-apigateway-authtype";

/// Errors raised while building or validating configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {setting}: {value}")]
    Invalid { setting: &'static str, value: String },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
