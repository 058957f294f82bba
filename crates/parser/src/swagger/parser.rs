//! Swagger document parser

use super::types::Swagger;
use crate::{FetchError, Result};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Swagger specification parser
///
/// Reads Swagger 2.0 documents in JSON or YAML form.
pub struct SwaggerParser {
    /// Loaded Swagger document
    spec: Swagger,
}

impl SwaggerParser {
    /// Load a Swagger document from a file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = SwaggerParser::from_file("swagger.json")?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read(path.as_ref())?;
        debug!(path = %path.as_ref().display(), bytes = content.len(), "Loaded swagger file");
        Self::from_slice(&content)
    }

    /// Parse raw bytes, trying JSON first and YAML second
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<Swagger>(bytes) {
            Ok(spec) => Self::checked(spec),
            Err(json_err) => {
                let content = std::str::from_utf8(bytes)
                    .map_err(|e| FetchError::Decode(format!("Document is not UTF-8: {}", e)))?;
                if looks_like_json(content) {
                    return Err(FetchError::Decode(format!(
                        "Failed to parse Swagger JSON: {}",
                        json_err
                    )));
                }
                Self::from_yaml(content)
            }
        }
    }

    /// Parse a Swagger document from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: Swagger = serde_json::from_str(json)
            .map_err(|e| FetchError::Decode(format!("Failed to parse Swagger JSON: {}", e)))?;
        Self::checked(spec)
    }

    /// Parse a Swagger document from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: YamlValue = serde_yaml::from_str(yaml)
            .map_err(|e| FetchError::Decode(format!("Failed to parse Swagger YAML: {}", e)))?;
        let spec: Swagger = serde_json::from_value(yaml_to_json(raw)?)
            .map_err(|e| FetchError::Decode(format!("Failed to parse Swagger YAML: {}", e)))?;
        Self::checked(spec)
    }

    fn checked(spec: Swagger) -> Result<Self> {
        if spec.swagger.trim() != "2.0" {
            return Err(FetchError::Decode(format!(
                "Unsupported Swagger version: {}",
                spec.swagger
            )));
        }
        Ok(Self { spec })
    }

    /// Get reference to the underlying document
    pub fn spec(&self) -> &Swagger {
        &self.spec
    }

    /// Take ownership of the parsed document
    pub fn into_spec(self) -> Swagger {
        self.spec
    }
}

fn looks_like_json(content: &str) -> bool {
    matches!(content.trim_start().chars().next(), Some('{') | Some('['))
}

/// YAML allows non-string keys (`200:` is an integer); JSON documents do not.
fn yaml_to_json(value: YamlValue) -> Result<JsonValue> {
    Ok(match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
                    .ok_or_else(|| FetchError::Decode(format!("Unsupported number: {}", n)))?
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut object = serde_json::Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = match key {
                    YamlValue::String(s) => s,
                    YamlValue::Number(n) => n.to_string(),
                    YamlValue::Bool(b) => b.to_string(),
                    other => {
                        return Err(FetchError::Decode(format!(
                            "Unsupported mapping key: {:?}",
                            other
                        )))
                    }
                };
                object.insert(key, yaml_to_json(value)?);
            }
            JsonValue::Object(object)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}
