//! Swagger 2.0 document model and parser
//!
//! The model covers what the API Gateway renderer reads or rewrites; any other
//! field is carried through untouched.
//!
//! ## Usage
//! ```rust,ignore
//! use apigw_publisher_parser::swagger::SwaggerParser;
//!
//! let parser = SwaggerParser::from_file("swagger.json")?;
//! let doc = parser.into_spec();
//! ```

mod extensions;
mod parser;
mod types;

pub use extensions::*;
pub use parser::SwaggerParser;
pub use types::*;
