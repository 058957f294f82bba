//! Path visibility filter

use apigw_publisher_common::PUBLISH_EXTENSION;
use apigw_publisher_parser::swagger::{PathItem, Swagger};
use tracing::{info, warn};

/// Whether a path should be published
///
/// The first operation (GET, PUT, POST, PATCH, DELETE) carrying `x-publish`
/// decides for the whole path; a path without the marker is visible.
pub fn is_path_visible(path: &str, item: &PathItem) -> bool {
    for (method, op) in item.operations() {
        match op.extensions.flag(PUBLISH_EXTENSION) {
            Some(Ok(visible)) => return visible,
            Some(Err(value)) => warn!(
                path,
                method = %method,
                value = %value,
                "Ignoring unparsable {} marker",
                PUBLISH_EXTENSION
            ),
            None => {}
        }
    }
    true
}

/// Remove invisible paths, returning the removed keys
pub fn filter_paths(doc: &mut Swagger) -> Vec<String> {
    let mut skipped = Vec::new();
    doc.paths.retain(|key, item| {
        let visible = is_path_visible(key, item);
        if visible {
            info!(path = %key, "Publishing ✅");
        } else {
            info!(path = %key, "Skipping publish ❌");
            skipped.push(key.clone());
        }
        visible
    });
    skipped
}
