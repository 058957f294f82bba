//! Definition cleanup
//!
//! Removes what the gateway's model importer rejects: property examples,
//! generic wrapper models and language-qualified names.

use crate::refs::{referenced_definitions, strip_namespace, DefinitionRenames};
use apigw_publisher_parser::swagger::{Schema, Swagger};
use tracing::{info, warn};

/// Marker some generators put in nested or paged generic model names
pub const GENERIC_MODEL_MARKER: char = '»';

/// What the cleanup changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionCleanup {
    pub removed: Vec<String>,
    pub renames: DefinitionRenames,
}

/// Clean every definition, then rewrite references to renamed ones
///
/// Per definition, in order: strip property examples, drop unreferenced
/// generic models, rename qualified names.
pub fn apply_filters(doc: &mut Swagger) -> DefinitionCleanup {
    let referenced = referenced_definitions(doc);
    let names: Vec<String> = doc.definitions.keys().cloned().collect();
    let mut cleanup = DefinitionCleanup::default();

    for name in names {
        let Some(schema) = doc.definitions.get_mut(&name) else {
            continue;
        };
        info!(dto = %name, "Filtering the `example` tag");
        remove_property_examples(schema);

        if name.contains(GENERIC_MODEL_MARKER) {
            if referenced.contains(&name) {
                warn!(dto = %name, "Keeping generic model, it is still referenced");
            } else {
                info!(dto = %name, "Removing unreferenced generic model");
                doc.definitions.remove(&name);
                cleanup.removed.push(name);
                continue;
            }
        }

        if let Some(short) = strip_namespace(&name).map(String::from) {
            if doc.definitions.contains_key(&short) {
                warn!(dto = %name, target = %short, "Cannot rename model, name already taken");
                cleanup.renames.keep(name);
            } else if let Some(schema) = doc.definitions.remove(&name) {
                info!(dto = %name, target = %short, "Renaming qualified model");
                doc.definitions.insert(short.clone(), schema);
                cleanup.renames.record(name, short);
            }
        }
    }
    cleanup.renames.known(doc.definitions.keys().cloned());

    for schema in doc.definitions.values_mut() {
        cleanup.renames.rewrite_schema(schema);
    }
    for schema in doc.parameters.values_mut().filter_map(|p| p.schema.as_mut()) {
        cleanup.renames.rewrite_schema(schema);
    }
    for schema in doc.responses.values_mut().filter_map(|r| r.schema.as_mut()) {
        cleanup.renames.rewrite_schema(schema);
    }

    cleanup
}

/// Strip `example` from every property, at any depth
fn remove_property_examples(schema: &mut Schema) {
    for property in schema.properties.values_mut() {
        property.walk_mut(&mut |s| s.example = None);
    }
    if let Some(items) = schema.items.as_mut() {
        remove_property_examples(items);
    }
    for member in &mut schema.all_of {
        remove_property_examples(member);
    }
}
