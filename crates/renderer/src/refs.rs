//! Definition references
//!
//! Some generators emit language-qualified model names (`model.Account`).
//! The gateway rejects them, so definitions are renamed to the bare type name
//! and every `$ref` pointing at the old key is rewritten.

use apigw_publisher_parser::swagger::{
    Operation, ParameterOrRef, PathItem, Schema, Swagger, DEFINITIONS_REF_PREFIX,
};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::warn;

static QUALIFIED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]*\.)+([A-Za-z_][A-Za-z0-9_]*)$")
        .expect("qualified name pattern is valid")
});

/// Bare type name of a qualified definition name
///
/// `model.Account` -> `Account`, `io.example.v1.Pod` -> `Pod`
pub fn strip_namespace(name: &str) -> Option<&str> {
    QUALIFIED_NAME
        .captures(name)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Outcome of definition renaming, used to rewrite references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionRenames {
    renamed: BTreeMap<String, String>,
    kept: BTreeSet<String>,
    existing: BTreeSet<String>,
}

impl DefinitionRenames {
    pub(crate) fn record(&mut self, from: String, to: String) {
        self.renamed.insert(from, to);
    }

    /// Qualified name left in place because its bare name was taken
    pub(crate) fn keep(&mut self, name: String) {
        self.kept.insert(name);
    }

    /// Definition names present once renaming is done
    pub(crate) fn known(&mut self, names: impl IntoIterator<Item = String>) {
        self.existing.extend(names);
    }

    pub fn renamed(&self) -> &BTreeMap<String, String> {
        &self.renamed
    }

    /// New name for a referenced definition, if it changes
    ///
    /// A qualified ref to a missing definition is shortened unless the bare
    /// name already belongs to another definition.
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if let Some(new_name) = self.renamed.get(name) {
            return Some(new_name);
        }
        if self.kept.contains(name) {
            return None;
        }
        let short = strip_namespace(name)?;
        if self.existing.contains(short) {
            warn!(reference = %name, target = %short, "Leaving dangling reference, bare name belongs to another model");
            return None;
        }
        Some(short)
    }

    /// Rewrite a single `$ref`; returns whether it changed
    pub fn rewrite_ref(&self, ref_path: &mut String) -> bool {
        let rewritten = match ref_path
            .strip_prefix(DEFINITIONS_REF_PREFIX)
            .and_then(|name| self.resolve(name))
        {
            Some(new_name) => format!("{}{}", DEFINITIONS_REF_PREFIX, new_name),
            None => return false,
        };
        *ref_path = rewritten;
        true
    }

    /// Rewrite every `$ref` in a schema tree; returns how many changed
    pub fn rewrite_schema(&self, schema: &mut Schema) -> usize {
        let mut count = 0;
        schema.walk_mut(&mut |s| {
            if let Some(ref_path) = s.ref_path.as_mut() {
                if self.rewrite_ref(ref_path) {
                    count += 1;
                }
            }
        });
        count
    }
}

fn all_operations(item: &PathItem) -> impl Iterator<Item = &Operation> {
    [
        &item.get,
        &item.put,
        &item.post,
        &item.delete,
        &item.options,
        &item.head,
        &item.patch,
    ]
    .into_iter()
    .flatten()
}

/// Names of definitions some `$ref` in the document points at
///
/// A definition referring to itself does not count.
pub fn referenced_definitions(doc: &Swagger) -> BTreeSet<String> {
    let mut referenced = BTreeSet::new();
    let mut record = |owner: Option<&str>, schema: &Schema| {
        schema.walk(&mut |s| {
            if let Some(target) = s.definition_ref() {
                if owner != Some(target) {
                    referenced.insert(target.to_string());
                }
            }
        });
    };

    for (name, schema) in &doc.definitions {
        record(Some(name.as_str()), schema);
    }
    for schema in doc.parameters.values().filter_map(|p| p.schema.as_ref()) {
        record(None, schema);
    }
    for schema in doc.responses.values().filter_map(|r| r.schema.as_ref()) {
        record(None, schema);
    }
    for item in doc.paths.values() {
        let shared = item.parameters.iter().filter_map(ParameterOrRef::as_parameter);
        for schema in shared.filter_map(|p| p.schema.as_ref()) {
            record(None, schema);
        }
        for op in all_operations(item) {
            for schema in op.inline_parameters().filter_map(|p| p.schema.as_ref()) {
                record(None, schema);
            }
            for schema in op.responses.values().filter_map(|r| r.schema.as_ref()) {
                record(None, schema);
            }
        }
    }

    referenced
}
