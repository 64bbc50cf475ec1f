//! Manifest splitting
//!
//! A manifest is YAML text holding zero or more documents separated by `---`.

use crate::error::EngineError;
use serde::Deserialize;
use serde_yaml::Value;

/// One non-empty document of a manifest, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDocument {
    /// Position among the manifest's non-empty documents, starting at 0
    pub index: usize,
    pub content: Value,
}

/// Split a manifest into its documents.
///
/// Empty and comment-only documents are dropped; the remaining documents keep
/// their order. `<<` merge keys are expanded in place. A malformed stream fails with `EngineError::Parse` and no
/// documents are returned.
pub fn split_documents(manifest: &str) -> Result<Vec<ManifestDocument>, EngineError> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(manifest) {
        let mut content = Value::deserialize(document)?;
        if content.is_null() {
            continue;
        }
        content.apply_merge()?;
        documents.push(ManifestDocument {
            index: documents.len(),
            content,
        });
    }
    Ok(documents)
}

/// Render documents back into a single multi-document manifest
pub fn join_documents<'a>(documents: impl IntoIterator<Item = &'a Value>) -> Result<String, EngineError> {
    let rendered = documents
        .into_iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rendered.join("---\n"))
}
