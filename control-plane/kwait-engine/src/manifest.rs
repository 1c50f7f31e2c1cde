//! Splitting release manifest text into individual Kubernetes objects.
//!
//! Parsing is strict: the first malformed document aborts the whole parse.

use kube::core::{DynamicObject, GroupVersionKind};
use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("document {index}: invalid YAML: {source}")]
    Yaml {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("document {index}: expected a mapping")]
    NotAnObject { index: usize },
    #[error("document {index}: missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },
    #[error("document {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One object declared in a manifest, before kind discovery.
#[derive(Clone, Debug)]
pub struct ManifestObject {
    pub gvk: GroupVersionKind,
    pub name: String,
    pub namespace: Option<String>,
    pub object: DynamicObject,
}

/// Split an `apiVersion` into (group, version); the core group is "".
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

/// Parse multi-document YAML into objects, preserving document order.
/// Empty documents are skipped and `List` documents are flattened in place.
pub fn parse_manifest(
    text: &str,
) -> Result<Vec<ManifestObject>, ManifestError> {
    let mut out = Vec::new();
    for (index, doc) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = serde_yaml::Value::deserialize(doc)
            .map_err(|source| ManifestError::Yaml { index, source })?;
        if value.is_null() {
            continue;
        }
        let json = serde_json::to_value(&value)
            .map_err(|source| ManifestError::Decode { index, source })?;
        collect_objects(index, json, &mut out)?;
    }
    Ok(out)
}

fn collect_objects(
    index: usize,
    json: JsonValue,
    out: &mut Vec<ManifestObject>,
) -> Result<(), ManifestError> {
    let map = json
        .as_object()
        .ok_or(ManifestError::NotAnObject { index })?;
    let api_version = map
        .get("apiVersion")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(ManifestError::MissingField {
            index,
            field: "apiVersion",
        })?;
    let kind = map
        .get("kind")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(ManifestError::MissingField {
            index,
            field: "kind",
        })?;

    if kind.ends_with("List") {
        if let Some(items) = map.get("items").and_then(|i| i.as_array()) {
            for item in items.clone() {
                collect_objects(index, item, out)?;
            }
            return Ok(());
        }
    }

    let (group, version) = split_api_version(api_version);
    let gvk = GroupVersionKind::gvk(group, version, kind);
    let metadata = map.get("metadata");
    let name = metadata
        .and_then(|m| m.get("name"))
        .and_then(|n| n.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(ManifestError::MissingField {
            index,
            field: "metadata.name",
        })?
        .to_string();
    let namespace = metadata
        .and_then(|m| m.get("namespace"))
        .and_then(|n| n.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let object: DynamicObject = serde_json::from_value(json)
        .map_err(|source| ManifestError::Decode { index, source })?;
    out.push(ManifestObject {
        gvk,
        name,
        namespace,
        object,
    });
    Ok(())
}
