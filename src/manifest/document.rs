use crate::error::LoadError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Identity of a resource document, taken from its own fields.
///
/// Example: `{apiVersion: apps/v1, kind: Deployment, metadata: {name: demo-v1, namespace: demo}}`
/// => `Deployment.apps/demo/demo-v1`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DocumentId {
    /// API group from `apiVersion`; empty for the core group.
    pub group: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kind)?;
        if !self.group.is_empty() {
            write!(f, ".{}", self.group)?;
        }
        match &self.namespace {
            Some(ns) => write!(f, "/{}/{}", ns, self.name),
            None => write!(f, "/{}", self.name),
        }
    }
}

/// One parsed resource document. The body is never mutated after parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    /// File name (or `inline:<unit>`) the document was read from.
    pub source: String,
    pub body: Value,
}

impl Document {
    /// Validate a parsed body and extract its identity.
    ///
    /// The body must be a mapping with a non-empty `kind` and `metadata.name`.
    /// A missing `apiVersion` is treated as the core group.
    pub fn from_value(source: &str, index: usize, body: Value) -> Result<Self, LoadError> {
        let malformed = |reason: &str| LoadError::Malformed {
            source_name: source.to_string(),
            index,
            reason: reason.to_string(),
        };

        let map = body
            .as_object()
            .ok_or_else(|| malformed("document is not a mapping"))?;

        let kind = non_empty_str(map, "kind").ok_or_else(|| malformed("missing `kind`"))?;

        let metadata = map
            .get("metadata")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed("missing `metadata` mapping"))?;
        let name =
            non_empty_str(metadata, "name").ok_or_else(|| malformed("missing `metadata.name`"))?;
        let namespace = non_empty_str(metadata, "namespace");
        let group = match map.get("apiVersion") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(v)) => api_group(v),
            Some(_) => return Err(malformed("`apiVersion` is not a string")),
        };

        Ok(Self {
            id: DocumentId {
                group,
                kind,
                namespace,
                name,
            },
            source: source.to_string(),
            body,
        })
    }

    /// Compact JSON encoding of the body. Keys are sorted, so equal bodies
    /// always encode to equal bytes.
    pub fn canonical(&self) -> String {
        self.body.to_string()
    }
}

/// `networking.istio.io/v1beta1` => `networking.istio.io`, `v1` => ``.
fn api_group(api_version: &str) -> String {
    match api_version.trim().rsplit_once('/') {
        Some((group, _)) => group.to_string(),
        None => String::new(),
    }
}

fn non_empty_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
