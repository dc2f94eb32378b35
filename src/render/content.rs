//! render::content
//!
//! The content model: target paths mapped to content, plus kustomize
//! aggregation directives.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "$files": { "a.txt": "a\n", "b.json": {"b": "B"} },
//!   "$kustomize": { "dir": { "x.yaml": {"k": "v"} } }
//! }
//! ```
//!
//! Both reserved keys are optional. After [`ContentTree::expand_kustomize`]
//! every aggregation member also appears in `files` under
//! `<dir>/<member>` and the member value is nulled.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from turning content into file bytes.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Structured content for a path whose extension has no serializer.
    #[error("unsupported file type: {path}")]
    UnsupportedFileType { path: String },

    #[error("failed to serialize {path}: {message}")]
    Serialize { path: String, message: String },
}

/// Content of one target file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Raw text, written verbatim.
    Text(String),
    /// Structured value, serialized according to the path's extension.
    Data(serde_json::Value),
}

impl Content {
    /// Serialize this content for the given repository-relative path.
    ///
    /// Text is written as-is. Structured data becomes compact JSON for
    /// `.json` and YAML for `.yaml`/`.yml`.
    ///
    /// # Errors
    ///
    /// - `ContentError::UnsupportedFileType` for structured data under any
    ///   other extension
    /// - `ContentError::Serialize` if the serializer fails
    ///
    /// # Example
    ///
    /// ```
    /// use gitimpart::render::Content;
    /// use serde_json::json;
    ///
    /// let data = Content::Data(json!({"b": "B"}));
    /// assert_eq!(data.serialize_for("b.json").unwrap(), b"{\"b\":\"B\"}");
    /// assert_eq!(data.serialize_for("b.yaml").unwrap(), b"b: B\n");
    /// assert!(data.serialize_for("b.txt").is_err());
    /// ```
    pub fn serialize_for(&self, path: &str) -> Result<Vec<u8>, ContentError> {
        let value = match self {
            Content::Text(text) => return Ok(text.as_bytes().to_vec()),
            Content::Data(value) => value,
        };

        let serialize_err = |message: String| ContentError::Serialize {
            path: path.to_string(),
            message,
        };

        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::to_vec(value).map_err(|e| serialize_err(e.to_string())),
            Some("yaml") | Some("yml") => serde_yaml::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| serialize_err(e.to_string())),
            _ => Err(ContentError::UnsupportedFileType {
                path: path.to_string(),
            }),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Content {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Content::Text(text),
            other => Content::Data(other),
        }
    }
}

/// Rendered, flattened set of target files plus aggregation directives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentTree {
    /// Repository-relative path → content.
    #[serde(rename = "$files", default)]
    pub files: BTreeMap<String, Content>,

    /// Aggregation directory → member path → content (`None` once merged
    /// into `files`).
    #[serde(rename = "$kustomize", default)]
    pub kustomize: BTreeMap<String, BTreeMap<String, Option<Content>>>,
}

impl ContentTree {
    /// Parse the wire format.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Merge every aggregation member into `files` and null it out.
    ///
    /// Members that are already `None` are left alone, so running this on an
    /// expanded tree changes nothing.
    pub fn expand_kustomize(&mut self) {
        for (dir, members) in self.kustomize.iter_mut() {
            for (name, content) in members.iter_mut() {
                if let Some(content) = content.take() {
                    self.files.insert(join_repo_path(dir, name), content);
                }
            }
        }
    }

    /// Paths of aggregation members, relative to their directory, per directory.
    pub fn aggregations(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.kustomize
            .iter()
            .map(|(dir, members)| (dir.as_str(), members.keys().map(String::as_str).collect()))
    }
}

/// Join two repository-relative paths with `/`, dropping `.` and empty parts.
pub(crate) fn join_repo_path(dir: &str, name: &str) -> String {
    dir.split('/')
        .chain(name.split('/'))
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}
