//! Outgoing payload encoding.
//!
//! A form's transformed value is sent one of three ways: as query
//! parameters (GET/DELETE), as a JSON body, or as multipart form data when
//! it carries a file anywhere in its tree. Nested keys use bracket
//! notation in both flattened encodings: `parent[child]`, `parent[0]`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::HttpMethod;

/// Multipart key used for a file that sits at the root of the payload.
const ROOT_FILE_KEY: &str = "file";

/// A local file attached to a form.
///
/// Serializes to `{"uri", "name", "type"}`; any JSON object with those
/// three string members is treated as a file when encoding a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    /// Local path, optionally with a `file://` scheme.
    pub uri: String,
    /// File name reported to the backend.
    pub name: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime: String,
}

impl FileUpload {
    pub fn new(path: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            uri: path.to_string_lossy().into_owned(),
            name,
            mime: mime.into(),
        }
    }

    /// Filesystem path of the upload.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(self.uri.strip_prefix("file://").unwrap_or(&self.uri))
    }

    /// Recognize a file-like JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_owned);
        Some(Self {
            uri: field("uri")?,
            name: field("name")?,
            mime: field("type")?,
        })
    }
}

/// Returns `true` if `value` contains a file-like object at any depth.
pub fn contains_files(value: &Value) -> bool {
    if FileUpload::from_value(value).is_some() {
        return true;
    }
    match value {
        Value::Array(items) => items.iter().any(contains_files),
        Value::Object(obj) => obj.values().any(contains_files),
        _ => false,
    }
}

/// A single multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEntry {
    Text { key: String, value: String },
    File { key: String, upload: FileUpload },
}

impl FormEntry {
    pub fn key(&self) -> &str {
        match self {
            Self::Text { key, .. } | Self::File { key, .. } => key,
        }
    }
}

/// Flatten a payload into multipart fields.
///
/// Null leaves become empty strings and primitives are stringified. A
/// primitive at the root has no key and is dropped.
pub fn flatten_form(value: &Value) -> Vec<FormEntry> {
    let mut out = Vec::new();
    flatten_into(value, None, &mut out);
    out
}

fn flatten_into(value: &Value, parent: Option<&str>, out: &mut Vec<FormEntry>) {
    if let Some(upload) = FileUpload::from_value(value) {
        out.push(FormEntry::File {
            key: parent.unwrap_or(ROOT_FILE_KEY).to_owned(),
            upload,
        });
        return;
    }

    match value {
        Value::Object(obj) => {
            for (key, child) in obj {
                flatten_into(child, Some(&nested_key(parent, key)), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, Some(&nested_key(parent, &index.to_string())), out);
            }
        }
        Value::Null => {
            if let Some(key) = parent {
                out.push(FormEntry::Text {
                    key: key.to_owned(),
                    value: String::new(),
                });
            }
        }
        primitive => {
            if let Some(key) = parent {
                out.push(FormEntry::Text {
                    key: key.to_owned(),
                    value: primitive_to_string(primitive),
                });
            }
        }
    }
}

/// Flatten a payload into query parameters.
///
/// Same bracket notation as [`flatten_form`], but null leaves are omitted
/// and files have no query representation.
pub fn query_pairs(value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    query_into(value, None, &mut out);
    out
}

fn query_into(value: &Value, parent: Option<&str>, out: &mut Vec<(String, String)>) {
    if FileUpload::from_value(value).is_some() {
        return;
    }
    match value {
        Value::Object(obj) => {
            for (key, child) in obj {
                query_into(child, Some(&nested_key(parent, key)), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                query_into(child, Some(&nested_key(parent, &index.to_string())), out);
            }
        }
        Value::Null => {}
        primitive => {
            if let Some(key) = parent {
                out.push((key.to_owned(), primitive_to_string(primitive)));
            }
        }
    }
}

fn nested_key(parent: Option<&str>, key: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}[{key}]"),
        None => key.to_owned(),
    }
}

fn primitive_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The encoded form of an outgoing request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No body and no query parameters.
    Empty,
    /// Appended to the URL query string.
    Query(Vec<(String, String)>),
    /// Sent as an `application/json` body.
    Json(Value),
    /// Sent as `multipart/form-data`.
    Multipart(Vec<FormEntry>),
}

impl Payload {
    /// Encode `value` for `method`.
    ///
    /// Query-placed methods always flatten to parameters. Body-placed
    /// methods send JSON unless the value carries a file or
    /// `force_multipart` is set.
    pub fn encode(method: HttpMethod, value: &Value, force_multipart: bool) -> Self {
        if method.sends_body() {
            if force_multipart || contains_files(value) {
                Self::Multipart(flatten_form(value))
            } else if value.is_null() {
                Self::Empty
            } else {
                Self::Json(value.clone())
            }
        } else {
            let pairs = query_pairs(value);
            if pairs.is_empty() {
                Self::Empty
            } else {
                Self::Query(pairs)
            }
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sorted(mut entries: Vec<FormEntry>) -> Vec<FormEntry> {
        entries.sort_by(|a, b| a.key().cmp(b.key()));
        entries
    }

    fn text(key: &str, value: &str) -> FormEntry {
        FormEntry::Text {
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn nested_file_forces_multipart() {
        let value = json!({
            "title": "Report",
            "photo": { "file": { "uri": "/tmp/a.png", "name": "a.png", "type": "image/png" } }
        });
        assert!(contains_files(&value));

        let payload = Payload::encode(HttpMethod::Post, &value, false);
        let Payload::Multipart(entries) = &payload else {
            panic!("expected multipart, got {payload:?}");
        };
        let entries = sorted(entries.clone());
        let keys: Vec<&str> = entries.iter().map(FormEntry::key).collect();
        assert_eq!(keys, vec!["photo[file]", "title"]);
        assert_eq!(
            entries[0],
            FormEntry::File {
                key: "photo[file]".into(),
                upload: FileUpload {
                    uri: "/tmp/a.png".into(),
                    name: "a.png".into(),
                    mime: "image/png".into(),
                },
            }
        );
    }

    #[test]
    fn plain_values_stay_json() {
        let value = json!({ "title": "A", "tags": ["x"], "meta": { "n": 1 } });
        assert!(!contains_files(&value));
        assert_eq!(
            Payload::encode(HttpMethod::Put, &value, false),
            Payload::Json(value.clone())
        );
    }

    #[test]
    fn forced_multipart_flattens_everything() {
        let value = json!({
            "name": "x",
            "empty": null,
            "count": 3,
            "done": false,
            "items": [ { "id": 7 }, "b" ]
        });
        let Payload::Multipart(entries) = Payload::encode(HttpMethod::Patch, &value, true) else {
            panic!("expected multipart");
        };
        assert_eq!(
            sorted(entries),
            vec![
                text("count", "3"),
                text("done", "false"),
                text("empty", ""),
                text("items[0][id]", "7"),
                text("items[1]", "b"),
                text("name", "x"),
            ]
        );
    }

    #[test]
    fn file_at_root_uses_file_key() {
        let upload = FileUpload::new("/tmp/report.pdf", "application/pdf");
        let value = serde_json::to_value(&upload).unwrap();
        assert_eq!(
            flatten_form(&value),
            vec![FormEntry::File {
                key: "file".into(),
                upload
            }]
        );
    }

    #[test]
    fn file_in_array_is_detected() {
        let value = json!({ "docs": [ 1, { "uri": "file:///x", "name": "x", "type": "text/plain" } ] });
        assert!(contains_files(&value));
        let entries = flatten_form(&value);
        assert_eq!(entries[1].key(), "docs[1]");
        if let FormEntry::File { upload, .. } = &entries[1] {
            assert_eq!(upload.path(), PathBuf::from("/x"));
        } else {
            panic!("expected file entry");
        }
    }

    #[test]
    fn incomplete_file_shape_is_not_a_file() {
        assert!(!contains_files(&json!({ "uri": "/x", "name": "x" })));
        assert!(!contains_files(&json!({ "uri": 1, "name": "x", "type": "t" })));
    }

    #[test]
    fn get_and_delete_use_query() {
        let value = json!({ "search": "abc", "page": 2, "status": null, "filter": { "ids": [1, 2] } });
        let Payload::Query(mut pairs) = Payload::encode(HttpMethod::Get, &value, false) else {
            panic!("expected query");
        };
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("filter[ids][0]".into(), "1".into()),
                ("filter[ids][1]".into(), "2".into()),
                ("page".into(), "2".into()),
                ("search".into(), "abc".into()),
            ]
        );
        assert_eq!(
            Payload::encode(HttpMethod::Delete, &json!({}), true),
            Payload::Empty
        );
    }
}
