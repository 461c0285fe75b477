//! Field-keyed validation errors.
//!
//! The backend reports validation failures as a bag of field name to
//! message(s). Each entry is either one message or a list of messages;
//! [`ErrorMessages`] models that explicitly.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key used when the backend returns a bare string instead of a bag.
pub const GENERIC_ERROR_KEY: &str = "error";

/// Messages attached to a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessages {
    Single(String),
    Multiple(Vec<String>),
}

impl ErrorMessages {
    /// The first message, used for inline display.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(msg) => Some(msg),
            Self::Multiple(msgs) => msgs.first().map(String::as_str),
        }
    }

    /// All messages in order.
    pub fn messages(&self) -> Vec<&str> {
        match self {
            Self::Single(msg) => vec![msg.as_str()],
            Self::Multiple(msgs) => msgs.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for ErrorMessages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl From<&str> for ErrorMessages {
    fn from(msg: &str) -> Self {
        Self::Single(msg.to_owned())
    }
}

impl From<String> for ErrorMessages {
    fn from(msg: String) -> Self {
        Self::Single(msg)
    }
}

impl From<Vec<String>> for ErrorMessages {
    fn from(msgs: Vec<String>) -> Self {
        Self::Multiple(msgs)
    }
}

/// Field name → messages.
pub type ValidationErrors = BTreeMap<String, ErrorMessages>;

/// Normalize a backend failure body into a [`ValidationErrors`] map.
///
/// Uses the `errors` member as the bag when present, the body itself
/// otherwise. A string bag lands under [`GENERIC_ERROR_KEY`]. Array entries
/// are stringified element-wise, strings are kept, objects with a `message`
/// are reduced to it, and anything else is dropped.
pub fn normalize_errors(body: Option<&Value>) -> ValidationErrors {
    let mut out = ValidationErrors::new();

    let Some(body) = body.filter(|b| !is_blank(b)) else {
        return out;
    };

    let bag = match body.get("errors") {
        Some(errors) if !errors.is_null() => errors,
        _ => body,
    };

    match bag {
        Value::String(msg) => {
            out.insert(GENERIC_ERROR_KEY.into(), ErrorMessages::Single(msg.clone()));
        }
        Value::Object(entries) => {
            for (field, value) in entries {
                let messages = match value {
                    Value::Array(items) => {
                        ErrorMessages::Multiple(items.iter().map(stringify).collect())
                    }
                    Value::String(msg) => ErrorMessages::Single(msg.clone()),
                    Value::Object(obj) => match obj.get("message") {
                        Some(msg) => ErrorMessages::Single(stringify(msg)),
                        None => continue,
                    },
                    _ => continue,
                };
                out.insert(field.clone(), messages);
            }
        }
        _ => {}
    }

    out
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
