// Field-level access to form data through its serde representation.
//
// Form data is any serializable record. Single fields are addressed by
// their serialized name, so these helpers round-trip the value through
// a JSON object.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::CoreError;

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, CoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::Field {
            message: format!("form data must serialize to an object, got {other}"),
        }),
    }
}

/// Set `key` on `data`. Fails if the record has no such field.
///
/// A null value may legitimately vanish on the round trip (optional fields
/// skipped when empty), so only non-null values are checked for a home.
pub(crate) fn set_field<T, V>(data: &T, key: &str, value: V) -> Result<T, CoreError>
where
    T: Serialize + DeserializeOwned,
    V: Serialize,
{
    let value = serde_json::to_value(value)?;
    let is_null = value.is_null();
    let mut map = to_object(data)?;
    map.insert(key.to_owned(), value);
    let updated: T = serde_json::from_value(Value::Object(map))?;

    if !is_null && !to_object(&updated)?.contains_key(key) {
        return Err(CoreError::Field {
            message: format!("unknown field '{key}'"),
        });
    }
    Ok(updated)
}

/// Overwrite every field present in `partial`.
pub(crate) fn merge<T, P>(data: &T, partial: &P) -> Result<T, CoreError>
where
    T: Serialize + DeserializeOwned,
    P: Serialize,
{
    let mut map = to_object(data)?;
    map.extend(to_object(partial)?);
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Copy the named fields from `source` into `data`.
pub(crate) fn copy_fields<T>(data: &T, source: &T, fields: &[&str]) -> Result<T, CoreError>
where
    T: Serialize + DeserializeOwned,
{
    let mut map = to_object(data)?;
    let source = to_object(source)?;
    for field in fields {
        match source.get(*field) {
            Some(value) => {
                map.insert((*field).to_owned(), value.clone());
            }
            None => {
                map.remove(*field);
            }
        }
    }
    Ok(serde_json::from_value(Value::Object(map))?)
}
