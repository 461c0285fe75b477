// Typed endpoint methods.
//
// Each module adds inherent methods to `ApiClient` for one resource.
// All of them go through `ApiClient::send`, so the bearer credential and
// error classification are shared with form submissions.

pub mod auth;
pub mod projects;
pub mod tasks;
pub mod users;

use serde::Serialize;

use crate::error::Error;
use crate::payload::query_pairs;

/// Flatten a serializable query struct into parameters.
pub(crate) fn to_query<Q: Serialize>(query: &Q) -> Result<Vec<(String, String)>, Error> {
    let value = serde_json::to_value(query).map_err(|e| Error::Payload(e.to_string()))?;
    Ok(query_pairs(&value))
}

/// Serialize a body into a JSON value.
pub(crate) fn to_body<B: Serialize>(body: &B) -> Result<serde_json::Value, Error> {
    serde_json::to_value(body).map_err(|e| Error::Payload(e.to_string()))
}
