//! Loading friend records and identifier lists from JSON files

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::data::{RawRecords, Records, UserId};
use crate::error::{Error, Result};

/// Load a raw records document
///
/// A missing file, a file that is not valid JSON, or a document whose root is
/// not an object is reported as [`Error::DataUnavailable`]; nothing is built
/// from a partially readable file.
pub fn load_raw_records(path: impl AsRef<Path>) -> Result<RawRecords> {
    let path = path.as_ref();
    log::info!("Reading friend records: {}", path.display());

    let value: serde_json::Value = read_json(path)?;
    match value {
        serde_json::Value::Object(map) => {
            log::info!("Loaded {} top-level user records", map.len());
            Ok(map)
        }
        other => Err(Error::DataUnavailable {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object at the root, found {}", json_kind(&other)),
        }),
    }
}

/// Load the list of user ids whose centralities should be reported
pub fn load_user_ids(path: impl AsRef<Path>) -> Result<Vec<UserId>> {
    let path = path.as_ref();
    let ids: Vec<UserId> = read_json(path)?;
    log::info!("Loaded {} user ids of interest from {}", ids.len(), path.display());
    Ok(ids)
}

/// Convert typed records into the raw document shape the graph builder reads
pub fn to_raw(records: &Records) -> Result<RawRecords> {
    match serde_json::to_value(records)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(Error::Json(serde::ser::Error::custom(format!(
            "records serialized to {} instead of an object",
            json_kind(&other)
        )))),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| Error::DataUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_unbounded(&bytes).map_err(|e| Error::DataUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Parse JSON without serde_json's nesting limit
///
/// Friend lists nest one level per hop, so real documents exceed the default
/// limit of 128. The stack grows on demand instead.
fn parse_unbounded<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
