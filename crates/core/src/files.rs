//! JSON file input and output shared by the binaries.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RewardResult;

/// Read and parse a JSON document from disk.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> RewardResult<T> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn to_pretty_json<T: Serialize>(value: &T) -> RewardResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
