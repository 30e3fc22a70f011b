use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputParseError {
    #[error("Invalid JSON from terraform output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON object from terraform output, got {0}")]
    NotAnObject(String),
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flattens `terraform output -json` (`{"name": {"value": ...}}`) into
/// name -> string. Entries without a `value` field are stringified whole.
pub fn parse_outputs(raw: &str) -> Result<BTreeMap<String, String>, OutputParseError> {
    let parsed: Value = serde_json::from_str(raw)?;
    let Value::Object(entries) = parsed else {
        return Err(OutputParseError::NotAnObject(parsed.to_string()));
    };

    Ok(entries
        .iter()
        .map(|(key, entry)| {
            let value = match entry.get("value") {
                Some(value) if entry.is_object() => value_to_string(value),
                _ => value_to_string(entry),
            };
            (key.clone(), value)
        })
        .collect())
}
