//! Per-operation results (RFC 7047 section 5.2).

use crate::{WireError, WireResult};
use serde_json::Value;
use uuid::Uuid;

/// Outcome of one operation of a committed or aborted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Insert succeeded; the server-assigned UUID.
    Inserted(Uuid),
    /// Update, mutate or delete succeeded on `n` rows.
    Count(i64),
    /// Select result row count.
    Rows(usize),
    /// Operation without a result payload (comment, wait, ...).
    Empty,
    /// Operation was not executed because an earlier one failed.
    NotExecuted,
    /// Operation failed.
    Error {
        error: String,
        details: Option<String>,
    },
}

impl OperationResult {
    pub fn is_error(&self) -> bool {
        matches!(self, OperationResult::Error { .. })
    }

    /// Decodes one element of the `transact` result array.
    pub fn from_json(value: &Value) -> WireResult<Self> {
        let obj = match value {
            Value::Null => return Ok(OperationResult::NotExecuted),
            Value::Object(obj) => obj,
            other => return Err(WireError::decode(format!("unexpected result {}", other))),
        };
        if let Some(error) = obj.get("error") {
            return Ok(OperationResult::Error {
                error: error.as_str().unwrap_or_default().to_string(),
                details: obj
                    .get("details")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
        if let Some(uuid) = obj.get("uuid") {
            let text = uuid
                .get(1)
                .and_then(Value::as_str)
                .ok_or_else(|| WireError::decode(format!("malformed uuid {}", uuid)))?;
            let parsed = Uuid::parse_str(text).map_err(|e| WireError::decode(e.to_string()))?;
            return Ok(OperationResult::Inserted(parsed));
        }
        if let Some(count) = obj.get("count") {
            let n = count
                .as_i64()
                .ok_or_else(|| WireError::decode(format!("malformed count {}", count)))?;
            return Ok(OperationResult::Count(n));
        }
        if let Some(rows) = obj.get("rows") {
            return Ok(OperationResult::Rows(
                rows.as_array().map(Vec::len).unwrap_or_default(),
            ));
        }
        Ok(OperationResult::Empty)
    }

    /// Decodes the full `transact` result array.
    pub fn from_json_array(value: &Value) -> WireResult<Vec<Self>> {
        value
            .as_array()
            .ok_or_else(|| WireError::decode("transact result is not an array"))?
            .iter()
            .map(Self::from_json)
            .collect()
    }
}
