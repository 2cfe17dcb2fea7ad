//! Key/value list entries and the correlation keys stamped into
//! `external_ids` columns.

use crate::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// External-id key holding the serialized path of the desired object.
pub const IID_EXTERNAL_ID_KEY: &str = "opendaylight-iid";
/// External-id key holding the QoS entry id.
pub const QOS_ID_EXTERNAL_ID_KEY: &str = "opendaylight-qos-id";
/// External-id key holding the queue id.
pub const QUEUE_ID_EXTERNAL_ID_KEY: &str = "opendaylight-queue-id";
/// External-id key holding the auto-attach id.
pub const AUTOATTACH_ID_EXTERNAL_ID_KEY: &str = "opendaylight-autoattach-id";

/// One entry of an opaque key/value list.
///
/// Both halves are optional because the desired model may carry partially
/// filled entries; such lists cannot be written and are rejected by
/// [`to_map`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: Option<String>,
    pub value: Option<String>,
}

impl KeyValue {
    /// Creates a complete entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }

    /// Returns true if both key and value are present.
    pub fn is_complete(&self) -> bool {
        self.key.is_some() && self.value.is_some()
    }
}

/// Converts a key/value list to a map.
///
/// Later entries win on duplicate keys.
///
/// # Errors
///
/// Returns [`ModelError::IncompleteEntry`] for the first entry that lacks a
/// key or a value.
pub fn to_map(entries: &[KeyValue]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for entry in entries {
        match (&entry.key, &entry.value) {
            (Some(key), Some(value)) => {
                map.insert(key.clone(), value.clone());
            }
            _ => {
                return Err(ModelError::IncompleteEntry {
                    key: entry.key.clone(),
                    value: entry.value.clone(),
                })
            }
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_map_complete() {
        let entries = vec![KeyValue::new("a", "1"), KeyValue::new("b", "2")];
        let map = to_map(&entries).unwrap();
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_to_map_incomplete_entry() {
        let entries = vec![
            KeyValue::new("a", "1"),
            KeyValue {
                key: Some("b".to_string()),
                value: None,
            },
        ];
        assert_eq!(
            to_map(&entries),
            Err(ModelError::IncompleteEntry {
                key: Some("b".to_string()),
                value: None
            })
        );
    }

    #[test]
    fn test_to_map_duplicate_key_last_wins() {
        let entries = vec![KeyValue::new("a", "1"), KeyValue::new("a", "2")];
        assert_eq!(to_map(&entries).unwrap()["a"], "2");
    }
}
