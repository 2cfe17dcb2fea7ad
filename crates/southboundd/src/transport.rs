//! Transport that records requests instead of sending them.

use async_trait::async_trait;
use log::info;
use ovsdb_wire::{Operation, OperationResult, OvsdbTransport, WireResult};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Logs every `transact` request and answers as if it had committed.
///
/// Inserts get a fresh UUID, comments an empty result and every other
/// operation a count of one.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    requests: Mutex<Vec<Value>>,
    next_id: AtomicU64,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON-RPC requests seen so far, oldest first.
    pub async fn requests(&self) -> Vec<Value> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl OvsdbTransport for DryRunTransport {
    async fn transact(
        &self,
        database: &str,
        operations: Vec<Operation>,
    ) -> WireResult<Vec<OperationResult>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut params = vec![json!(database)];
        params.extend(operations.iter().map(Operation::to_json));
        let request = json!({
            "method": "transact",
            "params": params,
            "id": id,
        });
        info!("Dry run transact: {}", request);
        self.requests.lock().await.push(request);

        Ok(operations
            .iter()
            .map(|op| match op {
                Operation::Insert { .. } => OperationResult::Inserted(Uuid::new_v4()),
                Operation::Comment(_) => OperationResult::Empty,
                _ => OperationResult::Count(1),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovsdb_wire::{BridgeRow, DatabaseSchema, SchemaVersion, Table, TransactionBuilder};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_dry_run_records_requests() {
        let mut tx = TransactionBuilder::new(DatabaseSchema::open_vswitch(SchemaVersion::new(8, 3, 0)));
        let mut bridge = BridgeRow::new(tx.schema());
        bridge.set_name("br0");
        tx.insert(bridge, "Bridge_br0").unwrap();
        tx.delete(Table::Queue, Vec::new());
        tx.comment("dry run");

        let transport = DryRunTransport::new();
        let results = transport
            .transact("Open_vSwitch", tx.into_operations())
            .await
            .unwrap();
        assert!(matches!(results[0], OperationResult::Inserted(_)));
        assert_eq!(
            results[1..].to_vec(),
            vec![OperationResult::Count(1), OperationResult::Empty]
        );

        transport.transact("Open_vSwitch", Vec::new()).await.unwrap();
        let requests = transport.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["method"], "transact");
        assert_eq!(requests[0]["params"][0], "Open_vSwitch");
        assert_eq!(requests[0]["params"][1]["uuid-name"], "Bridge_br0");
        assert_eq!(requests[1]["id"], 1);
    }
}
