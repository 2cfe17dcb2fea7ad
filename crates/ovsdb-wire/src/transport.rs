//! Transport seam that executes a batch against the remote database.

use crate::operation::Operation;
use crate::result::OperationResult;
use crate::WireResult;
use async_trait::async_trait;

/// Executes one transaction on the remote database.
///
/// Implementations own connection handling, JSON-RPC framing and
/// request/response correlation. The server applies the batch atomically,
/// so the result either reports every operation as applied or carries an
/// error entry for the operation that aborted it.
#[async_trait]
pub trait OvsdbTransport: Send + Sync {
    /// Submits `operations` as one `transact` request on `database`.
    async fn transact(
        &self,
        database: &str,
        operations: Vec<Operation>,
    ) -> WireResult<Vec<OperationResult>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WireError;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct EchoTransport {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OvsdbTransport for EchoTransport {
        async fn transact(
            &self,
            database: &str,
            operations: Vec<Operation>,
        ) -> WireResult<Vec<OperationResult>> {
            if database != "Open_vSwitch" {
                return Err(WireError::transport("unknown database"));
            }
            let mut seen = self.seen.lock().map_err(|e| WireError::transport(e.to_string()))?;
            seen.extend(operations.iter().map(|op| op.op_name().to_string()));
            Ok(operations.iter().map(|_| OperationResult::Empty).collect())
        }
    }

    #[tokio::test]
    async fn test_transport_trait_object() {
        let transport: Box<dyn OvsdbTransport> = Box::new(EchoTransport {
            seen: Mutex::new(Vec::new()),
        });
        let results = transport
            .transact("Open_vSwitch", vec![Operation::Comment("x".to_string())])
            .await
            .unwrap();
        assert_eq!(results, vec![OperationResult::Empty]);
        assert!(transport.transact("hardware_vtep", Vec::new()).await.is_err());
    }
}
