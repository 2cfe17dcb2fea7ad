//! Builds and submits one batch per reconciliation pass.

use super::{SchemaCapabilities, TransactCommandAggregator};
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;
use crate::error::{Result, TransactError};
use log::{debug, info, warn};
use ovsdb_wire::{DatabaseSchema, Operation, OperationResult, OvsdbTransport, TransactionBuilder};
use southbound_common::{
    DataChanges, IdentifierCodec, OperationalSnapshot, TransactCommand, TransactContext,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactOutcome {
    /// Nothing to change; no batch was submitted.
    Empty,
    /// The server applied the whole batch.
    Committed {
        operations: usize,
        /// Temporary name and server UUID of every inserted row
        inserted: Vec<(String, Uuid)>,
    },
    /// The server rejected the batch; none of it was applied.
    Rejected {
        operations: usize,
        error: String,
        details: Option<String>,
    },
}

/// Invoker statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactInvokerStats {
    pub passes: u64,
    pub empty_passes: u64,
    pub batches_submitted: u64,
    pub operations_submitted: u64,
    pub rejected_batches: u64,
    pub transport_errors: u64,
}

/// Runs the reconcilers of one connection and submits their batch.
pub struct TransactInvoker {
    connection: String,
    schema: DatabaseSchema,
    transport: Arc<dyn OvsdbTransport>,
    codec: Arc<dyn IdentifierCodec>,
    aggregator: TransactCommandAggregator,
    stats: TransactInvokerStats,
}

impl TransactInvoker {
    pub fn new(
        connection: impl Into<String>,
        schema: DatabaseSchema,
        transport: Arc<dyn OvsdbTransport>,
        codec: Arc<dyn IdentifierCodec>,
        capabilities: SchemaCapabilities,
    ) -> Self {
        Self {
            connection: connection.into(),
            schema,
            transport,
            codec,
            aggregator: TransactCommandAggregator::new(capabilities),
            stats: TransactInvokerStats::default(),
        }
    }

    /// Connection this invoker submits to.
    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn stats(&self) -> &TransactInvokerStats {
        &self.stats
    }

    /// Stages the reconcilers' operations without submitting them.
    pub fn build(&self, changes: &DataChanges, state: &OperationalSnapshot) -> TransactionBuilder {
        let mut tx = TransactionBuilder::new(self.schema.clone());
        let ctx = TransactContext::new(state, changes, self.codec.as_ref());
        self.aggregator.execute(&mut tx, &ctx);
        tx
    }

    fn audit(&self, outcome: AuditOutcome, action: &str, details: serde_json::Value) -> AuditRecord {
        self.audit_as(AuditCategory::Transaction, outcome, action, details)
    }

    fn audit_as(
        &self,
        category: AuditCategory,
        outcome: AuditOutcome,
        action: &str,
        details: serde_json::Value,
    ) -> AuditRecord {
        AuditRecord::new(category, "TransactInvoker", action)
            .with_outcome(outcome)
            .with_object_id(&self.connection)
            .with_object_type("ovsdb_connection")
            .with_correlation_id(format!("{}-{}", self.connection, self.stats.passes))
            .with_details(details)
    }

    /// One record per kind of row change in `operations`, with the number
    /// of operations per table.
    fn resource_records(&self, operations: &[Operation]) -> Vec<AuditRecord> {
        [
            AuditCategory::ResourceCreate,
            AuditCategory::ResourceModify,
            AuditCategory::ResourceDelete,
        ]
        .into_iter()
        .filter_map(|category| {
            let mut tables: BTreeMap<&str, usize> = BTreeMap::new();
            for table in operations
                .iter()
                .filter(|op| resource_category(op) == Some(category))
                .filter_map(Operation::table)
            {
                *tables.entry(table.name()).or_default() += 1;
            }
            if tables.is_empty() {
                return None;
            }
            Some(self.audit_as(
                category,
                AuditOutcome::Success,
                "apply_rows",
                serde_json::json!({ "tables": tables }),
            ))
        })
        .collect()
    }

    /// Runs one reconciliation pass.
    ///
    /// An empty batch is not submitted. A rejected batch is reported as
    /// [`TransactOutcome::Rejected`]; the next pass recomputes it from a
    /// fresh snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the batch references undefined temporary names, if the
    /// transport fails, or if the reply is shorter than the batch.
    pub async fn invoke(
        &mut self,
        changes: &DataChanges,
        state: &OperationalSnapshot,
    ) -> Result<TransactOutcome> {
        self.stats.passes += 1;
        let tx = self.build(changes, state);
        if tx.is_empty() {
            self.stats.empty_passes += 1;
            debug!("Nothing to reconcile on {}", self.connection);
            return Ok(TransactOutcome::Empty);
        }

        let unresolved = tx.unresolved_named_refs();
        if !unresolved.is_empty() {
            let error = TransactError::UnresolvedNamedRefs(unresolved.into_iter().collect());
            audit_log!(self
                .audit(AuditOutcome::Failure, "build_batch", serde_json::json!({ "operations": tx.len() }))
                .with_error(error.to_string()));
            return Err(error);
        }

        debug!("Transact request on {}: {}", self.connection, tx.to_json());
        let operations = tx.into_operations();
        let submitted = operations.len();
        let insert_names: Vec<String> = operations
            .iter()
            .filter_map(|op| match op {
                Operation::Insert { uuid_name, .. } => Some(uuid_name.clone()),
                _ => None,
            })
            .collect();
        let details = serde_json::json!({
            "operations": submitted,
            "inserts": insert_names.len(),
        });

        let resource_records = self.resource_records(&operations);

        self.stats.batches_submitted += 1;
        self.stats.operations_submitted += submitted as u64;
        audit_log!(self.audit(AuditOutcome::InProgress, "submit_batch", details.clone()));
        let results = match self.transport.transact(&self.schema.name, operations).await {
            Ok(results) => results,
            Err(e) => {
                self.stats.transport_errors += 1;
                warn!("Transaction on {} failed: {}", self.connection, e);
                audit_log!(self
                    .audit(AuditOutcome::Failure, "submit_batch", details)
                    .with_error(e.to_string()));
                return Err(e.into());
            }
        };

        if results.len() < submitted {
            warn!(
                "Transaction on {} returned {} results for {} operations",
                self.connection,
                results.len(),
                submitted
            );
            return Err(TransactError::ResultCountMismatch {
                submitted,
                received: results.len(),
            });
        }

        for (index, result) in results.iter().enumerate() {
            if result.is_error() {
                warn!("Transaction on {} result[{}]: {:?}", self.connection, index, result);
            } else {
                debug!("Transaction on {} result[{}]: {:?}", self.connection, index, result);
            }
        }

        if let Some(OperationResult::Error { error, details: reason }) =
            results.iter().find(|result| result.is_error())
        {
            self.stats.rejected_batches += 1;
            audit_log!(self
                .audit(AuditOutcome::Failure, "submit_batch", details)
                .with_error(error.clone()));
            return Ok(TransactOutcome::Rejected {
                operations: submitted,
                error: error.clone(),
                details: reason.clone(),
            });
        }

        let inserted: Vec<(String, Uuid)> = insert_names
            .into_iter()
            .zip(&results)
            .filter_map(|(name, result)| match result {
                OperationResult::Inserted(uuid) => Some((name, *uuid)),
                _ => None,
            })
            .collect();
        info!(
            "Committed {} operations on {} ({} inserts)",
            submitted,
            self.connection,
            inserted.len()
        );
        audit_log!(self.audit(AuditOutcome::Success, "submit_batch", details));
        for record in resource_records {
            audit_log!(record);
        }

        Ok(TransactOutcome::Committed {
            operations: submitted,
            inserted,
        })
    }
}

fn resource_category(op: &Operation) -> Option<AuditCategory> {
    match op {
        Operation::Insert { .. } => Some(AuditCategory::ResourceCreate),
        Operation::Update { .. } | Operation::Mutate { .. } => Some(AuditCategory::ResourceModify),
        Operation::Delete { .. } => Some(AuditCategory::ResourceDelete),
        Operation::Comment(_) => None,
    }
}
