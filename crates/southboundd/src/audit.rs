//! Audit records for reconciliation batches.
//!
//! Every batch submitted to a remote switch, and every batch the switch
//! rejects, produces one structured [`AuditRecord`]. A committed batch adds
//! one record per kind of row change, and the daemon records the
//! configuration it starts with. Records are emitted
//! through [`audit_log!`](crate::audit_log) on the `audit` tracing target
//! with the full record attached as JSON, so a collector can filter them
//! apart from operational logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audit event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Rows created on the remote switch
    ResourceCreate,
    /// Rows updated or mutated on the remote switch
    ResourceModify,
    /// Rows deleted from the remote switch
    ResourceDelete,
    /// A whole reconciliation batch
    Transaction,
    /// Daemon startup and shutdown
    SystemLifecycle,
    /// Configuration loading
    ConfigurationChange,
    /// Error and failure events
    ErrorCondition,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditCategory::ResourceCreate => write!(f, "RESOURCE_CREATE"),
            AuditCategory::ResourceModify => write!(f, "RESOURCE_MODIFY"),
            AuditCategory::ResourceDelete => write!(f, "RESOURCE_DELETE"),
            AuditCategory::Transaction => write!(f, "TRANSACTION"),
            AuditCategory::SystemLifecycle => write!(f, "SYSTEM_LIFECYCLE"),
            AuditCategory::ConfigurationChange => write!(f, "CONFIGURATION_CHANGE"),
            AuditCategory::ErrorCondition => write!(f, "ERROR_CONDITION"),
        }
    }
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
    InProgress,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Failure => write!(f, "failure"),
            AuditOutcome::InProgress => write!(f, "in_progress"),
        }
    }
}

/// Structured audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// UTC timestamp
    pub timestamp: DateTime<Utc>,

    pub category: AuditCategory,

    /// Component generating the event
    pub source: String,

    pub action: String,

    pub outcome: AuditOutcome,

    /// Object affected, e.g. the connection or a bridge path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// Examples: "ovsdb_connection", "bridge", "transaction"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Groups the records of one reconciliation pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl AuditRecord {
    /// Creates a record stamped with the current time.
    ///
    /// The outcome defaults to `InProgress` until explicitly set.
    pub fn new(
        category: AuditCategory,
        source: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            source: source.into(),
            action: action.into(),
            outcome: AuditOutcome::InProgress,
            object_id: None,
            object_type: None,
            details: None,
            error: None,
            correlation_id: None,
        }
    }

    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    pub fn with_object_type(mut self, obj_type: impl Into<String>) -> Self {
        self.object_type = Some(obj_type.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Sets the error message and marks the outcome as `Failure`.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.outcome = AuditOutcome::Failure;
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization_failed","message":"{}"}}"#, e))
    }
}

/// Emits an [`AuditRecord`] on the `audit` target.
///
/// Success is logged at info, in-progress at debug and failure at warn.
///
/// ```ignore
/// audit_log!(AuditRecord::new(AuditCategory::Transaction, "TransactInvoker", "submit_batch")
///     .with_outcome(AuditOutcome::Success)
///     .with_object_id("tcp:10.0.0.1:6640"));
/// ```
#[macro_export]
macro_rules! audit_log {
    ($record:expr) => {
        let record = $record;
        match record.outcome {
            $crate::audit::AuditOutcome::Success => {
                tracing::info!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::InProgress => {
                tracing::debug!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::Failure => {
                tracing::warn!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    error = record.error.as_deref().unwrap_or(""),
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
        }
    };
}

/// Installs a JSON tracing subscriber.
///
/// `RUST_LOG` overrides `log_level` when set.
pub fn init_logging(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_audit_record_creation() {
        let record = AuditRecord::new(AuditCategory::Transaction, "TransactInvoker", "submit_batch")
            .with_outcome(AuditOutcome::Success)
            .with_object_id("tcp:10.0.0.1:6640")
            .with_object_type("ovsdb_connection");

        assert_eq!(record.category, AuditCategory::Transaction);
        assert_eq!(record.source, "TransactInvoker");
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.object_id.as_deref(), Some("tcp:10.0.0.1:6640"));
    }

    #[test]
    fn test_audit_record_with_error() {
        let record = AuditRecord::new(AuditCategory::ErrorCondition, "TransactInvoker", "submit_batch")
            .with_error("constraint violation");

        assert_eq!(record.outcome, AuditOutcome::Failure);
        assert_eq!(record.error.as_deref(), Some("constraint violation"));
    }

    #[test]
    fn test_audit_record_json_serialization() {
        let record = AuditRecord::new(AuditCategory::Transaction, "TransactInvoker", "submit_batch")
            .with_outcome(AuditOutcome::Success)
            .with_correlation_id("pass-7")
            .with_details(serde_json::json!({
                "inserts": 3,
                "operations": 5
            }));

        let json = record.to_json();
        assert!(json.contains("TRANSACTION"));
        assert!(json.contains("\"inserts\":3"));
        assert!(json.contains("pass-7"));
        assert!(!json.contains("object_id"));
    }

    #[test]
    fn test_audit_display() {
        assert_eq!(AuditCategory::ResourceDelete.to_string(), "RESOURCE_DELETE");
        assert_eq!(AuditOutcome::InProgress.to_string(), "in_progress");
    }
}
