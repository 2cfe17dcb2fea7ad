//! Reconciler trait.

use crate::{DataChanges, IdentifierCodec, OperationalSnapshot};
use ovsdb_wire::TransactionBuilder;

/// Inputs shared by every reconciler of one pass.
pub struct TransactContext<'a> {
    pub state: &'a OperationalSnapshot,
    pub changes: &'a DataChanges,
    pub codec: &'a dyn IdentifierCodec,
}

impl<'a> TransactContext<'a> {
    pub fn new(
        state: &'a OperationalSnapshot,
        changes: &'a DataChanges,
        codec: &'a dyn IdentifierCodec,
    ) -> Self {
        Self {
            state,
            changes,
            codec,
        }
    }
}

/// A reconciler for one entity kind.
///
/// `execute` only appends operations to `tx`. It never submits, never
/// mutates the snapshot or the change set, and reports per-object problems
/// through the log instead of failing the pass.
pub trait TransactCommand: Send + Sync {
    /// Returns the reconciler name used in logs.
    fn name(&self) -> &str;

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>);
}
