//! Common reconciliation abstractions for the OVSDB southbound.
//!
//! This crate provides the core traits and types used by every entity
//! reconciler:
//!
//! - [`TransactCommand`]: Base trait for reconcilers that append wire
//!   operations to a shared [`TransactionBuilder`](ovsdb_wire::TransactionBuilder)
//! - [`DataChanges`]: Created-or-updated, original and removed objects of
//!   one change notification, with typed extraction
//! - [`OperationalSnapshot`]: Read-only view of what the remote database
//!   is believed to contain
//! - [`IdentifierCodec`]: Serializes a [`PathId`](ovsdb_types::PathId) for
//!   the external-id stamp
//!
//! # Architecture
//!
//! A reconciliation pass follows a fixed flow:
//!
//! 1. A change notification yields a [`DataChanges`]
//! 2. An [`OperationalSnapshot`] is taken from the remote-database mirror
//! 3. Every registered [`TransactCommand`] runs in a fixed order against
//!    one builder
//! 4. The finished batch is submitted as a single atomic transaction
//!
//! # Example
//!
//! ```ignore
//! use southbound_common::{TransactCommand, TransactContext};
//!
//! struct ProtocolUpdateCommand;
//!
//! impl TransactCommand for ProtocolUpdateCommand {
//!     fn name(&self) -> &str { "ProtocolUpdateCommand" }
//!
//!     fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
//!         for (path, entry) in ctx.changes.created_or_updated::<ProtocolEntry>() {
//!             if ctx.state.get_protocol_entry(&path).is_none() {
//!                 // mutate Bridge.protocols insert ...
//!             }
//!         }
//!     }
//! }
//! ```

mod changes;
mod codec;
mod command;
mod snapshot;

pub use changes::{DataChanges, DataObject, Extract};
pub use codec::{IdentifierCodec, TopologyPathCodec};
pub use command::{TransactCommand, TransactContext};
pub use snapshot::OperationalSnapshot;
