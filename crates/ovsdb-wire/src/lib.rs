//! Typed transaction surface for the Open_vSwitch database (RFC 7047).
//!
//! This crate provides the pieces reconcilers use to describe changes to
//! a remote switch database without talking to it directly:
//!
//! - [`value`]: Atoms and datums with their JSON encoding
//! - [`schema`]: Table descriptors and schema-version gated columns
//! - [`tables`]: Typed row wrappers, one per managed table
//! - [`operation`]: Insert / update / mutate / delete / comment operations
//! - [`transaction`]: The two-phase [`TransactionBuilder`]
//! - [`result`]: Per-operation results returned by the server
//! - [`transport`]: The [`OvsdbTransport`] seam that executes a batch
//!
//! # Example
//!
//! ```ignore
//! use ovsdb_wire::{Condition, DatabaseSchema, Mutation, Table, TransactionBuilder};
//! use ovsdb_wire::tables::BridgeRow;
//!
//! let mut tx = TransactionBuilder::new(DatabaseSchema::open_vswitch("8.3.0".parse()?));
//! let mut bridge = BridgeRow::new(tx.schema());
//! bridge.set_name("br0");
//! let named = tx.insert(bridge, "Bridge_br0")?;
//! tx.mutate(Table::OpenVSwitch, Mutation::insert("bridges", named.into()), Vec::new());
//! ```

pub mod error;
pub mod operation;
pub mod result;
pub mod schema;
pub mod tables;
pub mod transaction;
pub mod transport;
pub mod value;

pub use error::{WireError, WireResult};
pub use operation::{Condition, Function, Mutation, Mutator, Operation};
pub use result::OperationResult;
pub use schema::{DatabaseSchema, SchemaVersion, Table, UUID_COLUMN};
pub use tables::{
    AutoAttachRow, BridgeRow, ControllerRow, InterfaceRow, PortRow, QosRow, QueueRow, Row, TypedRow,
};
pub use transaction::TransactionBuilder;
pub use transport::OvsdbTransport;
pub use value::{Atom, Datum};
