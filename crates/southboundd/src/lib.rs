//! OVSDB southbound reconciliation daemon.
//!
//! southboundd turns a change notification on the desired topology into
//! one atomic OVSDB `transact` batch per remote switch.
//!
//! # Architecture
//!
//! ```text
//! [desired changes] ─┐
//!                    ├──> [ReconcileDaemon] ──> [TransactInvoker] ──> [OvsdbTransport] ──> [ovsdb-server]
//! [operational] ─────┘      (per connection)     (reconcilers)
//! ```
//!
//! # Key Components
//!
//! - [`transact`]: Entity reconcilers, their fixed-order aggregator and the invoker
//! - [`daemon::ReconcileDaemon`]: One sequential worker per remote connection
//! - [`transport::DryRunTransport`]: Logs batches instead of sending them
//! - [`config`]: TOML configuration
//! - [`audit`]: Structured audit records for submitted batches

pub mod audit;
pub mod config;
pub mod daemon;
pub mod error;
pub mod transact;
pub mod transport;

pub use error::{ConfigError, Result, TransactError};
