//! Per-connection reconcile workers.

mod reconcile;

pub use reconcile::{ReconcileDaemon, ReconcileDaemonConfig, ReconcileRequest};
