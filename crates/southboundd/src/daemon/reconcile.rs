//! ReconcileDaemon implementation.
//!
//! The daemon owns one worker task per remote connection. Each worker
//! drains a bounded queue of [`ReconcileRequest`]s and runs them through
//! its [`TransactInvoker`] one at a time, so a connection never has more
//! than one batch in flight.

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;
use crate::error::{Result, TransactError};
use crate::transact::{TransactInvoker, TransactInvokerStats, TransactOutcome};
use log::{debug, info, warn};
use southbound_common::{DataChanges, OperationalSnapshot};
use std::collections::BTreeMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Configuration for the ReconcileDaemon.
#[derive(Debug, Clone)]
pub struct ReconcileDaemonConfig {
    /// Pending requests per connection
    pub queue_depth: usize,
}

impl Default for ReconcileDaemonConfig {
    fn default() -> Self {
        Self { queue_depth: 16 }
    }
}

/// One reconciliation pass to run on a connection.
#[derive(Debug)]
pub struct ReconcileRequest {
    pub changes: DataChanges,
    pub snapshot: OperationalSnapshot,
    respond_to: Option<oneshot::Sender<Result<TransactOutcome>>>,
}

impl ReconcileRequest {
    pub fn new(changes: DataChanges, snapshot: OperationalSnapshot) -> Self {
        Self {
            changes,
            snapshot,
            respond_to: None,
        }
    }

    /// Attaches a channel that receives the outcome of the pass.
    pub fn with_reply(mut self, respond_to: oneshot::Sender<Result<TransactOutcome>>) -> Self {
        self.respond_to = Some(respond_to);
        self
    }
}

struct ConnectionWorker {
    sender: mpsc::Sender<ReconcileRequest>,
    handle: JoinHandle<TransactInvokerStats>,
}

async fn run_worker(
    mut invoker: TransactInvoker,
    mut receiver: mpsc::Receiver<ReconcileRequest>,
) -> TransactInvokerStats {
    debug!("Reconcile worker for {} started", invoker.connection());
    while let Some(request) = receiver.recv().await {
        let result = invoker.invoke(&request.changes, &request.snapshot).await;
        if let Err(e) = &result {
            warn!("Reconcile pass on {} failed: {}", invoker.connection(), e);
        }
        if let Some(respond_to) = request.respond_to {
            if respond_to.send(result).is_err() {
                debug!("Reconcile caller for {} went away", invoker.connection());
            }
        }
    }
    debug!("Reconcile worker for {} stopped", invoker.connection());
    invoker.stats().clone()
}

/// Coordinates the reconcile workers of every connection.
pub struct ReconcileDaemon {
    config: ReconcileDaemonConfig,
    workers: BTreeMap<String, ConnectionWorker>,
}

impl ReconcileDaemon {
    pub fn new(config: ReconcileDaemonConfig) -> Self {
        Self {
            config,
            workers: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &ReconcileDaemonConfig {
        &self.config
    }

    /// Connections with a running worker.
    pub fn connections(&self) -> Vec<&str> {
        self.workers.keys().map(String::as_str).collect()
    }

    /// Starts a worker for the invoker's connection.
    ///
    /// Returns false, dropping `invoker`, if the connection already has a
    /// worker.
    pub fn register_connection(&mut self, invoker: TransactInvoker) -> bool {
        let connection = invoker.connection().to_string();
        if self.workers.contains_key(&connection) {
            warn!("Connection {} is already registered", connection);
            return false;
        }
        info!(
            "Registering connection {} with queue depth {}",
            connection, self.config.queue_depth
        );

        let (sender, receiver) = mpsc::channel(self.config.queue_depth.max(1));
        let handle = tokio::spawn(run_worker(invoker, receiver));
        self.workers
            .insert(connection.clone(), ConnectionWorker { sender, handle });

        let record = AuditRecord::new(
            AuditCategory::SystemLifecycle,
            "ReconcileDaemon",
            "register_connection",
        )
        .with_outcome(AuditOutcome::Success)
        .with_object_id(&connection)
        .with_object_type("ovsdb_connection")
        .with_details(serde_json::json!({
            "queue_depth": self.config.queue_depth,
        }));
        audit_log!(record);
        true
    }

    fn sender(&self, connection: &str) -> Result<&mpsc::Sender<ReconcileRequest>> {
        self.workers
            .get(connection)
            .map(|worker| &worker.sender)
            .ok_or_else(|| TransactError::UnknownConnection(connection.to_string()))
    }

    /// Queues `request`, waiting for room if the queue is full.
    pub async fn submit(&self, connection: &str, request: ReconcileRequest) -> Result<()> {
        self.sender(connection)?
            .send(request)
            .await
            .map_err(|_| TransactError::WorkerStopped(connection.to_string()))
    }

    /// Queues `request` without waiting.
    ///
    /// A full queue is reported as [`TransactError::QueueFull`] so the
    /// caller can coalesce its changes into a later request.
    pub fn try_submit(&self, connection: &str, request: ReconcileRequest) -> Result<()> {
        self.sender(connection)?
            .try_send(request)
            .map_err(|e| match e {
                TrySendError::Full(_) => TransactError::QueueFull(connection.to_string()),
                TrySendError::Closed(_) => TransactError::WorkerStopped(connection.to_string()),
            })
    }

    /// Runs one pass on `connection` and waits for its outcome.
    pub async fn reconcile(
        &self,
        connection: &str,
        changes: DataChanges,
        snapshot: OperationalSnapshot,
    ) -> Result<TransactOutcome> {
        let (respond_to, reply) = oneshot::channel();
        self.submit(
            connection,
            ReconcileRequest::new(changes, snapshot).with_reply(respond_to),
        )
        .await?;
        reply
            .await
            .map_err(|_| TransactError::WorkerStopped(connection.to_string()))?
    }

    async fn stop_worker(connection: &str, worker: ConnectionWorker) -> Option<TransactInvokerStats> {
        drop(worker.sender);
        match worker.handle.await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("Reconcile worker for {} failed: {}", connection, e);
                None
            }
        }
    }

    /// Stops the worker of `connection` after its queue drains.
    pub async fn remove_connection(&mut self, connection: &str) -> Option<TransactInvokerStats> {
        let worker = self.workers.remove(connection)?;
        info!("Removing connection {}", connection);
        let stats = Self::stop_worker(connection, worker).await;

        let record = AuditRecord::new(
            AuditCategory::SystemLifecycle,
            "ReconcileDaemon",
            "remove_connection",
        )
        .with_outcome(AuditOutcome::Success)
        .with_object_id(connection)
        .with_object_type("ovsdb_connection");
        audit_log!(record);
        stats
    }

    /// Stops every worker after its queue drains.
    pub async fn shutdown(&mut self) -> BTreeMap<String, TransactInvokerStats> {
        info!("Stopping ReconcileDaemon with {} connections", self.workers.len());
        let mut stats = BTreeMap::new();
        for (connection, worker) in std::mem::take(&mut self.workers) {
            if let Some(worker_stats) = Self::stop_worker(&connection, worker).await {
                stats.insert(connection, worker_stats);
            }
        }

        let record = AuditRecord::new(AuditCategory::SystemLifecycle, "ReconcileDaemon", "shutdown")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({
                "connections": stats.len(),
                "batches_submitted": stats.values().map(|s| s.batches_submitted).sum::<u64>(),
            }));
        audit_log!(record);
        stats
    }
}
