//! southboundd entry point.
//!
//! Runs one reconciliation pass over JSON topology files and prints the
//! resulting `transact` request. Batches go through the dry-run transport,
//! so nothing is sent to a switch.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use ovsdb_types::{Node, PathId};
use serde::de::DeserializeOwned;
use southbound_common::{DataChanges, DataObject, OperationalSnapshot, TopologyPathCodec};
use southboundd::audit::init_logging;
use southboundd::audit_log;
use southboundd::config::{SouthboundConfig, DEFAULT_CONFIG_PATH};
use southboundd::daemon::{ReconcileDaemon, ReconcileDaemonConfig};
use southboundd::transact::{SchemaCapabilities, TransactInvoker, TransactOutcome};
use southboundd::transport::DryRunTransport;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// OVSDB southbound reconciliation daemon
#[derive(Parser, Debug)]
#[command(name = "southboundd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// JSON array of desired nodes (created or updated)
    #[arg(short = 'd', long)]
    desired: Option<PathBuf>,

    /// JSON array of nodes currently in the remote database
    #[arg(short = 'o', long)]
    operational: Option<PathBuf>,

    /// JSON array of desired nodes as they were before the change
    #[arg(long)]
    original: Option<PathBuf>,

    /// JSON array of removed paths
    #[arg(short = 'r', long)]
    removed: Option<PathBuf>,

    /// Connection name used in logs and audit records
    #[arg(long)]
    connection: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short = 'l', long)]
    log_level: Option<String>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn read_nodes(path: Option<&PathBuf>) -> Result<Vec<Node>> {
    path.map(|path| read_json(path))
        .transpose()
        .map(Option::unwrap_or_default)
}

fn keyed(nodes: Vec<Node>) -> impl Iterator<Item = (PathId, DataObject)> {
    nodes
        .into_iter()
        .map(|node| (PathId::Node(node.node_id.clone()), DataObject::Node(node)))
}

fn load_changes(args: &Args) -> Result<DataChanges> {
    let mut changes = DataChanges::new();
    changes
        .created_or_updated
        .extend(keyed(read_nodes(args.desired.as_ref())?));
    changes
        .original
        .extend(keyed(read_nodes(args.original.as_ref())?));
    if let Some(path) = &args.removed {
        let removed: Vec<PathId> = read_json(path)?;
        changes.removed.extend(removed);
    }
    Ok(changes)
}

async fn run(args: Args, config: SouthboundConfig) -> Result<()> {
    let schema = config.schema()?;
    let changes = load_changes(&args)?;
    let snapshot = OperationalSnapshot::new(read_nodes(args.operational.as_ref())?);
    let connection = args
        .connection
        .unwrap_or_else(|| format!("tcp:127.0.0.1:{}", config.ovsdb.port));

    info!("Schema: {} {}", schema.name, schema.version);
    info!("Topology: {}", config.reconcile.topology_id);
    info!(
        "Changes: {} created or updated, {} original, {} removed",
        changes.created_or_updated.len(),
        changes.original.len(),
        changes.removed.len()
    );
    info!("Operational nodes: {}", snapshot.len());
    if config.capabilities.autoattach {
        info!("AutoAttach: ENABLED");
    }

    let transport = Arc::new(DryRunTransport::new());
    let invoker = TransactInvoker::new(
        connection.clone(),
        schema,
        transport.clone(),
        Arc::new(TopologyPathCodec::new(config.reconcile.topology_id.clone())),
        SchemaCapabilities {
            autoattach: config.capabilities.autoattach,
        },
    );

    let mut daemon = ReconcileDaemon::new(ReconcileDaemonConfig {
        queue_depth: config.reconcile.queue_depth,
    });
    daemon.register_connection(invoker);
    let outcome = daemon.reconcile(&connection, changes, snapshot).await;
    daemon.shutdown().await;

    match outcome? {
        TransactOutcome::Empty => info!("Nothing to reconcile"),
        TransactOutcome::Committed { operations, inserted } => {
            info!("Committed {} operations ({} inserts)", operations, inserted.len())
        }
        TransactOutcome::Rejected { error, details, .. } => {
            anyhow::bail!("batch rejected: {} ({})", error, details.unwrap_or_default())
        }
    }

    for request in transport.requests().await {
        println!("{}", serde_json::to_string_pretty(&request)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match SouthboundConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("southboundd: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    if config.logging.json {
        init_logging(&level);
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&level)).init();
    }

    info!("====================================================================");
    info!("Starting southboundd");
    info!("====================================================================");
    info!("Config: {}", args.config.display());

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        audit_log!(config.load_record(&args.config).with_error(e.to_string()));
        return ExitCode::FAILURE;
    }
    audit_log!(config.load_record(&args.config));

    match run(args, config).await {
        Ok(()) => {
            info!("southboundd finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("southboundd failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
