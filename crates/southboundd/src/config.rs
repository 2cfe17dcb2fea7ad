//! Configuration file support for southboundd.
//!
//! Loads and validates the daemon configuration from a TOML file.
//! Default location: /etc/southboundd/southboundd.toml

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::error::ConfigError;
use ovsdb_types::DEFAULT_OVSDB_PORT;
use ovsdb_wire::{DatabaseSchema, SchemaVersion, Table};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/southboundd/southboundd.toml";

/// Remote database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvsdbConfig {
    /// Database name used in transact requests
    #[serde(default = "default_database")]
    pub database: String,

    /// Schema version of the connected switch (`major.minor.patch`)
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Management port of the remote switch
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Reconciliation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Topology id used when serializing path stamps
    #[serde(default = "default_topology_id")]
    pub topology_id: String,

    /// Pending requests per connection before submit reports a full queue
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

/// Optional remote features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilitiesConfig {
    /// Reconcile the AutoAttach table
    #[serde(default)]
    pub autoattach: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON logs through tracing instead of text logs
    #[serde(default)]
    pub json: bool,
}

/// Complete southboundd configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SouthboundConfig {
    #[serde(default)]
    pub ovsdb: OvsdbConfig,

    #[serde(default)]
    pub reconcile: ReconcileConfig,

    #[serde(default)]
    pub capabilities: CapabilitiesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_database() -> String {
    DatabaseSchema::OPEN_VSWITCH.to_string()
}

fn default_schema_version() -> String {
    "8.3.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_OVSDB_PORT
}

fn default_topology_id() -> String {
    "ovsdb:1".to_string()
}

fn default_queue_depth() -> usize {
    16
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for OvsdbConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            schema_version: default_schema_version(),
            port: default_port(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            topology_id: default_topology_id(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl SouthboundConfig {
    /// Loads configuration from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Loads configuration from `path`, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "Config file {} not found, using defaults",
                    path.as_ref().display()
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parsed schema of the connected database.
    pub fn schema(&self) -> Result<DatabaseSchema, ConfigError> {
        let version: SchemaVersion = self
            .ovsdb
            .schema_version
            .parse()
            .map_err(|e: ovsdb_wire::WireError| ConfigError::Invalid(e.to_string()))?;
        Ok(DatabaseSchema::new(self.ovsdb.database.clone(), version))
    }

    /// Audit record of the configuration loaded from `path`.
    pub fn load_record(&self, path: impl AsRef<Path>) -> AuditRecord {
        AuditRecord::new(AuditCategory::ConfigurationChange, "southboundd", "load_config")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(path.as_ref().display().to_string())
            .with_object_type("config_file")
            .with_details(serde_json::json!({
                "database": self.ovsdb.database,
                "schema_version": self.ovsdb.schema_version,
                "topology_id": self.reconcile.topology_id,
                "autoattach": self.capabilities.autoattach,
            }))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ovsdb.database.is_empty() {
            return Err(ConfigError::Invalid("database must not be empty".to_string()));
        }

        if self.ovsdb.port == 0 {
            return Err(ConfigError::Invalid("port must be > 0".to_string()));
        }

        if self.reconcile.topology_id.is_empty() {
            return Err(ConfigError::Invalid(
                "topology_id must not be empty".to_string(),
            ));
        }

        if self.reconcile.queue_depth == 0 {
            return Err(ConfigError::Invalid("queue_depth must be > 0".to_string()));
        }

        let schema = self.schema()?;
        if self.capabilities.autoattach && !schema.supports(Table::AutoAttach, "mappings") {
            return Err(ConfigError::Invalid(format!(
                "autoattach requires schema 7.11.2 or later, configured {}",
                schema.version
            )));
        }

        Ok(())
    }
}
