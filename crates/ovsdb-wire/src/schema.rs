//! Table descriptors and schema versions.

use crate::{WireError, WireResult};
use std::fmt;
use std::str::FromStr;

/// Name of the UUID column present in every table.
pub const UUID_COLUMN: &str = "_uuid";

/// Managed tables of the Open_vSwitch schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    OpenVSwitch,
    Bridge,
    Port,
    Interface,
    Controller,
    Qos,
    Queue,
    AutoAttach,
}

impl Table {
    /// Returns the table name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Table::OpenVSwitch => "Open_vSwitch",
            Table::Bridge => "Bridge",
            Table::Port => "Port",
            Table::Interface => "Interface",
            Table::Controller => "Controller",
            Table::Qos => "QoS",
            Table::Queue => "Queue",
            Table::AutoAttach => "AutoAttach",
        }
    }

    /// Returns the first schema version that has `column`, if gated.
    pub fn column_since(&self, column: &str) -> Option<SchemaVersion> {
        let since = match (self, column) {
            (Table::Bridge, "stp_enable") => (6, 2, 0),
            (Table::Bridge, "protocols") => (6, 11, 1),
            (Table::Bridge, "auto_attach") => (7, 11, 2),
            (Table::Interface, "ofport_request") => (6, 2, 0),
            (Table::Interface, "bfd") => (7, 2, 0),
            (Table::Interface, "lldp") => (7, 11, 0),
            (Table::Port, "vlan_mode") => (6, 1, 0),
            (Table::AutoAttach, _) => (7, 11, 2),
            _ => return None,
        };
        Some(SchemaVersion::new(since.0, since.1, since.2))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema version (`major.minor.patch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(WireError::InvalidVersion(s.to_string()));
        }
        let parse = |p: &str| {
            p.parse::<u32>()
                .map_err(|_| WireError::InvalidVersion(s.to_string()))
        };
        Ok(SchemaVersion::new(
            parse(parts[0])?,
            parse(parts[1])?,
            parse(parts[2])?,
        ))
    }
}

/// Schema of the connected database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub name: String,
    pub version: SchemaVersion,
}

impl DatabaseSchema {
    /// Name of the switch configuration database.
    pub const OPEN_VSWITCH: &'static str = "Open_vSwitch";

    pub fn new(name: impl Into<String>, version: SchemaVersion) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Schema descriptor for the Open_vSwitch database at `version`.
    pub fn open_vswitch(version: SchemaVersion) -> Self {
        Self::new(Self::OPEN_VSWITCH, version)
    }

    /// Returns true if `table.column` exists at this schema version.
    pub fn supports(&self, table: Table, column: &str) -> bool {
        table
            .column_since(column)
            .map_or(true, |since| self.version >= since)
    }

    /// Fails with [`WireError::SchemaVersionMismatch`] if `table.column`
    /// is newer than this schema.
    pub fn check(&self, table: Table, column: &'static str) -> WireResult<()> {
        match table.column_since(column) {
            Some(since) if self.version < since => Err(WireError::SchemaVersionMismatch {
                table: table.name(),
                column,
                required: since.to_string(),
                actual: self.version.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version_parse_and_order() {
        let v: SchemaVersion = "7.11.2".parse().unwrap();
        assert_eq!(v, SchemaVersion::new(7, 11, 2));
        assert!(v > "7.2.0".parse().unwrap());
        assert!("7.11".parse::<SchemaVersion>().is_err());
        assert!("7.x.1".parse::<SchemaVersion>().is_err());
    }

    #[test]
    fn test_column_gating() {
        let old = DatabaseSchema::open_vswitch(SchemaVersion::new(7, 0, 0));
        assert!(old.supports(Table::Bridge, "name"));
        assert!(old.supports(Table::Bridge, "protocols"));
        assert!(!old.supports(Table::Interface, "bfd"));
        assert!(!old.supports(Table::AutoAttach, "system_name"));

        let err = old.check(Table::Interface, "lldp").unwrap_err();
        assert_eq!(
            err,
            WireError::SchemaVersionMismatch {
                table: "Interface",
                column: "lldp",
                required: "7.11.0".to_string(),
                actual: "7.0.0".to_string(),
            }
        );
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Table::OpenVSwitch.name(), "Open_vSwitch");
        assert_eq!(Table::Qos.name(), "QoS");
        assert_eq!(Table::AutoAttach.to_string(), "AutoAttach");
    }
}
