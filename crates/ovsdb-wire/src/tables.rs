//! Typed row wrappers for the managed tables.
//!
//! Each wrapper yields a [`Row`] holding only the columns that were set.
//! Setters for columns that do not exist in older schemas check the
//! connected schema version and return
//! [`WireError::SchemaVersionMismatch`](crate::WireError::SchemaVersionMismatch)
//! instead of writing a column the server would reject.

use crate::schema::{DatabaseSchema, Table};
use crate::value::{Atom, Datum};
use crate::WireResult;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Column values of one row of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    table: Table,
    columns: BTreeMap<&'static str, Datum>,
}

impl Row {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            columns: BTreeMap::new(),
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn get(&self, column: &str) -> Option<&Datum> {
        self.columns.get(column)
    }

    pub fn set(&mut self, column: &'static str, value: Datum) {
        self.columns.insert(column, value);
    }

    pub fn remove(&mut self, column: &str) -> Option<Datum> {
        self.columns.remove(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &Datum)> {
        self.columns.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Drops every column whose value already equals the value in `current`.
    pub fn retain_changed(&mut self, current: &Row) {
        self.columns
            .retain(|column, value| current.get(column) != Some(value));
    }

    pub fn named_refs(&self) -> Vec<&str> {
        self.columns.values().flat_map(Datum::named_refs).collect()
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        for (column, value) in &self.columns {
            obj.insert((*column).to_string(), value.to_json());
        }
        Value::Object(obj)
    }
}

/// A typed wrapper around a [`Row`] of a fixed table.
pub trait TypedRow {
    const TABLE: Table;

    fn row(&self) -> &Row;

    fn into_row(self) -> Row;
}

macro_rules! typed_row {
    ($(#[$meta:meta])* $name:ident, $table:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            schema: DatabaseSchema,
            row: Row,
        }

        impl $name {
            pub fn new(schema: &DatabaseSchema) -> Self {
                Self {
                    schema: schema.clone(),
                    row: Row::new($table),
                }
            }

            /// Sets any column, rejecting columns newer than the schema.
            pub fn set_column(&mut self, column: &'static str, value: Datum) -> WireResult<()> {
                self.schema.check($table, column)?;
                self.row.set(column, value);
                Ok(())
            }

            pub fn set_external_ids(&mut self, map: &BTreeMap<String, String>) {
                self.row.set("external_ids", Datum::string_map(map));
            }

            /// Keeps only the columns whose value differs from `current`.
            pub fn retain_changed(&mut self, current: &Self) {
                self.row.retain_changed(&current.row);
            }

            pub fn is_empty(&self) -> bool {
                self.row.is_empty()
            }
        }

        impl TypedRow for $name {
            const TABLE: Table = $table;

            fn row(&self) -> &Row {
                &self.row
            }

            fn into_row(self) -> Row {
                self.row
            }
        }
    };
}

typed_row!(
    /// Row of the `Bridge` table.
    BridgeRow,
    Table::Bridge
);

impl BridgeRow {
    pub fn set_name(&mut self, name: &str) {
        self.row.set("name", Atom::from(name).into());
    }

    pub fn set_fail_mode(&mut self, fail_mode: &str) {
        self.row.set("fail_mode", Datum::set([fail_mode]));
    }

    pub fn set_datapath_type(&mut self, datapath_type: &str) {
        self.row.set("datapath_type", Atom::from(datapath_type).into());
    }

    pub fn set_stp_enable(&mut self, enable: bool) -> WireResult<()> {
        self.set_column("stp_enable", Atom::from(enable).into())
    }

    pub fn set_protocols<'a>(&mut self, protocols: impl IntoIterator<Item = &'a str>) -> WireResult<()> {
        self.set_column("protocols", Datum::set(protocols))
    }

    pub fn set_other_config(&mut self, map: &BTreeMap<String, String>) {
        self.row.set("other_config", Datum::string_map(map));
    }
}

typed_row!(
    /// Row of the `Port` table.
    PortRow,
    Table::Port
);

impl PortRow {
    pub fn set_name(&mut self, name: &str) {
        self.row.set("name", Atom::from(name).into());
    }

    pub fn set_interfaces(&mut self, interfaces: impl IntoIterator<Item = Atom>) {
        self.row.set("interfaces", Datum::set(interfaces));
    }

    pub fn set_tag(&mut self, tag: i64) {
        self.row.set("tag", Datum::set([tag]));
    }

    pub fn set_trunks(&mut self, trunks: impl IntoIterator<Item = i64>) {
        self.row.set("trunks", Datum::set(trunks));
    }

    pub fn set_vlan_mode(&mut self, mode: &str) -> WireResult<()> {
        self.set_column("vlan_mode", Datum::set([mode]))
    }

    pub fn set_qos(&mut self, qos: Atom) {
        self.row.set("qos", Datum::set([qos]));
    }

    pub fn set_other_config(&mut self, map: &BTreeMap<String, String>) {
        self.row.set("other_config", Datum::string_map(map));
    }
}

typed_row!(
    /// Row of the `Interface` table.
    InterfaceRow,
    Table::Interface
);

impl InterfaceRow {
    pub fn set_name(&mut self, name: &str) {
        self.row.set("name", Atom::from(name).into());
    }

    pub fn set_type(&mut self, interface_type: &str) {
        self.row.set("type", Atom::from(interface_type).into());
    }

    pub fn set_ofport(&mut self, ofport: i64) {
        self.row.set("ofport", Datum::set([ofport]));
    }

    pub fn set_ofport_request(&mut self, ofport_request: i64) -> WireResult<()> {
        self.set_column("ofport_request", Datum::set([ofport_request]))
    }

    pub fn set_options(&mut self, map: &BTreeMap<String, String>) {
        self.row.set("options", Datum::string_map(map));
    }

    pub fn set_other_config(&mut self, map: &BTreeMap<String, String>) {
        self.row.set("other_config", Datum::string_map(map));
    }

    pub fn set_lldp(&mut self, map: &BTreeMap<String, String>) -> WireResult<()> {
        self.set_column("lldp", Datum::string_map(map))
    }

    pub fn set_bfd(&mut self, map: &BTreeMap<String, String>) -> WireResult<()> {
        self.set_column("bfd", Datum::string_map(map))
    }

    pub fn set_ingress_policing_rate(&mut self, rate: i64) {
        self.row.set("ingress_policing_rate", Atom::from(rate).into());
    }

    pub fn set_ingress_policing_burst(&mut self, burst: i64) {
        self.row.set("ingress_policing_burst", Atom::from(burst).into());
    }
}

typed_row!(
    /// Row of the `Controller` table.
    ControllerRow,
    Table::Controller
);

impl ControllerRow {
    pub fn set_target(&mut self, target: &str) {
        self.row.set("target", Atom::from(target).into());
    }

    pub fn set_max_backoff(&mut self, max_backoff: Option<i64>) {
        self.row
            .set("max_backoff", Datum::optional(max_backoff.map(Atom::from)));
    }

    pub fn set_inactivity_probe(&mut self, inactivity_probe: Option<i64>) {
        self.row.set(
            "inactivity_probe",
            Datum::optional(inactivity_probe.map(Atom::from)),
        );
    }
}

typed_row!(
    /// Row of the `QoS` table.
    QosRow,
    Table::Qos
);

impl QosRow {
    pub fn set_type(&mut self, qos_type: &str) {
        self.row.set("type", Atom::from(qos_type).into());
    }

    /// Queue number to queue UUID (or temporary name) map.
    pub fn set_queues(&mut self, queues: BTreeMap<i64, Atom>) {
        self.row.set(
            "queues",
            Datum::Map(queues.into_iter().map(|(k, v)| (Atom::Integer(k), v)).collect()),
        );
    }

    pub fn set_other_config(&mut self, map: &BTreeMap<String, String>) {
        self.row.set("other_config", Datum::string_map(map));
    }
}

typed_row!(
    /// Row of the `Queue` table.
    QueueRow,
    Table::Queue
);

impl QueueRow {
    pub fn set_dscp(&mut self, dscp: i64) {
        self.row.set("dscp", Datum::set([dscp]));
    }

    pub fn set_other_config(&mut self, map: &BTreeMap<String, String>) {
        self.row.set("other_config", Datum::string_map(map));
    }
}

typed_row!(
    /// Row of the `AutoAttach` table.
    AutoAttachRow,
    Table::AutoAttach
);

impl AutoAttachRow {
    pub fn set_system_name(&mut self, name: &str) -> WireResult<()> {
        self.set_column("system_name", Atom::from(name).into())
    }

    pub fn set_system_description(&mut self, description: &str) -> WireResult<()> {
        self.set_column("system_description", Atom::from(description).into())
    }

    /// I-SID to VLAN map.
    pub fn set_mappings(&mut self, mappings: &BTreeMap<i64, i64>) -> WireResult<()> {
        self.set_column(
            "mappings",
            Datum::Map(
                mappings
                    .iter()
                    .map(|(k, v)| (Atom::Integer(*k), Atom::Integer(*v)))
                    .collect(),
            ),
        )
    }
}
