//! Helpers shared by the entity reconcilers.

use log::{debug, warn};
use ovsdb_types::{to_map, KeyValue, OvsdbBridgeAugmentation, PathId, IID_EXTERNAL_ID_KEY};
use ovsdb_wire::{Table, WireResult};
use southbound_common::{IdentifierCodec, TransactContext};
use std::collections::BTreeMap;
use std::fmt::Write;

/// External-id pairs a reconciler writes into every row it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Stamp {
    pairs: BTreeMap<&'static str, String>,
}

impl Stamp {
    /// The `opendaylight-iid` pair for `path`.
    pub(crate) fn iid(codec: &dyn IdentifierCodec, path: &PathId) -> Self {
        let mut pairs = BTreeMap::new();
        pairs.insert(IID_EXTERNAL_ID_KEY, codec.serialize(path));
        Self { pairs }
    }

    pub(crate) fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.pairs.insert(key, value.into());
        self
    }

    fn apply(&self, map: &mut BTreeMap<String, String>) {
        for (key, value) in &self.pairs {
            map.insert((*key).to_string(), value.clone());
        }
    }
}

/// Which state a row is being built from.
///
/// Desired rows are built twice per object when it already exists: once
/// from the desired object and once from its operational counterpart, and
/// the two are diffed column by column. Only the desired side reports
/// problems and carries the external-id stamp.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Side<'a> {
    /// Desired object that will be inserted.
    Insert(&'a Stamp),
    /// Desired object whose row already exists.
    Update(&'a Stamp),
    /// Operational counterpart, used only for comparison.
    Operational,
}

impl Side<'_> {
    fn reports(&self) -> bool {
        !matches!(self, Side::Operational)
    }

    /// Converts an optional key/value list to a column map.
    ///
    /// Unset and empty lists yield `None` so the column is left alone. An
    /// incomplete list is logged and also yields `None`.
    pub(crate) fn key_value_map(
        &self,
        entries: Option<&Vec<KeyValue>>,
        table: &str,
        column: &str,
    ) -> Option<BTreeMap<String, String>> {
        let entries = entries.filter(|e| !e.is_empty())?;
        match to_map(entries) {
            Ok(map) => Some(map),
            Err(e) => {
                if self.reports() {
                    warn!("Incomplete OVSDB {} {}: {}", table, column, e);
                }
                None
            }
        }
    }

    /// Builds the `external_ids` column.
    ///
    /// Inserts always carry the stamp. Updates write the column only when
    /// the desired object sets it, and merge the stamp in. Operational rows
    /// are taken as they are.
    pub(crate) fn external_ids(
        &self,
        entries: Option<&Vec<KeyValue>>,
        table: &str,
    ) -> Option<BTreeMap<String, String>> {
        let map = self.key_value_map(entries, table, "external_ids");
        match self {
            Side::Insert(stamp) => {
                let mut map = map.unwrap_or_default();
                stamp.apply(&mut map);
                Some(map)
            }
            Side::Update(stamp) => map.map(|mut map| {
                stamp.apply(&mut map);
                map
            }),
            Side::Operational => map,
        }
    }

    /// Logs a schema-gated column that the connected schema lacks.
    pub(crate) fn gated(&self, table: Table, column: &str, result: WireResult<()>) {
        if let Err(e) = result {
            if self.reports() {
                debug!("{} column for {} table is not supported: {}", column, table, e);
            }
        }
    }
}

/// Name of the bridge enclosing `path` for create and update work.
///
/// The desired bridge of the same change set wins over the snapshot, so a
/// child created together with its bridge targets the bridge being
/// inserted.
pub(crate) fn bridge_name(ctx: &TransactContext<'_>, path: &PathId) -> Option<String> {
    let node = PathId::Node(path.node_id().clone());
    ctx.changes
        .created_or_updated::<OvsdbBridgeAugmentation>()
        .get(&node)
        .and_then(|bridge| bridge.bridge_name.clone())
        .or_else(|| operational_bridge_name(ctx, path))
}

/// Name of the bridge enclosing `path` for removals.
///
/// Falls back to the pre-change bridge when the snapshot no longer has it.
pub(crate) fn removed_bridge_name(ctx: &TransactContext<'_>, path: &PathId) -> Option<String> {
    let node = PathId::Node(path.node_id().clone());
    operational_bridge_name(ctx, path).or_else(|| {
        ctx.changes
            .original::<OvsdbBridgeAugmentation>()
            .get(&node)
            .and_then(|bridge| bridge.bridge_name.clone())
    })
}

/// Returns true if the snapshot bridge enclosing `path` is the bridge
/// that create and update work targets.
///
/// A bridge renamed at the same path is a new row, so its children found
/// in the snapshot belong to the old row.
pub(crate) fn same_bridge(ctx: &TransactContext<'_>, path: &PathId) -> bool {
    let target = bridge_name(ctx, path);
    target.is_some() && target == operational_bridge_name(ctx, path)
}

fn operational_bridge_name(ctx: &TransactContext<'_>, path: &PathId) -> Option<String> {
    ctx.state
        .get_bridge(path)
        .and_then(|bridge| bridge.bridge_name.clone())
}

/// Lowercase hex of the UTF-8 bytes of `id`.
pub(crate) fn hex_id(id: &str) -> String {
    id.bytes().fold(String::with_capacity(id.len() * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

/// Temporary name of a queue insert.
pub(crate) fn queue_named_uuid(queue_id: &str) -> String {
    format!("QUEUE{}", hex_id(queue_id))
}

/// Temporary name of a QoS insert.
pub(crate) fn qos_named_uuid(qos_id: &str) -> String {
    format!("QOS{}", hex_id(qos_id))
}
