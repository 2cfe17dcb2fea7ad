//! Auto-attach reconcilers.
//!
//! Both reconcilers are inert unless the connection was set up with the
//! auto-attach capability, in which case the schema must also have the
//! `AutoAttach` table.

use super::util::{bridge_name, removed_bridge_name, Side, Stamp};
use log::{debug, info, warn};
use ovsdb_types::{AutoAttach, PathId, AUTOATTACH_ID_EXTERNAL_ID_KEY};
use ovsdb_wire::{AutoAttachRow, Condition, DatabaseSchema, Datum, Mutation, Table, TransactionBuilder};
use southbound_common::{TransactCommand, TransactContext};
use std::collections::BTreeMap;

fn autoattach_row(schema: &DatabaseSchema, autoattach: &AutoAttach, side: Side<'_>) -> AutoAttachRow {
    let mut row = AutoAttachRow::new(schema);
    if let Some(system_name) = &autoattach.system_name {
        side.gated(Table::AutoAttach, "system_name", row.set_system_name(system_name));
    }
    if let Some(description) = &autoattach.system_description {
        side.gated(
            Table::AutoAttach,
            "system_description",
            row.set_system_description(description),
        );
    }
    if !autoattach.mappings.is_empty() {
        let mappings: BTreeMap<i64, i64> = autoattach
            .mappings
            .iter()
            .map(|mapping| (mapping.isid, mapping.vlan))
            .collect();
        side.gated(Table::AutoAttach, "mappings", row.set_mappings(&mappings));
    }
    if let Some(external_ids) = side.external_ids(autoattach.autoattach_external_ids.as_ref(), "AutoAttach") {
        row.set_external_ids(&external_ids);
    }
    row
}

/// Returns true if auto-attach work may be staged on `tx`.
fn supported(enabled: bool, tx: &TransactionBuilder, pending: usize) -> bool {
    if pending == 0 {
        return false;
    }
    if !enabled {
        debug!("AutoAttach is not supported, skipping {} entries", pending);
        return false;
    }
    match tx.schema().check(Table::AutoAttach, "mappings") {
        Ok(()) => true,
        Err(e) => {
            debug!("AutoAttach table is not supported: {}", e);
            false
        }
    }
}

fn bridge_path(autoattach: &AutoAttach) -> Option<PathId> {
    autoattach.bridge_id.clone().map(PathId::Node)
}

/// Creates and updates auto-attach entries.
#[derive(Debug, Default)]
pub struct AutoAttachUpdateCommand {
    enabled: bool,
}

impl AutoAttachUpdateCommand {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl TransactCommand for AutoAttachUpdateCommand {
    fn name(&self) -> &str {
        "AutoAttachUpdateCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        let entries = ctx.changes.created_or_updated::<AutoAttach>();
        if !supported(self.enabled, tx, entries.len()) {
            return;
        }

        for (path, autoattach) in entries {
            let stamp = Stamp::iid(ctx.codec, &path)
                .with(AUTOATTACH_ID_EXTERNAL_ID_KEY, autoattach.autoattach_id.as_str());
            let live = ctx
                .state
                .get_autoattach(&path)
                .and_then(|live| live.autoattach_uuid.map(|uuid| (live, uuid)));

            if let Some((live, uuid)) = live {
                let mut row = autoattach_row(tx.schema(), autoattach, Side::Update(&stamp));
                row.retain_changed(&autoattach_row(tx.schema(), live, Side::Operational));
                if row.is_empty() {
                    debug!("AutoAttach {} is up to date", autoattach.autoattach_id);
                    continue;
                }
                tx.update(row, vec![Condition::uuid_equal(uuid)]);
                tx.comment(format!("Updating AutoAttach table: {}", uuid));
                continue;
            }

            let row = autoattach_row(tx.schema(), autoattach, Side::Insert(&stamp));
            let uuid_name = tx.unique_name(&format!("AutoAttach_{}", autoattach.autoattach_id));
            let autoattach_ref = match tx.insert(row, &uuid_name) {
                Ok(autoattach_ref) => autoattach_ref,
                Err(e) => {
                    warn!("Failed to stage insert of AutoAttach {}: {}", autoattach.autoattach_id, e);
                    continue;
                }
            };
            info!("Creating AutoAttach {} as {}", autoattach.autoattach_id, uuid_name);

            match bridge_path(autoattach).and_then(|bridge| bridge_name(ctx, &bridge)) {
                Some(bridge) => {
                    tx.mutate(
                        Table::Bridge,
                        Mutation::insert("auto_attach", Datum::set([autoattach_ref])),
                        vec![Condition::equal("name", bridge.as_str())],
                    );
                    tx.comment(format!("Bridge: Mutating {} AutoAttach", bridge));
                }
                None => debug!(
                    "AutoAttach {} is not attached to a known bridge",
                    autoattach.autoattach_id
                ),
            }
        }
    }
}

/// Deletes removed auto-attach entries and detaches them from their bridge.
#[derive(Debug, Default)]
pub struct AutoAttachRemovedCommand {
    enabled: bool,
}

impl AutoAttachRemovedCommand {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl TransactCommand for AutoAttachRemovedCommand {
    fn name(&self) -> &str {
        "AutoAttachRemovedCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        let removed = ctx.changes.removed_objects::<AutoAttach>();
        let paths = ctx.changes.removed::<AutoAttach>();
        if !supported(self.enabled, tx, paths.len()) {
            return;
        }

        for path in paths {
            let live = ctx.state.get_autoattach(&path);
            let Some(uuid) = live.and_then(|live| live.autoattach_uuid) else {
                warn!(
                    "Unable to delete AutoAttach {} because it was not found in the operational store",
                    path
                );
                continue;
            };

            let bridge = live
                .and_then(bridge_path)
                .or_else(|| removed.get(&path).and_then(|original| bridge_path(original)))
                .and_then(|bridge| removed_bridge_name(ctx, &bridge));
            if let Some(bridge) = bridge {
                tx.mutate(
                    Table::Bridge,
                    Mutation::delete("auto_attach", Datum::set([uuid])),
                    vec![Condition::equal("name", bridge.as_str())],
                );
                tx.comment(format!("Bridge: Mutating {} AutoAttach", bridge));
            }

            tx.delete(Table::AutoAttach, vec![Condition::uuid_equal(uuid)]);
            tx.comment(format!("AutoAttach: Deleting {}", uuid));
            info!("Deleting AutoAttach {} ({})", path, uuid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transact::test_support::*;
    use ovsdb_types::{AutoAttachMapping, NodeId, OvsdbBridgeAugmentation, OvsdbNodeAugmentation};
    use ovsdb_wire::SchemaVersion;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use southbound_common::{DataChanges, OperationalSnapshot};
    use uuid::Uuid;

    fn aa1(uuid: Option<Uuid>) -> AutoAttach {
        AutoAttach {
            autoattach_id: "aa1".to_string(),
            autoattach_uuid: uuid,
            bridge_id: Some(NodeId::new(BR0)),
            system_name: Some("sw1".to_string()),
            mappings: vec![AutoAttachMapping { isid: 100, vlan: 10 }],
            ..Default::default()
        }
    }

    fn switch_with(autoattach: Vec<AutoAttach>) -> ovsdb_types::Node {
        switch_node(OvsdbNodeAugmentation {
            autoattach,
            ..Default::default()
        })
    }

    fn state_with(autoattach: Vec<AutoAttach>) -> OperationalSnapshot {
        OperationalSnapshot::new([
            bridge_node(live_bridge(OvsdbBridgeAugmentation::named("br0"))),
            switch_with(autoattach),
        ])
    }

    #[test]
    fn test_disabled_reconcilers_emit_nothing() {
        let changes = created([switch_with(vec![aa1(None)])]);
        assert!(run(&AutoAttachUpdateCommand::new(false), &changes, &state_with(Vec::new())).is_empty());

        let removed = DataChanges::new().with_removed(PathId::autoattach(SWITCH, "aa1"));
        let state = state_with(vec![aa1(Some(Uuid::new_v4()))]);
        assert!(run(&AutoAttachRemovedCommand::new(false), &removed, &state).is_empty());
    }

    #[test]
    fn test_enabled_but_old_schema_emits_nothing() {
        let changes = created([switch_with(vec![aa1(None)])]);
        let old = TransactionBuilder::new(DatabaseSchema::open_vswitch(SchemaVersion::new(7, 11, 1)));
        let tx = run_with(old, &AutoAttachUpdateCommand::new(true), &changes, &state_with(Vec::new()));
        assert!(tx.is_empty());
    }

    #[test]
    fn test_new_entry_is_inserted_and_attached_to_bridge() {
        let changes = created([switch_with(vec![aa1(None)])]);
        let tx = run(&AutoAttachUpdateCommand::new(true), &changes, &state_with(Vec::new()));

        let ops = ops_json(&tx);
        assert_eq!(op_names(&tx), vec!["insert", "mutate", "comment"]);
        assert_eq!(ops[0]["table"], "AutoAttach");
        assert_eq!(ops[0]["uuid-name"], "AutoAttach_aa1");
        assert_eq!(ops[0]["row"]["system_name"], "sw1");
        assert_eq!(ops[0]["row"]["mappings"], json!(["map", [[100, 10]]]));
        assert_eq!(
            ops[0]["row"]["external_ids"],
            json!(["map", [
                ["opendaylight-autoattach-id", "aa1"],
                ["opendaylight-iid", iid(&PathId::autoattach(SWITCH, "aa1"))]
            ]])
        );
        assert_eq!(ops[1]["where"], json!([["name", "==", "br0"]]));
        assert_eq!(
            ops[1]["mutations"],
            json!([["auto_attach", "insert", ["named-uuid", "AutoAttach_aa1"]]])
        );
    }

    #[test]
    fn test_existing_entry_is_updated_with_comment() {
        let uuid = Uuid::new_v4();
        let mut desired = aa1(None);
        desired.system_description = Some("edge".to_string());
        let changes = created([switch_with(vec![desired])]);
        let tx = run(&AutoAttachUpdateCommand::new(true), &changes, &state_with(vec![aa1(Some(uuid))]));

        assert_eq!(
            ops_json(&tx),
            vec![
                json!({
                    "op": "update",
                    "table": "AutoAttach",
                    "where": [["_uuid", "==", ["uuid", uuid.to_string()]]],
                    "row": {"system_description": "edge"}
                }),
                json!({"op": "comment", "comment": format!("Updating AutoAttach table: {}", uuid)}),
            ]
        );
    }

    #[test]
    fn test_removed_entry_is_detached_and_deleted() {
        let uuid = Uuid::new_v4();
        let changes = DataChanges::new().with_removed(PathId::autoattach(SWITCH, "aa1"));
        let tx = run(&AutoAttachRemovedCommand::new(true), &changes, &state_with(vec![aa1(Some(uuid))]));

        let ops = ops_json(&tx);
        assert_eq!(op_names(&tx), vec!["mutate", "comment", "delete", "comment"]);
        assert_eq!(
            ops[0]["mutations"],
            json!([["auto_attach", "delete", ["uuid", uuid.to_string()]]])
        );
        assert_eq!(ops[2]["table"], "AutoAttach");
    }

    #[test]
    fn test_removed_entry_without_uuid_is_skipped() {
        let changes = DataChanges::new().with_removed(PathId::autoattach(SWITCH, "aa1"));
        assert!(run(&AutoAttachRemovedCommand::new(true), &changes, &state_with(Vec::new())).is_empty());
    }
}
