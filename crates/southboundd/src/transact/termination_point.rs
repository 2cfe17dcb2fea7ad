//! Termination point reconcilers.
//!
//! A termination point is one `Port` row and one `Interface` row. Creation
//! stages the interface first, the port referencing it second, and then
//! attaches the port to its bridge, all in the same batch.

use super::util::{bridge_name, qos_named_uuid, removed_bridge_name, Side, Stamp};
use log::{debug, info, warn};
use ovsdb_types::{OvsdbTerminationPointAugmentation, PathId};
use ovsdb_wire::{
    Atom, Condition, DatabaseSchema, Datum, InterfaceRow, Mutation, PortRow, Table,
    TransactionBuilder,
};
use southbound_common::{TransactCommand, TransactContext};

/// Port and interface name: the explicit name, else the tp-id.
fn tp_name(path: &PathId, tp: &OvsdbTerminationPointAugmentation) -> Option<String> {
    tp.name.clone().or_else(|| match path {
        PathId::TerminationPoint { tp, .. } => Some(tp.clone()),
        _ => None,
    })
}

/// Snapshot counterpart of `path`, if it carries the same name.
fn operational_tp<'a>(
    ctx: &TransactContext<'a>,
    path: &PathId,
    name: &str,
) -> Option<&'a OvsdbTerminationPointAugmentation> {
    ctx.state
        .get_termination_point(path)
        .filter(|live| tp_name(path, live).as_deref() == Some(name))
}

fn interface_row(
    schema: &DatabaseSchema,
    tp: &OvsdbTerminationPointAugmentation,
    side: Side<'_>,
) -> InterfaceRow {
    let mut row = InterfaceRow::new(schema);
    if let Some(interface_type) = tp.interface_type {
        row.set_type(interface_type.as_str());
    }
    if let Some(ofport) = tp.ofport {
        row.set_ofport(i64::from(ofport));
    }
    if let Some(ofport_request) = tp.ofport_request {
        side.gated(
            Table::Interface,
            "ofport_request",
            row.set_ofport_request(i64::from(ofport_request)),
        );
    }
    if let Some(options) = side.key_value_map(tp.options.as_ref(), "Interface", "options") {
        row.set_options(&options);
    }
    if let Some(other_config) =
        side.key_value_map(tp.interface_other_configs.as_ref(), "Interface", "other_config")
    {
        row.set_other_config(&other_config);
    }
    if let Some(external_ids) = side.external_ids(tp.interface_external_ids.as_ref(), "Interface") {
        row.set_external_ids(&external_ids);
    }
    if let Some(lldp) = side.key_value_map(tp.interface_lldp.as_ref(), "Interface", "lldp") {
        side.gated(Table::Interface, "lldp", row.set_lldp(&lldp));
    }
    if let Some(bfd) = side.key_value_map(tp.interface_bfd.as_ref(), "Interface", "bfd") {
        side.gated(Table::Interface, "bfd", row.set_bfd(&bfd));
    }
    if let Some(rate) = tp.ingress_policing_rate {
        row.set_ingress_policing_rate(rate);
    }
    if let Some(burst) = tp.ingress_policing_burst {
        row.set_ingress_policing_burst(burst);
    }
    row
}

fn port_row(schema: &DatabaseSchema, tp: &OvsdbTerminationPointAugmentation, side: Side<'_>) -> PortRow {
    let mut row = PortRow::new(schema);
    if let Some(tag) = tp.vlan_tag {
        row.set_tag(i64::from(tag.as_u16()));
    }
    if !tp.trunks.is_empty() {
        row.set_trunks(tp.trunks.iter().map(|vlan| i64::from(vlan.as_u16())));
    }
    if let Some(vlan_mode) = tp.vlan_mode {
        side.gated(Table::Port, "vlan_mode", row.set_vlan_mode(vlan_mode.as_str()));
    }
    if let Some(other_config) =
        side.key_value_map(tp.port_other_configs.as_ref(), "Port", "other_config")
    {
        row.set_other_config(&other_config);
    }
    if let Some(external_ids) = side.external_ids(tp.port_external_ids.as_ref(), "Port") {
        row.set_external_ids(&external_ids);
    }
    row
}

/// Resolves the QoS row a port should reference.
///
/// The operational UUID is used when known. A QoS insert staged earlier in
/// this batch is referenced by its temporary name. Anything else is left
/// for a later pass, when the QoS row has been observed.
fn desired_qos(tx: &TransactionBuilder, ctx: &TransactContext<'_>, port: &str, qos: &PathId) -> Option<Atom> {
    if let Some(uuid) = ctx.state.get_qos_entry(qos).and_then(|entry| entry.qos_uuid) {
        return Some(Atom::Uuid(uuid));
    }
    if let PathId::QosEntry { qos_id, .. } = qos {
        let staged = qos_named_uuid(qos_id);
        if tx.is_staged(&staged) {
            return Some(Atom::named(staged));
        }
    }
    warn!(
        "QoS entry {} of port {} is not in the operational store yet, deferring its qos column",
        qos, port
    );
    None
}

fn operational_qos(ctx: &TransactContext<'_>, live: &OvsdbTerminationPointAugmentation) -> Option<Atom> {
    live.qos_entry
        .as_ref()
        .and_then(|qos| ctx.state.get_qos_entry(qos))
        .and_then(|entry| entry.qos_uuid)
        .map(Atom::Uuid)
}

/// Creates termination points missing from the snapshot.
#[derive(Debug, Default)]
pub struct TerminationPointCreateCommand;

impl TransactCommand for TerminationPointCreateCommand {
    fn name(&self) -> &str {
        "TerminationPointCreateCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for (path, tp) in ctx.changes.created_or_updated::<OvsdbTerminationPointAugmentation>() {
            let Some(name) = tp_name(&path, tp) else {
                warn!("Termination point at {} has no name, skipping", path);
                continue;
            };
            if operational_tp(ctx, &path, &name).is_some() {
                continue;
            }
            let Some(bridge) = bridge_name(ctx, &path) else {
                warn!("Unable to find the bridge of termination point {}, skipping", path);
                continue;
            };
            let stamp = Stamp::iid(ctx.codec, &path);

            let mut interface = interface_row(tx.schema(), tp, Side::Insert(&stamp));
            interface.set_name(&name);
            let interface_name = tx.unique_name(&format!("Interface_{}", name));
            let interface_ref = match tx.insert(interface, &interface_name) {
                Ok(interface_ref) => interface_ref,
                Err(e) => {
                    warn!("Failed to stage insert of interface {}: {}", name, e);
                    continue;
                }
            };

            let mut port = port_row(tx.schema(), tp, Side::Insert(&stamp));
            port.set_name(&name);
            port.set_interfaces([interface_ref]);
            if let Some(qos) = tp
                .qos_entry
                .as_ref()
                .and_then(|qos| desired_qos(tx, ctx, &name, qos))
            {
                port.set_qos(qos);
            }
            let port_name = tx.unique_name(&format!("Port_{}", name));
            let port_ref = match tx.insert(port, &port_name) {
                Ok(port_ref) => port_ref,
                Err(e) => {
                    warn!("Failed to stage insert of port {}: {}", name, e);
                    continue;
                }
            };

            tx.mutate(
                Table::Bridge,
                Mutation::insert("ports", Datum::set([port_ref])),
                vec![Condition::equal("name", bridge.as_str())],
            );
            info!("Creating termination point {} on bridge {}", name, bridge);
        }
    }
}

/// Updates termination points already present in the snapshot.
#[derive(Debug, Default)]
pub struct TerminationPointUpdateCommand;

impl TransactCommand for TerminationPointUpdateCommand {
    fn name(&self) -> &str {
        "TerminationPointUpdateCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for (path, tp) in ctx.changes.created_or_updated::<OvsdbTerminationPointAugmentation>() {
            let Some(name) = tp_name(&path, tp) else {
                continue;
            };
            let Some(live) = operational_tp(ctx, &path, &name) else {
                continue;
            };
            let stamp = Stamp::iid(ctx.codec, &path);

            let mut interface = interface_row(tx.schema(), tp, Side::Update(&stamp));
            interface.retain_changed(&interface_row(tx.schema(), live, Side::Operational));
            if !interface.is_empty() {
                tx.update(interface, vec![Condition::equal("name", name.as_str())]);
                info!("Updating interface {}", name);
            }

            let mut port = port_row(tx.schema(), tp, Side::Update(&stamp));
            if let Some(qos) = tp
                .qos_entry
                .as_ref()
                .and_then(|qos| desired_qos(tx, ctx, &name, qos))
            {
                port.set_qos(qos);
            }
            let mut current = port_row(tx.schema(), live, Side::Operational);
            if let Some(qos) = operational_qos(ctx, live) {
                current.set_qos(qos);
            }
            port.retain_changed(&current);
            if !port.is_empty() {
                tx.update(port, vec![Condition::equal("name", name.as_str())]);
                info!("Updating port {}", name);
            }
        }
    }
}

/// Deletes removed termination points and detaches them from their bridge.
#[derive(Debug, Default)]
pub struct TerminationPointDeleteCommand;

impl TransactCommand for TerminationPointDeleteCommand {
    fn name(&self) -> &str {
        "TerminationPointDeleteCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for path in ctx.changes.removed::<OvsdbTerminationPointAugmentation>() {
            let Some(live) = ctx.state.get_termination_point(&path) else {
                debug!("Termination point {} is already gone", path);
                continue;
            };
            let Some(port_uuid) = live.port_uuid else {
                warn!("Unable to delete termination point {}: no port UUID in the operational store", path);
                continue;
            };
            let Some(bridge) = removed_bridge_name(ctx, &path) else {
                warn!("Unable to find the bridge of termination point {}, skipping", path);
                continue;
            };
            let name = tp_name(&path, live).unwrap_or_default();

            tx.delete(Table::Port, vec![Condition::uuid_equal(port_uuid)]);
            tx.comment(format!("Bridge: Deleting {} on {}", name, bridge));
            tx.mutate(
                Table::Bridge,
                Mutation::delete("ports", Datum::set([port_uuid])),
                vec![Condition::equal("name", bridge.as_str())],
            );
            info!("Deleting termination point {} from bridge {}", name, bridge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transact::test_support::*;
    use ovsdb_types::{
        InterfaceType, KeyValue, Node, OvsdbBridgeAugmentation, OvsdbNodeAugmentation, QosEntry,
        VlanId, VlanMode,
    };
    use ovsdb_wire::{QosRow, SchemaVersion};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use southbound_common::{DataChanges, OperationalSnapshot};
    use uuid::Uuid;

    fn eth0() -> OvsdbTerminationPointAugmentation {
        OvsdbTerminationPointAugmentation::named("eth0")
    }

    fn node_with(tp: OvsdbTerminationPointAugmentation) -> Node {
        Node::new(BR0)
            .with_bridge(OvsdbBridgeAugmentation::named("br0"))
            .with_termination_point("eth0", tp)
    }

    fn live_br0() -> OperationalSnapshot {
        OperationalSnapshot::new([bridge_node(live_bridge(OvsdbBridgeAugmentation::named("br0")))])
    }

    #[test]
    fn test_create_emits_interface_port_and_bridge_mutate() {
        let changes = created([node_with(eth0())]);
        let tx = run(&TerminationPointCreateCommand, &changes, &live_br0());

        let ops = ops_json(&tx);
        assert_eq!(op_names(&tx), vec!["insert", "insert", "mutate"]);

        assert_eq!(ops[0]["table"], "Interface");
        assert_eq!(ops[0]["row"]["name"], "eth0");
        let interface_name = ops[0]["uuid-name"].as_str().unwrap();

        assert_eq!(ops[1]["table"], "Port");
        assert_eq!(ops[1]["row"]["name"], "eth0");
        assert_eq!(ops[1]["row"]["interfaces"], json!(["named-uuid", interface_name]));
        let port_name = ops[1]["uuid-name"].as_str().unwrap();

        assert_eq!(
            ops[2],
            json!({
                "op": "mutate",
                "table": "Bridge",
                "where": [["name", "==", "br0"]],
                "mutations": [["ports", "insert", ["named-uuid", port_name]]]
            })
        );
        assert!(tx.unresolved_named_refs().is_empty());
    }

    #[test]
    fn test_create_stamps_both_rows() {
        let changes = created([node_with(eth0())]);
        let tx = run(&TerminationPointCreateCommand, &changes, &live_br0());

        let expected = iid(&PathId::termination_point(BR0, "eth0"));
        for op in ops_json(&tx).iter().take(2) {
            assert_eq!(
                op["row"]["external_ids"],
                json!(["map", [["opendaylight-iid", expected.clone()]]])
            );
        }
    }

    #[test]
    fn test_create_copies_interface_and_port_columns() {
        let mut tp = eth0();
        tp.interface_type = Some(InterfaceType::Internal);
        tp.ofport_request = Some(10);
        tp.vlan_tag = Some(VlanId::new(100).unwrap());
        tp.trunks = vec![VlanId::new(10).unwrap(), VlanId::new(20).unwrap()];
        tp.vlan_mode = Some(VlanMode::Trunk);
        tp.options = Some(vec![KeyValue::new("peer", "patch1")]);
        tp.interface_lldp = Some(vec![KeyValue::new("enable", "true")]);
        let changes = created([node_with(tp)]);
        let tx = run(&TerminationPointCreateCommand, &changes, &live_br0());

        let ops = ops_json(&tx);
        let interface = &ops[0]["row"];
        assert_eq!(interface["type"], "internal");
        assert_eq!(interface["ofport_request"], 10);
        assert_eq!(interface["options"], json!(["map", [["peer", "patch1"]]]));
        assert_eq!(interface["lldp"], json!(["map", [["enable", "true"]]]));
        let port = &ops[1]["row"];
        assert_eq!(port["tag"], 100);
        assert_eq!(port["trunks"], json!(["set", [10, 20]]));
        assert_eq!(port["vlan_mode"], "trunk");
    }

    #[test]
    fn test_gated_interface_columns_dropped_on_old_schema() {
        let mut tp = eth0();
        tp.ofport_request = Some(10);
        tp.interface_lldp = Some(vec![KeyValue::new("enable", "true")]);
        tp.interface_bfd = Some(vec![KeyValue::new("enable", "true")]);
        let changes = created([node_with(tp)]);
        let old = TransactionBuilder::new(DatabaseSchema::open_vswitch(SchemaVersion::new(7, 2, 0)));
        let tx = run_with(old, &TerminationPointCreateCommand, &changes, &live_br0());

        let interface = &ops_json(&tx)[0]["row"];
        assert_eq!(interface["ofport_request"], 10);
        assert_eq!(interface["bfd"], json!(["map", [["enable", "true"]]]));
        assert!(interface.get("lldp").is_none());
    }

    #[test]
    fn test_incomplete_options_are_omitted() {
        let mut tp = eth0();
        tp.options = Some(vec![KeyValue {
            key: Some("peer".to_string()),
            value: None,
        }]);
        let changes = created([node_with(tp)]);
        let tx = run(&TerminationPointCreateCommand, &changes, &live_br0());

        assert_eq!(op_names(&tx), vec!["insert", "insert", "mutate"]);
        assert!(ops_json(&tx)[0]["row"].get("options").is_none());
    }

    #[test]
    fn test_create_without_bridge_is_skipped() {
        let node = Node::new(BR0).with_termination_point("eth0", eth0());
        let tx = run(&TerminationPointCreateCommand, &created([node]), &OperationalSnapshot::default());
        assert!(tx.is_empty());
    }

    #[test]
    fn test_qos_reference_deferred_until_observed() {
        let mut tp = eth0();
        tp.qos_entry = Some(PathId::qos_entry(SWITCH, "qos1"));
        let changes = created([node_with(tp)]);
        let tx = run(&TerminationPointCreateCommand, &changes, &live_br0());

        assert!(ops_json(&tx)[1]["row"].get("qos").is_none());
        assert!(tx.unresolved_named_refs().is_empty());
    }

    #[test]
    fn test_qos_reference_uses_staged_insert() {
        let mut tp = eth0();
        tp.qos_entry = Some(PathId::qos_entry(SWITCH, "qos1"));
        let changes = created([node_with(tp)]);

        let mut tx = TransactionBuilder::new(schema());
        let qos = QosRow::new(tx.schema());
        tx.insert(qos, &qos_named_uuid("qos1")).unwrap();
        let tx = run_with(tx, &TerminationPointCreateCommand, &changes, &live_br0());

        let port = tx
            .operations()
            .map(|op| op.to_json())
            .find(|op| op["table"] == "Port")
            .unwrap();
        assert_eq!(port["row"]["qos"], json!(["named-uuid", "QOS716f7331"]));
        assert!(tx.unresolved_named_refs().is_empty());
    }

    #[test]
    fn test_qos_reference_uses_operational_uuid() {
        let qos_uuid = Uuid::new_v4();
        let mut qos = QosEntry {
            qos_id: "qos1".to_string(),
            ..Default::default()
        };
        qos.qos_uuid = Some(qos_uuid);
        let switch = switch_node(OvsdbNodeAugmentation {
            qos_entries: vec![qos],
            ..Default::default()
        });
        let mut state = live_br0();
        state.insert(switch);

        let mut tp = eth0();
        tp.qos_entry = Some(PathId::qos_entry(SWITCH, "qos1"));
        let tx = run(&TerminationPointCreateCommand, &created([node_with(tp)]), &state);
        assert_eq!(
            ops_json(&tx)[1]["row"]["qos"],
            json!(["uuid", qos_uuid.to_string()])
        );
    }

    #[test]
    fn test_update_emits_interface_then_port_by_name() {
        let mut desired = eth0();
        desired.interface_type = Some(InterfaceType::Internal);
        desired.vlan_tag = Some(VlanId::new(200).unwrap());
        let mut live = live_tp(eth0());
        live.interface_type = Some(InterfaceType::System);
        live.vlan_tag = Some(VlanId::new(100).unwrap());

        let changes = created([node_with(desired)]);
        let state = OperationalSnapshot::new([node_with(live)]);
        assert!(run(&TerminationPointCreateCommand, &changes, &state).is_empty());

        let tx = run(&TerminationPointUpdateCommand, &changes, &state);
        assert_eq!(
            ops_json(&tx),
            vec![
                json!({
                    "op": "update",
                    "table": "Interface",
                    "where": [["name", "==", "eth0"]],
                    "row": {"type": "internal"}
                }),
                json!({
                    "op": "update",
                    "table": "Port",
                    "where": [["name", "==", "eth0"]],
                    "row": {"tag": 200}
                }),
            ]
        );
    }

    #[test]
    fn test_unchanged_termination_point_emits_nothing() {
        let mut desired = eth0();
        desired.vlan_tag = Some(VlanId::new(100).unwrap());
        let live = live_tp(desired.clone());

        let changes = created([node_with(desired)]);
        let state = OperationalSnapshot::new([node_with(live)]);
        assert!(run(&TerminationPointUpdateCommand, &changes, &state).is_empty());
        assert!(run(&TerminationPointCreateCommand, &changes, &state).is_empty());
    }

    #[test]
    fn test_delete_emits_port_delete_and_bridge_mutate() {
        let live = live_tp(eth0());
        let port_uuid = live.port_uuid.unwrap();
        let state = OperationalSnapshot::new([node_with(live)]);
        let changes = DataChanges::new().with_removed(PathId::termination_point(BR0, "eth0"));
        let tx = run(&TerminationPointDeleteCommand, &changes, &state);

        let ops = ops_json(&tx);
        assert_eq!(op_names(&tx), vec!["delete", "comment", "mutate"]);
        assert_eq!(ops[0]["table"], "Port");
        assert_eq!(ops[0]["where"], json!([["_uuid", "==", ["uuid", port_uuid.to_string()]]]));
        assert_eq!(ops[2]["where"], json!([["name", "==", "br0"]]));
        assert_eq!(
            ops[2]["mutations"],
            json!([["ports", "delete", ["uuid", port_uuid.to_string()]]])
        );
    }

    #[test]
    fn test_delete_of_absent_termination_point_is_skipped() {
        let changes = DataChanges::new().with_removed(PathId::termination_point(BR0, "eth0"));
        assert!(run(&TerminationPointDeleteCommand, &changes, &live_br0()).is_empty());
    }
}
