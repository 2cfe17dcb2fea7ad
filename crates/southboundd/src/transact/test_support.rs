//! Fixtures shared by the reconciler tests.

use ovsdb_types::{
    ControllerEntry, Node, OvsdbBridgeAugmentation, OvsdbNodeAugmentation,
    OvsdbTerminationPointAugmentation, PathId,
};
use ovsdb_wire::{DatabaseSchema, Operation, SchemaVersion, TransactionBuilder};
use serde_json::Value;
use southbound_common::{
    DataChanges, DataObject, OperationalSnapshot, TopologyPathCodec, TransactCommand,
    TransactContext,
};
use uuid::Uuid;

pub(crate) const BR0: &str = "ovsdb://uuid/0001/bridge/br0";
pub(crate) const SWITCH: &str = "ovsdb://uuid/0001";

pub(crate) fn schema() -> DatabaseSchema {
    DatabaseSchema::open_vswitch(SchemaVersion::new(8, 3, 0))
}

/// Runs one reconciler against a fresh builder.
pub(crate) fn run(
    command: &dyn TransactCommand,
    changes: &DataChanges,
    state: &OperationalSnapshot,
) -> TransactionBuilder {
    run_with(TransactionBuilder::new(schema()), command, changes, state)
}

/// Runs one reconciler against `tx`.
pub(crate) fn run_with(
    mut tx: TransactionBuilder,
    command: &dyn TransactCommand,
    changes: &DataChanges,
    state: &OperationalSnapshot,
) -> TransactionBuilder {
    let codec = TopologyPathCodec::default();
    command.execute(&mut tx, &TransactContext::new(state, changes, &codec));
    tx
}

pub(crate) fn ops_json(tx: &TransactionBuilder) -> Vec<Value> {
    tx.operations().map(Operation::to_json).collect()
}

pub(crate) fn op_names(tx: &TransactionBuilder) -> Vec<&'static str> {
    tx.operations().map(Operation::op_name).collect()
}

/// Serialized path stamp of `path` with the default codec.
pub(crate) fn iid(path: &PathId) -> String {
    use southbound_common::IdentifierCodec;
    TopologyPathCodec::default().serialize(path)
}

pub(crate) fn bridge_node(bridge: OvsdbBridgeAugmentation) -> Node {
    Node::new(BR0).with_bridge(bridge)
}

/// Operational copy of `bridge` with a database UUID.
pub(crate) fn live_bridge(mut bridge: OvsdbBridgeAugmentation) -> OvsdbBridgeAugmentation {
    bridge.bridge_uuid = Some(Uuid::new_v4());
    bridge
}

pub(crate) fn live_controller(target: &str) -> ControllerEntry {
    let mut controller = ControllerEntry::new(target);
    controller.controller_uuid = Some(Uuid::new_v4());
    controller
}

pub(crate) fn live_tp(mut tp: OvsdbTerminationPointAugmentation) -> OvsdbTerminationPointAugmentation {
    tp.port_uuid = Some(Uuid::new_v4());
    tp.interface_uuid = Some(Uuid::new_v4());
    tp
}

pub(crate) fn switch_node(ovsdb: OvsdbNodeAugmentation) -> Node {
    Node::new(SWITCH).with_ovsdb_node(ovsdb)
}

pub(crate) fn created(nodes: impl IntoIterator<Item = Node>) -> DataChanges {
    nodes.into_iter().fold(DataChanges::new(), |changes, node| {
        changes.with_created_or_updated(PathId::Node(node.node_id.clone()), DataObject::Node(node))
    })
}
