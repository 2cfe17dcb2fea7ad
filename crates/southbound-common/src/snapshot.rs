//! Read-only operational state.

use ovsdb_types::{
    AutoAttach, ControllerEntry, Node, NodeId, OvsdbBridgeAugmentation, OvsdbNodeAugmentation,
    OvsdbTerminationPointAugmentation, PathId, ProtocolEntry, QosEntry, QueueEntry,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the remote database is believed to contain, keyed by node.
///
/// Reconcilers only read from the snapshot. Lookups by a nested path
/// resolve the enclosing node first and then the entry inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationalSnapshot {
    nodes: BTreeMap<NodeId, Node>,
}

impl OperationalSnapshot {
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            nodes: nodes
                .into_iter()
                .map(|node| (node.node_id.clone(), node))
                .collect(),
        }
    }

    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.node_id.clone(), node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node enclosing `path`.
    pub fn get_node(&self, path: &PathId) -> Option<&Node> {
        self.nodes.get(path.node_id())
    }

    pub fn get_bridge(&self, path: &PathId) -> Option<&OvsdbBridgeAugmentation> {
        self.get_node(path)?.bridge.as_ref()
    }

    pub fn get_ovsdb_node(&self, path: &PathId) -> Option<&OvsdbNodeAugmentation> {
        self.get_node(path)?.ovsdb_node.as_ref()
    }

    pub fn get_termination_point(&self, path: &PathId) -> Option<&OvsdbTerminationPointAugmentation> {
        match path {
            PathId::TerminationPoint { tp, .. } => self.get_node(path)?.termination_points.get(tp),
            _ => None,
        }
    }

    pub fn get_controller_entry(&self, path: &PathId) -> Option<&ControllerEntry> {
        match path {
            PathId::ControllerEntry { target, .. } => self.get_bridge(path)?.controller(target),
            _ => None,
        }
    }

    pub fn get_protocol_entry(&self, path: &PathId) -> Option<&ProtocolEntry> {
        match path {
            PathId::ProtocolEntry { protocol, .. } => self.get_bridge(path)?.protocol(*protocol),
            _ => None,
        }
    }

    pub fn get_qos_entry(&self, path: &PathId) -> Option<&QosEntry> {
        match path {
            PathId::QosEntry { qos_id, .. } => self.get_ovsdb_node(path)?.qos(qos_id),
            _ => None,
        }
    }

    pub fn get_queue(&self, path: &PathId) -> Option<&QueueEntry> {
        match path {
            PathId::Queue { queue_id, .. } => self.get_ovsdb_node(path)?.queue(queue_id),
            _ => None,
        }
    }

    pub fn get_autoattach(&self, path: &PathId) -> Option<&AutoAttach> {
        match path {
            PathId::AutoAttach { autoattach_id, .. } => {
                self.get_ovsdb_node(path)?.autoattach(autoattach_id)
            }
            _ => None,
        }
    }
}
