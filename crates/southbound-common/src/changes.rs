//! Change sets and typed extraction.

use ovsdb_types::{
    AutoAttach, ControllerEntry, Node, OvsdbBridgeAugmentation, OvsdbNodeAugmentation,
    OvsdbTerminationPointAugmentation, PathId, PathKind, ProtocolEntry, QosEntry, QueueEntry,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An object stored at one path of the desired-state tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataObject {
    Node(Node),
    TerminationPoint(OvsdbTerminationPointAugmentation),
    ControllerEntry(ControllerEntry),
    ProtocolEntry(ProtocolEntry),
    QosEntry(QosEntry),
    Queue(QueueEntry),
    AutoAttach(AutoAttach),
}

/// Types that can be pulled out of a [`DataObject`].
///
/// Extraction walks nested objects: a bridge node yields its termination
/// points, controller entries and protocol entries, and a switch node
/// yields its QoS entries, queues and auto-attach entries.
pub trait Extract: Sized {
    /// Kind of path this type is stored under.
    const KIND: PathKind;

    /// Returns every `Self` contained in `obj`, which is stored at `path`.
    fn extract<'a>(path: &PathId, obj: &'a DataObject) -> Vec<(PathId, &'a Self)>;
}

impl Extract for Node {
    const KIND: PathKind = PathKind::Node;

    fn extract<'a>(path: &PathId, obj: &'a DataObject) -> Vec<(PathId, &'a Self)> {
        match obj {
            DataObject::Node(node) => vec![(path.clone(), node)],
            _ => Vec::new(),
        }
    }
}

impl Extract for OvsdbBridgeAugmentation {
    const KIND: PathKind = PathKind::Node;

    fn extract<'a>(path: &PathId, obj: &'a DataObject) -> Vec<(PathId, &'a Self)> {
        match obj {
            DataObject::Node(Node {
                bridge: Some(bridge),
                ..
            }) => vec![(path.clone(), bridge)],
            _ => Vec::new(),
        }
    }
}

impl Extract for OvsdbNodeAugmentation {
    const KIND: PathKind = PathKind::Node;

    fn extract<'a>(path: &PathId, obj: &'a DataObject) -> Vec<(PathId, &'a Self)> {
        match obj {
            DataObject::Node(Node {
                ovsdb_node: Some(ovsdb_node),
                ..
            }) => vec![(path.clone(), ovsdb_node)],
            _ => Vec::new(),
        }
    }
}

impl Extract for OvsdbTerminationPointAugmentation {
    const KIND: PathKind = PathKind::TerminationPoint;

    fn extract<'a>(path: &PathId, obj: &'a DataObject) -> Vec<(PathId, &'a Self)> {
        match obj {
            DataObject::Node(node) => node
                .termination_points
                .iter()
                .map(|(tp_id, tp)| (PathId::termination_point(path.node_id().clone(), tp_id.as_str()), tp))
                .collect(),
            DataObject::TerminationPoint(tp) => vec![(path.clone(), tp)],
            _ => Vec::new(),
        }
    }
}

impl Extract for ControllerEntry {
    const KIND: PathKind = PathKind::ControllerEntry;

    fn extract<'a>(path: &PathId, obj: &'a DataObject) -> Vec<(PathId, &'a Self)> {
        match obj {
            DataObject::Node(Node {
                bridge: Some(bridge),
                ..
            }) => bridge
                .controller_entries
                .iter()
                .map(|c| (PathId::controller_entry(path.node_id().clone(), c.target.as_str()), c))
                .collect(),
            DataObject::ControllerEntry(c) => vec![(path.clone(), c)],
            _ => Vec::new(),
        }
    }
}

impl Extract for ProtocolEntry {
    const KIND: PathKind = PathKind::ProtocolEntry;

    fn extract<'a>(path: &PathId, obj: &'a DataObject) -> Vec<(PathId, &'a Self)> {
        match obj {
            DataObject::Node(Node {
                bridge: Some(bridge),
                ..
            }) => bridge
                .protocol_entries
                .iter()
                .map(|p| (PathId::protocol_entry(path.node_id().clone(), p.protocol), p))
                .collect(),
            DataObject::ProtocolEntry(p) => vec![(path.clone(), p)],
            _ => Vec::new(),
        }
    }
}

impl Extract for QosEntry {
    const KIND: PathKind = PathKind::QosEntry;

    fn extract<'a>(path: &PathId, obj: &'a DataObject) -> Vec<(PathId, &'a Self)> {
        match obj {
            DataObject::Node(Node {
                ovsdb_node: Some(ovsdb_node),
                ..
            }) => ovsdb_node
                .qos_entries
                .iter()
                .map(|q| (PathId::qos_entry(path.node_id().clone(), q.qos_id.as_str()), q))
                .collect(),
            DataObject::QosEntry(q) => vec![(path.clone(), q)],
            _ => Vec::new(),
        }
    }
}

impl Extract for QueueEntry {
    const KIND: PathKind = PathKind::Queue;

    fn extract<'a>(path: &PathId, obj: &'a DataObject) -> Vec<(PathId, &'a Self)> {
        match obj {
            DataObject::Node(Node {
                ovsdb_node: Some(ovsdb_node),
                ..
            }) => ovsdb_node
                .queues
                .iter()
                .map(|q| (PathId::queue(path.node_id().clone(), q.queue_id.as_str()), q))
                .collect(),
            DataObject::Queue(q) => vec![(path.clone(), q)],
            _ => Vec::new(),
        }
    }
}

impl Extract for AutoAttach {
    const KIND: PathKind = PathKind::AutoAttach;

    fn extract<'a>(path: &PathId, obj: &'a DataObject) -> Vec<(PathId, &'a Self)> {
        match obj {
            DataObject::Node(Node {
                ovsdb_node: Some(ovsdb_node),
                ..
            }) => ovsdb_node
                .autoattach
                .iter()
                .map(|a| (PathId::autoattach(path.node_id().clone(), a.autoattach_id.as_str()), a))
                .collect(),
            DataObject::AutoAttach(a) => vec![(path.clone(), a)],
            _ => Vec::new(),
        }
    }
}

/// The three read-only maps of one change notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataChanges {
    /// Desired objects that were created or updated.
    pub created_or_updated: BTreeMap<PathId, DataObject>,
    /// Pre-change objects for every path that existed before the change.
    pub original: BTreeMap<PathId, DataObject>,
    /// Paths that were removed.
    pub removed: BTreeSet<PathId>,
}

impl DataChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_created_or_updated(mut self, path: PathId, obj: DataObject) -> Self {
        self.created_or_updated.insert(path, obj);
        self
    }

    pub fn with_original(mut self, path: PathId, obj: DataObject) -> Self {
        self.original.insert(path, obj);
        self
    }

    pub fn with_removed(mut self, path: PathId) -> Self {
        self.removed.insert(path);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.created_or_updated.is_empty() && self.removed.is_empty()
    }

    fn flatten<'a, T: Extract>(map: &'a BTreeMap<PathId, DataObject>) -> BTreeMap<PathId, &'a T> {
        map.iter()
            .flat_map(|(path, obj)| T::extract(path, obj))
            .collect()
    }

    /// Every created or updated `T`, including nested ones.
    pub fn created_or_updated<T: Extract>(&self) -> BTreeMap<PathId, &T> {
        Self::flatten(&self.created_or_updated)
    }

    /// Every pre-change `T`, including nested ones.
    pub fn original<T: Extract>(&self) -> BTreeMap<PathId, &T> {
        Self::flatten(&self.original)
    }

    /// Created-or-updated `T` with no pre-change counterpart.
    pub fn created<T: Extract>(&self) -> BTreeMap<PathId, &T> {
        let original = self.original::<T>();
        self.created_or_updated::<T>()
            .into_iter()
            .filter(|(path, _)| !original.contains_key(path))
            .collect()
    }

    /// Created-or-updated `T` that also existed before the change.
    pub fn updated<T: Extract>(&self) -> BTreeMap<PathId, &T> {
        let original = self.original::<T>();
        self.created_or_updated::<T>()
            .into_iter()
            .filter(|(path, _)| original.contains_key(path))
            .collect()
    }

    /// Paths of removed `T`.
    ///
    /// A `T` is removed when its path (or its enclosing node) is in the
    /// removed set, or when its enclosing node was re-written without it.
    pub fn removed<T: Extract>(&self) -> BTreeSet<PathId> {
        let current = self.created_or_updated::<T>();
        let mut removed: BTreeSet<PathId> = self
            .removed
            .iter()
            .filter(|path| path.kind() == T::KIND)
            .cloned()
            .collect();
        for path in self.original::<T>().into_keys() {
            if current.contains_key(&path) {
                continue;
            }
            let parent = path.parent();
            let ancestor_removed = self.removed.contains(&path)
                || parent.as_ref().map_or(false, |p| self.removed.contains(p));
            let parent_rewritten = parent
                .as_ref()
                .map_or(false, |p| self.created_or_updated.contains_key(p));
            if ancestor_removed || parent_rewritten {
                removed.insert(path);
            }
        }
        removed
    }

    /// Pre-change objects of removed `T`.
    pub fn removed_objects<T: Extract>(&self) -> BTreeMap<PathId, &T> {
        let removed = self.removed::<T>();
        self.original::<T>()
            .into_iter()
            .filter(|(path, _)| removed.contains(path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovsdb_types::OvsdbProtocol;
    use pretty_assertions::assert_eq;

    const BR0: &str = "ovsdb://uuid/0001/bridge/br0";

    fn bridge_node(controllers: &[&str], tps: &[&str]) -> DataObject {
        let mut bridge = OvsdbBridgeAugmentation::named("br0");
        bridge.controller_entries = controllers.iter().map(|t| ControllerEntry::new(*t)).collect();
        bridge.protocol_entries = vec![ProtocolEntry {
            protocol: OvsdbProtocol::OpenFlow13,
        }];
        let mut node = Node::new(BR0).with_bridge(bridge);
        for tp in tps {
            node = node.with_termination_point(*tp, OvsdbTerminationPointAugmentation::named(*tp));
        }
        DataObject::Node(node)
    }

    #[test]
    fn test_nested_extraction_of_created_node() {
        let changes = DataChanges::new()
            .with_created_or_updated(PathId::node(BR0), bridge_node(&["tcp:1.1.1.1:6653"], &["eth0"]));

        let bridges = changes.created::<OvsdbBridgeAugmentation>();
        assert_eq!(bridges.len(), 1);

        let controllers = changes.created::<ControllerEntry>();
        assert!(controllers.contains_key(&PathId::controller_entry(BR0, "tcp:1.1.1.1:6653")));

        let tps = changes.created_or_updated::<OvsdbTerminationPointAugmentation>();
        assert!(tps.contains_key(&PathId::termination_point(BR0, "eth0")));

        let protocols = changes.created::<ProtocolEntry>();
        assert!(protocols.contains_key(&PathId::protocol_entry(BR0, OvsdbProtocol::OpenFlow13)));
        assert!(changes.updated::<ProtocolEntry>().is_empty());
    }

    #[test]
    fn test_child_dropped_from_rewritten_parent_is_removed() {
        let changes = DataChanges::new()
            .with_original(PathId::node(BR0), bridge_node(&["tcp:1.1.1.1:6653"], &["eth0", "eth1"]))
            .with_created_or_updated(PathId::node(BR0), bridge_node(&[], &["eth0"]));

        let removed_tps = changes.removed::<OvsdbTerminationPointAugmentation>();
        assert_eq!(
            removed_tps.into_iter().collect::<Vec<_>>(),
            vec![PathId::termination_point(BR0, "eth1")]
        );
        let removed_controllers = changes.removed_objects::<ControllerEntry>();
        assert_eq!(removed_controllers.len(), 1);
        assert!(changes.removed::<OvsdbBridgeAugmentation>().is_empty());
        assert_eq!(changes.updated::<OvsdbBridgeAugmentation>().len(), 1);
    }

    #[test]
    fn test_removed_node_removes_children() {
        let changes = DataChanges::new()
            .with_original(PathId::node(BR0), bridge_node(&[], &["eth0"]))
            .with_removed(PathId::node(BR0));

        assert!(changes.removed::<OvsdbBridgeAugmentation>().contains(&PathId::node(BR0)));
        assert!(changes
            .removed::<OvsdbTerminationPointAugmentation>()
            .contains(&PathId::termination_point(BR0, "eth0")));
    }

    #[test]
    fn test_explicit_removed_path_without_original() {
        let path = PathId::termination_point(BR0, "ghost");
        let changes = DataChanges::new().with_removed(path.clone());
        assert!(changes.removed::<OvsdbTerminationPointAugmentation>().contains(&path));
        assert!(changes.removed::<ControllerEntry>().is_empty());
        assert!(changes.removed_objects::<OvsdbTerminationPointAugmentation>().is_empty());
    }

    #[test]
    fn test_data_changes_json() {
        let json = r#"{
            "created_or_updated": {
                "ovsdb://uuid/0001/bridge/br0#tp=eth0": { "type": "termination_point", "name": "eth0" }
            },
            "removed": ["ovsdb://uuid/0001/bridge/br0#controller=tcp:1.1.1.1:6653"]
        }"#;
        let changes: DataChanges = serde_json::from_str(json).unwrap();
        assert_eq!(changes.created::<OvsdbTerminationPointAugmentation>().len(), 1);
        assert_eq!(changes.removed::<ControllerEntry>().len(), 1);
    }
}
