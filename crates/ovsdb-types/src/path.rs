//! Path identifiers for topology nodes and the entries nested in them.

use crate::{ModelError, OvsdbProtocol};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Topology node identifier, e.g. `ovsdb://uuid/5f1c.../bridge/br0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of object a [`PathId`] addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Node,
    TerminationPoint,
    ControllerEntry,
    ProtocolEntry,
    QosEntry,
    Queue,
    AutoAttach,
}

/// Opaque identifier of a desired-state object.
///
/// A path addresses either a whole node (a bridge node or the switch node)
/// or one entry nested in a node. Nested entries always know their
/// enclosing node, which is how a reconciler finds the bridge owning a
/// termination point or controller entry.
///
/// The textual form is `<node-id>` for nodes and `<node-id>#<kind>=<key>`
/// for nested entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PathId {
    Node(NodeId),
    TerminationPoint { node: NodeId, tp: String },
    ControllerEntry { node: NodeId, target: String },
    ProtocolEntry { node: NodeId, protocol: OvsdbProtocol },
    QosEntry { node: NodeId, qos_id: String },
    Queue { node: NodeId, queue_id: String },
    AutoAttach { node: NodeId, autoattach_id: String },
}

impl PathId {
    pub fn node(node: impl Into<NodeId>) -> Self {
        PathId::Node(node.into())
    }

    pub fn termination_point(node: impl Into<NodeId>, tp: impl Into<String>) -> Self {
        PathId::TerminationPoint {
            node: node.into(),
            tp: tp.into(),
        }
    }

    pub fn controller_entry(node: impl Into<NodeId>, target: impl Into<String>) -> Self {
        PathId::ControllerEntry {
            node: node.into(),
            target: target.into(),
        }
    }

    pub fn protocol_entry(node: impl Into<NodeId>, protocol: OvsdbProtocol) -> Self {
        PathId::ProtocolEntry {
            node: node.into(),
            protocol,
        }
    }

    pub fn qos_entry(node: impl Into<NodeId>, qos_id: impl Into<String>) -> Self {
        PathId::QosEntry {
            node: node.into(),
            qos_id: qos_id.into(),
        }
    }

    pub fn queue(node: impl Into<NodeId>, queue_id: impl Into<String>) -> Self {
        PathId::Queue {
            node: node.into(),
            queue_id: queue_id.into(),
        }
    }

    pub fn autoattach(node: impl Into<NodeId>, autoattach_id: impl Into<String>) -> Self {
        PathId::AutoAttach {
            node: node.into(),
            autoattach_id: autoattach_id.into(),
        }
    }

    /// Returns the identifier of the enclosing node.
    pub fn node_id(&self) -> &NodeId {
        match self {
            PathId::Node(node)
            | PathId::TerminationPoint { node, .. }
            | PathId::ControllerEntry { node, .. }
            | PathId::ProtocolEntry { node, .. }
            | PathId::QosEntry { node, .. }
            | PathId::Queue { node, .. }
            | PathId::AutoAttach { node, .. } => node,
        }
    }

    /// Returns the enclosing node path, or `None` for a node path.
    pub fn parent(&self) -> Option<PathId> {
        match self {
            PathId::Node(_) => None,
            other => Some(PathId::Node(other.node_id().clone())),
        }
    }

    pub fn kind(&self) -> PathKind {
        match self {
            PathId::Node(_) => PathKind::Node,
            PathId::TerminationPoint { .. } => PathKind::TerminationPoint,
            PathId::ControllerEntry { .. } => PathKind::ControllerEntry,
            PathId::ProtocolEntry { .. } => PathKind::ProtocolEntry,
            PathId::QosEntry { .. } => PathKind::QosEntry,
            PathId::Queue { .. } => PathKind::Queue,
            PathId::AutoAttach { .. } => PathKind::AutoAttach,
        }
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathId::Node(node) => write!(f, "{}", node),
            PathId::TerminationPoint { node, tp } => write!(f, "{}#tp={}", node, tp),
            PathId::ControllerEntry { node, target } => write!(f, "{}#controller={}", node, target),
            PathId::ProtocolEntry { node, protocol } => write!(f, "{}#protocol={}", node, protocol),
            PathId::QosEntry { node, qos_id } => write!(f, "{}#qos={}", node, qos_id),
            PathId::Queue { node, queue_id } => write!(f, "{}#queue={}", node, queue_id),
            PathId::AutoAttach { node, autoattach_id } => {
                write!(f, "{}#autoattach={}", node, autoattach_id)
            }
        }
    }
}

impl FromStr for PathId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((node, entry)) = s.split_once('#') else {
            return Ok(PathId::node(s));
        };
        let unknown = || ModelError::UnknownVariant {
            kind: "path",
            value: s.to_string(),
        };
        let (kind, key) = entry.split_once('=').ok_or_else(unknown)?;
        let node = NodeId::from(node);
        match kind {
            "tp" => Ok(PathId::termination_point(node, key)),
            "controller" => Ok(PathId::controller_entry(node, key)),
            "protocol" => Ok(PathId::protocol_entry(node, key.parse()?)),
            "qos" => Ok(PathId::qos_entry(node, key)),
            "queue" => Ok(PathId::queue(node, key)),
            "autoattach" => Ok(PathId::autoattach(node, key)),
            _ => Err(unknown()),
        }
    }
}

impl TryFrom<String> for PathId {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PathId> for String {
    fn from(path: PathId) -> String {
        path.to_string()
    }
}
