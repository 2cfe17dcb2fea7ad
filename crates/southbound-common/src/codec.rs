//! Path serialization for the external-id stamp.

use ovsdb_types::PathId;

/// Serializes a [`PathId`] to the text stored under the
/// `opendaylight-iid` external-id key.
pub trait IdentifierCodec: Send + Sync {
    fn serialize(&self, path: &PathId) -> String;
}

/// Renders paths as network-topology instance identifiers.
///
/// ```text
/// /network-topology:network-topology/network-topology:topology[network-topology:topology-id='ovsdb:1']
///     /network-topology:node[network-topology:node-id='ovsdb://uuid/0001/bridge/br0']
///     /network-topology:termination-point[network-topology:tp-id='eth0']
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyPathCodec {
    topology_id: String,
}

impl TopologyPathCodec {
    pub fn new(topology_id: impl Into<String>) -> Self {
        Self {
            topology_id: topology_id.into(),
        }
    }

    pub fn topology_id(&self) -> &str {
        &self.topology_id
    }
}

impl Default for TopologyPathCodec {
    fn default() -> Self {
        Self::new("ovsdb:1")
    }
}

impl IdentifierCodec for TopologyPathCodec {
    fn serialize(&self, path: &PathId) -> String {
        let mut out = format!(
            "/network-topology:network-topology\
             /network-topology:topology[network-topology:topology-id='{}']\
             /network-topology:node[network-topology:node-id='{}']",
            self.topology_id,
            path.node_id()
        );
        let suffix = match path {
            PathId::Node(_) => None,
            PathId::TerminationPoint { tp, .. } => Some(format!(
                "/network-topology:termination-point[network-topology:tp-id='{}']",
                tp
            )),
            PathId::ControllerEntry { target, .. } => Some(format!(
                "/ovsdb:controller-entry[ovsdb:target='{}']",
                target
            )),
            PathId::ProtocolEntry { protocol, .. } => Some(format!(
                "/ovsdb:protocol-entry[ovsdb:protocol='{}']",
                protocol
            )),
            PathId::QosEntry { qos_id, .. } => {
                Some(format!("/ovsdb:qos-entries[ovsdb:qos-id='{}']", qos_id))
            }
            PathId::Queue { queue_id, .. } => {
                Some(format!("/ovsdb:queues[ovsdb:queue-id='{}']", queue_id))
            }
            PathId::AutoAttach { autoattach_id, .. } => Some(format!(
                "/ovsdb:autoattach[ovsdb:autoattach-id='{}']",
                autoattach_id
            )),
        };
        if let Some(suffix) = suffix {
            out.push_str(&suffix);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_node_path() {
        let codec = TopologyPathCodec::default();
        assert_eq!(
            codec.serialize(&PathId::node("ovsdb://uuid/0001/bridge/br0")),
            "/network-topology:network-topology\
             /network-topology:topology[network-topology:topology-id='ovsdb:1']\
             /network-topology:node[network-topology:node-id='ovsdb://uuid/0001/bridge/br0']"
        );
    }

    #[test]
    fn test_serialize_nested_paths_are_distinct() {
        let codec = TopologyPathCodec::new("ovsdb:2");
        let tp = codec.serialize(&PathId::termination_point("n", "eth0"));
        let queue = codec.serialize(&PathId::queue("n", "eth0"));
        assert!(tp.ends_with("/network-topology:termination-point[network-topology:tp-id='eth0']"));
        assert!(queue.ends_with("/ovsdb:queues[ovsdb:queue-id='eth0']"));
        assert!(tp.contains("topology-id='ovsdb:2'"));
        assert_ne!(tp, queue);
    }
}
