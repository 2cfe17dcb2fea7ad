//! Topology node and augmentation types.
//!
//! The same types describe both desired state (what a client asked for)
//! and operational state (what the remote database is believed to
//! contain). Database UUID fields are only ever populated on the
//! operational side.

use crate::{
    DatapathType, FailMode, InterfaceType, KeyValue, NodeId, OvsdbProtocol, PathId, QosType,
    VlanId, VlanMode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A topology node: either a bridge node or the switch ("ovsdb") node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<OvsdbBridgeAugmentation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ovsdb_node: Option<OvsdbNodeAugmentation>,
    /// Termination points keyed by tp-id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub termination_points: BTreeMap<String, OvsdbTerminationPointAugmentation>,
}

impl Node {
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            bridge: None,
            ovsdb_node: None,
            termination_points: BTreeMap::new(),
        }
    }

    pub fn with_bridge(mut self, bridge: OvsdbBridgeAugmentation) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_ovsdb_node(mut self, ovsdb_node: OvsdbNodeAugmentation) -> Self {
        self.ovsdb_node = Some(ovsdb_node);
        self
    }

    pub fn with_termination_point(
        mut self,
        tp_id: impl Into<String>,
        tp: OvsdbTerminationPointAugmentation,
    ) -> Self {
        self.termination_points.insert(tp_id.into(), tp);
        self
    }
}

/// Bridge attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvsdbBridgeAugmentation {
    pub bridge_name: Option<String>,
    pub bridge_uuid: Option<Uuid>,
    pub fail_mode: Option<FailMode>,
    pub datapath_type: Option<DatapathType>,
    pub stp_enable: Option<bool>,
    pub protocol_entries: Vec<ProtocolEntry>,
    pub controller_entries: Vec<ControllerEntry>,
    pub bridge_external_ids: Option<Vec<KeyValue>>,
    pub bridge_other_configs: Option<Vec<KeyValue>>,
    /// Switch node that manages this bridge.
    pub managed_by: Option<NodeId>,
}

impl OvsdbBridgeAugmentation {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            bridge_name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn controller(&self, target: &str) -> Option<&ControllerEntry> {
        self.controller_entries.iter().find(|c| c.target == target)
    }

    pub fn protocol(&self, protocol: OvsdbProtocol) -> Option<&ProtocolEntry> {
        self.protocol_entries.iter().find(|p| p.protocol == protocol)
    }
}

/// Controller target configured on a bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerEntry {
    pub target: String,
    #[serde(default)]
    pub controller_uuid: Option<Uuid>,
    #[serde(default)]
    pub max_backoff: Option<i64>,
    #[serde(default)]
    pub inactivity_probe: Option<i64>,
    #[serde(default)]
    pub is_connected: Option<bool>,
}

impl ControllerEntry {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            controller_uuid: None,
            max_backoff: None,
            inactivity_probe: None,
            is_connected: None,
        }
    }
}

/// Protocol version enabled on a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtocolEntry {
    pub protocol: OvsdbProtocol,
}

/// Port + Interface attributes for one termination point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvsdbTerminationPointAugmentation {
    pub name: Option<String>,
    pub port_uuid: Option<Uuid>,
    pub interface_uuid: Option<Uuid>,
    pub interface_type: Option<InterfaceType>,
    pub ofport: Option<u32>,
    pub ofport_request: Option<u16>,
    pub vlan_tag: Option<VlanId>,
    pub trunks: Vec<VlanId>,
    pub vlan_mode: Option<VlanMode>,
    pub options: Option<Vec<KeyValue>>,
    pub port_external_ids: Option<Vec<KeyValue>>,
    pub interface_external_ids: Option<Vec<KeyValue>>,
    pub port_other_configs: Option<Vec<KeyValue>>,
    pub interface_other_configs: Option<Vec<KeyValue>>,
    pub interface_lldp: Option<Vec<KeyValue>>,
    pub interface_bfd: Option<Vec<KeyValue>>,
    pub ingress_policing_rate: Option<i64>,
    pub ingress_policing_burst: Option<i64>,
    /// Reference to a QoS entry of the managing switch node.
    pub qos_entry: Option<PathId>,
}

impl OvsdbTerminationPointAugmentation {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Switch-scoped attributes of the ovsdb node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvsdbNodeAugmentation {
    pub ovs_version: Option<String>,
    pub db_version: Option<String>,
    pub openvswitch_external_ids: Option<Vec<KeyValue>>,
    pub openvswitch_other_configs: Option<Vec<KeyValue>>,
    pub qos_entries: Vec<QosEntry>,
    pub queues: Vec<QueueEntry>,
    pub autoattach: Vec<AutoAttach>,
    pub managed_node_entries: Vec<NodeId>,
}

impl OvsdbNodeAugmentation {
    pub fn qos(&self, qos_id: &str) -> Option<&QosEntry> {
        self.qos_entries.iter().find(|q| q.qos_id == qos_id)
    }

    pub fn queue(&self, queue_id: &str) -> Option<&QueueEntry> {
        self.queues.iter().find(|q| q.queue_id == queue_id)
    }

    pub fn autoattach(&self, autoattach_id: &str) -> Option<&AutoAttach> {
        self.autoattach
            .iter()
            .find(|a| a.autoattach_id == autoattach_id)
    }
}

/// QoS policy of the switch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QosEntry {
    pub qos_id: String,
    pub qos_uuid: Option<Uuid>,
    pub qos_type: Option<QosType>,
    pub queue_list: Vec<QueueRef>,
    pub qos_external_ids: Option<Vec<KeyValue>>,
    pub qos_other_config: Option<Vec<KeyValue>>,
}

/// Numbered queue reference inside a QoS entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRef {
    pub queue_number: i64,
    /// Path of the referenced queue.
    pub queue: PathId,
}

/// Queue of the switch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueEntry {
    pub queue_id: String,
    pub queue_uuid: Option<Uuid>,
    pub dscp: Option<u8>,
    pub queues_external_ids: Option<Vec<KeyValue>>,
    pub queues_other_config: Option<Vec<KeyValue>>,
}

/// Auto-attach (IEEE 802.1Qcj) discovery configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoAttach {
    pub autoattach_id: String,
    pub autoattach_uuid: Option<Uuid>,
    /// Bridge node this entry is attached to.
    pub bridge_id: Option<NodeId>,
    pub system_name: Option<String>,
    pub system_description: Option<String>,
    pub mappings: Vec<AutoAttachMapping>,
    pub autoattach_external_ids: Option<Vec<KeyValue>>,
}

/// I-SID to VLAN mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAttachMapping {
    pub isid: i64,
    pub vlan: i64,
}
