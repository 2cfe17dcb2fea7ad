//! Topology model for the OVSDB southbound.
//!
//! This crate provides the typed representation of the desired and
//! operational state that the southbound reconciles against a remote
//! Open_vSwitch database:
//!
//! - [`PathId`]: Path identifier of a node or of an entry nested in a node
//! - [`Node`]: A topology node carrying a bridge or switch augmentation
//! - [`OvsdbBridgeAugmentation`]: Bridge attributes, controllers and protocols
//! - [`OvsdbTerminationPointAugmentation`]: Port/Interface pair attributes
//! - [`OvsdbNodeAugmentation`]: Switch-scoped QoS, queue and auto-attach tables
//! - [`KeyValue`]: Opaque key/value list entries (external ids, other config)
//! - [`VlanId`]: IEEE 802.1Q VLAN tag as accepted by the Port table

mod enums;
mod key_value;
mod model;
mod path;
mod vlan;

pub use enums::{DatapathType, FailMode, InterfaceType, OvsdbProtocol, QosType, VlanMode};
pub use key_value::{
    to_map, KeyValue, AUTOATTACH_ID_EXTERNAL_ID_KEY, IID_EXTERNAL_ID_KEY, QOS_ID_EXTERNAL_ID_KEY,
    QUEUE_ID_EXTERNAL_ID_KEY,
};
pub use model::{
    AutoAttach, AutoAttachMapping, ControllerEntry, Node, OvsdbBridgeAugmentation,
    OvsdbNodeAugmentation, OvsdbTerminationPointAugmentation, ProtocolEntry, QosEntry, QueueEntry,
    QueueRef,
};
pub use path::{NodeId, PathId, PathKind};
pub use vlan::VlanId;

/// Default OVSDB management port.
pub const DEFAULT_OVSDB_PORT: u16 = 6640;

/// Error type for model parsing and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("invalid VLAN ID: {0} (must be 0-4095)")]
    InvalidVlanId(u16),

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("incomplete key/value entry (key: {key:?}, value: {value:?})")]
    IncompleteEntry {
        key: Option<String>,
        value: Option<String>,
    },
}

/// Result alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
