//! Entity reconcilers and batch execution.
//!
//! Every reconciler implements [`TransactCommand`](southbound_common::TransactCommand)
//! and only appends operations to the shared builder. The
//! [`TransactCommandAggregator`] runs them in dependency order and the
//! [`TransactInvoker`] submits the finished batch.

mod aggregator;
mod autoattach;
mod bridge;
mod controller;
mod invoker;
mod node;
mod protocol;
mod qos;
mod queue;
mod termination_point;
mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::{SchemaCapabilities, TransactCommandAggregator};
pub use autoattach::{AutoAttachRemovedCommand, AutoAttachUpdateCommand};
pub use bridge::{BridgeRemovedCommand, BridgeUpdateCommand};
pub use controller::{ControllerRemovedCommand, ControllerUpdateCommand};
pub use invoker::{TransactInvoker, TransactInvokerStats, TransactOutcome};
pub use node::OvsdbNodeUpdateCommand;
pub use protocol::{ProtocolRemovedCommand, ProtocolUpdateCommand};
pub use qos::{QosRemovedCommand, QosUpdateCommand};
pub use queue::{QueueRemovedCommand, QueueUpdateCommand};
pub use termination_point::{
    TerminationPointCreateCommand, TerminationPointDeleteCommand, TerminationPointUpdateCommand,
};
