//! Ordered reconciler pipeline.

use super::{
    AutoAttachRemovedCommand, AutoAttachUpdateCommand, BridgeRemovedCommand, BridgeUpdateCommand,
    ControllerRemovedCommand, ControllerUpdateCommand, OvsdbNodeUpdateCommand,
    ProtocolRemovedCommand, ProtocolUpdateCommand, QosRemovedCommand, QosUpdateCommand,
    QueueRemovedCommand, QueueUpdateCommand, TerminationPointCreateCommand,
    TerminationPointDeleteCommand, TerminationPointUpdateCommand,
};
use log::debug;
use ovsdb_wire::TransactionBuilder;
use southbound_common::{TransactCommand, TransactContext};

/// Optional remote features a connection was set up with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaCapabilities {
    /// Reconcile the `AutoAttach` table
    pub autoattach: bool,
}

/// Runs every reconciler against one builder.
///
/// Order: switch row, then the children of bridges and the switch
/// (controllers, protocols, queues, QoS, auto-attach), then bridges, then
/// termination points. Queues run before QoS and QoS before termination
/// points so that references to rows staged in the same batch resolve.
pub struct TransactCommandAggregator {
    commands: Vec<Box<dyn TransactCommand>>,
}

impl TransactCommandAggregator {
    pub fn new(capabilities: SchemaCapabilities) -> Self {
        let commands: Vec<Box<dyn TransactCommand>> = vec![
            Box::new(OvsdbNodeUpdateCommand),
            Box::new(ControllerUpdateCommand),
            Box::new(ControllerRemovedCommand),
            Box::new(ProtocolUpdateCommand),
            Box::new(ProtocolRemovedCommand),
            Box::new(QueueUpdateCommand),
            Box::new(QueueRemovedCommand),
            Box::new(QosUpdateCommand),
            Box::new(QosRemovedCommand),
            Box::new(AutoAttachUpdateCommand::new(capabilities.autoattach)),
            Box::new(AutoAttachRemovedCommand::new(capabilities.autoattach)),
            Box::new(BridgeUpdateCommand),
            Box::new(BridgeRemovedCommand),
            Box::new(TerminationPointCreateCommand),
            Box::new(TerminationPointUpdateCommand),
            Box::new(TerminationPointDeleteCommand),
        ];
        Self { commands }
    }

    /// Reconciler names in execution order.
    pub fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(|command| command.name()).collect()
    }
}

impl TransactCommand for TransactCommandAggregator {
    fn name(&self) -> &str {
        "TransactCommandAggregator"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for command in &self.commands {
            let before = tx.len();
            command.execute(tx, ctx);
            let staged = tx.len() - before;
            if staged > 0 {
                debug!("{} staged {} operations", command.name(), staged);
            }
        }
    }
}
