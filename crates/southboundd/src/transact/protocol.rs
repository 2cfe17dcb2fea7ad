//! Bridge protocol reconcilers.

use super::util::{bridge_name, removed_bridge_name, same_bridge};
use log::{debug, info, warn};
use ovsdb_types::{PathId, ProtocolEntry};
use ovsdb_wire::{Condition, Datum, Mutation, Table, TransactionBuilder};
use southbound_common::{TransactCommand, TransactContext};

fn protocols_supported(tx: &TransactionBuilder) -> bool {
    match tx.schema().check(Table::Bridge, "protocols") {
        Ok(()) => true,
        Err(e) => {
            debug!("Bridge protocols are not supported: {}", e);
            false
        }
    }
}

fn protocol_of(path: &PathId) -> Option<&'static str> {
    match path {
        PathId::ProtocolEntry { protocol, .. } => Some(protocol.as_str()),
        _ => None,
    }
}

/// Adds protocol entries the bridge does not have yet.
#[derive(Debug, Default)]
pub struct ProtocolUpdateCommand;

impl TransactCommand for ProtocolUpdateCommand {
    fn name(&self) -> &str {
        "ProtocolUpdateCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        let added: Vec<_> = ctx
            .changes
            .created_or_updated::<ProtocolEntry>()
            .into_iter()
            .filter(|(path, _)| {
                ctx.state.get_protocol_entry(path).is_none() || !same_bridge(ctx, path)
            })
            .collect();
        if added.is_empty() || !protocols_supported(tx) {
            return;
        }

        for (path, entry) in added {
            let Some(bridge) = bridge_name(ctx, &path) else {
                warn!("Unable to find the bridge of protocol entry {}, skipping", path);
                continue;
            };
            tx.mutate(
                Table::Bridge,
                Mutation::insert("protocols", Datum::set([entry.protocol.as_str()])),
                vec![Condition::equal("name", bridge.as_str())],
            );
            info!("Enabling {} on bridge {}", entry.protocol, bridge);
        }
    }
}

/// Removes protocol entries from their bridge.
#[derive(Debug, Default)]
pub struct ProtocolRemovedCommand;

impl TransactCommand for ProtocolRemovedCommand {
    fn name(&self) -> &str {
        "ProtocolRemovedCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        let removed: Vec<_> = ctx
            .changes
            .removed::<ProtocolEntry>()
            .into_iter()
            .filter(|path| {
                let present = ctx.state.get_protocol_entry(path).is_some();
                if !present {
                    debug!("Protocol entry {} is not in the operational store", path);
                }
                present
            })
            .collect();
        if removed.is_empty() || !protocols_supported(tx) {
            return;
        }

        for path in removed {
            let (Some(protocol), Some(bridge)) = (protocol_of(&path), removed_bridge_name(ctx, &path))
            else {
                warn!("Unable to find the bridge of protocol entry {}, skipping", path);
                continue;
            };
            tx.mutate(
                Table::Bridge,
                Mutation::delete("protocols", Datum::set([protocol])),
                vec![Condition::equal("name", bridge.as_str())],
            );
            info!("Disabling {} on bridge {}", protocol, bridge);
        }
    }
}
