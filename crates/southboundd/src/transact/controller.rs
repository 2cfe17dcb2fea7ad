//! Controller entry reconcilers.
//!
//! Controller rows are owned by the bridge that references them, so a
//! removal only drops the reference and the server collects the row.

use super::util::{bridge_name, removed_bridge_name, same_bridge, Side, Stamp};
use log::{debug, info, warn};
use ovsdb_types::ControllerEntry;
use ovsdb_wire::{Condition, ControllerRow, DatabaseSchema, Datum, Mutation, Table, TransactionBuilder};
use southbound_common::{TransactCommand, TransactContext};

fn controller_row(schema: &DatabaseSchema, entry: &ControllerEntry) -> ControllerRow {
    let mut row = ControllerRow::new(schema);
    if entry.max_backoff.is_some() {
        row.set_max_backoff(entry.max_backoff);
    }
    if entry.inactivity_probe.is_some() {
        row.set_inactivity_probe(entry.inactivity_probe);
    }
    row
}

/// Creates controller entries and updates their timers.
#[derive(Debug, Default)]
pub struct ControllerUpdateCommand;

impl TransactCommand for ControllerUpdateCommand {
    fn name(&self) -> &str {
        "ControllerUpdateCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for (path, entry) in ctx.changes.created_or_updated::<ControllerEntry>() {
            if entry.target.is_empty() {
                warn!("Controller entry at {} has no target, skipping", path);
                continue;
            }

            let live = ctx
                .state
                .get_controller_entry(&path)
                .filter(|_| same_bridge(ctx, &path));
            if let Some(uuid) = live.and_then(|live| live.controller_uuid) {
                let mut row = controller_row(tx.schema(), entry);
                if let Some(live) = live {
                    row.retain_changed(&controller_row(tx.schema(), live));
                }
                if !row.is_empty() {
                    tx.update(row, vec![Condition::uuid_equal(uuid)]);
                    info!("Updating controller {}", entry.target);
                }
                continue;
            }

            let Some(bridge) = bridge_name(ctx, &path) else {
                warn!("Unable to find the bridge of controller {}, skipping", entry.target);
                continue;
            };
            let stamp = Stamp::iid(ctx.codec, &path);
            let mut row = controller_row(tx.schema(), entry);
            row.set_target(&entry.target);
            if let Some(external_ids) = Side::Insert(&stamp).external_ids(None, "Controller") {
                row.set_external_ids(&external_ids);
            }

            let uuid_name = tx.unique_name(&format!("Controller_{}", entry.target));
            match tx.insert(row, &uuid_name) {
                Ok(controller_ref) => {
                    tx.mutate(
                        Table::Bridge,
                        Mutation::insert("controller", Datum::set([controller_ref])),
                        vec![Condition::equal("name", bridge.as_str())],
                    );
                    info!("Adding controller {} to bridge {}", entry.target, bridge);
                }
                Err(e) => warn!("Failed to stage insert of controller {}: {}", entry.target, e),
            }
        }
    }
}

/// Detaches removed controller entries from their bridge.
#[derive(Debug, Default)]
pub struct ControllerRemovedCommand;

impl TransactCommand for ControllerRemovedCommand {
    fn name(&self) -> &str {
        "ControllerRemovedCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for path in ctx.changes.removed::<ControllerEntry>() {
            let Some(uuid) = ctx
                .state
                .get_controller_entry(&path)
                .and_then(|live| live.controller_uuid)
            else {
                debug!("Controller entry {} is not in the operational store", path);
                continue;
            };
            let Some(bridge) = removed_bridge_name(ctx, &path) else {
                warn!("Unable to find the bridge of controller entry {}, skipping", path);
                continue;
            };
            tx.mutate(
                Table::Bridge,
                Mutation::delete("controller", Datum::set([uuid])),
                vec![Condition::equal("name", bridge.as_str())],
            );
            info!("Removing controller {} from bridge {}", uuid, bridge);
        }
    }
}
