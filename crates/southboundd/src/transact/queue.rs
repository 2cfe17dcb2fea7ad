//! Queue reconcilers.

use super::util::{queue_named_uuid, Side, Stamp};
use log::{debug, info, warn};
use ovsdb_types::{QueueEntry, QUEUE_ID_EXTERNAL_ID_KEY};
use ovsdb_wire::{Condition, DatabaseSchema, QueueRow, Table, TransactionBuilder};
use southbound_common::{TransactCommand, TransactContext};

fn queue_row(schema: &DatabaseSchema, queue: &QueueEntry, side: Side<'_>) -> QueueRow {
    let mut row = QueueRow::new(schema);
    if let Some(dscp) = queue.dscp {
        row.set_dscp(i64::from(dscp));
    }
    if let Some(other_config) =
        side.key_value_map(queue.queues_other_config.as_ref(), "Queue", "other_config")
    {
        row.set_other_config(&other_config);
    }
    if let Some(external_ids) = side.external_ids(queue.queues_external_ids.as_ref(), "Queue") {
        row.set_external_ids(&external_ids);
    }
    row
}

/// Creates and updates queues.
///
/// New queues are inserted under `QUEUE<hex id>` so a QoS entry of the
/// same batch can reference them.
#[derive(Debug, Default)]
pub struct QueueUpdateCommand;

impl TransactCommand for QueueUpdateCommand {
    fn name(&self) -> &str {
        "QueueUpdateCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for (path, queue) in ctx.changes.created_or_updated::<QueueEntry>() {
            let stamp = Stamp::iid(ctx.codec, &path).with(QUEUE_ID_EXTERNAL_ID_KEY, queue.queue_id.as_str());
            let live = ctx
                .state
                .get_queue(&path)
                .and_then(|live| live.queue_uuid.map(|uuid| (live, uuid)));

            match live {
                Some((live, uuid)) => {
                    let mut row = queue_row(tx.schema(), queue, Side::Update(&stamp));
                    row.retain_changed(&queue_row(tx.schema(), live, Side::Operational));
                    if row.is_empty() {
                        debug!("Queue {} is up to date", queue.queue_id);
                        continue;
                    }
                    tx.update(row, vec![Condition::uuid_equal(uuid)]);
                    info!("Updating queue {} ({})", queue.queue_id, uuid);
                }
                None => {
                    let row = queue_row(tx.schema(), queue, Side::Insert(&stamp));
                    let uuid_name = queue_named_uuid(&queue.queue_id);
                    match tx.insert(row, &uuid_name) {
                        Ok(_) => info!("Creating queue {} as {}", queue.queue_id, uuid_name),
                        Err(e) => warn!("Failed to stage insert of queue {}: {}", queue.queue_id, e),
                    }
                }
            }
        }
    }
}

/// Deletes removed queues.
#[derive(Debug, Default)]
pub struct QueueRemovedCommand;

impl TransactCommand for QueueRemovedCommand {
    fn name(&self) -> &str {
        "QueueRemovedCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for path in ctx.changes.removed::<QueueEntry>() {
            match ctx.state.get_queue(&path).and_then(|live| live.queue_uuid) {
                Some(uuid) => {
                    tx.delete(Table::Queue, vec![Condition::uuid_equal(uuid)]);
                    info!("Deleting queue {} ({})", path, uuid);
                }
                None => warn!(
                    "Unable to delete Queue {} because it was not found in the operational store",
                    path
                ),
            }
        }
    }
}
