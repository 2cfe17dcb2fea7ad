//! QoS reconcilers.

use super::util::{qos_named_uuid, queue_named_uuid, Side, Stamp};
use log::{debug, info, warn};
use ovsdb_types::{PathId, QosEntry, QOS_ID_EXTERNAL_ID_KEY};
use ovsdb_wire::{Atom, Condition, DatabaseSchema, QosRow, Table, TransactionBuilder};
use southbound_common::{OperationalSnapshot, TransactCommand, TransactContext};
use std::collections::BTreeMap;

fn qos_row(schema: &DatabaseSchema, qos: &QosEntry, side: Side<'_>) -> QosRow {
    let mut row = QosRow::new(schema);
    if let Some(qos_type) = qos.qos_type {
        row.set_type(qos_type.as_str());
    }
    if let Some(other_config) = side.key_value_map(qos.qos_other_config.as_ref(), "QoS", "other_config") {
        row.set_other_config(&other_config);
    }
    if let Some(external_ids) = side.external_ids(qos.qos_external_ids.as_ref(), "QoS") {
        row.set_external_ids(&external_ids);
    }
    row
}

fn operational_queue(state: &OperationalSnapshot, queue: &PathId) -> Option<Atom> {
    state.get_queue(queue).and_then(|q| q.queue_uuid).map(Atom::Uuid)
}

/// Resolves the desired queue map of `qos`.
///
/// An empty list yields an empty map. Returns `None` when any queue is
/// neither in the snapshot nor staged in this batch; the column is then
/// left alone until a later pass can resolve every queue.
fn desired_queues(
    tx: &TransactionBuilder,
    state: &OperationalSnapshot,
    qos: &QosEntry,
) -> Option<BTreeMap<i64, Atom>> {
    let mut queues = BTreeMap::new();
    for queue_ref in &qos.queue_list {
        let resolved = operational_queue(state, &queue_ref.queue).or_else(|| match &queue_ref.queue {
            PathId::Queue { queue_id, .. } => {
                let staged = queue_named_uuid(queue_id);
                tx.is_staged(&staged).then(|| Atom::named(staged))
            }
            _ => None,
        });
        let Some(atom) = resolved else {
            warn!(
                "Queue {} of QoS {} is not in the operational store yet, deferring its queues",
                queue_ref.queue, qos.qos_id
            );
            return None;
        };
        queues.insert(queue_ref.queue_number, atom);
    }
    Some(queues)
}

fn operational_queues(state: &OperationalSnapshot, qos: &QosEntry) -> Option<BTreeMap<i64, Atom>> {
    qos.queue_list
        .iter()
        .map(|queue_ref| Some((queue_ref.queue_number, operational_queue(state, &queue_ref.queue)?)))
        .collect()
}

/// Creates and updates QoS entries.
#[derive(Debug, Default)]
pub struct QosUpdateCommand;

impl TransactCommand for QosUpdateCommand {
    fn name(&self) -> &str {
        "QosUpdateCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for (path, qos) in ctx.changes.created_or_updated::<QosEntry>() {
            let stamp = Stamp::iid(ctx.codec, &path).with(QOS_ID_EXTERNAL_ID_KEY, qos.qos_id.as_str());
            let live = ctx
                .state
                .get_qos_entry(&path)
                .and_then(|live| live.qos_uuid.map(|uuid| (live, uuid)));

            match live {
                Some((live, uuid)) => {
                    let mut row = qos_row(tx.schema(), qos, Side::Update(&stamp));
                    if let Some(queues) = desired_queues(tx, ctx.state, qos) {
                        row.set_queues(queues);
                    }
                    let mut current = qos_row(tx.schema(), live, Side::Operational);
                    if let Some(queues) = operational_queues(ctx.state, live) {
                        current.set_queues(queues);
                    }
                    row.retain_changed(&current);
                    if row.is_empty() {
                        debug!("QoS {} is up to date", qos.qos_id);
                        continue;
                    }
                    tx.update(row, vec![Condition::uuid_equal(uuid)]);
                    info!("Updating QoS {} ({})", qos.qos_id, uuid);
                }
                None => {
                    let mut row = qos_row(tx.schema(), qos, Side::Insert(&stamp));
                    if let Some(queues) = desired_queues(tx, ctx.state, qos).filter(|q| !q.is_empty()) {
                        row.set_queues(queues);
                    }
                    let uuid_name = qos_named_uuid(&qos.qos_id);
                    match tx.insert(row, &uuid_name) {
                        Ok(_) => info!("Creating QoS {} as {}", qos.qos_id, uuid_name),
                        Err(e) => warn!("Failed to stage insert of QoS {}: {}", qos.qos_id, e),
                    }
                }
            }
        }
    }
}

/// Deletes removed QoS entries.
#[derive(Debug, Default)]
pub struct QosRemovedCommand;

impl TransactCommand for QosRemovedCommand {
    fn name(&self) -> &str {
        "QosRemovedCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for path in ctx.changes.removed::<QosEntry>() {
            match ctx.state.get_qos_entry(&path).and_then(|live| live.qos_uuid) {
                Some(uuid) => {
                    tx.delete(Table::Qos, vec![Condition::uuid_equal(uuid)]);
                    info!("Deleting QoS {} ({})", path, uuid);
                }
                None => warn!(
                    "Unable to delete QoS {} because it was not found in the operational store",
                    path
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transact::test_support::*;
    use crate::transact::QueueUpdateCommand;
    use ovsdb_types::{Node, OvsdbNodeAugmentation, QosType, QueueEntry, QueueRef};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use southbound_common::DataChanges;
    use uuid::Uuid;

    fn qos1(queues: &[(i64, &str)]) -> QosEntry {
        QosEntry {
            qos_id: "qos1".to_string(),
            qos_type: Some(QosType::LinuxHtb),
            queue_list: queues
                .iter()
                .map(|(number, id)| QueueRef {
                    queue_number: *number,
                    queue: PathId::queue(SWITCH, *id),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn queue(id: &str, uuid: Option<Uuid>) -> QueueEntry {
        QueueEntry {
            queue_id: id.to_string(),
            queue_uuid: uuid,
            ..Default::default()
        }
    }

    fn switch_with(qos: Vec<QosEntry>, queues: Vec<QueueEntry>) -> Node {
        switch_node(OvsdbNodeAugmentation {
            qos_entries: qos,
            queues,
            ..Default::default()
        })
    }

    #[test]
    fn test_new_qos_references_operational_queue() {
        let queue_uuid = Uuid::new_v4();
        let changes = created([switch_with(vec![qos1(&[(0, "q1")])], Vec::new())]);
        let state = OperationalSnapshot::new([switch_with(Vec::new(), vec![queue("q1", Some(queue_uuid))])]);
        let tx = run(&QosUpdateCommand, &changes, &state);

        let ops = ops_json(&tx);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0]["table"], "QoS");
        assert_eq!(ops[0]["uuid-name"], "QOS716f7331");
        assert_eq!(ops[0]["row"]["type"], "linux-htb");
        assert_eq!(
            ops[0]["row"]["queues"],
            json!(["map", [[0, ["uuid", queue_uuid.to_string()]]]])
        );
        assert_eq!(
            ops[0]["row"]["external_ids"],
            json!(["map", [
                ["opendaylight-iid", iid(&PathId::qos_entry(SWITCH, "qos1"))],
                ["opendaylight-qos-id", "qos1"]
            ]])
        );
    }

    #[test]
    fn test_new_qos_references_queue_staged_in_same_batch() {
        let changes = created([switch_with(vec![qos1(&[(1, "q1")])], vec![queue("q1", None)])]);
        let state = OperationalSnapshot::default();
        let tx = run(&QueueUpdateCommand, &changes, &state);
        let tx = run_with(tx, &QosUpdateCommand, &changes, &state);

        let ops = ops_json(&tx);
        assert_eq!(op_names(&tx), vec!["insert", "insert"]);
        assert_eq!(ops[1]["row"]["queues"], json!(["map", [[1, ["named-uuid", "QUEUE7131"]]]]));
        assert!(tx.unresolved_named_refs().is_empty());
    }

    #[test]
    fn test_unresolved_queue_defers_queues_column() {
        let changes = created([switch_with(vec![qos1(&[(0, "q1"), (1, "q2")])], Vec::new())]);
        let state = OperationalSnapshot::new([switch_with(Vec::new(), vec![queue("q1", Some(Uuid::new_v4()))])]);
        let tx = run(&QosUpdateCommand, &changes, &state);

        let ops = ops_json(&tx);
        assert_eq!(ops.len(), 1);
        assert!(ops[0]["row"].get("queues").is_none());
        assert!(tx.unresolved_named_refs().is_empty());
    }

    #[test]
    fn test_existing_qos_updates_changed_queues_only() {
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let qos_uuid = Uuid::new_v4();
        let mut live = qos1(&[(0, "q1")]);
        live.qos_uuid = Some(qos_uuid);
        let queues = vec![queue("q1", Some(q1)), queue("q2", Some(q2))];

        let changes = created([switch_with(vec![qos1(&[(0, "q1"), (1, "q2")])], Vec::new())]);
        let state = OperationalSnapshot::new([switch_with(vec![live], queues)]);
        let tx = run(&QosUpdateCommand, &changes, &state);

        assert_eq!(
            ops_json(&tx),
            vec![json!({
                "op": "update",
                "table": "QoS",
                "where": [["_uuid", "==", ["uuid", qos_uuid.to_string()]]],
                "row": {"queues": ["map", [
                    [0, ["uuid", q1.to_string()]],
                    [1, ["uuid", q2.to_string()]]
                ]]}
            })]
        );
    }

    #[test]
    fn test_emptied_queue_list_clears_queues() {
        let qos_uuid = Uuid::new_v4();
        let mut live = qos1(&[(0, "q1")]);
        live.qos_uuid = Some(qos_uuid);
        let queues = vec![queue("q1", Some(Uuid::new_v4()))];

        let changes = created([switch_with(vec![qos1(&[])], Vec::new())]);
        let state = OperationalSnapshot::new([switch_with(vec![live], queues)]);
        let tx = run(&QosUpdateCommand, &changes, &state);

        assert_eq!(
            ops_json(&tx),
            vec![json!({
                "op": "update",
                "table": "QoS",
                "where": [["_uuid", "==", ["uuid", qos_uuid.to_string()]]],
                "row": {"queues": ["map", []]}
            })]
        );
    }

    #[test]
    fn test_new_qos_without_queues_omits_column() {
        let changes = created([switch_with(vec![qos1(&[])], Vec::new())]);
        let tx = run(&QosUpdateCommand, &changes, &OperationalSnapshot::default());

        let ops = ops_json(&tx);
        assert_eq!(ops.len(), 1);
        assert!(ops[0]["row"].get("queues").is_none());
    }

    #[test]
    fn test_unchanged_qos_emits_nothing() {
        let q1 = Uuid::new_v4();
        let mut live = qos1(&[(0, "q1")]);
        live.qos_uuid = Some(Uuid::new_v4());

        let changes = created([switch_with(vec![qos1(&[(0, "q1")])], Vec::new())]);
        let state = OperationalSnapshot::new([switch_with(vec![live], vec![queue("q1", Some(q1))])]);
        assert!(run(&QosUpdateCommand, &changes, &state).is_empty());
    }

    #[test]
    fn test_removed_qos_is_deleted_or_skipped() {
        let qos_uuid = Uuid::new_v4();
        let mut live = qos1(&[]);
        live.qos_uuid = Some(qos_uuid);
        let state = OperationalSnapshot::new([switch_with(vec![live], Vec::new())]);
        let changes = DataChanges::new().with_removed(PathId::qos_entry(SWITCH, "qos1"));

        let tx = run(&QosRemovedCommand, &changes, &state);
        assert_eq!(op_names(&tx), vec!["delete"]);
        assert_eq!(ops_json(&tx)[0]["table"], "QoS");

        assert!(run(&QosRemovedCommand, &changes, &OperationalSnapshot::default()).is_empty());
    }
}
