//! Switch-wide (`Open_vSwitch` row) reconciler.

use super::util::{Side, Stamp};
use log::{debug, info};
use ovsdb_types::{KeyValue, OvsdbNodeAugmentation};
use ovsdb_wire::{Datum, Mutation, Table, TransactionBuilder};
use southbound_common::{TransactCommand, TransactContext};
use std::collections::{BTreeMap, BTreeSet};

/// Key changes of one map column of the switch row.
#[derive(Debug, Default, PartialEq)]
struct MapDelta {
    /// Keys to delete before re-inserting
    stale: BTreeSet<String>,
    /// Pairs to insert
    changed: BTreeMap<String, String>,
}

impl MapDelta {
    fn compute(
        desired: &BTreeMap<String, String>,
        current: &BTreeMap<String, String>,
        original: &BTreeMap<String, String>,
    ) -> Self {
        let changed: BTreeMap<String, String> = desired
            .iter()
            .filter(|(key, value)| current.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let vanished = original.keys().filter(|key| !desired.contains_key(*key));
        let stale = changed
            .keys()
            .chain(vanished)
            .filter(|key| current.contains_key(*key))
            .cloned()
            .collect();
        Self { stale, changed }
    }

    fn stage(self, tx: &mut TransactionBuilder, column: &str) {
        if !self.stale.is_empty() {
            tx.mutate(
                Table::OpenVSwitch,
                Mutation::delete(column, Datum::set(self.stale)),
                Vec::new(),
            );
        }
        if !self.changed.is_empty() {
            tx.mutate(
                Table::OpenVSwitch,
                Mutation::insert(column, Datum::string_map(&self.changed)),
                Vec::new(),
            );
        }
    }

    fn is_empty(&self) -> bool {
        self.stale.is_empty() && self.changed.is_empty()
    }
}

fn pairs(side: Side<'_>, entries: Option<&Vec<KeyValue>>, column: &str) -> BTreeMap<String, String> {
    side.key_value_map(entries, "Open_vSwitch", column)
        .unwrap_or_default()
}

/// Rewrites the switch-wide `external_ids` and `other_config` maps.
///
/// The single `Open_vSwitch` row is never inserted or deleted here. Keys
/// are replaced through a delete mutation followed by an insert mutation,
/// which leaves keys owned by other writers untouched.
#[derive(Debug, Default)]
pub struct OvsdbNodeUpdateCommand;

impl TransactCommand for OvsdbNodeUpdateCommand {
    fn name(&self) -> &str {
        "OvsdbNodeUpdateCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        let originals = ctx.changes.original::<OvsdbNodeAugmentation>();
        for (path, desired) in ctx.changes.created_or_updated::<OvsdbNodeAugmentation>() {
            let stamp = Stamp::iid(ctx.codec, &path);
            let live = ctx.state.get_ovsdb_node(&path);
            let original = originals.get(&path);

            let desired_ids = Side::Insert(&stamp)
                .external_ids(desired.openvswitch_external_ids.as_ref(), "Open_vSwitch")
                .unwrap_or_default();
            let current_ids = live
                .map(|live| pairs(Side::Operational, live.openvswitch_external_ids.as_ref(), "external_ids"))
                .unwrap_or_default();
            let original_ids = original
                .map(|o| pairs(Side::Operational, o.openvswitch_external_ids.as_ref(), "external_ids"))
                .unwrap_or_default();
            let external_ids = MapDelta::compute(&desired_ids, &current_ids, &original_ids);

            let desired_config = pairs(
                Side::Update(&stamp),
                desired.openvswitch_other_configs.as_ref(),
                "other_config",
            );
            let current_config = live
                .map(|live| pairs(Side::Operational, live.openvswitch_other_configs.as_ref(), "other_config"))
                .unwrap_or_default();
            let original_config = original
                .map(|o| pairs(Side::Operational, o.openvswitch_other_configs.as_ref(), "other_config"))
                .unwrap_or_default();
            let other_config = MapDelta::compute(&desired_config, &current_config, &original_config);

            if external_ids.is_empty() && other_config.is_empty() {
                debug!("Switch {} is up to date", path);
                continue;
            }
            info!("Updating switch {}", path);
            external_ids.stage(tx, "external_ids");
            other_config.stage(tx, "other_config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transact::test_support::*;
    use ovsdb_types::{PathId, IID_EXTERNAL_ID_KEY};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use southbound_common::{DataObject, OperationalSnapshot};

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn kv(pairs: &[(&str, &str)]) -> Option<Vec<KeyValue>> {
        Some(pairs.iter().map(|(k, v)| KeyValue::new(*k, *v)).collect())
    }

    #[test]
    fn test_map_delta() {
        let delta = MapDelta::compute(
            &map(&[("a", "1"), ("b", "2"), ("c", "3")]),
            &map(&[("a", "1"), ("b", "0"), ("d", "4"), ("e", "5")]),
            &map(&[("a", "1"), ("d", "4"), ("f", "6")]),
        );
        assert_eq!(delta.changed, map(&[("b", "2"), ("c", "3")]));
        assert_eq!(
            delta.stale.into_iter().collect::<Vec<_>>(),
            vec!["b".to_string(), "d".to_string()]
        );
    }

    #[test]
    fn test_new_switch_gets_stamp_and_config() {
        let desired = OvsdbNodeAugmentation {
            openvswitch_other_configs: kv(&[("n-handler-threads", "4")]),
            ..Default::default()
        };
        let tx = run(&OvsdbNodeUpdateCommand, &created([switch_node(desired)]), &OperationalSnapshot::default());

        assert_eq!(
            ops_json(&tx),
            vec![
                json!({
                    "op": "mutate",
                    "table": "Open_vSwitch",
                    "where": [],
                    "mutations": [["external_ids", "insert",
                        ["map", [[IID_EXTERNAL_ID_KEY, iid(&PathId::node(SWITCH))]]]]]
                }),
                json!({
                    "op": "mutate",
                    "table": "Open_vSwitch",
                    "where": [],
                    "mutations": [["other_config", "insert", ["map", [["n-handler-threads", "4"]]]]]
                }),
            ]
        );
    }

    #[test]
    fn test_changed_key_is_deleted_then_inserted() {
        let stamp = (IID_EXTERNAL_ID_KEY, iid(&PathId::node(SWITCH)));
        let live = OvsdbNodeAugmentation {
            openvswitch_external_ids: kv(&[(stamp.0, stamp.1.as_str()), ("owner", "old")]),
            ..Default::default()
        };
        let desired = OvsdbNodeAugmentation {
            openvswitch_external_ids: kv(&[("owner", "new")]),
            ..Default::default()
        };
        let tx = run(
            &OvsdbNodeUpdateCommand,
            &created([switch_node(desired)]),
            &OperationalSnapshot::new([switch_node(live)]),
        );

        let ops = ops_json(&tx);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0]["mutations"], json!([["external_ids", "delete", "owner"]]));
        assert_eq!(
            ops[1]["mutations"],
            json!([["external_ids", "insert", ["map", [["owner", "new"]]]]])
        );
    }

    #[test]
    fn test_vanished_config_key_is_deleted() {
        let live = OvsdbNodeAugmentation {
            openvswitch_external_ids: kv(&[(IID_EXTERNAL_ID_KEY, iid(&PathId::node(SWITCH)).as_str())]),
            openvswitch_other_configs: kv(&[("stats-update-interval", "5000")]),
            ..Default::default()
        };
        let original = live.clone();
        let changes = created([switch_node(OvsdbNodeAugmentation::default())])
            .with_original(PathId::node(SWITCH), DataObject::Node(switch_node(original)));
        let tx = run(&OvsdbNodeUpdateCommand, &changes, &OperationalSnapshot::new([switch_node(live)]));

        assert_eq!(
            ops_json(&tx),
            vec![json!({
                "op": "mutate",
                "table": "Open_vSwitch",
                "where": [],
                "mutations": [["other_config", "delete", "stats-update-interval"]]
            })]
        );
    }

    #[test]
    fn test_up_to_date_switch_emits_nothing() {
        let live = OvsdbNodeAugmentation {
            openvswitch_external_ids: kv(&[(IID_EXTERNAL_ID_KEY, iid(&PathId::node(SWITCH)).as_str())]),
            ..Default::default()
        };
        let tx = run(
            &OvsdbNodeUpdateCommand,
            &created([switch_node(OvsdbNodeAugmentation::default())]),
            &OperationalSnapshot::new([switch_node(live)]),
        );
        assert!(tx.is_empty());
    }
}
