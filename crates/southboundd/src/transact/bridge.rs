//! Bridge reconcilers.

use super::util::{Side, Stamp};
use log::{debug, info, warn};
use ovsdb_types::OvsdbBridgeAugmentation;
use ovsdb_wire::{BridgeRow, Condition, DatabaseSchema, Datum, Mutation, Table, TransactionBuilder};
use southbound_common::{TransactCommand, TransactContext};

/// Builds the settable columns of a bridge, without its name.
fn bridge_row(schema: &DatabaseSchema, bridge: &OvsdbBridgeAugmentation, side: Side<'_>) -> BridgeRow {
    let mut row = BridgeRow::new(schema);
    if let Some(fail_mode) = bridge.fail_mode {
        row.set_fail_mode(fail_mode.as_str());
    }
    if let Some(datapath_type) = bridge.datapath_type {
        row.set_datapath_type(datapath_type.as_str());
    }
    if let Some(stp_enable) = bridge.stp_enable {
        side.gated(Table::Bridge, "stp_enable", row.set_stp_enable(stp_enable));
    }
    if let Some(other_config) =
        side.key_value_map(bridge.bridge_other_configs.as_ref(), "Bridge", "other_config")
    {
        row.set_other_config(&other_config);
    }
    if let Some(external_ids) = side.external_ids(bridge.bridge_external_ids.as_ref(), "Bridge") {
        row.set_external_ids(&external_ids);
    }
    row
}

/// Creates missing bridges and updates changed ones.
///
/// Bridges are matched by name. A snapshot bridge under the same path
/// with a different name is a different bridge, so the desired one is
/// inserted and the old one is left to its own removal.
#[derive(Debug, Default)]
pub struct BridgeUpdateCommand;

impl BridgeUpdateCommand {
    fn create(tx: &mut TransactionBuilder, name: &str, bridge: &OvsdbBridgeAugmentation, stamp: &Stamp) {
        let mut row = bridge_row(tx.schema(), bridge, Side::Insert(stamp));
        row.set_name(name);

        let uuid_name = tx.unique_name(&format!("Bridge_{}", name));
        match tx.insert(row, &uuid_name) {
            Ok(bridge_ref) => {
                tx.mutate(
                    Table::OpenVSwitch,
                    Mutation::insert("bridges", Datum::set([bridge_ref])),
                    Vec::new(),
                );
                info!("Creating bridge {} as {}", name, uuid_name);
            }
            Err(e) => warn!("Failed to stage insert of bridge {}: {}", name, e),
        }
    }

    fn update(
        tx: &mut TransactionBuilder,
        name: &str,
        bridge: &OvsdbBridgeAugmentation,
        live: &OvsdbBridgeAugmentation,
        stamp: &Stamp,
    ) {
        let mut row = bridge_row(tx.schema(), bridge, Side::Update(stamp));
        row.retain_changed(&bridge_row(tx.schema(), live, Side::Operational));
        if row.is_empty() {
            debug!("Bridge {} is up to date", name);
            return;
        }
        tx.update(row, vec![Condition::equal("name", name)]);
        info!("Updating bridge {}", name);
    }
}

impl TransactCommand for BridgeUpdateCommand {
    fn name(&self) -> &str {
        "BridgeUpdateCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for (path, bridge) in ctx.changes.created_or_updated::<OvsdbBridgeAugmentation>() {
            let Some(name) = bridge.bridge_name.as_deref() else {
                warn!("Bridge at {} has no name, skipping", path);
                continue;
            };
            let stamp = Stamp::iid(ctx.codec, &path);
            let live = ctx
                .state
                .get_bridge(&path)
                .filter(|live| live.bridge_name.as_deref() == Some(name));
            match live {
                Some(live) => Self::update(tx, name, bridge, live, &stamp),
                None => Self::create(tx, name, bridge, &stamp),
            }
        }
    }
}

/// Deletes removed bridges and detaches them from the switch row.
#[derive(Debug, Default)]
pub struct BridgeRemovedCommand;

impl TransactCommand for BridgeRemovedCommand {
    fn name(&self) -> &str {
        "BridgeRemovedCommand"
    }

    fn execute(&self, tx: &mut TransactionBuilder, ctx: &TransactContext<'_>) {
        for path in ctx.changes.removed::<OvsdbBridgeAugmentation>() {
            let Some(live) = ctx.state.get_bridge(&path) else {
                debug!("Bridge at {} is already gone", path);
                continue;
            };
            let Some(uuid) = live.bridge_uuid else {
                warn!("Unable to delete bridge at {}: no UUID in the operational store", path);
                continue;
            };
            let name = live.bridge_name.as_deref().unwrap_or("<unnamed>");

            tx.delete(Table::Bridge, vec![Condition::uuid_equal(uuid)]);
            tx.comment(format!("Bridge: Deleting {}", name));
            tx.mutate(
                Table::OpenVSwitch,
                Mutation::delete("bridges", Datum::set([uuid])),
                Vec::new(),
            );
            info!("Deleting bridge {} ({})", name, uuid);
        }
    }
}
