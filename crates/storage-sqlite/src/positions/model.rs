//! Database model for investment lots.

use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};

use ledgerfolio_core::positions::{Horizon, Position, PositionKey};

use crate::utils::{format_timestamp, parse_decimal, parse_timestamp};

/// One row of `positions`. Also the JSON shape of the lot embedded in a
/// simple-position vault, which keeps every decimal as an exact string.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct PositionDB {
    pub id: String,
    pub asset_id: String,
    pub account_id: String,
    pub horizon: String,
    pub deposit_quantity: String,
    pub deposit_cost: String,
    pub average_unit_cost: String,
    pub withdrawn_quantity: String,
    pub withdrawn_value: String,
    pub cost_basis_withdrawn: String,
    pub pending_realized_pnl: String,
    pub realized_pnl: String,
    pub pnl_percent: String,
    pub is_open: bool,
    pub written_off_quantity: String,
    pub opened_at: String,
    pub closed_at: Option<String>,
    pub closed_by: Option<String>,
    pub updated_at: String,
}

impl From<PositionDB> for Position {
    fn from(db: PositionDB) -> Self {
        let horizon = db.horizon.parse().unwrap_or_else(|e| {
            warn!("Position {} has unknown horizon: {}", db.id, e);
            Horizon::default()
        });
        Position {
            id: db.id,
            key: PositionKey::new(db.asset_id, db.account_id, horizon),
            deposit_quantity: parse_decimal(&db.deposit_quantity),
            deposit_cost: parse_decimal(&db.deposit_cost),
            average_unit_cost: parse_decimal(&db.average_unit_cost),
            withdrawn_quantity: parse_decimal(&db.withdrawn_quantity),
            withdrawn_value: parse_decimal(&db.withdrawn_value),
            cost_basis_withdrawn: parse_decimal(&db.cost_basis_withdrawn),
            pending_realized_pnl: parse_decimal(&db.pending_realized_pnl),
            realized_pnl: parse_decimal(&db.realized_pnl),
            pnl_percent: parse_decimal(&db.pnl_percent),
            is_open: db.is_open,
            written_off_quantity: parse_decimal(&db.written_off_quantity),
            opened_at: parse_timestamp(&db.opened_at),
            closed_at: db.closed_at.as_deref().map(parse_timestamp),
            closed_by: db.closed_by,
            updated_at: parse_timestamp(&db.updated_at),
        }
    }
}

impl From<&Position> for PositionDB {
    fn from(position: &Position) -> Self {
        PositionDB {
            id: position.id.clone(),
            asset_id: position.key.asset_id.clone(),
            account_id: position.key.account_id.clone(),
            horizon: position.key.horizon.as_str().to_string(),
            deposit_quantity: position.deposit_quantity.to_string(),
            deposit_cost: position.deposit_cost.to_string(),
            average_unit_cost: position.average_unit_cost.to_string(),
            withdrawn_quantity: position.withdrawn_quantity.to_string(),
            withdrawn_value: position.withdrawn_value.to_string(),
            cost_basis_withdrawn: position.cost_basis_withdrawn.to_string(),
            pending_realized_pnl: position.pending_realized_pnl.to_string(),
            realized_pnl: position.realized_pnl.to_string(),
            pnl_percent: position.pnl_percent.to_string(),
            is_open: position.is_open,
            written_off_quantity: position.written_off_quantity.to_string(),
            opened_at: format_timestamp(&position.opened_at),
            closed_at: position.closed_at.as_ref().map(format_timestamp),
            closed_by: position.closed_by.clone(),
            updated_at: format_timestamp(&position.updated_at),
        }
    }
}
