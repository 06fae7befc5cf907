//! Database models for transactions.

use std::collections::BTreeMap;

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerfolio_core::transactions::{DerivedFields, FxSnapshot, Transaction};
use ledgerfolio_core::{Error, Result};

use crate::errors::StorageError;
use crate::utils::{format_timestamp, parse_decimal, parse_timestamp};

fn decimals_to_strings(
    map: &BTreeMap<String, rust_decimal::Decimal>,
) -> BTreeMap<String, String> {
    map.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
}

fn strings_to_decimals(
    map: BTreeMap<String, String>,
) -> BTreeMap<String, rust_decimal::Decimal> {
    map.into_iter()
        .map(|(k, v)| {
            let value = parse_decimal(&v);
            (k, value)
        })
        .collect()
}

/// JSON shape of the stored FX snapshot. Rates stay strings so they come back
/// exactly as they were captured.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FxSnapshotDB {
    pub local_currency: String,
    pub rates: BTreeMap<String, String>,
    pub captured_at: String,
}

impl From<&FxSnapshot> for FxSnapshotDB {
    fn from(snapshot: &FxSnapshot) -> Self {
        Self {
            local_currency: snapshot.local_currency.clone(),
            rates: decimals_to_strings(&snapshot.rates),
            captured_at: format_timestamp(&snapshot.captured_at),
        }
    }
}

impl From<FxSnapshotDB> for FxSnapshot {
    fn from(db: FxSnapshotDB) -> Self {
        Self {
            local_currency: db.local_currency,
            rates: strings_to_decimals(db.rates),
            captured_at: parse_timestamp(&db.captured_at),
        }
    }
}

/// JSON shape of the derived amounts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFieldsDB {
    pub amount_local: String,
    #[serde(default)]
    pub amounts: BTreeMap<String, String>,
    pub delta_quantity: String,
    #[serde(default)]
    pub cash_flows: BTreeMap<String, String>,
}

impl From<&DerivedFields> for DerivedFieldsDB {
    fn from(derived: &DerivedFields) -> Self {
        Self {
            amount_local: derived.amount_local.to_string(),
            amounts: decimals_to_strings(&derived.amounts),
            delta_quantity: derived.delta_quantity.to_string(),
            cash_flows: decimals_to_strings(&derived.cash_flows),
        }
    }
}

impl From<DerivedFieldsDB> for DerivedFields {
    fn from(db: DerivedFieldsDB) -> Self {
        Self {
            amount_local: parse_decimal(&db.amount_local),
            amounts: strings_to_decimals(db.amounts),
            delta_quantity: parse_decimal(&db.delta_quantity),
            cash_flows: strings_to_decimals(db.cash_flows),
        }
    }
}

pub(crate) fn derived_to_json(derived: &DerivedFields) -> Result<String> {
    serde_json::to_string(&DerivedFieldsDB::from(derived))
        .map_err(|e| StorageError::from(e).into())
}

/// One row of `transactions`.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub account_id: String,
    pub asset_id: String,
    pub transaction_type: String,
    pub transaction_date: String,
    pub quantity: String,
    pub unit_price: String,
    pub horizon: String,
    pub fx_snapshot: String,
    pub internal_flow: bool,
    pub allow_overdraw: bool,
    pub notes: Option<String>,
    pub derived: String,
    pub created_by: String,
    pub created_at: String,
}

impl TryFrom<&Transaction> for TransactionDB {
    type Error = Error;

    fn try_from(transaction: &Transaction) -> Result<Self> {
        let fx_snapshot = serde_json::to_string(&FxSnapshotDB::from(&transaction.fx_snapshot))
            .map_err(StorageError::from)?;
        Ok(Self {
            id: transaction.id.clone(),
            account_id: transaction.account_id.clone(),
            asset_id: transaction.asset_id.clone(),
            transaction_type: transaction.transaction_type.as_str().to_string(),
            transaction_date: format_timestamp(&transaction.transaction_date),
            quantity: transaction.quantity.to_string(),
            unit_price: transaction.unit_price.to_string(),
            horizon: transaction.horizon.as_str().to_string(),
            fx_snapshot,
            internal_flow: transaction.internal_flow,
            allow_overdraw: transaction.allow_overdraw,
            notes: transaction.notes.clone(),
            derived: derived_to_json(&transaction.derived)?,
            created_by: transaction.created_by.clone(),
            created_at: format_timestamp(&transaction.created_at),
        })
    }
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = Error;

    fn try_from(db: TransactionDB) -> Result<Self> {
        let fx_snapshot: FxSnapshotDB =
            serde_json::from_str(&db.fx_snapshot).map_err(StorageError::from)?;
        let derived: DerivedFieldsDB =
            serde_json::from_str(&db.derived).map_err(StorageError::from)?;
        Ok(Self {
            transaction_type: db.transaction_type.parse()?,
            horizon: db.horizon.parse()?,
            transaction_date: parse_timestamp(&db.transaction_date),
            quantity: parse_decimal(&db.quantity),
            unit_price: parse_decimal(&db.unit_price),
            fx_snapshot: fx_snapshot.into(),
            derived: derived.into(),
            created_at: parse_timestamp(&db.created_at),
            id: db.id,
            account_id: db.account_id,
            asset_id: db.asset_id,
            internal_flow: db.internal_flow,
            allow_overdraw: db.allow_overdraw,
            notes: db.notes,
            created_by: db.created_by,
        })
    }
}
