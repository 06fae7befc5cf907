//! Database model for assets.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};

use ledgerfolio_core::assets::{Asset, AssetKind, NewAsset};

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
#[diesel(table_name = crate::schema::assets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetDB {
    pub id: String,
    pub symbol: String,
    pub name: Option<String>,
    pub kind: String,
    pub currency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<AssetDB> for Asset {
    fn from(db: AssetDB) -> Self {
        let kind = db.kind.parse().unwrap_or_else(|e| {
            warn!("Asset {} has unknown kind: {}", db.id, e);
            AssetKind::Other
        });
        Self {
            id: db.id,
            symbol: db.symbol,
            name: db.name,
            kind,
            currency: db.currency,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewAsset> for AssetDB {
    fn from(domain: NewAsset) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let symbol = domain.symbol.trim().to_uppercase();
        Self {
            // Without an explicit id the symbol is the id.
            id: domain.id.unwrap_or_else(|| symbol.clone()),
            symbol,
            name: domain.name,
            kind: domain.kind.as_str().to_string(),
            currency: domain.currency.trim().to_uppercase(),
            created_at: now,
            updated_at: now,
        }
    }
}
