//! Database models for vaults.

use diesel::prelude::*;

use ledgerfolio_core::positions::Position;
use ledgerfolio_core::vaults::{
    ManualPricing, Vault, VaultKind, VaultShare, VaultTransaction,
};
use ledgerfolio_core::{Error, Result};

use crate::errors::StorageError;
use crate::positions::PositionDB;
use crate::utils::{format_timestamp, parse_decimal, parse_optional_decimal, parse_timestamp};

const KIND_TOKENIZED: &str = "TOKENIZED";
const KIND_SIMPLE_POSITION: &str = "SIMPLE_POSITION";

/// One row of `vaults`. A tokenized vault fills `total_shares`; a
/// simple-position vault keeps its lot as JSON in `position`.
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::vaults)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct VaultDB {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub kind: String,
    pub total_shares: Option<String>,
    pub position: Option<String>,
    pub aum: String,
    pub current_share_price: String,
    pub initial_share_price: String,
    pub is_manual_price: bool,
    pub manual_price_per_share: Option<String>,
    pub reference_aum: Option<String>,
    pub reference_price: Option<String>,
    pub manual_updated_by: Option<String>,
    pub manual_updated_at: Option<String>,
    pub manual_notes: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<&Vault> for VaultDB {
    type Error = Error;

    fn try_from(vault: &Vault) -> Result<Self> {
        let (total_shares, position) = match &vault.kind {
            VaultKind::Tokenized { total_shares } => (Some(total_shares.to_string()), None),
            VaultKind::SimplePosition { position } => {
                let json = serde_json::to_string(&PositionDB::from(position))
                    .map_err(StorageError::from)?;
                (None, Some(json))
            }
        };
        let pricing = &vault.manual_pricing;

        Ok(Self {
            id: vault.id.clone(),
            name: vault.name.clone(),
            currency: vault.currency.clone(),
            kind: vault.kind.name().to_string(),
            total_shares,
            position,
            aum: vault.aum.to_string(),
            current_share_price: vault.current_share_price.to_string(),
            initial_share_price: vault.initial_share_price.to_string(),
            is_manual_price: pricing.is_manual_price,
            manual_price_per_share: pricing.manual_price_per_share.map(|d| d.to_string()),
            reference_aum: pricing.reference_aum.map(|d| d.to_string()),
            reference_price: pricing.reference_price.map(|d| d.to_string()),
            manual_updated_by: pricing.updated_by.clone(),
            manual_updated_at: pricing.updated_at.as_ref().map(format_timestamp),
            manual_notes: pricing.notes.clone(),
            status: vault.status.as_str().to_string(),
            created_at: format_timestamp(&vault.created_at),
            updated_at: format_timestamp(&vault.updated_at),
        })
    }
}

impl TryFrom<VaultDB> for Vault {
    type Error = Error;

    fn try_from(db: VaultDB) -> Result<Self> {
        let kind = match db.kind.as_str() {
            KIND_TOKENIZED => VaultKind::Tokenized {
                total_shares: parse_optional_decimal(db.total_shares.as_deref())
                    .unwrap_or_default(),
            },
            KIND_SIMPLE_POSITION => {
                let json = db.position.as_deref().ok_or_else(|| {
                    StorageError::SerializationError(format!(
                        "Vault {} has no stored position",
                        db.id
                    ))
                })?;
                let position: PositionDB =
                    serde_json::from_str(json).map_err(StorageError::from)?;
                VaultKind::SimplePosition {
                    position: Position::from(position),
                }
            }
            other => {
                return Err(StorageError::SerializationError(format!(
                    "Vault {} has unknown kind '{}'",
                    db.id, other
                ))
                .into())
            }
        };

        Ok(Self {
            kind,
            aum: parse_decimal(&db.aum),
            current_share_price: parse_decimal(&db.current_share_price),
            initial_share_price: parse_decimal(&db.initial_share_price),
            manual_pricing: ManualPricing {
                is_manual_price: db.is_manual_price,
                manual_price_per_share: parse_optional_decimal(
                    db.manual_price_per_share.as_deref(),
                ),
                reference_aum: parse_optional_decimal(db.reference_aum.as_deref()),
                reference_price: parse_optional_decimal(db.reference_price.as_deref()),
                updated_by: db.manual_updated_by,
                updated_at: db.manual_updated_at.as_deref().map(parse_timestamp),
                notes: db.manual_notes,
            },
            status: db.status.parse()?,
            created_at: parse_timestamp(&db.created_at),
            updated_at: parse_timestamp(&db.updated_at),
            id: db.id,
            name: db.name,
            currency: db.currency,
        })
    }
}

/// One row of `vault_shares`.
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::vault_shares)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VaultShareDB {
    pub id: String,
    pub vault_id: String,
    pub user_id: String,
    pub share_balance: String,
    pub total_cost: String,
    pub average_cost_per_share: String,
    pub realized_pnl: String,
    pub updated_at: String,
}

impl From<&VaultShare> for VaultShareDB {
    fn from(share: &VaultShare) -> Self {
        Self {
            id: share.id.clone(),
            vault_id: share.vault_id.clone(),
            user_id: share.user_id.clone(),
            share_balance: share.share_balance.to_string(),
            total_cost: share.total_cost.to_string(),
            average_cost_per_share: share.average_cost_per_share.to_string(),
            realized_pnl: share.realized_pnl.to_string(),
            updated_at: format_timestamp(&share.updated_at),
        }
    }
}

impl From<VaultShareDB> for VaultShare {
    fn from(db: VaultShareDB) -> Self {
        Self {
            share_balance: parse_decimal(&db.share_balance),
            total_cost: parse_decimal(&db.total_cost),
            average_cost_per_share: parse_decimal(&db.average_cost_per_share),
            realized_pnl: parse_decimal(&db.realized_pnl),
            updated_at: parse_timestamp(&db.updated_at),
            id: db.id,
            vault_id: db.vault_id,
            user_id: db.user_id,
        }
    }
}

/// One row of `vault_transactions`. `entry_index` orders the entries written
/// by a single mutation, which share a timestamp.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::vault_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VaultTransactionDB {
    pub id: String,
    pub vault_id: String,
    pub entry_index: i32,
    pub user_id: Option<String>,
    pub transaction_type: String,
    pub amount: String,
    pub shares: String,
    pub price_per_share: String,
    pub aum_before: String,
    pub aum_after: String,
    pub share_price_before: String,
    pub share_price_after: String,
    pub user_shares_before: Option<String>,
    pub user_shares_after: Option<String>,
    pub actor: String,
    pub notes: Option<String>,
    pub created_at: String,
}

impl VaultTransactionDB {
    pub fn from_entry(entry: &VaultTransaction, entry_index: i32) -> Self {
        Self {
            id: entry.id.clone(),
            vault_id: entry.vault_id.clone(),
            entry_index,
            user_id: entry.user_id.clone(),
            transaction_type: entry.transaction_type.as_str().to_string(),
            amount: entry.amount.to_string(),
            shares: entry.shares.to_string(),
            price_per_share: entry.price_per_share.to_string(),
            aum_before: entry.aum_before.to_string(),
            aum_after: entry.aum_after.to_string(),
            share_price_before: entry.share_price_before.to_string(),
            share_price_after: entry.share_price_after.to_string(),
            user_shares_before: entry.user_shares_before.map(|d| d.to_string()),
            user_shares_after: entry.user_shares_after.map(|d| d.to_string()),
            actor: entry.actor.clone(),
            notes: entry.notes.clone(),
            created_at: format_timestamp(&entry.created_at),
        }
    }
}

impl TryFrom<VaultTransactionDB> for VaultTransaction {
    type Error = Error;

    fn try_from(db: VaultTransactionDB) -> Result<Self> {
        Ok(Self {
            transaction_type: db.transaction_type.parse()?,
            amount: parse_decimal(&db.amount),
            shares: parse_decimal(&db.shares),
            price_per_share: parse_decimal(&db.price_per_share),
            aum_before: parse_decimal(&db.aum_before),
            aum_after: parse_decimal(&db.aum_after),
            share_price_before: parse_decimal(&db.share_price_before),
            share_price_after: parse_decimal(&db.share_price_after),
            user_shares_before: parse_optional_decimal(db.user_shares_before.as_deref()),
            user_shares_after: parse_optional_decimal(db.user_shares_after.as_deref()),
            created_at: parse_timestamp(&db.created_at),
            id: db.id,
            vault_id: db.vault_id,
            user_id: db.user_id,
            actor: db.actor,
            notes: db.notes,
        })
    }
}
