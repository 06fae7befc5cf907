//! Database model for accounts.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerfolio_core::accounts::{Account, NewAccount};
use ledgerfolio_core::{Error, Result};

/// Database model for accounts
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
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub name: String,
    pub account_type: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// An unknown `account_type` is an error: defaulting it would silently
/// change how the account's expenses are signed.
impl TryFrom<AccountDB> for Account {
    type Error = Error;

    fn try_from(db: AccountDB) -> Result<Self> {
        Ok(Self {
            account_type: db.account_type.parse()?,
            id: db.id,
            name: db.name,
            currency: db.currency,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<NewAccount> for AccountDB {
    fn from(domain: NewAccount) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: domain.id.unwrap_or_default(),
            name: domain.name.trim().to_string(),
            account_type: domain.account_type.as_str().to_string(),
            currency: domain.currency.trim().to_uppercase(),
            is_active: domain.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}
