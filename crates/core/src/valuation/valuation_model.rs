//! Valuation domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source recorded for cash holdings, which are valued at par.
pub const CASH_PRICE_SOURCE: &str = "CASH";

/// One lot valued at the latest cached price on or before a date.
///
/// Price fields are `None` when no active mapping has a cached price in
/// range; cost basis is always known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingValuation {
    pub position_id: String,
    pub asset_id: String,
    pub account_id: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub price: Option<Decimal>,
    pub price_date: Option<NaiveDate>,
    pub price_source: Option<String>,
    pub market_value: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
}

impl HoldingValuation {
    pub fn is_priced(&self) -> bool {
        self.price.is_some()
    }
}

/// Open lots of an account. Totals only cover priced holdings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountValuation {
    pub account_id: String,
    pub as_of: NaiveDate,
    pub holdings: Vec<HoldingValuation>,
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub unrealized_pnl: Decimal,
    pub unpriced_assets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VaultValuation {
    pub vault_id: String,
    pub currency: String,
    pub supply: Decimal,
    pub share_price: Decimal,
    pub aum: Decimal,
    pub is_manual: bool,
    pub user_id: Option<String>,
    pub user_shares: Option<Decimal>,
    pub user_value: Option<Decimal>,
    pub user_unrealized_pnl: Option<Decimal>,
}
