//! Asset domain models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::{Error, Result};

/// Broad classification of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    /// Cash in one currency. The asset id is the ISO currency code.
    Cash,
    #[default]
    Security,
    Crypto,
    Commodity,
    Other,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Cash => "CASH",
            AssetKind::Security => "SECURITY",
            AssetKind::Crypto => "CRYPTO",
            AssetKind::Commodity => "COMMODITY",
            AssetKind::Other => "OTHER",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CASH" => Ok(AssetKind::Cash),
            "SECURITY" => Ok(AssetKind::Security),
            "CRYPTO" => Ok(AssetKind::Crypto),
            "COMMODITY" => Ok(AssetKind::Commodity),
            "OTHER" => Ok(AssetKind::Other),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown asset kind '{}'",
                other
            )))),
        }
    }
}

/// Domain model representing an asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: Option<String>,
    pub kind: AssetKind,
    pub currency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Asset {
    pub fn is_cash(&self) -> bool {
        self.kind == AssetKind::Cash
    }
}

/// Input model for creating a new asset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub id: Option<String>,
    pub symbol: String,
    pub name: Option<String>,
    pub kind: AssetKind,
    pub currency: String,
}

impl NewAsset {
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        if self.currency.trim().is_empty() {
            return Err(ValidationError::MissingField("currency".to_string()).into());
        }
        Ok(())
    }

    /// Cash asset for a currency. Its id is the currency code itself.
    pub fn new_cash_asset(currency: &str) -> Self {
        let code = currency.trim().to_uppercase();
        Self {
            id: Some(code.clone()),
            symbol: code.clone(),
            name: Some(format!("Cash {}", code)),
            kind: AssetKind::Cash,
            currency: code,
        }
    }
}
