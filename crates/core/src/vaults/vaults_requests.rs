//! One validated input struct per vault action.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};
use crate::positions::Horizon;
use crate::Error;

fn require_positive(field: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::non_positive(field, value).into());
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field.to_string()).into());
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewVaultKind {
    Tokenized,
    #[serde(rename_all = "camelCase")]
    SimplePosition {
        asset_id: String,
        account_id: String,
        #[serde(default)]
        horizon: Horizon,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVaultRequest {
    pub name: String,
    pub currency: String,
    pub kind: NewVaultKind,
    pub initial_share_price: Option<Decimal>,
}

impl CreateVaultRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("currency", &self.currency)?;
        if let Some(price) = self.initial_share_price {
            require_positive("initialSharePrice", price)?;
        }
        if let NewVaultKind::SimplePosition {
            asset_id,
            account_id,
            ..
        } = &self.kind
        {
            require_text("assetId", asset_id)?;
            require_text("accountId", account_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    /// Required for tokenized vaults; the share holder.
    pub user_id: Option<String>,
    pub amount: Decimal,
    pub notes: Option<String>,
}

impl DepositRequest {
    pub fn validate(&self) -> Result<()> {
        require_positive("amount", self.amount)?;
        if let Some(user_id) = &self.user_id {
            require_text("userId", user_id)?;
        }
        Ok(())
    }
}

/// Withdraw either a number of shares or a cash amount, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub user_id: Option<String>,
    pub shares: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
}

impl WithdrawRequest {
    pub fn validate(&self) -> Result<()> {
        match (self.shares, self.amount) {
            (Some(shares), None) => require_positive("shares", shares)?,
            (None, Some(amount)) => require_positive("amount", amount)?,
            _ => {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Exactly one of shares or amount must be given".to_string(),
                )))
            }
        }
        if let Some(user_id) = &self.user_id {
            require_text("userId", user_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldRequest {
    pub amount: Decimal,
    pub notes: Option<String>,
}

impl YieldRequest {
    pub fn validate(&self) -> Result<()> {
        require_positive("amount", self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRequest {
    pub amount: Decimal,
    pub notes: Option<String>,
}

impl FeeRequest {
    pub fn validate(&self) -> Result<()> {
        require_positive("amount", self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRequest {
    pub aum: Decimal,
    pub notes: Option<String>,
}

impl ValuationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.aum < Decimal::ZERO {
            return Err(ValidationError::negative("aum", self.aum).into());
        }
        Ok(())
    }
}

/// Turnover inside the vault. AUM does not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceRequest {
    pub amount: Decimal,
    pub notes: Option<String>,
}

impl RebalanceRequest {
    pub fn validate(&self) -> Result<()> {
        require_positive("amount", self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableManualPricingRequest {
    pub initial_price: Decimal,
    pub notes: Option<String>,
}

impl EnableManualPricingRequest {
    pub fn validate(&self) -> Result<()> {
        require_positive("initialPrice", self.initial_price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManualPriceRequest {
    pub new_price: Decimal,
    pub notes: Option<String>,
}

impl UpdateManualPriceRequest {
    pub fn validate(&self) -> Result<()> {
        if self.new_price < Decimal::ZERO {
            return Err(ValidationError::negative("newPrice", self.new_price).into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManualTotalValueRequest {
    pub new_total_value: Decimal,
    /// Deposits minus withdrawals since the last total-value update.
    #[serde(default)]
    pub net_contribution_delta: Decimal,
    pub notes: Option<String>,
}

impl UpdateManualTotalValueRequest {
    pub fn validate(&self) -> Result<()> {
        require_positive("newTotalValue", self.new_total_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_withdraw_request_needs_exactly_one_quantity() {
        let both = WithdrawRequest {
            user_id: Some("u1".into()),
            shares: Some(dec!(1)),
            amount: Some(dec!(1)),
            notes: None,
        };
        assert_eq!(both.validate().unwrap_err().kind(), ErrorKind::Validation);

        let neither = WithdrawRequest {
            shares: None,
            amount: None,
            ..both.clone()
        };
        assert!(neither.validate().is_err());

        let shares = WithdrawRequest {
            amount: None,
            ..both
        };
        assert!(shares.validate().is_ok());
    }

    #[test]
    fn test_create_request_checks_simple_position_ids() {
        let request = CreateVaultRequest {
            name: "Staking".into(),
            currency: "USD".into(),
            kind: NewVaultKind::SimplePosition {
                asset_id: "".into(),
                account_id: "acc".into(),
                horizon: Horizon::Long,
            },
            initial_share_price: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_amount_requests_reject_zero() {
        assert!(YieldRequest {
            amount: dec!(0),
            notes: None
        }
        .validate()
        .is_err());
        assert!(FeeRequest {
            amount: dec!(-1),
            notes: None
        }
        .validate()
        .is_err());
        assert!(ValuationRequest {
            aum: dec!(0),
            notes: None
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_kind_deserializes_from_tagged_json() {
        let kind: NewVaultKind = serde_json::from_str(
            r#"{"type":"SIMPLE_POSITION","assetId":"ETH","accountId":"acc-1"}"#,
        )
        .unwrap();
        assert_eq!(
            kind,
            NewVaultKind::SimplePosition {
                asset_id: "ETH".into(),
                account_id: "acc-1".into(),
                horizon: Horizon::Long,
            }
        );
    }
}
