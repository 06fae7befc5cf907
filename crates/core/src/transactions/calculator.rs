//! Derived-field calculation for transactions.
//!
//! Turns a raw transaction into its local amount, its converted amounts, the
//! signed quantity change and the signed external cash flow per reporting
//! currency. Every conversion uses the transaction's own FX snapshot.
//!
//! The calculation is pure: the same input always yields the same output, so
//! stored transactions can be recalculated at any time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::transactions_model::{DerivedFields, FxSnapshot, Transaction, TransactionType};
use crate::accounts::AccountType;
use crate::constants::DECIMAL_PRECISION;
use crate::errors::{Result, ValidationError};

/// Tunables for the calculator.
#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    /// Decimal places kept on converted amounts and cash flows.
    pub amount_precision: u32,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            amount_precision: DECIMAL_PRECISION,
        }
    }
}

/// Everything the calculator reads.
#[derive(Debug, Clone)]
pub struct CalculationInput {
    pub transaction_date: DateTime<Utc>,
    pub transaction_type: TransactionType,
    pub asset_id: String,
    pub account_id: String,
    pub account_type: AccountType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub fx_snapshot: FxSnapshot,
    pub internal_flow: bool,
    pub reporting_currencies: Vec<String>,
}

impl CalculationInput {
    /// Rebuilds the input of a stored transaction from its own fields and
    /// stored snapshot.
    pub fn from_transaction(
        transaction: &Transaction,
        account_type: AccountType,
        reporting_currencies: &[String],
    ) -> Self {
        Self {
            transaction_date: transaction.transaction_date,
            transaction_type: transaction.transaction_type,
            asset_id: transaction.asset_id.clone(),
            account_id: transaction.account_id.clone(),
            account_type,
            quantity: transaction.quantity,
            unit_price: transaction.unit_price,
            fx_snapshot: transaction.fx_snapshot.clone(),
            internal_flow: transaction.internal_flow,
            reporting_currencies: reporting_currencies.to_vec(),
        }
    }
}

/// Why a transaction's cash flow is forced to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashFlowExemption {
    /// Both legs of the transfer are inside the portfolio.
    InternalTransfer,
    /// The liability of a credit account absorbs the expense.
    CreditExpense,
    /// Cash moved in its own currency; a reclassification, not income.
    SameCurrencyCash,
    /// Valuations observe, they do not move money.
    Valuation,
}

/// First matching override, evaluated in a fixed order.
pub fn cash_flow_exemption(input: &CalculationInput) -> Option<CashFlowExemption> {
    let tx_type = input.transaction_type;
    if input.internal_flow && tx_type.is_transfer() {
        return Some(CashFlowExemption::InternalTransfer);
    }
    if tx_type == TransactionType::Expense && input.account_type.is_credit() {
        return Some(CashFlowExemption::CreditExpense);
    }
    if matches!(
        tx_type,
        TransactionType::Deposit | TransactionType::Withdraw | TransactionType::Borrow
    ) && input.asset_id == input.fx_snapshot.local_currency
    {
        return Some(CashFlowExemption::SameCurrencyCash);
    }
    if tx_type == TransactionType::Valuation {
        return Some(CashFlowExemption::Valuation);
    }
    None
}

fn validate(input: &CalculationInput) -> Result<()> {
    if input.account_id.trim().is_empty() {
        return Err(ValidationError::MissingField("accountId".to_string()).into());
    }
    if input.asset_id.trim().is_empty() {
        return Err(ValidationError::MissingField("assetId".to_string()).into());
    }
    if input.quantity <= Decimal::ZERO {
        return Err(ValidationError::non_positive("quantity", input.quantity).into());
    }
    if input.unit_price < Decimal::ZERO {
        return Err(ValidationError::negative("unitPrice", input.unit_price).into());
    }
    if input.fx_snapshot.local_currency.trim().is_empty() {
        return Err(ValidationError::MissingField("fxSnapshot.localCurrency".to_string()).into());
    }
    for currency in &input.reporting_currencies {
        match input.fx_snapshot.rate_for(currency) {
            None => return Err(ValidationError::MissingFxRate(currency.clone()).into()),
            Some(rate) if rate <= Decimal::ZERO => {
                return Err(ValidationError::InvalidFxRate {
                    currency: currency.clone(),
                    rate,
                }
                .into())
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Computes derived fields with the default configuration.
pub fn compute_derived_fields(input: &CalculationInput) -> Result<DerivedFields> {
    compute_derived_fields_with(input, &CalculatorConfig::default())
}

pub fn compute_derived_fields_with(
    input: &CalculationInput,
    config: &CalculatorConfig,
) -> Result<DerivedFields> {
    validate(input)?;

    let amount_local = input.quantity * input.unit_price;
    let sign = input.transaction_type.quantity_sign();
    let delta_quantity = input.quantity * sign;
    let exempt = cash_flow_exemption(input).is_some();

    let mut amounts = BTreeMap::new();
    let mut cash_flows = BTreeMap::new();
    for currency in &input.reporting_currencies {
        // Presence and positivity checked in validate()
        let rate = input.fx_snapshot.rate_for(currency).unwrap_or(Decimal::ONE);
        let amount = (amount_local * rate).round_dp(config.amount_precision);
        let flow = if exempt { Decimal::ZERO } else { amount * sign };
        amounts.insert(currency.clone(), amount);
        cash_flows.insert(currency.clone(), flow);
    }

    Ok(DerivedFields {
        amount_local,
        amounts,
        delta_quantity,
        cash_flows,
    })
}
