//! Transactions module - recorded monetary events and their derived amounts.

pub mod calculator;
mod transactions_model;
mod transactions_service;
mod transactions_traits;


pub use calculator::{
    compute_derived_fields, compute_derived_fields_with, CalculationInput, CalculatorConfig,
    CashFlowExemption,
};
pub use transactions_model::{
    DerivedFields, FxSnapshot, NewTransaction, RecalculationSummary, Transaction,
    TransactionType,
};
pub use transactions_service::TransactionService;
pub use transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
