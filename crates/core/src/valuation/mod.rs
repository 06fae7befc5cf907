//! Valuation module - read-only market values from the price cache.

mod valuation_model;
mod valuation_service;
mod valuation_traits;

#[cfg(test)]
mod valuation_service_tests;

pub use valuation_model::{AccountValuation, HoldingValuation, VaultValuation, CASH_PRICE_SOURCE};
pub use valuation_service::ValuationService;
pub use valuation_traits::ValuationServiceTrait;
