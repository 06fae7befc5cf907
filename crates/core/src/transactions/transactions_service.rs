use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use super::calculator::{compute_derived_fields_with, CalculationInput, CalculatorConfig};
use super::transactions_model::{NewTransaction, RecalculationSummary, Transaction};
use super::transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
use crate::accounts::AccountRepositoryTrait;
use crate::errors::{Result, ValidationError};
use crate::positions::PositionServiceTrait;

/// Records transactions: computes derived fields, plans the lot change and
/// saves both together.
pub struct TransactionService {
    repository: Arc<dyn TransactionRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    position_service: Arc<dyn PositionServiceTrait>,
    reporting_currencies: Vec<String>,
    config: CalculatorConfig,
}

impl TransactionService {
    pub fn new(
        repository: Arc<dyn TransactionRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        position_service: Arc<dyn PositionServiceTrait>,
        reporting_currencies: Vec<String>,
    ) -> Self {
        Self {
            repository,
            account_repository,
            position_service,
            reporting_currencies,
            config: CalculatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CalculatorConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    async fn create_transaction(
        &self,
        new_transaction: NewTransaction,
        actor: &str,
    ) -> Result<Transaction> {
        if actor.trim().is_empty() {
            return Err(ValidationError::MissingField("actor".to_string()).into());
        }
        if new_transaction.account_id.trim().is_empty() {
            return Err(ValidationError::MissingField("accountId".to_string()).into());
        }
        let account = self.account_repository.get_by_id(&new_transaction.account_id)?;

        let now = Utc::now();
        let mut transaction = Transaction {
            id: new_transaction
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            account_id: new_transaction.account_id,
            asset_id: new_transaction.asset_id,
            transaction_type: new_transaction.transaction_type,
            transaction_date: new_transaction.transaction_date,
            quantity: new_transaction.quantity,
            unit_price: new_transaction.unit_price,
            horizon: new_transaction.horizon,
            fx_snapshot: new_transaction.fx_snapshot,
            internal_flow: new_transaction.internal_flow,
            allow_overdraw: new_transaction.allow_overdraw,
            notes: new_transaction.notes,
            derived: Default::default(),
            created_by: actor.to_string(),
            created_at: now,
        };

        let input = CalculationInput::from_transaction(
            &transaction,
            account.account_type,
            &self.reporting_currencies,
        );
        transaction.derived = compute_derived_fields_with(&input, &self.config)?;

        let position = self.position_service.plan_transaction(&transaction)?;
        debug!(
            "Recording {} {} of {} in account {} (lot change: {})",
            transaction.transaction_type,
            transaction.quantity,
            transaction.asset_id,
            transaction.account_id,
            position.is_some()
        );

        self.repository.create(transaction, position).await
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.repository.get_by_id(transaction_id)
    }

    fn list_transactions(&self, account_id: Option<&str>) -> Result<Vec<Transaction>> {
        self.repository.list(account_id)
    }

    async fn recalculate_all(&self) -> Result<RecalculationSummary> {
        let transactions = self.repository.list(None)?;
        let mut summary = RecalculationSummary {
            total: transactions.len(),
            ..Default::default()
        };

        for transaction in transactions {
            let account = match self.account_repository.get_by_id(&transaction.account_id) {
                Ok(account) => account,
                Err(e) => {
                    warn!("Skipping transaction {}: {}", transaction.id, e);
                    summary.failed.push(transaction.id);
                    continue;
                }
            };
            let input = CalculationInput::from_transaction(
                &transaction,
                account.account_type,
                &self.reporting_currencies,
            );
            match compute_derived_fields_with(&input, &self.config) {
                Ok(derived) if derived == transaction.derived => summary.unchanged += 1,
                Ok(derived) => {
                    self.repository
                        .update_derived(&transaction.id, derived)
                        .await?;
                    summary.changed += 1;
                }
                Err(e) => {
                    warn!("Cannot recalculate transaction {}: {}", transaction.id, e);
                    summary.failed.push(transaction.id);
                }
            }
        }

        info!(
            "Recalculated {} transactions: {} changed, {} unchanged, {} failed",
            summary.total,
            summary.changed,
            summary.unchanged,
            summary.failed.len()
        );
        Ok(summary)
    }
}
