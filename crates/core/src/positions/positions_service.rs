use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use rust_decimal::Decimal;

use super::positions_model::{Position, PositionEffect};
use super::positions_traits::{PositionRepositoryTrait, PositionServiceTrait};
use crate::assets::AssetRepositoryTrait;
use crate::errors::{DomainError, Result, ValidationError};
use crate::transactions::Transaction;

pub struct PositionService {
    repository: Arc<dyn PositionRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
}

impl PositionService {
    pub fn new(
        repository: Arc<dyn PositionRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
    ) -> Self {
        Self {
            repository,
            asset_repository,
        }
    }
}

#[async_trait]
impl PositionServiceTrait for PositionService {
    fn plan_transaction(&self, transaction: &Transaction) -> Result<Option<Position>> {
        let Some(effect) = transaction.transaction_type.position_effect() else {
            return Ok(None);
        };
        let asset = self.asset_repository.get_by_id(&transaction.asset_id)?;
        if asset.is_cash() {
            return Ok(None);
        }

        let key = transaction.position_key();
        let at = transaction.transaction_date;
        let existing = self.repository.find_open_by_key(&key)?;

        let position = match effect {
            PositionEffect::Deposit => {
                let mut position = existing.unwrap_or_else(|| Position::open(key, at));
                position.add_deposit(transaction.quantity, transaction.derived.amount_local, at)?;
                position
            }
            PositionEffect::Withdrawal => {
                let mut position = match existing {
                    Some(position) => position,
                    None if transaction.allow_overdraw => Position::open(key, at),
                    None => {
                        return Err(DomainError::InsufficientQuantity {
                            requested: transaction.quantity,
                            available: Decimal::ZERO,
                        }
                        .into())
                    }
                };
                let outcome = position.add_withdrawal(
                    transaction.quantity,
                    transaction.derived.amount_local,
                    at,
                    transaction.allow_overdraw,
                )?;
                debug!(
                    "Transaction {} relieves cost basis {} on position {} (closed: {})",
                    transaction.id, outcome.cost_basis, position.id, outcome.closed
                );
                position
            }
        };
        Ok(Some(position))
    }

    async fn apply_transaction(&self, transaction: &Transaction) -> Result<Option<Position>> {
        match self.plan_transaction(transaction)? {
            Some(position) => Ok(Some(self.repository.save(position).await?)),
            None => Ok(None),
        }
    }

    async fn close_position(
        &self,
        position_id: &str,
        force: bool,
        actor: &str,
    ) -> Result<Position> {
        if actor.trim().is_empty() {
            return Err(ValidationError::MissingField("actor".to_string()).into());
        }
        let mut position = self.repository.get_by_id(position_id)?;
        position.close(force, Utc::now())?;
        position.closed_by = Some(actor.to_string());
        info!(
            "Position {} closed by {} (forced: {}, written off: {})",
            position.id, actor, force, position.written_off_quantity
        );
        self.repository.save(position).await
    }

    async fn delete_position(&self, position_id: &str) -> Result<()> {
        let deleted = self.repository.delete(position_id).await?;
        if deleted == 0 {
            return Err(crate::Error::not_found("Position", position_id));
        }
        info!("Position {} deleted", position_id);
        Ok(())
    }

    fn get_position(&self, position_id: &str) -> Result<Position> {
        self.repository.get_by_id(position_id)
    }

    fn get_positions_for_account(&self, account_id: &str) -> Result<Vec<Position>> {
        self.repository.list_by_account(account_id)
    }
}
