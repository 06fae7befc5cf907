//! Positions module - investment lots with weighted-average cost basis.

mod positions_model;
mod positions_service;
mod positions_traits;


pub use positions_model::{
    is_quantity_significant, Horizon, Position, PositionEffect, PositionKey, WithdrawalOutcome,
};
pub use positions_service::PositionService;
pub use positions_traits::{PositionRepositoryTrait, PositionServiceTrait};
