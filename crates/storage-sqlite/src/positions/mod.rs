//! SQLite storage implementation for investment lots.

mod model;
mod repository;

pub use model::PositionDB;
pub(crate) use repository::upsert_position;
pub use repository::PositionRepository;
