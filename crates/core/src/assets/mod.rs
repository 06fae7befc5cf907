//! Assets module - instruments that can be held in an account.

mod assets_model;
mod assets_service;
mod assets_traits;

pub use assets_model::{Asset, AssetKind, NewAsset};
pub use assets_service::AssetService;
pub use assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
