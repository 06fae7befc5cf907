mod model;
mod repository;

pub use model::{DerivedFieldsDB, FxSnapshotDB, TransactionDB};
pub use repository::TransactionRepository;
