//! Database repositories and the store abstraction they implement
//
// Store trait and error taxonomy
pub mod store;
//
// Postgres product repository
pub mod product;
//
// Transaction utilities
pub mod transaction;

pub use product::ProductRepository;
pub use store::{AtomicInsertError, ProductStore, StoreError};
pub use transaction::TransactionGuard;
