//! Test doubles for the persistence layer
//!
//! Enabled for this crate's own tests and, via the `test-helpers` feature, for
//! downstream crates that need a store without a database.

mod memory_store;

pub use memory_store::InMemoryProductStore;
