//! cwk-testkit
//!
//! In-memory [`Store`](cwk_catalog::Store) plus fixtures for scenario tests.
//! The memory store runs one transaction at a time and enforces the same
//! cascades and uniqueness rules as the Postgres schema, so catalog
//! operations behave the same against either backend.

mod fixtures;
mod mem;

pub use fixtures::{seed_account, seed_course, SeededCourse};
pub use mem::{MemState, MemStore};
