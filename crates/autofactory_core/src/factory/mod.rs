//! Record-generic CRUD over pooled SQLite connections.
//!
//! # Responsibility
//! - Render the INSERT/UPDATE/SELECT/DELETE text for a record type once.
//! - Expose the five CRUD operations through `EntityRepository`.
//!
//! # Invariants
//! - The key column is never part of INSERT/UPDATE column lists.
//! - Every value, the key included, is bound as a parameter; no value is
//!   ever interpolated into SQL text.

mod entity_factory;
mod statements;

pub use entity_factory::{EntityFactory, EntityRepository};
