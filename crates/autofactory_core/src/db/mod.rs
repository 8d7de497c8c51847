//! SQLite connection settings and pooling.
//!
//! # Responsibility
//! - Turn an opaque connection string into typed settings.
//! - Own the pooled-connection layer factories check connections out of.
//!
//! # Invariants
//! - One pool may back any number of factories; handles are cheap clones.
//! - Checked-out connections are released by drop on every exit path.

mod pool;
pub mod settings;

pub use pool::{create_pool, create_pool_from_str, DbPool};
pub use settings::{ConnectionSettings, DataSource};
