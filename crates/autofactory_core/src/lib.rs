//! Record-generic CRUD data access for SQLite.
//!
//! A record type declares its table shape once (see [`entity!`]) and an
//! [`EntityFactory`] turns that declaration into parameterized SQL, runs it on
//! a pooled connection and maps rows back by column position.

pub mod config;
pub mod db;
pub mod error;
pub mod factory;
pub mod logging;
pub mod record;

pub use config::{ConfigError, ConfigSource, EnvConfig, FileConfig, DEFAULT_CONNECTION_NAME};
pub use db::{create_pool, create_pool_from_str, ConnectionSettings, DataSource, DbPool};
pub use error::{FactoryError, FactoryResult, MappingError};
pub use factory::{EntityFactory, EntityRepository};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use record::{ColumnDescriptor, Record, ReflectionError, TableDescriptor};

// Used by `entity!` expansions in downstream crates.
#[doc(hidden)]
pub use rusqlite;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
