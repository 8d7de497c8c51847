//! Connection pool bootstrap for SQLite.
//!
//! # Responsibility
//! - Build a shared `r2d2` pool from parsed connection settings.
//! - Configure connection pragmas on every new pooled connection.
//!
//! # Invariants
//! - Pool construction never touches the database; an unreachable data
//!   source surfaces on the first checkout.
//! - Settings are validated before the pool is built, so r2d2 and SQLite
//!   never see out-of-range timeouts or pool sizes.
//! - Every pooled connection has the busy timeout applied and the configured
//!   `foreign_keys` mode.

use super::settings::{ConnectionSettings, DataSource};
use crate::config::ConfigError;
use log::{error, info};
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Instant;

/// Shared, cloneable pool handle.
pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

/// Builds a pool for the given settings.
///
/// # Errors
/// - `MalformedConnectionString` when the settings are out of range (see
///   [`ConnectionSettings::validate`]).
///
/// # Side effects
/// - Emits a `db_pool_open` logging event.
pub fn create_pool(settings: &ConnectionSettings) -> Result<DbPool, ConfigError> {
    let started_at = Instant::now();
    if let Err(err) = settings.validate() {
        error!(
            "event=db_pool_open module=db status=error error_code=settings_invalid mode={} error={}",
            settings.mode(),
            err
        );
        return Err(err);
    }

    let busy_timeout = settings.busy_timeout;
    let foreign_keys = settings.foreign_keys;

    let manager = match &settings.data_source {
        DataSource::File(path) => SqliteConnectionManager::file(path),
        DataSource::Memory => SqliteConnectionManager::memory(),
    }
    .with_init(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", foreign_keys)?;
        Ok(())
    });

    let mut builder = r2d2::Pool::builder()
        .max_size(settings.effective_pool_size())
        .connection_timeout(settings.connect_timeout);
    builder = match settings.data_source {
        // The single connection holds the whole database, never recycle it.
        DataSource::Memory => builder.idle_timeout(None).max_lifetime(None),
        DataSource::File(_) => builder.min_idle(Some(0)),
    };
    let pool = builder.build_unchecked(manager);

    info!(
        "event=db_pool_open module=db status=ok mode={} max_size={} duration_ms={}",
        settings.mode(),
        settings.effective_pool_size(),
        started_at.elapsed().as_millis()
    );
    Ok(pool)
}

/// Parses `connection_string` and builds a pool for it.
pub fn create_pool_from_str(connection_string: &str) -> Result<DbPool, ConfigError> {
    match ConnectionSettings::parse(connection_string) {
        Ok(settings) => create_pool(&settings),
        Err(err) => {
            // Connection strings may carry credentials, log only the failure.
            error!(
                "event=db_pool_open module=db status=error error_code=connection_string_invalid error={}",
                err
            );
            Err(err)
        }
    }
}
