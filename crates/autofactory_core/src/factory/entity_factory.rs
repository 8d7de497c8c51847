//! Generic CRUD factory and its repository contract.
//!
//! # Responsibility
//! - Execute the rendered statements of one record type against a pooled
//!   SQLite connection.
//! - Map `SELECT *` rows back into records by column ordinal.
//!
//! # Invariants
//! - Each operation checks out exactly one connection and releases it before
//!   returning, on success and on error.
//! - Lookups by key that find nothing return `T::default()`.
//! - NULL columns leave the field at its default value.
//! - A key lookup matching more than one row is a mapping error.
//! - A mapping failure on any row fails the whole call.
//! - A record whose `values()` does not cover every declared column is
//!   rejected before any statement runs.

use super::statements::Statements;
use crate::config::{ConfigSource, DEFAULT_CONNECTION_NAME};
use crate::db::{create_pool_from_str, DbPool};
use crate::error::{FactoryError, FactoryResult, MappingError};
use crate::record::{Record, TableDescriptor};
use log::{debug, error, info};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, ToSql};
use std::marker::PhantomData;
use std::time::Instant;

/// Repository interface for record CRUD operations.
pub trait EntityRepository<T: Record> {
    /// Inserts every non-key column and returns the database-assigned key.
    fn add(&self, entity: &T) -> FactoryResult<i64>;
    /// Rewrites the non-key columns of the row matching `entity.key()`.
    /// Returns the affected row count; zero is not an error.
    fn update(&self, entity: &T) -> FactoryResult<usize>;
    /// Loads the row with key `id`, or `T::default()` when absent.
    fn get(&self, id: i64) -> FactoryResult<T>;
    /// Loads every row in database order.
    fn get_all(&self) -> FactoryResult<Vec<T>>;
    /// Deletes the row with key `id`; deleting a missing row succeeds.
    fn delete(&self, id: i64) -> FactoryResult<()>;
}

/// SQLite-backed CRUD factory for one record type.
///
/// Cheap to clone; clones share the pool and the rendered statements are
/// copied. Safe to use from several threads at once.
pub struct EntityFactory<T: Record> {
    pool: DbPool,
    descriptor: TableDescriptor,
    statements: Statements,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> std::fmt::Debug for EntityFactory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityFactory")
            .field("pool", &self.pool)
            .field("descriptor", &self.descriptor)
            .field("statements", &self.statements)
            .finish()
    }
}

impl<T: Record> Clone for EntityFactory<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            descriptor: self.descriptor.clone(),
            statements: self.statements.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> EntityFactory<T> {
    /// Builds a factory from the connection string registered under
    /// [`DEFAULT_CONNECTION_NAME`].
    ///
    /// # Errors
    /// - `Configuration` when the name is absent or the string is malformed.
    /// - `Reflection` when `T`'s declaration is invalid.
    pub fn from_config(source: &impl ConfigSource) -> FactoryResult<Self> {
        Self::from_named_config(source, DEFAULT_CONNECTION_NAME)
    }

    /// Same as [`from_config`](Self::from_config) with an explicit name.
    pub fn from_named_config(source: &impl ConfigSource, name: &str) -> FactoryResult<Self> {
        let connection_string = source.require_connection_string(name).map_err(|err| {
            error!(
                "event=factory_init module=factory status=error table={} error_code=connection_string_missing name={}",
                T::TABLE_NAME,
                name
            );
            err
        })?;
        Self::from_connection_string(&connection_string)
    }

    /// Builds a private pool for `connection_string` and a factory on it.
    pub fn from_connection_string(connection_string: &str) -> FactoryResult<Self> {
        let pool = create_pool_from_str(connection_string)?;
        Self::with_pool(pool)
    }

    /// Builds a factory on an existing, possibly shared, pool.
    pub fn with_pool(pool: DbPool) -> FactoryResult<Self> {
        let descriptor = TableDescriptor::of::<T>().map_err(|err| {
            error!(
                "event=factory_init module=factory status=error table={} error_code=invalid_record error={}",
                T::TABLE_NAME,
                err
            );
            err
        })?;
        let statements = Statements::render(&descriptor);

        info!(
            "event=factory_init module=factory status=ok table={} columns={}",
            descriptor.table(),
            descriptor.columns().len()
        );

        Ok(Self {
            pool,
            descriptor,
            statements,
            _record: PhantomData,
        })
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Checks that the live table exists and that its leading columns match
    /// the record's columns by name, in order. Extra trailing table columns
    /// are accepted; they are never read or written.
    pub fn verify_schema(&self) -> FactoryResult<()> {
        self.run("schema_verify", |conn| {
            let table = self.descriptor.table();
            let mut stmt = conn.prepare(&self.statements.table_info)?;
            let live = stmt
                .query_map([], |row| row.get::<_, String>("name"))?
                .collect::<Result<Vec<_>, _>>()?;

            if live.is_empty() {
                return Err(schema_mismatch(table, "table does not exist".to_string()));
            }

            let declared = self.descriptor.columns();
            if live.len() < declared.len() {
                return Err(schema_mismatch(
                    table,
                    format!(
                        "table has {} columns, record declares {}",
                        live.len(),
                        declared.len()
                    ),
                ));
            }

            for (ordinal, (column, live_name)) in declared.iter().zip(&live).enumerate() {
                if !column.name.eq_ignore_ascii_case(live_name) {
                    return Err(schema_mismatch(
                        table,
                        format!(
                            "column {ordinal} is `{live_name}`, record expects `{}`",
                            column.name
                        ),
                    ));
                }
            }

            Ok(())
        })
    }

    /// Runs `op` on one pooled connection, logging start and outcome.
    fn run<R>(
        &self,
        event: &'static str,
        op: impl FnOnce(&Connection) -> FactoryResult<R>,
    ) -> FactoryResult<R> {
        let started_at = Instant::now();
        let table = self.descriptor.table();
        debug!("event={event} module=factory status=start table={table}");

        let result = self
            .pool
            .get()
            .map_err(FactoryError::from)
            .and_then(|conn| op(&conn));

        match &result {
            Ok(_) => debug!(
                "event={event} module=factory status=ok table={table} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={event} module=factory status=error table={table} duration_ms={} stage={} error={}",
                started_at.elapsed().as_millis(),
                err.stage(),
                err
            ),
        }

        result
    }

    /// Collects `entity`'s values, checking there is one per declared column.
    fn values_of<'a>(&self, entity: &'a T) -> FactoryResult<Vec<&'a dyn ToSql>> {
        let values = entity.values();
        let expected = self.descriptor.columns().len();
        if values.len() != expected {
            return Err(MappingError::ValueCount {
                table: self.descriptor.table(),
                expected,
                actual: values.len(),
            }
            .into());
        }
        Ok(values)
    }

    fn key_param<'a>(&'a self, key: &'a dyn ToSql) -> [(&'a str, &'a dyn ToSql); 1] {
        [(self.statements.key_param.as_str(), key)]
    }
}

impl<T: Record> EntityRepository<T> for EntityFactory<T> {
    fn add(&self, entity: &T) -> FactoryResult<i64> {
        self.run("entity_add", |conn| {
            let values = self.values_of(entity)?;
            let params = bind_named(&self.statements.data_params, &values[1..]);
            conn.execute(&self.statements.insert, params.as_slice())?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update(&self, entity: &T) -> FactoryResult<usize> {
        let Some(sql) = self.statements.update.as_deref() else {
            debug!(
                "event=entity_update module=factory status=skipped table={} reason=no_data_columns",
                self.descriptor.table()
            );
            return Ok(0);
        };

        self.run("entity_update", |conn| {
            let values = self.values_of(entity)?;
            let mut params = bind_named(&self.statements.data_params, &values[1..]);
            params.push((self.statements.key_param.as_str(), values[0]));
            let changed = conn.execute(sql, params.as_slice())?;
            debug!(
                "event=entity_update module=factory table={} key={} rows={}",
                self.descriptor.table(),
                entity.key(),
                changed
            );
            Ok(changed)
        })
    }

    fn get(&self, id: i64) -> FactoryResult<T> {
        self.run("entity_get", |conn| {
            let mut stmt = conn.prepare(&self.statements.select_by_key)?;
            let column_count = stmt.column_count();
            let key = self.key_param(&id);
            let mut rows = stmt.query(key.as_slice())?;

            let Some(row) = rows.next()? else {
                return Ok(T::default());
            };
            let record = map_row::<T>(&self.descriptor, row, column_count)?;

            if rows.next()?.is_some() {
                return Err(MappingError::DuplicateKey {
                    table: self.descriptor.table(),
                    key: id,
                }
                .into());
            }

            Ok(record)
        })
    }

    fn get_all(&self) -> FactoryResult<Vec<T>> {
        self.run("entity_get_all", |conn| {
            let mut stmt = conn.prepare(&self.statements.select_all)?;
            let column_count = stmt.column_count();
            let mut rows = stmt.query([])?;
            let mut records = Vec::new();

            while let Some(row) = rows.next()? {
                records.push(map_row::<T>(&self.descriptor, row, column_count)?);
            }

            Ok(records)
        })
    }

    fn delete(&self, id: i64) -> FactoryResult<()> {
        self.run("entity_delete", |conn| {
            let key = self.key_param(&id);
            let changed = conn.execute(&self.statements.delete_by_key, key.as_slice())?;
            debug!(
                "event=entity_delete module=factory table={} key={} rows={}",
                self.descriptor.table(),
                id,
                changed
            );
            Ok(())
        })
    }
}

fn bind_named<'a>(
    names: &'a [String],
    values: &[&'a dyn ToSql],
) -> Vec<(&'a str, &'a dyn ToSql)> {
    names
        .iter()
        .map(String::as_str)
        .zip(values.iter().copied())
        .collect()
}

fn map_row<T: Record>(
    descriptor: &TableDescriptor,
    row: &Row<'_>,
    column_count: usize,
) -> FactoryResult<T> {
    let columns = descriptor.columns();
    if column_count < columns.len() {
        return Err(MappingError::ColumnCount {
            table: descriptor.table(),
            expected: columns.len(),
            actual: column_count,
        }
        .into());
    }

    let mut record = T::default();
    for (ordinal, column) in columns.iter().enumerate() {
        let value = row.get_ref(ordinal)?;
        if matches!(value, ValueRef::Null) {
            continue;
        }
        record
            .assign(ordinal, value)
            .map_err(|source| MappingError::IncompatibleType {
                table: descriptor.table(),
                column: column.name,
                ordinal,
                source,
            })?;
    }

    Ok(record)
}

fn schema_mismatch(table: &'static str, detail: String) -> FactoryError {
    MappingError::SchemaMismatch { table, detail }.into()
}
