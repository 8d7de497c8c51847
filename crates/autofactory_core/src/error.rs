//! Error taxonomy shared by every factory operation.
//!
//! # Responsibility
//! - Identify the failing stage: configuration, record declaration,
//!   connection checkout, statement execution or row mapping.
//! - Surface engine errors unchanged through `source()`.
//!
//! # Invariants
//! - Nothing in this crate recovers from these errors locally.

use crate::config::ConfigError;
use crate::record::ReflectionError;
use rusqlite::types::FromSqlError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FactoryResult<T> = Result<T, FactoryError>;

/// Top-level error returned by `EntityFactory` operations.
#[derive(Debug)]
pub enum FactoryError {
    Configuration(ConfigError),
    Reflection(ReflectionError),
    Connection(r2d2::Error),
    Execution(rusqlite::Error),
    Mapping(MappingError),
}

impl FactoryError {
    /// Stable stage name used in log events.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Reflection(_) => "reflection",
            Self::Connection(_) => "connection",
            Self::Execution(_) => "execution",
            Self::Mapping(_) => "mapping",
        }
    }
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "configuration error: {err}"),
            Self::Reflection(err) => write!(f, "record declaration error: {err}"),
            Self::Connection(err) => write!(f, "connection error: {err}"),
            Self::Execution(err) => write!(f, "execution error: {err}"),
            Self::Mapping(err) => write!(f, "mapping error: {err}"),
        }
    }
}

impl Error for FactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::Reflection(err) => Some(err),
            Self::Connection(err) => Some(err),
            Self::Execution(err) => Some(err),
            Self::Mapping(err) => Some(err),
        }
    }
}

impl From<ConfigError> for FactoryError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value)
    }
}

impl From<ReflectionError> for FactoryError {
    fn from(value: ReflectionError) -> Self {
        Self::Reflection(value)
    }
}

impl From<r2d2::Error> for FactoryError {
    fn from(value: r2d2::Error) -> Self {
        Self::Connection(value)
    }
}

impl From<rusqlite::Error> for FactoryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Execution(value)
    }
}

impl From<MappingError> for FactoryError {
    fn from(value: MappingError) -> Self {
        Self::Mapping(value)
    }
}

/// Row-to-record mapping failures.
#[derive(Debug)]
pub enum MappingError {
    /// A non-NULL column value could not be converted into its field type.
    IncompatibleType {
        table: &'static str,
        column: &'static str,
        ordinal: usize,
        source: FromSqlError,
    },
    /// The result set has fewer columns than the record declares.
    ColumnCount {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
    /// `Record::values` returned a different number of values than the
    /// record declares columns.
    ValueCount {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A primary-key lookup matched more than one row.
    DuplicateKey { table: &'static str, key: i64 },
    /// The live table layout differs from the record's column order.
    SchemaMismatch { table: &'static str, detail: String },
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompatibleType {
                table,
                column,
                ordinal,
                source,
            } => write!(
                f,
                "column `{table}.{column}` (ordinal {ordinal}) cannot be mapped: {source}"
            ),
            Self::ColumnCount {
                table,
                expected,
                actual,
            } => write!(
                f,
                "table `{table}` returned {actual} columns, record declares {expected}"
            ),
            Self::ValueCount {
                table,
                expected,
                actual,
            } => write!(
                f,
                "record for `{table}` produced {actual} values, it declares {expected} columns"
            ),
            Self::DuplicateKey { table, key } => {
                write!(f, "key {key} matched more than one row in `{table}`")
            }
            Self::SchemaMismatch { table, detail } => {
                write!(f, "table `{table}` does not match its record: {detail}")
            }
        }
    }
}

impl Error for MappingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IncompatibleType { source, .. } => Some(source),
            Self::ColumnCount { .. }
            | Self::ValueCount { .. }
            | Self::DuplicateKey { .. }
            | Self::SchemaMismatch { .. } => None,
        }
    }
}
