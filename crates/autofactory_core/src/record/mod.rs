//! Record declarations: the compile-time column mapping of a row type.
//!
//! # Responsibility
//! - Define the `Record` contract every persisted type implements.
//! - Validate a record's declaration once and freeze it into a
//!   `TableDescriptor`.
//!
//! # Invariants
//! - Ordinal 0 is the primary key. Its name contains `id`
//!   (case-insensitive) and its value converts to `i64`.
//! - Column order is positional: `SELECT *` results are mapped by ordinal,
//!   so the table's declared column order must equal `COLUMNS` order.
//!   `EntityFactory::verify_schema` checks this against a live table.
//! - Table and column names are plain SQL identifiers.

mod macros;

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::{FromSqlResult, ValueRef};
use rusqlite::ToSql;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern must compile")
});

/// One column/field correspondence. The ordinal is its index in
/// `Record::COLUMNS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: &'static str,
    /// Declared Rust type, as written in the record declaration.
    pub type_name: &'static str,
}

impl ColumnDescriptor {
    pub const fn new(name: &'static str, type_name: &'static str) -> Self {
        Self { name, type_name }
    }
}

/// A row type persisted one-to-one in a table named `TABLE_NAME`.
///
/// Usually implemented through [`entity!`](crate::entity). Hand-written
/// implementations must keep `COLUMNS`, `values` and `assign` in the same
/// ordinal order.
pub trait Record: Default {
    const TABLE_NAME: &'static str;
    const COLUMNS: &'static [ColumnDescriptor];

    /// Primary-key value (ordinal 0).
    fn key(&self) -> i64;

    /// Current field values in ordinal order, key included. Must yield
    /// exactly one value per entry of `COLUMNS`.
    fn values(&self) -> Vec<&dyn ToSql>;

    /// Stores a non-NULL column value into the field at `ordinal`.
    fn assign(&mut self, ordinal: usize, value: ValueRef<'_>) -> FromSqlResult<()>;
}

/// Invalid record declarations, detected when a factory is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectionError {
    NoColumns {
        table: &'static str,
    },
    KeyNotIdentifier {
        table: &'static str,
        column: &'static str,
    },
    InvalidIdentifier {
        table: &'static str,
        name: &'static str,
    },
    DuplicateColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for ReflectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoColumns { table } => write!(f, "record `{table}` declares no columns"),
            Self::KeyNotIdentifier { table, column } => write!(
                f,
                "first column `{column}` of `{table}` must be the id column"
            ),
            Self::InvalidIdentifier { table, name } => {
                write!(f, "`{name}` in `{table}` is not a valid SQL identifier")
            }
            Self::DuplicateColumn { table, column } => {
                write!(f, "column `{column}` is declared twice in `{table}`")
            }
        }
    }
}

impl Error for ReflectionError {}

/// Validated, immutable snapshot of a record declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    table: &'static str,
    columns: &'static [ColumnDescriptor],
}

impl TableDescriptor {
    /// Captures and validates the declaration of `T`.
    pub fn of<T: Record>() -> Result<Self, ReflectionError> {
        Self::new(T::TABLE_NAME, T::COLUMNS)
    }

    pub fn new(
        table: &'static str,
        columns: &'static [ColumnDescriptor],
    ) -> Result<Self, ReflectionError> {
        if !is_identifier(table) {
            return Err(ReflectionError::InvalidIdentifier { table, name: table });
        }

        let key = columns.first().ok_or(ReflectionError::NoColumns { table })?;
        if !key.name.to_ascii_lowercase().contains("id") {
            return Err(ReflectionError::KeyNotIdentifier {
                table,
                column: key.name,
            });
        }

        let mut seen = HashSet::new();
        for column in columns {
            if !is_identifier(column.name) {
                return Err(ReflectionError::InvalidIdentifier {
                    table,
                    name: column.name,
                });
            }
            if !seen.insert(column.name.to_ascii_lowercase()) {
                return Err(ReflectionError::DuplicateColumn {
                    table,
                    column: column.name,
                });
            }
        }

        Ok(Self { table, columns })
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn columns(&self) -> &'static [ColumnDescriptor] {
        self.columns
    }

    pub fn key(&self) -> &'static ColumnDescriptor {
        // Non-empty by construction.
        &self.columns[0]
    }

    /// Columns written by INSERT/UPDATE: everything after the key.
    pub fn data_columns(&self) -> &'static [ColumnDescriptor] {
        &self.columns[1..]
    }
}

fn is_identifier(name: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::{ColumnDescriptor, ReflectionError, TableDescriptor};

    const PERSON: &[ColumnDescriptor] = &[
        ColumnDescriptor::new("ID", "i64"),
        ColumnDescriptor::new("Name", "String"),
        ColumnDescriptor::new("Age", "i64"),
    ];

    #[test]
    fn valid_declaration_splits_key_and_data_columns() {
        let descriptor = TableDescriptor::new("Person", PERSON).unwrap();
        assert_eq!(descriptor.key().name, "ID");
        let data: Vec<_> = descriptor.data_columns().iter().map(|c| c.name).collect();
        assert_eq!(data, ["Name", "Age"]);
    }

    #[test]
    fn key_name_match_is_case_insensitive() {
        const COLUMNS: &[ColumnDescriptor] = &[ColumnDescriptor::new("OrderId", "i64")];
        assert!(TableDescriptor::new("Orders", COLUMNS).is_ok());
    }

    #[test]
    fn empty_declaration_is_rejected() {
        let err = TableDescriptor::new("Empty", &[]).unwrap_err();
        assert_eq!(err, ReflectionError::NoColumns { table: "Empty" });
    }

    #[test]
    fn first_column_must_be_the_id() {
        const COLUMNS: &[ColumnDescriptor] = &[
            ColumnDescriptor::new("Name", "String"),
            ColumnDescriptor::new("ID", "i64"),
        ];
        let err = TableDescriptor::new("Person", COLUMNS).unwrap_err();
        assert!(matches!(
            err,
            ReflectionError::KeyNotIdentifier { column: "Name", .. }
        ));
    }

    #[test]
    fn unsafe_identifiers_are_rejected() {
        const COLUMNS: &[ColumnDescriptor] = &[
            ColumnDescriptor::new("ID", "i64"),
            ColumnDescriptor::new("Name\"; DROP TABLE Person; --", "String"),
        ];
        let err = TableDescriptor::new("Person", COLUMNS).unwrap_err();
        assert!(matches!(err, ReflectionError::InvalidIdentifier { .. }));

        let err = TableDescriptor::new("Per son", PERSON).unwrap_err();
        assert!(matches!(
            err,
            ReflectionError::InvalidIdentifier { name: "Per son", .. }
        ));
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        const COLUMNS: &[ColumnDescriptor] = &[
            ColumnDescriptor::new("ID", "i64"),
            ColumnDescriptor::new("Name", "String"),
            ColumnDescriptor::new("name", "String"),
        ];
        let err = TableDescriptor::new("Person", COLUMNS).unwrap_err();
        assert!(matches!(
            err,
            ReflectionError::DuplicateColumn { column: "name", .. }
        ));
    }
}
