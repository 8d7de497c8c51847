//! SQL text rendered once per factory from a table descriptor.
//!
//! Identifiers are double-quoted; they are already restricted to plain
//! identifiers by `TableDescriptor`. Values are always bound as `@name`
//! parameters, the key included.

use crate::record::TableDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Statements {
    pub insert: String,
    /// `None` when the record has no column besides its key.
    pub update: Option<String>,
    pub select_by_key: String,
    pub select_all: String,
    pub delete_by_key: String,
    pub table_info: String,
    /// `@name` for every data column, in ordinal order starting at 1.
    pub data_params: Vec<String>,
    pub key_param: String,
}

impl Statements {
    pub fn render(descriptor: &TableDescriptor) -> Self {
        let table = quote(descriptor.table());
        let key = descriptor.key().name;
        let key_param = param(key);
        let key_predicate = format!("{} = {key_param}", quote(key));

        let data_columns: Vec<&str> = descriptor
            .data_columns()
            .iter()
            .map(|column| column.name)
            .collect();
        let data_params: Vec<String> = data_columns.iter().map(|name| param(name)).collect();

        let insert = if data_columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let columns = data_columns
                .iter()
                .map(|name| quote(name))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "INSERT INTO {table} ({columns}) VALUES ({})",
                data_params.join(", ")
            )
        };

        let update = (!data_columns.is_empty()).then(|| {
            let assignments = data_columns
                .iter()
                .zip(&data_params)
                .map(|(name, param)| format!("{} = {param}", quote(name)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("UPDATE {table} SET {assignments} WHERE {key_predicate}")
        });

        Self {
            insert,
            update,
            select_by_key: format!("SELECT * FROM {table} WHERE {key_predicate}"),
            select_all: format!("SELECT * FROM {table}"),
            delete_by_key: format!("DELETE FROM {table} WHERE {key_predicate}"),
            table_info: format!("PRAGMA table_info({table})"),
            data_params,
            key_param,
        }
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

fn param(name: &str) -> String {
    format!("@{name}")
}
