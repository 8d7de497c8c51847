//! Connection-string parsing.
//!
//! Accepts `key=value` pairs separated by `;`. Keys are case-insensitive and
//! ignore inner spaces, so `Data Source`, `datasource` and `DATA SOURCE` are
//! the same key. A string without any `=` is taken as a bare file path.

use crate::config::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MAX_POOL_SIZE: u32 = 8;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);
const MAX_CONNECT_TIMEOUT_SECS: u64 = 3_600;
// SQLite takes the busy timeout as a C int of milliseconds.
const MAX_BUSY_TIMEOUT_MS: u64 = i32::MAX as u64;
const MEMORY_DATA_SOURCE: &str = ":memory:";

/// Where connections point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    /// Private in-memory database. The pool is pinned to one connection so
    /// every operation sees the same data.
    Memory,
}

/// Parsed connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub data_source: DataSource,
    pub max_pool_size: u32,
    /// Upper bound on waiting for a pooled connection.
    pub connect_timeout: Duration,
    /// SQLite busy handler timeout applied to every connection.
    pub busy_timeout: Duration,
    pub foreign_keys: bool,
}

impl ConnectionSettings {
    /// Settings for a file database with all defaults.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_source(DataSource::File(path.into()))
    }

    /// Settings for a private in-memory database.
    pub fn memory() -> Self {
        Self::with_source(DataSource::Memory)
    }

    fn with_source(data_source: DataSource) -> Self {
        Self {
            data_source,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            foreign_keys: true,
        }
    }

    /// Parses a connection string.
    ///
    /// # Errors
    /// - `MalformedConnectionString` for empty input, segments without `=`,
    ///   unknown keys, invalid numbers/booleans or a missing `Data Source`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(malformed("connection string is empty"));
        }
        if !trimmed.contains('=') {
            return Ok(Self::with_source(parse_data_source(trimmed)));
        }

        let mut data_source = None;
        let mut settings = Self::memory();

        for segment in trimmed.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| malformed(format!("segment `{segment}` is not key=value")))?;
            let value = value.trim();

            match normalize_key(key).as_str() {
                "datasource" | "filename" => {
                    if value.is_empty() {
                        return Err(malformed("data source cannot be empty"));
                    }
                    data_source = Some(parse_data_source(value));
                }
                "maxpoolsize" => {
                    settings.max_pool_size = u32::try_from(parse_number(key, value)?)
                        .map_err(|_| malformed(format!("max pool size `{value}` is too large")))?;
                }
                "connecttimeout" => {
                    settings.connect_timeout = Duration::from_secs(parse_number(key, value)?);
                }
                "busytimeout" => {
                    settings.busy_timeout = Duration::from_millis(parse_number(key, value)?);
                }
                "foreignkeys" => settings.foreign_keys = parse_bool(key, value)?,
                _ => return Err(malformed(format!("unsupported key `{}`", key.trim()))),
            }
        }

        settings.data_source = data_source.ok_or_else(|| malformed("missing `Data Source`"))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks the numeric limits the pool and SQLite accept.
    ///
    /// # Errors
    /// - `MalformedConnectionString` for a zero pool size, a connect timeout
    ///   outside `1..=3600` seconds or a busy timeout above `i32::MAX` ms.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pool_size == 0 {
            return Err(malformed("max pool size must be at least 1"));
        }
        if self.connect_timeout < Duration::from_secs(1) {
            return Err(malformed("connect timeout must be at least 1 second"));
        }
        if self.connect_timeout > Duration::from_secs(MAX_CONNECT_TIMEOUT_SECS) {
            return Err(malformed(format!(
                "connect timeout must be at most {MAX_CONNECT_TIMEOUT_SECS} seconds"
            )));
        }
        if self.busy_timeout > Duration::from_millis(MAX_BUSY_TIMEOUT_MS) {
            return Err(malformed(format!(
                "busy timeout must be at most {MAX_BUSY_TIMEOUT_MS} ms"
            )));
        }
        Ok(())
    }

    /// Pool size actually used; memory databases are pinned to one connection.
    pub fn effective_pool_size(&self) -> u32 {
        match self.data_source {
            DataSource::Memory => 1,
            DataSource::File(_) => self.max_pool_size,
        }
    }

    /// Short label for log events.
    pub fn mode(&self) -> &'static str {
        match self.data_source {
            DataSource::Memory => "memory",
            DataSource::File(_) => "file",
        }
    }
}

fn parse_data_source(value: &str) -> DataSource {
    if value.eq_ignore_ascii_case(MEMORY_DATA_SOURCE) {
        DataSource::Memory
    } else {
        DataSource::File(PathBuf::from(value))
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|_| malformed(format!("`{}` expects a number, got `{value}`", key.trim())))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(malformed(format!(
            "`{}` expects true|false, got `{value}`",
            key.trim()
        ))),
    }
}

fn malformed(message: impl Into<String>) -> ConfigError {
    ConfigError::MalformedConnectionString(message.into())
}
