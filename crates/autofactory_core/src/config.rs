//! Named connection-string resolution.
//!
//! # Responsibility
//! - Look up a connection string by name from a host-provided source.
//! - Fail fast when the requested name is absent.
//!
//! # Invariants
//! - Resolution happens once, when a factory is constructed.
//! - Connection strings are opaque here; parsing lives in `db::settings`.

use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Name under which factories look up their connection string.
pub const DEFAULT_CONNECTION_NAME: &str = "default";

/// Environment variable prefix used by [`EnvConfig`].
pub const ENV_PREFIX: &str = "AUTOFACTORY_CONNECTION_";

/// Configuration and connection-string errors.
#[derive(Debug)]
pub enum ConfigError {
    MissingConnectionString { name: String },
    MalformedConnectionString(String),
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingConnectionString { name } => {
                write!(f, "connection string `{name}` is not configured")
            }
            Self::MalformedConnectionString(message) => {
                write!(f, "malformed connection string: {message}")
            }
            Self::Io(err) => write!(f, "failed to read configuration: {err}"),
            Self::Parse(err) => write!(f, "failed to parse configuration: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::MissingConnectionString { .. } | Self::MalformedConnectionString(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Host-provided store of named connection strings.
pub trait ConfigSource {
    /// Returns the raw connection string registered under `name`.
    fn connection_string(&self, name: &str) -> Option<String>;

    /// Resolves `name`, treating absent or blank values as a hard error.
    fn require_connection_string(&self, name: &str) -> Result<String, ConfigError> {
        match self.connection_string(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingConnectionString {
                name: name.to_string(),
            }),
        }
    }
}

impl ConfigSource for HashMap<String, String> {
    fn connection_string(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Reads `AUTOFACTORY_CONNECTION_<NAME>` from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl EnvConfig {
    /// Environment variable consulted for `name`.
    pub fn variable_for(name: &str) -> String {
        format!("{ENV_PREFIX}{}", name.trim().to_ascii_uppercase())
    }
}

impl ConfigSource for EnvConfig {
    fn connection_string(&self, name: &str) -> Option<String> {
        std::env::var(Self::variable_for(name)).ok()
    }
}

/// JSON configuration document.
///
/// ```json
/// { "connection_strings": { "default": "Data Source=app.db;Max Pool Size=4" } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub connection_strings: HashMap<String, String>,
}

impl FileConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

impl ConfigSource for FileConfig {
    fn connection_string(&self, name: &str) -> Option<String> {
        self.connection_strings.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ConfigSource, EnvConfig, FileConfig, DEFAULT_CONNECTION_NAME};
    use std::collections::HashMap;

    #[test]
    fn file_config_resolves_named_entry() {
        let config = FileConfig::from_json_str(
            r#"{ "connection_strings": { "default": "Data Source=app.db" } }"#,
        )
        .unwrap();

        assert_eq!(
            config
                .require_connection_string(DEFAULT_CONNECTION_NAME)
                .unwrap(),
            "Data Source=app.db"
        );
    }

    #[test]
    fn missing_and_blank_entries_are_rejected() {
        let mut source = HashMap::new();
        source.insert("blank".to_string(), "   ".to_string());

        let missing = source.require_connection_string("default").unwrap_err();
        assert!(matches!(missing, ConfigError::MissingConnectionString { name } if name == "default"));

        let blank = source.require_connection_string("blank").unwrap_err();
        assert!(matches!(blank, ConfigError::MissingConnectionString { .. }));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = FileConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_variable_name_is_upper_cased() {
        assert_eq!(
            EnvConfig::variable_for("reporting"),
            "AUTOFACTORY_CONNECTION_REPORTING"
        );
    }
}
