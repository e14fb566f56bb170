//! Database connection settings.
//!
//! Settings load from the environment with the `JALAPENO_` prefix:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `JALAPENO_database_server` | `http://arangodb:8529` | Graph store base URL. |
//! | `JALAPENO_database_name` | `jalapeno` | Database to open. |
//! | `JALAPENO_username` | `root` | Basic-auth user. |
//! | `JALAPENO_password` | `jalapeno` | Basic-auth password. |
//!
//! Setting `LOCAL_DEV` to any value swaps the server for the developer
//! sandbox endpoint. Unresolvable settings are a startup error - the
//! binary exits non-zero rather than serving with a broken store.

use serde::Deserialize;
use thiserror::Error;

/// Developer sandbox database, selected by the `LOCAL_DEV` flag.
const LOCAL_DEV_SERVER: &str = "http://198.18.133.112:30852";

/// Settings load/validation failures.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read settings from environment: {0}")]
    Environment(#[from] ::config::ConfigError),
    #[error("setting {0} must not be empty")]
    Empty(&'static str),
    #[error("database_server '{0}' is not an http(s) URL")]
    InvalidServer(String),
}

/// Connection settings for the graph store.
#[derive(Debug, Clone, Deserialize)]
pub struct DbSettings {
    #[serde(default = "defaults::server")]
    pub database_server: String,
    #[serde(default = "defaults::name")]
    pub database_name: String,
    #[serde(default = "defaults::username")]
    pub username: String,
    #[serde(default = "defaults::password")]
    pub password: String,
}

mod defaults {
    pub fn server() -> String {
        "http://arangodb:8529".to_string()
    }
    pub fn name() -> String {
        "jalapeno".to_string()
    }
    pub fn username() -> String {
        "root".to_string()
    }
    pub fn password() -> String {
        "jalapeno".to_string()
    }
}

impl DbSettings {
    /// Load from `JALAPENO_*` environment variables, applying the
    /// `LOCAL_DEV` override and validating the result.
    pub fn from_env() -> Result<Self, SettingsError> {
        let cfg = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix("JALAPENO"))
            .build()?;
        let mut settings: DbSettings = cfg.try_deserialize()?;

        if std::env::var_os("LOCAL_DEV").is_some() {
            settings.database_server = LOCAL_DEV_SERVER.to_string();
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.database_server.is_empty() {
            return Err(SettingsError::Empty("database_server"));
        }
        if self.database_name.is_empty() {
            return Err(SettingsError::Empty("database_name"));
        }
        if self.username.is_empty() {
            return Err(SettingsError::Empty("username"));
        }
        if !self.database_server.starts_with("http://")
            && !self.database_server.starts_with("https://")
        {
            return Err(SettingsError::InvalidServer(self.database_server.clone()));
        }
        Ok(())
    }
}

impl Default for DbSettings {
    fn default() -> Self {
        DbSettings {
            database_server: defaults::server(),
            database_name: defaults::name(),
            username: defaults::username(),
            password: defaults::password(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_k8s_deployment() {
        let settings = DbSettings::default();
        assert_eq!(settings.database_server, "http://arangodb:8529");
        assert_eq!(settings.database_name, "jalapeno");
        assert_eq!(settings.username, "root");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_empty_and_malformed_values() {
        let mut settings = DbSettings::default();
        settings.database_server = String::new();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Empty("database_server"))
        ));

        settings.database_server = "tcp://somewhere:1234".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidServer(_))
        ));
    }
}
