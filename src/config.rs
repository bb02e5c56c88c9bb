//! Client configuration.
//!
//! Configuration can be built in code, loaded from a TOML file, or partially
//! updated at runtime through [`ClientOptions`].
//!
//! ```toml
//! url = "bolt://localhost:7687"
//! username = "neo4j"
//! password = "secret"
//! database = "movies"
//! auto_close_driver = false
//!
//! [driver_config]
//! fetch_size = 500
//! max_connections = 16
//! ```

use crate::error::{Neo4jHelperError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_USERNAME: &str = "neo4j";
pub const DEFAULT_PASSWORD: &str = "admin";

/// Settings passed through to the underlying driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub fetch_size: Option<usize>,
    #[serde(default)]
    pub max_connections: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Bolt URL, e.g. `bolt://localhost:7687`
    pub url: String,
    pub username: String,
    pub password: String,
    /// Database name. `None` uses the server default.
    pub database: Option<String>,
    /// Always return raw responses, whatever the run options ask for.
    pub raw: bool,
    /// Open a fresh driver for every call and close it afterwards.
    pub auto_close_driver: bool,
    pub driver_config: DriverConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            database: None,
            raw: false,
            auto_close_driver: false,
            driver_config: DriverConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Neo4jHelperError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Neo4jHelperError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Apply a partial update. Returns `true` if a setting that affects the
    /// driver connection changed.
    pub fn apply(&mut self, options: ClientOptions) -> bool {
        let before = (
            self.url.clone(),
            self.username.clone(),
            self.password.clone(),
            self.database.clone(),
            self.auto_close_driver,
            self.driver_config.clone(),
        );

        if let Some(url) = options.url {
            self.url = url;
        }
        if let Some(username) = options.username {
            self.username = username;
        }
        if let Some(password) = options.password {
            self.password = password;
        }
        if let Some(database) = options.database {
            self.database = Some(database);
        }
        if let Some(raw) = options.raw {
            self.raw = raw;
        }
        if let Some(auto_close_driver) = options.auto_close_driver {
            self.auto_close_driver = auto_close_driver;
        }
        if let Some(driver_config) = options.driver_config {
            self.driver_config = driver_config;
        }

        before
            != (
                self.url.clone(),
                self.username.clone(),
                self.password.clone(),
                self.database.clone(),
                self.auto_close_driver,
                self.driver_config.clone(),
            )
    }
}

/// Partial configuration update. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub raw: Option<bool>,
    pub auto_close_driver: Option<bool>,
    pub driver_config: Option<DriverConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.url, "");
        assert_eq!(config.username, "neo4j");
        assert_eq!(config.password, "admin");
        assert_eq!(config.database, None);
        assert!(!config.raw);
        assert!(!config.auto_close_driver);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ClientConfig::from_toml(
            r#"
            url = "bolt://localhost:7687"
            database = "movies"

            [driver_config]
            fetch_size = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.url, "bolt://localhost:7687");
        assert_eq!(config.username, "neo4j");
        assert_eq!(config.database.as_deref(), Some("movies"));
        assert_eq!(config.driver_config.fetch_size, Some(500));
        assert_eq!(config.driver_config.max_connections, None);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "url = \"bolt://db:7687\"\npassword = \"secret\"\nraw = true").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.url, "bolt://db:7687");
        assert_eq!(config.password, "secret");
        assert!(config.raw);
    }

    #[test]
    fn test_from_file_missing() {
        let result = ClientConfig::from_file("/nonexistent/neo4j-helper.toml");
        assert!(matches!(result, Err(Neo4jHelperError::Config(_))));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ClientConfig::from_toml("url = ").is_err());
    }

    #[test]
    fn test_apply_reports_connection_changes() {
        let mut config = ClientConfig::new("bolt://a:7687");

        let changed = config.apply(ClientOptions {
            raw: Some(true),
            ..Default::default()
        });
        assert!(!changed);
        assert!(config.raw);

        let changed = config.apply(ClientOptions {
            url: Some("bolt://b:7687".to_string()),
            ..Default::default()
        });
        assert!(changed);
        assert_eq!(config.url, "bolt://b:7687");
        assert_eq!(config.username, "neo4j");
    }
}
