use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config as cfg;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemoryStoreConfig {
    /// JSON fixture loaded into the in-memory graph at startup
    #[serde(default)]
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Bolt URI (e.g., "bolt://localhost:7687" or "neo4j+s://host:7687")
    pub uri: String,
    #[serde(default = "Neo4jConfig::default_user")]
    pub user: String,
    /// Database name
    #[serde(default = "Neo4jConfig::default_database")]
    pub database: String,
    /// Upper bound of pooled Bolt connections
    #[serde(default = "Neo4jConfig::default_max_connections")]
    pub max_connections: usize,
    /// Rows pulled per round trip
    #[serde(default = "Neo4jConfig::default_fetch_size")]
    pub fetch_size: usize,
}

impl Neo4jConfig {
    fn default_user() -> String {
        "neo4j".to_string()
    }

    fn default_database() -> String {
        "neo4j".to_string()
    }

    fn default_max_connections() -> usize {
        16
    }

    fn default_fetch_size() -> usize {
        200
    }
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: Self::default_user(),
            database: Self::default_database(),
            max_connections: Self::default_max_connections(),
            fetch_size: Self::default_fetch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseBackend {
    #[default]
    Memory,
    Neo4j,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,
    #[serde(default)]
    pub memory: MemoryStoreConfig,
    #[serde(default)]
    pub neo4j: Neo4jConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "SecurityConfig::default_require_auth")]
    pub require_auth: bool,
    /// Username accepted for HTTP Basic authentication
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl SecurityConfig {
    fn default_require_auth() -> bool {
        true
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            require_auth: Self::default_require_auth(),
            username: None,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretsConfig {
    // Do not serialize secrets; allow deserialization from config/env only.
    #[serde(default, skip_serializing)]
    pub password: Option<SecretString>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
    #[serde(default, skip_serializing)]
    pub neo4j_password: Option<SecretString>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "Settings::default_env")]
    pub env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Self::default_env(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
            secrets: SecretsConfig::default(),
        }
    }
}

impl Settings {
    fn default_env() -> String {
        env::var("APP_ENV")
            .ok()
            .or_else(|| env::var("RUST_ENV").ok())
            .unwrap_or_else(|| "development".to_string())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.server.host.trim().is_empty(),
            "server.host cannot be empty"
        );
        anyhow::ensure!(self.server.port > 0, "server.port must be > 0");

        match self.database.backend {
            DatabaseBackend::Memory => {
                if let Some(path) = &self.database.memory.seed_path {
                    anyhow::ensure!(
                        !path.trim().is_empty(),
                        "database.memory.seed_path cannot be empty when set"
                    );
                }
            }
            DatabaseBackend::Neo4j => {
                anyhow::ensure!(
                    !self.database.neo4j.uri.is_empty(),
                    "database.neo4j.uri cannot be empty"
                );
                anyhow::ensure!(
                    !self.database.neo4j.database.is_empty(),
                    "database.neo4j.database cannot be empty"
                );
                anyhow::ensure!(
                    self.database.neo4j.max_connections > 0,
                    "database.neo4j.max_connections must be > 0"
                );
            }
        }

        if self.security.require_auth {
            let basic = self.security.username.is_some() && self.secrets.password.is_some();
            anyhow::ensure!(
                basic || self.secrets.api_key.is_some(),
                "security.require_auth needs security.username + secrets.password or secrets.api_key"
            );
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    settings: Settings,
    config_dir: PathBuf,
    env: String,
}

impl ConfigManager {
    /// Load, merge and validate settings for `env_override` (or `APP_ENV`).
    pub fn load(config_dir: Option<PathBuf>, env_override: Option<String>) -> Result<Self> {
        let env_name = env_override.unwrap_or_else(Settings::default_env);
        let config_dir = config_dir.unwrap_or_else(Self::default_config_dir);
        let mut settings = Self::load_from_sources(&config_dir, &env_name)?;
        settings.env = env_name.clone();
        settings.validate()?;
        Ok(Self {
            settings,
            config_dir,
            env: env_name,
        })
    }

    /// Wrap already-built settings (tests, embedding).
    pub fn from_settings(settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            env: settings.env.clone(),
            settings,
            config_dir: PathBuf::from("."),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Override the listen address (CLI flags) and re-validate.
    pub fn override_server(&mut self, host: Option<String>, port: Option<u16>) -> Result<()> {
        if let Some(host) = host {
            self.settings.server.host = host;
        }
        if let Some(port) = port {
            self.settings.server.port = port;
        }
        self.settings.validate()
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    /// Get the default configuration directory.
    ///
    /// Priority order:
    /// 1. ./config/ (project-level config)
    /// 2. Current directory (fallback)
    pub fn default_config_dir() -> PathBuf {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let project_config = cwd.join("config");
        if project_config.exists() {
            return project_config;
        }
        cwd
    }

    pub fn load_from_sources(config_dir: &Path, env_name: &str) -> Result<Settings> {
        let settings: Settings = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.yaml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.yml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.json")).required(false))
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.yaml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.yml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.json", env_name))).required(false),
            )
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                cfg::Environment::with_prefix("RESGRAPH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::fs;

    fn open_settings() -> Settings {
        let mut settings = Settings::default();
        settings.security.require_auth = false;
        settings
    }

    #[test]
    fn defaults_use_memory_backend() {
        let settings = open_settings();
        assert_eq!(settings.database.backend, DatabaseBackend::Memory);
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.logging.level, "info");
        settings.validate().unwrap();
    }

    #[test]
    fn server_override_is_validated() {
        let mut manager = ConfigManager::from_settings(open_settings()).unwrap();
        manager
            .override_server(Some("127.0.0.1".into()), Some(8088))
            .unwrap();
        assert_eq!(manager.settings().server.host, "127.0.0.1");
        assert_eq!(manager.settings().server.port, 8088);
        assert!(manager.override_server(None, Some(0)).is_err());
    }

    #[test]
    fn auth_without_credentials_is_rejected() {
        let settings = Settings::default();
        assert!(settings.security.require_auth);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn env_file_overrides_default_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
[server]
host = "127.0.0.1"
port = 4000

[security]
require_auth = true
username = "admin"

[secrets]
password = "hunter2"
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("staging.toml"),
            r#"
[server]
host = "127.0.0.1"
port = 4100

[database]
backend = "neo4j"

[database.neo4j]
uri = "bolt://graph:7687"
"#,
        )
        .unwrap();

        let manager =
            ConfigManager::load(Some(dir.path().to_path_buf()), Some("staging".into())).unwrap();
        let settings = manager.settings();
        assert_eq!(manager.env(), "staging");
        assert_eq!(manager.config_dir(), dir.path());
        assert_eq!(settings.server.port, 4100);
        assert_eq!(settings.database.backend, DatabaseBackend::Neo4j);
        assert_eq!(settings.database.neo4j.uri, "bolt://graph:7687");
        assert_eq!(settings.database.neo4j.user, "neo4j");
        assert_eq!(settings.security.username.as_deref(), Some("admin"));
        assert_eq!(
            settings
                .secrets
                .password
                .as_ref()
                .map(|p| p.expose_secret().to_string())
                .as_deref(),
            Some("hunter2")
        );
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut settings = open_settings();
        settings.secrets.password = Some(SecretString::from("hunter2".to_string()));
        let rendered = serde_json::to_string(&settings).unwrap();
        assert!(!rendered.contains("hunter2"));
    }
}
