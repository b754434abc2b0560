pub mod config;
pub mod error;
pub mod types;

pub use config::{
    ConfigManager, DatabaseBackend, DatabaseConfig, LoggingConfig, MemoryStoreConfig,
    Neo4jConfig, SecretsConfig, SecurityConfig, ServerConfig, Settings,
};
pub use error::*;
pub use types::*;
