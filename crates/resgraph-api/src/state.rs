use crate::auth::AuthConfig;
use resgraph_core::{ConfigManager, DatabaseBackend, Result, Settings};
use resgraph_graph::{GraphStore, MemoryGraphStore, Session};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub session: Session,
    pub auth: Arc<AuthConfig>,
    pub allowed_origins: Arc<Vec<String>>,
}

impl AppState {
    /// Connect the configured backend and build the shared request state.
    pub async fn new(config: Arc<ConfigManager>) -> Result<Self> {
        let settings = config.settings();
        let store = connect_store(settings).await?;
        info!(
            backend = store.backend_name(),
            env = config.env(),
            "Graph store ready"
        );
        Ok(Self::with_store(store, settings))
    }

    /// State over an already constructed store.
    pub fn with_store(store: Arc<dyn GraphStore>, settings: &Settings) -> Self {
        Self {
            session: Session::new(store),
            auth: Arc::new(AuthConfig::from_settings(settings)),
            allowed_origins: Arc::new(settings.security.allowed_origins.clone()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.session.store().backend_name()
    }
}

async fn connect_store(settings: &Settings) -> Result<Arc<dyn GraphStore>> {
    match settings.database.backend {
        DatabaseBackend::Memory => {
            let store = match &settings.database.memory.seed_path {
                Some(path) => MemoryGraphStore::from_seed_file(path).await?,
                None => MemoryGraphStore::new(),
            };
            Ok(Arc::new(store))
        }
        DatabaseBackend::Neo4j => connect_neo4j(settings).await,
    }
}

#[cfg(feature = "neo4j")]
async fn connect_neo4j(settings: &Settings) -> Result<Arc<dyn GraphStore>> {
    use secrecy::ExposeSecret;

    let password = settings
        .secrets
        .neo4j_password
        .as_ref()
        .map(|secret| secret.expose_secret().to_string())
        .unwrap_or_default();
    let storage = resgraph_graph::Neo4jStorage::connect(&settings.database.neo4j, &password).await?;
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "neo4j"))]
async fn connect_neo4j(_settings: &Settings) -> Result<Arc<dyn GraphStore>> {
    Err(resgraph_core::ResGraphError::Config(
        "database.backend = \"neo4j\" requires building with the `neo4j` feature".into(),
    ))
}
