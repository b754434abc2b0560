use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl ResGraphError {
    /// True for failures talking to or executing against the graph store.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            ResGraphError::Database(_) | ResGraphError::Query(_) | ResGraphError::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ResGraphError>;
