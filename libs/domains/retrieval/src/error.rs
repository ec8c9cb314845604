use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Schema mismatch: collection declares dimension {expected}, embedder produces {actual}")]
    SchemaMismatch { expected: u64, actual: u64 },

    #[error("Arity mismatch: got {texts} texts but {ids} ids")]
    ArityMismatch { texts: usize, ids: usize },

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;

impl From<qdrant_client::QdrantError> for RetrievalError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        RetrievalError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::Embedding(err.to_string())
    }
}

impl From<serde_json::Error> for RetrievalError {
    fn from(err: serde_json::Error) -> Self {
        RetrievalError::Internal(format!("JSON error: {}", err))
    }
}
