use core_config::env_or_default;
use domain_retrieval::{EmbeddingModel, OpenAIConfig, QdrantConfig, WriteMode};

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application configuration, composed from shared config components
#[derive(Debug, Clone)]
pub struct Config {
    pub qdrant: QdrantConfig,
    pub embedder: OpenAIConfig,
    pub collection: String,
    pub write_mode: WriteMode,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let qdrant = QdrantConfig::from_env()?;

        // Default to a local OpenAI-compatible server hosting the MiniLM
        // sentence embedder (384 dimensions)
        let embedder = OpenAIConfig::from_env()?.with_model(EmbeddingModel::Custom {
            name: env_or_default("EMBEDDING_MODEL", "all-MiniLM-L6-v2"),
            dimension: env_or_default("EMBEDDING_DIMENSION", "384")
                .parse()
                .map_err(|e| eyre::eyre!("Invalid EMBEDDING_DIMENSION: {}", e))?,
        });

        let collection = env_or_default("COLLECTION_NAME", "demo_collection");

        let write_mode = if env_or_default("WRITE_MODE", "blocking").eq_ignore_ascii_case("fire-and-forget") {
            WriteMode::FireAndForget
        } else {
            WriteMode::Blocking
        };

        Ok(Self {
            qdrant,
            embedder,
            collection,
            write_mode,
            environment,
        })
    }
}
