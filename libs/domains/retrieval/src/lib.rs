//! Retrieval Domain Library
//!
//! A semantic retrieval facade: free-text documents become dense float32
//! embeddings, persisted alongside their source text in a Qdrant collection
//! and queried through three retrieval strategies.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  SemanticIndex  │  ← lifecycle, ingestion, retrieval strategies
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐     ┌─────────────────┐
//! │ VectorRepository│     │  TextEmbedder   │
//! │     (trait)     │     │     (trait)     │
//! └────────┬────────┘     └────────┬────────┘
//!          │                       │
//! ┌────────▼────────┐     ┌────────▼────────┐
//! │ QdrantRepository│     │  OpenAIEmbedder  │
//! │ (implementation)│     │ (any compatible  │
//! └─────────────────┘     │  HTTP endpoint)  │
//!                         └──────────────────┘
//! ```
//!
//! # Retrieval strategies
//!
//! - **select_by_id** — direct lookup; an absent id is `None`, not an error
//! - **select_text** — similarity search under a server-side exact-match
//!   filter on the `text` payload, top 10
//! - **select_like** — top-50 similarity pool, then a client-side
//!   case-insensitive substring filter (limit-then-filter, deliberately)
//! - **select_semantic** — top-50 similarity pool, optionally kept to hits
//!   scoring strictly above a threshold
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_retrieval::{
//!     CollectionConfig, OpenAIEmbedder, QdrantConfig, QdrantRepository, SemanticIndex,
//!     TextEmbedder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = QdrantRepository::new(QdrantConfig::from_env()?)?;
//! let embedder = Arc::new(OpenAIEmbedder::from_env()?);
//!
//! let dimension = embedder.dimension();
//! let index = SemanticIndex::new(
//!     repository,
//!     embedder,
//!     "documents",
//!     CollectionConfig::new(dimension),
//! );
//!
//! index.ensure_collection().await?;
//! index.insert("Koty lubią mleko", 2).await?;
//!
//! let hits = index.select_semantic("zwierzęta domowe", 0.47).await?;
//! # Ok(())
//! # }
//! ```

pub mod embedding;
pub mod error;
pub mod models;
pub mod qdrant;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use embedding::{EmbeddingModel, OpenAIConfig, OpenAIEmbedder, TextEmbedder};
pub use error::{RetrievalError, RetrievalResult};
pub use models::{
    CollectionConfig, DistanceMetric, HnswConfig, PointId, PointRecord, SearchHit, SearchQuery,
    StoredPoint, WriteMode,
};
pub use qdrant::{QdrantConfig, QdrantRepository};
pub use repository::VectorRepository;
pub use service::SemanticIndex;
