use async_trait::async_trait;

use crate::error::RetrievalResult;
use crate::models::{CollectionConfig, PointId, PointRecord, SearchHit, SearchQuery, StoredPoint};

/// Storage abstraction over the vector database.
///
/// Any store offering collection management, upsert, retrieve-by-id, and
/// top-k similarity search with an optional exact-match payload filter is
/// sufficient; nothing here depends on the store's indexing internals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorRepository: Send + Sync {
    // ===== Collection Management =====

    /// Whether a collection with this name exists
    async fn collection_exists(&self, name: &str) -> RetrievalResult<bool>;

    /// Create a collection with the given schema and tuning
    async fn create_collection(&self, name: &str, config: &CollectionConfig)
        -> RetrievalResult<()>;

    /// Delete a collection and all of its points
    async fn delete_collection(&self, name: &str) -> RetrievalResult<()>;

    // ===== Point Operations =====

    /// Upsert points; an existing id is overwritten entirely.
    ///
    /// With `wait` the call returns after the store has applied the write;
    /// without it, after the write is accepted.
    async fn upsert(&self, name: &str, points: Vec<PointRecord>, wait: bool)
        -> RetrievalResult<()>;

    /// Fetch points by id; missing ids are simply absent from the result
    async fn retrieve(
        &self,
        name: &str,
        ids: Vec<PointId>,
        with_vectors: bool,
    ) -> RetrievalResult<Vec<StoredPoint>>;

    /// Top-k similarity search, ranked by non-increasing score
    async fn search(&self, name: &str, query: SearchQuery) -> RetrievalResult<Vec<SearchHit>>;

    /// Delete points by id, returning the number requested for deletion
    async fn delete(&self, name: &str, ids: Vec<PointId>, wait: bool) -> RetrievalResult<u32>;
}
