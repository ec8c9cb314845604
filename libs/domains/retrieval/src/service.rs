use std::sync::Arc;

use tracing::{debug, info};

use crate::embedding::TextEmbedder;
use crate::error::{RetrievalError, RetrievalResult};
use crate::models::{
    CollectionConfig, PointId, PointRecord, SearchHit, SearchQuery, StoredPoint, WriteMode,
};
use crate::repository::VectorRepository;

/// Exact-match strategy limit: top similarity hits among exact text matches
const EXACT_MATCH_LIMIT: u64 = 10;

/// Candidate pool for the client-side filtering strategies.
///
/// Substring and threshold filters run over this pool; true matches ranked
/// below the pool are missed. Widening the pool trades latency for recall.
const CANDIDATE_POOL_LIMIT: u64 = 50;

/// Semantic index over one named collection.
///
/// Combines the embedder (text → vector) with the vector store and
/// implements the ingestion and query contract: upsert-by-id writes and
/// three retrieval strategies (exact payload match, hybrid
/// semantic+substring, pure semantic with a score threshold).
///
/// Dependencies are injected at construction; the service holds no global
/// state and every call is independent.
pub struct SemanticIndex<R: VectorRepository> {
    repository: Arc<R>,
    embedder: Arc<dyn TextEmbedder>,
    collection: String,
    config: CollectionConfig,
    write_mode: WriteMode,
    annotations: serde_json::Map<String, serde_json::Value>,
}

impl<R: VectorRepository> SemanticIndex<R> {
    pub fn new(
        repository: R,
        embedder: Arc<dyn TextEmbedder>,
        collection: impl Into<String>,
        config: CollectionConfig,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            embedder,
            collection: collection.into(),
            config,
            write_mode: WriteMode::default(),
            annotations: serde_json::Map::new(),
        }
    }

    /// Choose how upserts are acknowledged.
    ///
    /// `FireAndForget` gives up read-after-write: a query immediately after
    /// an insert may not observe it.
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Add a fixed annotation merged into every payload.
    ///
    /// The `text` key is reserved and always holds the source string.
    pub fn with_annotation(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.annotations.insert(key.into(), value);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Embedder dimension must equal the declared collection dimension.
    /// Checked before any store call so a misconfigured pipeline never
    /// creates or touches a collection.
    fn check_schema(&self) -> RetrievalResult<()> {
        let actual = self.embedder.dimension();
        if actual != self.config.dimension {
            return Err(RetrievalError::SchemaMismatch {
                expected: self.config.dimension,
                actual,
            });
        }
        Ok(())
    }

    // ===== Collection Lifecycle =====

    /// Create the collection if it does not exist yet. Idempotent and
    /// non-destructive: an existing collection (and its points) is left
    /// untouched.
    pub async fn ensure_collection(&self) -> RetrievalResult<()> {
        self.check_schema()?;

        if self.repository.collection_exists(&self.collection).await? {
            debug!(collection = %self.collection, "Collection already exists");
            return Ok(());
        }

        self.repository
            .create_collection(&self.collection, &self.config)
            .await?;

        info!(
            collection = %self.collection,
            dimension = self.config.dimension,
            "Collection created"
        );

        Ok(())
    }

    /// Recreate the collection from scratch.
    ///
    /// DESTRUCTIVE: if the collection exists it is deleted in full — every
    /// stored point is lost, non-reversibly — before recreation. This is
    /// the fresh-start lifecycle; use [`ensure_collection`](Self::ensure_collection)
    /// to keep existing data.
    pub async fn reset_collection(&self) -> RetrievalResult<()> {
        self.check_schema()?;

        if self.repository.collection_exists(&self.collection).await? {
            self.repository.delete_collection(&self.collection).await?;
            info!(collection = %self.collection, "Existing collection dropped");
        }

        self.repository
            .create_collection(&self.collection, &self.config)
            .await?;

        info!(
            collection = %self.collection,
            dimension = self.config.dimension,
            "Collection created"
        );

        Ok(())
    }

    // ===== Ingestion =====

    fn build_payload(&self, text: &str) -> serde_json::Value {
        let mut payload = self.annotations.clone();
        payload.insert(
            "text".to_string(),
            serde_json::Value::String(text.to_string()),
        );
        serde_json::Value::Object(payload)
    }

    /// Encode `text` and upsert it under `id`.
    ///
    /// Reusing an id replaces the prior vector and payload entirely.
    pub async fn insert(&self, text: &str, id: impl Into<PointId>) -> RetrievalResult<()> {
        let id = id.into();
        let vector = self.embedder.embed(text).await?;

        let point = PointRecord::new(id, vector).with_payload(self.build_payload(text));

        self.repository
            .upsert(&self.collection, vec![point], self.write_mode.wait())
            .await?;

        debug!(collection = %self.collection, %id, "Point upserted");

        Ok(())
    }

    /// Encode all `texts` as one batch and upsert them in a single write.
    ///
    /// `texts[i]` is stored under `ids[i]`; unequal lengths are an
    /// [`ArityMismatch`](RetrievalError::ArityMismatch) error and nothing is
    /// inserted. The store may apply points within the batch in any order.
    pub async fn insert_many(
        &self,
        texts: Vec<String>,
        ids: Vec<PointId>,
    ) -> RetrievalResult<()> {
        if texts.len() != ids.len() {
            return Err(RetrievalError::ArityMismatch {
                texts: texts.len(),
                ids: ids.len(),
            });
        }

        if texts.is_empty() {
            return Ok(());
        }

        let vectors = self.embedder.embed_batch(&texts).await?;

        let points: Vec<PointRecord> = ids
            .into_iter()
            .zip(vectors)
            .zip(&texts)
            .map(|((id, vector), text)| {
                PointRecord::new(id, vector).with_payload(self.build_payload(text))
            })
            .collect();

        let count = points.len();

        self.repository
            .upsert(&self.collection, points, self.write_mode.wait())
            .await?;

        info!(collection = %self.collection, count, "Batch upserted");

        Ok(())
    }

    /// Delete points by id
    pub async fn delete(&self, ids: Vec<PointId>) -> RetrievalResult<u32> {
        self.repository
            .delete(&self.collection, ids, self.write_mode.wait())
            .await
    }

    // ===== Retrieval Strategies =====

    /// Direct lookup by id, no vector math involved.
    ///
    /// An absent id yields `Ok(None)`, not an error.
    pub async fn select_by_id(&self, id: impl Into<PointId>) -> RetrievalResult<Option<StoredPoint>> {
        let id = id.into();

        let mut points = self
            .repository
            .retrieve(&self.collection, vec![id], true)
            .await?;

        debug!(collection = %self.collection, %id, found = !points.is_empty(), "Lookup by id");

        Ok(if points.is_empty() {
            None
        } else {
            Some(points.remove(0))
        })
    }

    /// Exact-match strategy: similarity search constrained by a server-side
    /// payload filter requiring `text` to equal the query byte-for-byte,
    /// top 10 by similarity among those matches.
    ///
    /// Near-identical text under a different exact string is excluded, so
    /// zero results are possible even when semantically close points exist.
    pub async fn select_text(&self, text: &str) -> RetrievalResult<Vec<SearchHit>> {
        let vector = self.embedder.embed(text).await?;

        let query = SearchQuery::new(vector, EXACT_MATCH_LIMIT).with_text_equals(text);

        let hits = self.repository.search(&self.collection, query).await?;

        debug!(collection = %self.collection, hits = hits.len(), "Exact-match search");

        Ok(hits)
    }

    /// Hybrid strategy: unfiltered similarity search over a broad candidate
    /// pool, then a client-side case-insensitive substring filter on the
    /// `text` payload.
    ///
    /// The order is limit-then-filter: substring matches ranked below the
    /// top 50 by similarity are missed. That recall bound is inherent to
    /// the strategy, not a defect.
    pub async fn select_like(&self, text: &str) -> RetrievalResult<Vec<SearchHit>> {
        let vector = self.embedder.embed(text).await?;

        let pool = self
            .repository
            .search(&self.collection, SearchQuery::new(vector, CANDIDATE_POOL_LIMIT))
            .await?;

        let needle = text.to_lowercase();
        let pool_size = pool.len();

        let hits: Vec<SearchHit> = pool
            .into_iter()
            .filter(|hit| {
                hit.text()
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .collect();

        debug!(
            collection = %self.collection,
            pool = pool_size,
            hits = hits.len(),
            "Substring search"
        );

        Ok(hits)
    }

    /// Pure semantic strategy: unfiltered similarity search over the same
    /// broad pool; with a positive `score_threshold` only hits scoring
    /// strictly above it are kept (a hit at exactly the threshold is
    /// excluded). A threshold of zero or below returns the full ranked
    /// pool. Ranking order survives the filter.
    pub async fn select_semantic(
        &self,
        text: &str,
        score_threshold: f32,
    ) -> RetrievalResult<Vec<SearchHit>> {
        let vector = self.embedder.embed(text).await?;

        let mut hits = self
            .repository
            .search(&self.collection, SearchQuery::new(vector, CANDIDATE_POOL_LIMIT))
            .await?;

        if score_threshold > 0.0 {
            hits.retain(|hit| hit.score > score_threshold);
        }

        debug!(
            collection = %self.collection,
            hits = hits.len(),
            score_threshold,
            "Semantic search"
        );

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockTextEmbedder;
    use crate::repository::MockVectorRepository;
    use serde_json::json;

    const DIM: u64 = 4;

    fn embedder_returning(vector: Vec<f32>) -> Arc<MockTextEmbedder> {
        let mut embedder = MockTextEmbedder::new();
        embedder.expect_dimension().return_const(DIM);
        embedder
            .expect_embed()
            .returning(move |_| Ok(vector.clone()));
        Arc::new(embedder)
    }

    fn hit(id: u64, score: f32, text: &str) -> SearchHit {
        SearchHit::new(PointId::from(id), score, Some(json!({ "text": text })))
    }

    fn index(
        repository: MockVectorRepository,
        embedder: Arc<MockTextEmbedder>,
    ) -> SemanticIndex<MockVectorRepository> {
        SemanticIndex::new(repository, embedder, "docs", CollectionConfig::new(DIM))
    }

    // ===== Lifecycle =====

    #[tokio::test]
    async fn test_ensure_collection_creates_when_absent() {
        let mut repo = MockVectorRepository::new();
        repo.expect_collection_exists()
            .withf(|name| name == "docs")
            .returning(|_| Ok(false));
        repo.expect_create_collection()
            .withf(|name, config| name == "docs" && config.dimension == DIM)
            .returning(|_, _| Ok(()));

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        index(repo, embedder).ensure_collection().await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_collection_is_non_destructive_when_present() {
        let mut repo = MockVectorRepository::new();
        repo.expect_collection_exists().returning(|_| Ok(true));
        // No create_collection or delete_collection expectations: any such
        // call fails the test.

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        index(repo, embedder).ensure_collection().await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_collection_drops_and_recreates() {
        let mut repo = MockVectorRepository::new();
        repo.expect_collection_exists().returning(|_| Ok(true));
        repo.expect_delete_collection()
            .withf(|name| name == "docs")
            .times(1)
            .returning(|_| Ok(()));
        repo.expect_create_collection()
            .withf(|name, _| name == "docs")
            .times(1)
            .returning(|_, _| Ok(()));

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        index(repo, embedder).reset_collection().await.unwrap();
    }

    #[tokio::test]
    async fn test_schema_mismatch_detected_before_any_store_call() {
        // Repository with no expectations: any call fails the test
        let repo = MockVectorRepository::new();

        let mut embedder = MockTextEmbedder::new();
        embedder.expect_dimension().return_const(DIM + 1);

        let svc = index(repo, Arc::new(embedder));
        let err = svc.reset_collection().await.unwrap_err();

        match err {
            RetrievalError::SchemaMismatch { expected, actual } => {
                assert_eq!(expected, DIM);
                assert_eq!(actual, DIM + 1);
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    // ===== Ingestion =====

    #[tokio::test]
    async fn test_insert_upserts_encoded_text_with_payload() {
        let mut repo = MockVectorRepository::new();
        repo.expect_upsert()
            .withf(|name, points, wait| {
                name == "docs"
                    && *wait
                    && points.len() == 1
                    && points[0].id == PointId::from(1)
                    && points[0].vector == vec![0.1, 0.2, 0.3, 0.4]
                    && points[0].payload.as_ref().unwrap()["text"] == "Koty lubią mleko"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let embedder = embedder_returning(vec![0.1, 0.2, 0.3, 0.4]);
        index(repo, embedder)
            .insert("Koty lubią mleko", 1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fire_and_forget_insert_does_not_wait() {
        let mut repo = MockVectorRepository::new();
        repo.expect_upsert()
            .withf(|_, _, wait| !*wait)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let svc = index(repo, embedder).with_write_mode(WriteMode::FireAndForget);

        svc.insert("Sebastian ma piękne włosy", 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_merges_fixed_annotations() {
        let mut repo = MockVectorRepository::new();
        repo.expect_upsert()
            .withf(|_, points, _| {
                let payload = points[0].payload.as_ref().unwrap();
                payload["text"] == "Koty lubią mleko" && payload["source"] == "demo"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let svc = index(repo, embedder).with_annotation("source", json!("demo"));

        svc.insert("Koty lubią mleko", 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_many_batches_in_order() {
        let mut embedder = MockTextEmbedder::new();
        embedder.expect_dimension().return_const(DIM);
        embedder
            .expect_embed_batch()
            .withf(|texts| texts == ["a", "b"])
            .times(1)
            .returning(|_| Ok(vec![vec![1.0; DIM as usize], vec![2.0; DIM as usize]]));

        let mut repo = MockVectorRepository::new();
        repo.expect_upsert()
            .withf(|_, points, wait| {
                *wait
                    && points.len() == 2
                    && points[0].id == PointId::from(1)
                    && points[0].vector == vec![1.0; DIM as usize]
                    && points[0].payload.as_ref().unwrap()["text"] == "a"
                    && points[1].id == PointId::from(2)
                    && points[1].vector == vec![2.0; DIM as usize]
                    && points[1].payload.as_ref().unwrap()["text"] == "b"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let svc = index(repo, Arc::new(embedder));
        svc.insert_many(
            vec!["a".to_string(), "b".to_string()],
            vec![PointId::from(1), PointId::from(2)],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_insert_many_arity_mismatch_inserts_nothing() {
        // Neither the embedder nor the repository may be called
        let repo = MockVectorRepository::new();
        let mut embedder = MockTextEmbedder::new();
        embedder.expect_dimension().return_const(DIM);

        let svc = index(repo, Arc::new(embedder));
        let err = svc
            .insert_many(
                vec!["a".to_string()],
                vec![PointId::from(1), PointId::from(2)],
            )
            .await
            .unwrap_err();

        match err {
            RetrievalError::ArityMismatch { texts, ids } => {
                assert_eq!(texts, 1);
                assert_eq!(ids, 2);
            }
            other => panic!("expected ArityMismatch, got {:?}", other),
        }
    }

    // ===== select_by_id =====

    #[tokio::test]
    async fn test_select_by_id_returns_point() {
        let mut repo = MockVectorRepository::new();
        repo.expect_retrieve()
            .withf(|name, ids, with_vectors| {
                name == "docs" && *ids == [PointId::from(1)] && *with_vectors
            })
            .returning(|_, _, _| {
                Ok(vec![StoredPoint {
                    id: PointId::from(1),
                    vector: Some(vec![0.1, 0.2, 0.3, 0.4]),
                    payload: Some(json!({ "text": "Sebastian ma piękne włosy" })),
                }])
            });

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let point = index(repo, embedder).select_by_id(1).await.unwrap().unwrap();

        assert_eq!(point.id, PointId::from(1));
        assert_eq!(point.text(), Some("Sebastian ma piękne włosy"));
        assert_eq!(point.vector, Some(vec![0.1, 0.2, 0.3, 0.4]));
    }

    #[tokio::test]
    async fn test_select_by_id_absent_is_none_not_error() {
        let mut repo = MockVectorRepository::new();
        repo.expect_retrieve().returning(|_, _, _| Ok(vec![]));

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let result = index(repo, embedder).select_by_id(999).await.unwrap();

        assert!(result.is_none());
    }

    // ===== select_text =====

    #[tokio::test]
    async fn test_select_text_uses_server_side_filter_and_limit_10() {
        let mut repo = MockVectorRepository::new();
        repo.expect_search()
            .withf(|name, query| {
                name == "docs"
                    && query.limit == 10
                    && query.text_equals.as_deref() == Some("Koty lubią mleko")
            })
            .returning(|_, _| Ok(vec![hit(2, 0.99, "Koty lubią mleko")]));

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let hits = index(repo, embedder)
            .select_text("Koty lubią mleko")
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, PointId::from(2));
    }

    #[tokio::test]
    async fn test_select_text_can_be_empty_despite_similar_text() {
        // The store filters before ranking: a near-identical string that is
        // not byte-equal never reaches the result set.
        let mut repo = MockVectorRepository::new();
        repo.expect_search()
            .withf(|_, query| query.text_equals.is_some())
            .returning(|_, _| Ok(vec![]));

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let hits = index(repo, embedder)
            .select_text("Koty lubią mleko!")
            .await
            .unwrap();

        assert!(hits.is_empty());
    }

    // ===== select_like =====

    #[tokio::test]
    async fn test_select_like_filters_pool_case_insensitively() {
        let mut repo = MockVectorRepository::new();
        repo.expect_search()
            .withf(|_, query| query.limit == 50 && query.text_equals.is_none())
            .returning(|_, _| {
                Ok(vec![
                    hit(3, 0.91, "Alicja lubi koty i psy."),
                    hit(2, 0.84, "Koty lubią mleko"),
                    hit(5, 0.63, "Nie akceptujemy zwierząt domowych"),
                ])
            });

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let hits = index(repo, embedder).select_like("KOTY").await.unwrap();

        // Limit-then-filter: pool order (descending score) is preserved
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, PointId::from(3));
        assert_eq!(hits[1].id, PointId::from(2));
    }

    #[tokio::test]
    async fn test_select_like_drops_hits_without_text_payload() {
        let mut repo = MockVectorRepository::new();
        repo.expect_search().returning(|_, _| {
            Ok(vec![
                SearchHit::new(PointId::from(9), 0.95, None),
                hit(6, 0.72, "Adaś ma małego psa który się wabi Reksio"),
            ])
        });

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let hits = index(repo, embedder).select_like("psa").await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, PointId::from(6));
    }

    // ===== select_semantic =====

    #[tokio::test]
    async fn test_select_semantic_strictly_above_threshold() {
        let mut repo = MockVectorRepository::new();
        repo.expect_search()
            .withf(|_, query| query.limit == 50 && query.text_equals.is_none())
            .returning(|_, _| {
                Ok(vec![
                    hit(5, 0.81, "Nie akceptujemy zwierząt domowych"),
                    hit(7, 0.50, "W zasadzie to papuga też należy do zwierząt domowych"),
                    hit(4, 0.31, "W naszym hotelu jest bardzo przyjemnie"),
                ])
            });

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let hits = index(repo, embedder)
            .select_semantic("zwierzęta domowe", 0.5)
            .await
            .unwrap();

        // A hit at exactly the threshold is excluded
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, PointId::from(5));
    }

    #[tokio::test]
    async fn test_select_semantic_zero_threshold_returns_full_pool() {
        let mut repo = MockVectorRepository::new();
        repo.expect_search().returning(|_, _| {
            Ok(vec![
                hit(5, 0.81, "Nie akceptujemy zwierząt domowych"),
                hit(4, 0.31, "W naszym hotelu jest bardzo przyjemnie"),
                hit(1, -0.12, "Sebastian ma piękne włosy"),
            ])
        });

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let hits = index(repo, embedder)
            .select_semantic("zwierzęta domowe", 0.0)
            .await
            .unwrap();

        assert_eq!(hits.len(), 3);
        // Ranking order is preserved
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_select_semantic_empty_when_nothing_exceeds_threshold() {
        let mut repo = MockVectorRepository::new();
        repo.expect_search()
            .returning(|_, _| Ok(vec![hit(4, 0.31, "W naszym hotelu jest bardzo przyjemnie")]));

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let hits = index(repo, embedder)
            .select_semantic("zwierzęta domowe", 0.5)
            .await
            .unwrap();

        assert!(hits.is_empty());
    }

    // ===== delete =====

    #[tokio::test]
    async fn test_delete_honors_write_mode() {
        let mut repo = MockVectorRepository::new();
        repo.expect_delete()
            .withf(|name, ids, wait| name == "docs" && ids.len() == 2 && *wait)
            .returning(|_, ids, _| Ok(ids.len() as u32));

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let count = index(repo, embedder)
            .delete(vec![PointId::from(1), PointId::from(2)])
            .await
            .unwrap();

        assert_eq!(count, 2);
    }

    // ===== error propagation =====

    #[tokio::test]
    async fn test_store_errors_propagate_unmodified() {
        let mut repo = MockVectorRepository::new();
        repo.expect_search()
            .returning(|_, _| Err(RetrievalError::Store("connection refused".to_string())));

        let embedder = embedder_returning(vec![0.0; DIM as usize]);
        let err = index(repo, embedder)
            .select_semantic("anything", 0.0)
            .await
            .unwrap_err();

        match err {
            RetrievalError::Store(msg) => assert!(msg.contains("connection refused")),
            other => panic!("expected Store, got {:?}", other),
        }
    }
}
