use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-supplied point identifier, unique within a collection.
///
/// Reusing an id overwrites the prior point (upsert semantics). The two
/// variants mirror the id families the vector store accepts natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(Uuid),
}

impl From<u64> for PointId {
    fn from(id: u64) -> Self {
        PointId::Num(id)
    }
}

impl From<Uuid> for PointId {
    fn from(id: Uuid) -> Self {
        PointId::Uuid(id)
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Uuid(u) => write!(f, "{}", u),
        }
    }
}

/// Distance metric for similarity ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
    Manhattan,
}

/// HNSW index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswConfig {
    pub m: Option<u32>,
    pub ef_construct: Option<u32>,
    pub full_scan_threshold: Option<u32>,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: Some(16),
            ef_construct: Some(100),
            full_scan_threshold: None,
        }
    }
}

/// Collection schema and tuning.
///
/// `dimension` and `distance` are fixed for the collection's lifetime and
/// define result correctness; everything else (sharding, replication,
/// on-disk storage, memmap threshold) only affects performance and
/// durability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub dimension: u64,
    pub distance: DistanceMetric,
    pub hnsw: Option<HnswConfig>,
    pub shard_number: Option<u32>,
    pub replication_factor: Option<u32>,
    pub on_disk: bool,
    pub memmap_threshold: Option<u64>,
}

impl CollectionConfig {
    pub fn new(dimension: u64) -> Self {
        Self {
            dimension,
            distance: DistanceMetric::default(),
            hnsw: None,
            shard_number: None,
            replication_factor: None,
            on_disk: false,
            memmap_threshold: None,
        }
    }

    pub fn with_distance(mut self, distance: DistanceMetric) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_hnsw(mut self, hnsw: HnswConfig) -> Self {
        self.hnsw = Some(hnsw);
        self
    }

    pub fn with_sharding(mut self, shard_number: u32, replication_factor: u32) -> Self {
        self.shard_number = Some(shard_number);
        self.replication_factor = Some(replication_factor);
        self
    }

    pub fn with_on_disk(mut self, on_disk: bool) -> Self {
        self.on_disk = on_disk;
        self
    }

    pub fn with_memmap_threshold(mut self, threshold: u64) -> Self {
        self.memmap_threshold = Some(threshold);
        self
    }
}

/// Write acknowledgement mode for ingestion.
///
/// `Blocking` waits until the store has applied the write, so a subsequent
/// read observes it. `FireAndForget` returns once the write is accepted;
/// the store may apply it later, and a query issued immediately afterwards
/// is not guaranteed to see it. Pick `Blocking` when read-after-write
/// matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    #[default]
    Blocking,
    FireAndForget,
}

impl WriteMode {
    pub fn wait(self) -> bool {
        matches!(self, WriteMode::Blocking)
    }
}

/// A point to be upserted: id, embedding vector, and payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: Option<serde_json::Value>,
}

impl PointRecord {
    pub fn new(id: PointId, vector: Vec<f32>) -> Self {
        Self {
            id,
            vector,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// A point as returned by retrieve-by-id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPoint {
    pub id: PointId,
    pub vector: Option<Vec<f32>>,
    pub payload: Option<serde_json::Value>,
}

impl StoredPoint {
    /// The `text` payload field, when present
    pub fn text(&self) -> Option<&str> {
        self.payload.as_ref()?.get("text")?.as_str()
    }
}

/// Similarity search parameters.
///
/// `text_equals` is the only server-side payload predicate this domain
/// uses: an exact match on the `text` field, applied by the store before
/// ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    pub limit: u64,
    pub text_equals: Option<String>,
    pub with_vectors: bool,
    pub with_payload: bool,
}

impl SearchQuery {
    pub fn new(vector: Vec<f32>, limit: u64) -> Self {
        Self {
            vector,
            limit,
            text_equals: None,
            with_vectors: false,
            with_payload: true,
        }
    }

    pub fn with_text_equals(mut self, text: impl Into<String>) -> Self {
        self.text_equals = Some(text.into());
        self
    }
}

/// A ranked similarity search result.
///
/// Cosine scores fall in `[-1, 1]`; higher means more similar. Result
/// lists arrive in non-increasing score order, truncated to the query
/// limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: PointId,
    pub score: f32,
    pub payload: Option<serde_json::Value>,
}

impl SearchHit {
    pub fn new(id: PointId, score: f32, payload: Option<serde_json::Value>) -> Self {
        Self { id, score, payload }
    }

    /// The `text` payload field, when present
    pub fn text(&self) -> Option<&str> {
        self.payload.as_ref()?.get("text")?.as_str()
    }
}
