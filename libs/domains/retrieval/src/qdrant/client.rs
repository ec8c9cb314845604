use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    self, Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    GetPointsBuilder, PointId as QdrantPointId, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use uuid::Uuid;

use super::QdrantConfig;
use crate::error::{RetrievalError, RetrievalResult};
use crate::models::{
    CollectionConfig, DistanceMetric, PointId, PointRecord, SearchHit, SearchQuery, StoredPoint,
};
use crate::repository::VectorRepository;

/// Qdrant-backed implementation of VectorRepository
pub struct QdrantRepository {
    client: Qdrant,
}

impl QdrantRepository {
    pub fn new(config: QdrantConfig) -> RetrievalResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| RetrievalError::Store(format!("Failed to build client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclidean => Distance::Euclid,
            DistanceMetric::DotProduct => Distance::Dot,
            DistanceMetric::Manhattan => Distance::Manhattan,
        }
    }

    fn to_qdrant_point_id(id: PointId) -> QdrantPointId {
        match id {
            PointId::Num(n) => QdrantPointId::from(n),
            PointId::Uuid(u) => QdrantPointId::from(u.to_string()),
        }
    }

    fn from_qdrant_point_id(point_id: &QdrantPointId) -> RetrievalResult<PointId> {
        match &point_id.point_id_options {
            Some(qdrant::point_id::PointIdOptions::Num(n)) => Ok(PointId::Num(*n)),
            Some(qdrant::point_id::PointIdOptions::Uuid(uuid_str)) => Uuid::parse_str(uuid_str)
                .map(PointId::Uuid)
                .map_err(|e| RetrievalError::Internal(format!("Invalid UUID: {}", e))),
            None => Err(RetrievalError::Internal("Missing point ID".to_string())),
        }
    }

    fn payload_to_qdrant(payload: Option<serde_json::Value>) -> HashMap<String, QdrantValue> {
        let Some(value) = payload else {
            return HashMap::new();
        };

        let mut result = HashMap::new();

        if let serde_json::Value::Object(map) = value {
            for (key, val) in map {
                if let Some(qdrant_val) = json_to_qdrant_value(val) {
                    result.insert(key, qdrant_val);
                }
            }
        }

        result
    }

    fn qdrant_to_payload(payload: HashMap<String, QdrantValue>) -> Option<serde_json::Value> {
        if payload.is_empty() {
            return None;
        }

        let mut map = serde_json::Map::new();
        for (key, val) in payload {
            if let Some(json_val) = qdrant_value_to_json(val) {
                map.insert(key, json_val);
            }
        }

        Some(serde_json::Value::Object(map))
    }

    /// Extract vector values from VectorsOutput
    #[allow(deprecated)]
    fn extract_vector_from_output(vectors: &Option<qdrant::VectorsOutput>) -> Option<Vec<f32>> {
        match vectors {
            Some(qdrant::VectorsOutput {
                vectors_options: Some(opts),
            }) => match opts {
                qdrant::vectors_output::VectorsOptions::Vector(v) => Some(v.data.clone()),
                qdrant::vectors_output::VectorsOptions::Vectors(map) => {
                    map.vectors.values().next().map(|v| v.data.clone())
                }
            },
            _ => None,
        }
    }
}

fn json_to_qdrant_value(val: serde_json::Value) -> Option<QdrantValue> {
    match val {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(QdrantValue::from(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(QdrantValue::from(i))
            } else {
                n.as_f64().map(QdrantValue::from)
            }
        }
        serde_json::Value::String(s) => Some(QdrantValue::from(s)),
        _ => {
            // Complex types are stored as their JSON text
            Some(QdrantValue::from(val.to_string()))
        }
    }
}

fn qdrant_value_to_json(val: QdrantValue) -> Option<serde_json::Value> {
    use qdrant::value::Kind;

    match val.kind {
        Some(Kind::NullValue(_)) => Some(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => Some(serde_json::Value::Bool(b)),
        Some(Kind::IntegerValue(i)) => Some(serde_json::Value::Number(i.into())),
        Some(Kind::DoubleValue(f)) => {
            serde_json::Number::from_f64(f).map(serde_json::Value::Number)
        }
        Some(Kind::StringValue(s)) => Some(serde_json::Value::String(s)),
        _ => None,
    }
}

#[async_trait]
impl VectorRepository for QdrantRepository {
    async fn collection_exists(&self, name: &str) -> RetrievalResult<bool> {
        Ok(self.client.collection_exists(name).await?)
    }

    async fn create_collection(
        &self,
        name: &str,
        config: &CollectionConfig,
    ) -> RetrievalResult<()> {
        let mut vector_params =
            VectorParamsBuilder::new(config.dimension, Self::to_qdrant_distance(config.distance));

        if config.on_disk {
            vector_params = vector_params.on_disk(true);
        }

        let mut builder = CreateCollectionBuilder::new(name).vectors_config(vector_params);

        if let Some(hnsw) = &config.hnsw {
            let mut hnsw_config = qdrant::HnswConfigDiff::default();
            if let Some(m) = hnsw.m {
                hnsw_config.m = Some(m as u64);
            }
            if let Some(ef) = hnsw.ef_construct {
                hnsw_config.ef_construct = Some(ef as u64);
            }
            if let Some(threshold) = hnsw.full_scan_threshold {
                hnsw_config.full_scan_threshold = Some(threshold as u64);
            }
            builder = builder.hnsw_config(hnsw_config);
        }

        if let Some(shards) = config.shard_number {
            builder = builder.shard_number(shards);
        }

        if let Some(replication) = config.replication_factor {
            builder = builder.replication_factor(replication);
        }

        if let Some(threshold) = config.memmap_threshold {
            builder = builder.optimizers_config(qdrant::OptimizersConfigDiff {
                memmap_threshold: Some(threshold),
                ..Default::default()
            });
        }

        self.client.create_collection(builder).await?;

        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> RetrievalResult<()> {
        self.client.delete_collection(name).await?;
        Ok(())
    }

    async fn upsert(
        &self,
        name: &str,
        points: Vec<PointRecord>,
        wait: bool,
    ) -> RetrievalResult<()> {
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| {
                PointStruct::new(
                    Self::to_qdrant_point_id(p.id),
                    p.vector,
                    Self::payload_to_qdrant(p.payload),
                )
            })
            .collect();

        let mut builder = UpsertPointsBuilder::new(name, points);
        if wait {
            builder = builder.wait(true);
        }

        self.client.upsert_points(builder).await?;

        Ok(())
    }

    async fn retrieve(
        &self,
        name: &str,
        ids: Vec<PointId>,
        with_vectors: bool,
    ) -> RetrievalResult<Vec<StoredPoint>> {
        let point_ids: Vec<QdrantPointId> =
            ids.into_iter().map(Self::to_qdrant_point_id).collect();

        let builder = GetPointsBuilder::new(name, point_ids)
            .with_vectors(with_vectors)
            .with_payload(true);

        let results = self.client.get_points(builder).await?;

        results
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .as_ref()
                    .map(Self::from_qdrant_point_id)
                    .transpose()?
                    .ok_or_else(|| RetrievalError::Internal("Missing point ID".to_string()))?;

                Ok(StoredPoint {
                    id,
                    vector: Self::extract_vector_from_output(&point.vectors),
                    payload: Self::qdrant_to_payload(point.payload),
                })
            })
            .collect()
    }

    async fn search(&self, name: &str, query: SearchQuery) -> RetrievalResult<Vec<SearchHit>> {
        let mut builder = SearchPointsBuilder::new(name, query.vector, query.limit);

        if let Some(text) = query.text_equals {
            builder = builder.filter(Filter::must([Condition::matches("text", text)]));
        }

        builder = builder.with_vectors(query.with_vectors);
        builder = builder.with_payload(query.with_payload);

        let results = self.client.search_points(builder).await?;

        results
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .as_ref()
                    .map(Self::from_qdrant_point_id)
                    .transpose()?
                    .ok_or_else(|| RetrievalError::Internal("Missing point ID".to_string()))?;

                Ok(SearchHit {
                    id,
                    score: point.score,
                    payload: Self::qdrant_to_payload(point.payload),
                })
            })
            .collect()
    }

    async fn delete(&self, name: &str, ids: Vec<PointId>, wait: bool) -> RetrievalResult<u32> {
        let point_ids: Vec<QdrantPointId> =
            ids.into_iter().map(Self::to_qdrant_point_id).collect();
        let count = point_ids.len() as u32;

        let mut builder = DeletePointsBuilder::new(name).points(point_ids);
        if wait {
            builder = builder.wait(true);
        }

        self.client.delete_points(builder).await?;

        Ok(count)
    }
}
