use std::sync::Arc;

use core_config::tracing::{init_tracing, install_color_eyre};
use domain_retrieval::{
    CollectionConfig, OpenAIEmbedder, PointId, QdrantRepository, SemanticIndex, TextEmbedder,
};
use tracing::info;

mod config;

use config::Config;

const CORPUS: [&str; 8] = [
    "Sebastian ma piękne włosy",
    "Koty lubią mleko",
    "Alicja lubi koty i psy.",
    "W naszym hotelu jest bardzo przyjemnie",
    "Nie akceptujemy zwierząt domowych",
    "Adaś ma małego psa który się wabi Reksio",
    "W zasadzie to papuga też należy do zwierząt domowych",
    "Pies mojej sąsiadki ugryzł małe dziecko, duży problem z tego",
];

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    init_tracing(&config.environment);

    info!(url = %config.qdrant.url, "Connecting to Qdrant");
    let repository = QdrantRepository::new(config.qdrant.clone())?;

    let embedder = Arc::new(OpenAIEmbedder::new(config.embedder.clone()));
    let dimension = embedder.dimension();

    let index = SemanticIndex::new(
        repository,
        embedder,
        config.collection.clone(),
        CollectionConfig::new(dimension),
    )
    .with_write_mode(config.write_mode);

    // Fresh-start: drops any existing collection along with its points
    index.reset_collection().await?;
    info!(collection = %config.collection, "Collection ready");

    let texts: Vec<String> = CORPUS.iter().map(|s| s.to_string()).collect();
    let ids: Vec<PointId> = (1..=CORPUS.len() as u64).map(PointId::from).collect();
    index.insert_many(texts, ids).await?;
    info!(count = CORPUS.len(), "Corpus ingested");

    if let Some(point) = index.select_by_id(1).await? {
        info!(id = %point.id, text = point.text().unwrap_or(""), "Lookup by id");
    }

    for hit in index.select_like("psy").await? {
        info!(id = %hit.id, score = hit.score, text = hit.text().unwrap_or(""), "Substring match");
    }

    for hit in index.select_semantic("zwierzęta domowe", 0.47).await? {
        info!(id = %hit.id, score = hit.score, text = hit.text().unwrap_or(""), "Semantic match");
    }

    Ok(())
}
