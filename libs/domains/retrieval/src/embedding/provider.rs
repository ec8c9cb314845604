use async_trait::async_trait;

use crate::error::RetrievalResult;

/// Text-to-vector conversion, the single seam between text and the store.
///
/// Implementations must be deterministic per model version: encoding the
/// same text twice yields the same vector, so insert-time and query-time
/// vectors are comparable.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Output dimensionality, fixed per model.
    ///
    /// Must equal the target collection's declared dimension; the mismatch
    /// is caught at collection-creation time.
    fn dimension(&self) -> u64;

    /// Encode a single text
    async fn embed(&self, text: &str) -> RetrievalResult<Vec<f32>>;

    /// Encode many texts in one call.
    ///
    /// Output preserves input order: `vectors[i]` corresponds to `texts[i]`.
    async fn embed_batch(&self, texts: &[String]) -> RetrievalResult<Vec<Vec<f32>>>;
}
