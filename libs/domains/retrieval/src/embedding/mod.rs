mod openai;
mod provider;

pub use openai::{EmbeddingModel, OpenAIConfig, OpenAIEmbedder};
pub use provider::TextEmbedder;

#[cfg(test)]
pub use provider::MockTextEmbedder;
