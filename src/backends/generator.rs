use crate::backends::{GenerationChunk, GenerationParams};
use crate::core::MinerError;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub type BoxStream =
    Pin<Box<dyn Stream<Item = Result<GenerationChunk, MinerError>> + Send + 'static>>;

/// A model runtime able to continue a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt` and return the decoded text
    async fn generate(&self, prompt: &str, params: &GenerationParams)
        -> Result<String, MinerError>;

    /// Generate a completion for `prompt`, yielding tokens as they are decoded
    async fn generate_streaming(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<BoxStream, MinerError>;
}
