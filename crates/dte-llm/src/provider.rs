//! The `Provider` trait: the sole, opaque text-generation collaborator.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ProviderError;

/// Sampling options for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOpts {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerateOpts {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self { temperature, max_tokens }
    }
}

impl Default for GenerateOpts {
    fn default() -> Self {
        Self { temperature: 0.7, max_tokens: 256 }
    }
}

/// One chunk of a streamed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    pub text: String,
    pub done: bool,
}

/// `Generate(prompt, opts) -> (text, err)` treated as opaque per §1/§6.
/// Implementations are interchangeable; the orchestrator is configured
/// with one primary and may fall back between them on repeated failures.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, prompt: &str, opts: GenerateOpts) -> Result<String, ProviderError>;

    fn stream_generate(
        &self,
        prompt: &str,
        opts: GenerateOpts,
    ) -> BoxStream<'static, Result<StreamChunk, ProviderError>>;

    fn name(&self) -> &str;

    fn available(&self) -> bool;

    fn max_tokens(&self) -> u32;
}
