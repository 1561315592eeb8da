//! Test/offline providers: a deterministic mock and a scripted-failure
//! provider used to exercise the retry/fallback path (§8 scenario 5).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::ProviderError;
use crate::provider::{GenerateOpts, Provider, StreamChunk};

/// Returns a synthetic answer without calling any real API, matching the
/// shape of `beagle_llm::clients::mock::MockLlmClient`.
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate(&self, prompt: &str, _opts: GenerateOpts) -> Result<String, ProviderError> {
        Ok(format!("MOCK_ANSWER for: {prompt}"))
    }

    fn stream_generate(
        &self,
        prompt: &str,
        _opts: GenerateOpts,
    ) -> BoxStream<'static, Result<StreamChunk, ProviderError>> {
        let text = format!("MOCK_ANSWER for: {prompt}");
        stream::iter(vec![Ok(StreamChunk { text, done: true })]).boxed()
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn max_tokens(&self) -> u32 {
        4096
    }
}

/// Fails transiently the first `failures` calls, then succeeds. Used to
/// exercise the retry/backoff path deterministically in tests.
pub struct FlakyProvider {
    failures: usize,
    attempts: AtomicUsize,
}

impl FlakyProvider {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for FlakyProvider {
    async fn generate(&self, prompt: &str, _opts: GenerateOpts) -> Result<String, ProviderError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(ProviderError::Transient(format!("synthetic failure #{n}")))
        } else {
            Ok(format!("RECOVERED_ANSWER for: {prompt}"))
        }
    }

    fn stream_generate(
        &self,
        _prompt: &str,
        _opts: GenerateOpts,
    ) -> BoxStream<'static, Result<StreamChunk, ProviderError>> {
        stream::iter(vec![Err(ProviderError::Transient("no streaming in FlakyProvider".into()))])
            .boxed()
    }

    fn name(&self) -> &str {
        "flaky"
    }

    fn available(&self) -> bool {
        true
    }

    fn max_tokens(&self) -> u32 {
        4096
    }
}
