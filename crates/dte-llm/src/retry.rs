//! Shared retry/backoff/deadline discipline for provider calls (§5/§7):
//! up to 3 retries with exponential backoff (1s, 2s, 4s), skipped for
//! permanent (4xx-class) errors, each attempt bounded by a deadline.

use dte_config::ProviderConfig;
use tracing::warn;

use crate::error::ProviderError;
use crate::provider::{GenerateOpts, Provider};

/// Calls `provider.generate` with retry/backoff/deadline per `cfg`.
/// Returns the first success, or the last error if every attempt (the
/// initial try plus `cfg.max_retries` retries) fails.
pub async fn generate_with_retry(
    provider: &dyn Provider,
    prompt: &str,
    opts: GenerateOpts,
    cfg: &ProviderConfig,
) -> Result<String, ProviderError> {
    let mut attempt = 0u32;
    let mut backoff = cfg.backoff_base;

    loop {
        let call = tokio::time::timeout(cfg.deadline, provider.generate(prompt, opts));
        let outcome = match call.await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Transient(format!(
                "provider {} timed out after {:?}",
                provider.name(),
                cfg.deadline
            ))),
        };

        match outcome {
            Ok(text) => return Ok(text),
            Err(err) if !err.is_retryable() => {
                warn!(provider = provider.name(), "permanent provider error: {err}");
                return Err(err);
            }
            Err(err) if attempt >= cfg.max_retries => {
                warn!(
                    provider = provider.name(),
                    attempt, "provider call failed after exhausting retries: {err}"
                );
                return Err(err);
            }
            Err(err) => {
                warn!(provider = provider.name(), attempt, "retrying after transient error: {err}");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FlakyProvider;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn retries_until_recovery_with_exponential_backoff() {
        let provider = FlakyProvider::new(3);
        let cfg = ProviderConfig {
            deadline: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_millis(1),
        };
        let result = generate_with_retry(&provider, "hi", GenerateOpts::default(), &cfg).await;
        assert!(result.unwrap().starts_with("RECOVERED_ANSWER"));
        assert_eq!(provider.attempts(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_retries_and_returns_last_error() {
        let provider = FlakyProvider::new(10);
        let cfg = ProviderConfig {
            deadline: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_millis(1),
        };
        let result = generate_with_retry(&provider, "hi", GenerateOpts::default(), &cfg).await;
        assert!(result.is_err());
        assert_eq!(provider.attempts(), 4);
    }
}
