//! LLM provider abstraction for Deep Tree Echo.
//!
//! Generation itself is out of scope (§1): this crate only defines the
//! opaque `Provider` trait callers program against, the error taxonomy,
//! and the shared retry/backoff discipline every caller must apply.

pub mod error;
pub mod mock;
pub mod provider;
pub mod retry;

pub use error::ProviderError;
pub use mock::{FlakyProvider, MockProvider};
pub use provider::{GenerateOpts, Provider, StreamChunk};
pub use retry::generate_with_retry;
