//! The narrow collaborator the consolidator hands its pattern batch to
//! once a dream pass completes (the wisdom synthesizer implements this).

use async_trait::async_trait;
use dte_types::Pattern;

#[async_trait]
pub trait PatternSink: Send + Sync {
    async fn accept(&self, patterns: Vec<Pattern>);
}

pub struct NullPatternSink;

#[async_trait]
impl PatternSink for NullPatternSink {
    async fn accept(&self, _patterns: Vec<Pattern>) {}
}
