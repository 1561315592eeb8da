//! The autonomous thought stream run loop (§4.3).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dte_config::{ProviderConfig, StreamConfig};
use dte_events::{EventBus, EventPayload};
use dte_llm::{generate_with_retry, GenerateOpts, Provider};
use dte_types::{ClockState, LifecycleState, Thought, ThoughtSource};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::buffer::ThoughtBuffer;
use crate::context::ContextSource;
use crate::gaps::KnowledgeGapTracker;
use crate::prompt::{build_prompt, fallback_content, PromptContext, FALLBACK_IMPORTANCE};
use crate::selection::{select_kind, Register};

pub struct ThoughtStream {
    buffer: ThoughtBuffer,
    gaps: KnowledgeGapTracker,
    counter: AtomicU64,
    next_id: AtomicU64,
}

impl Default for ThoughtStream {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ThoughtStream {
    pub fn new(buffer_cap: usize) -> Self {
        Self {
            buffer: ThoughtBuffer::new(buffer_cap),
            gaps: KnowledgeGapTracker::new(),
            counter: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn buffer(&self) -> ThoughtBuffer {
        self.buffer.clone()
    }

    pub fn gaps(&self) -> KnowledgeGapTracker {
        self.gaps.clone()
    }

    /// Runs until `stop` reports `true`. Pauses (without advancing the
    /// thought counter) while `lifecycle` reports `Resting` or
    /// `Dreaming`. Each tick's generation is spawned as its own task so a
    /// slow or stuck provider call never delays the next tick.
    pub async fn run(
        self: Arc<Self>,
        bus: EventBus,
        provider: Arc<dyn Provider>,
        provider_cfg: ProviderConfig,
        context: Arc<dyn ContextSource>,
        clock: watch::Receiver<ClockState>,
        mut lifecycle: watch::Receiver<LifecycleState>,
        cfg: StreamConfig,
        mut stop: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        debug!("thought stream stopping");
                        return;
                    }
                }
                _ = tokio::time::sleep(cfg.cadence) => {
                    let state = *lifecycle.borrow();
                    if matches!(state, LifecycleState::Resting | LifecycleState::Dreaming) {
                        continue;
                    }
                    let stream = self.clone();
                    let bus = bus.clone();
                    let provider = provider.clone();
                    let provider_cfg = provider_cfg.clone();
                    let context = context.clone();
                    let clock_state = *clock.borrow();
                    tokio::spawn(async move {
                        stream.generate_one(bus, provider.as_ref(), &provider_cfg, context.as_ref(), clock_state).await;
                    });
                }
                _ = lifecycle.changed() => {}
            }
        }
    }

    async fn generate_one(
        &self,
        bus: EventBus,
        provider: &dyn Provider,
        provider_cfg: &ProviderConfig,
        context: &dyn ContextSource,
        clock_state: ClockState,
    ) {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let gaps_exist = self.gaps.exists().await;
        let kind = select_kind(n, gaps_exist);
        let register = Register::for_clock(&clock_state);

        let prompt_ctx = PromptContext {
            recent_thoughts: self.buffer.recent(5).await,
            gaps: self.gaps.top(2).await,
            interests: context.top_interests(2).await,
            goals: context.active_goals().await,
            focus: context.current_focus().await,
            mood: context.current_mood().await,
        };
        let focus = prompt_ctx.focus.clone();
        let prompt = build_prompt(kind, &prompt_ctx);
        let opts = GenerateOpts {
            temperature: register.temperature(),
            max_tokens: 200,
        };

        let (content, importance) = match generate_with_retry(provider, &prompt, opts, provider_cfg).await {
            Ok(text) => (text, kind.default_importance()),
            Err(err) => {
                warn!("thought generation failed, using fallback: {err}");
                (fallback_content(&focus), FALLBACK_IMPORTANCE)
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let thought = Thought::new(id, content, kind, importance, [], ThoughtSource::Internal, clock_state);
        self.buffer.push(thought.clone()).await;
        bus.publish(EventPayload::ThoughtGenerated(thought)).await;
    }
}
