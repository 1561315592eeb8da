//! The orchestrator: constructs every collaborator, replays persisted
//! state into them, and owns the control surface (`Start`, `Stop`,
//! `Think`, `ProcessMessage`, `Status`, `GetWisdomPrinciples`,
//! `GetSelfModel`, `GetMetrics`) that everything else in this crate is
//! built to serve.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dte_clock::{Clock, SyncKind};
use dte_config::{DteConfig, InterestConfig, ProviderConfig, WisdomConfig};
use dte_consolidator::{Consolidator, PatternSink};
use dte_engines::EnginePool;
use dte_events::{EventBus, EventPayload, EventType, SubscriptionToken};
use dte_interest::{consider_skill, maybe_initiate, DiscussionTracker, EngagementDecision, FatigueSource, InterestMap};
use dte_lifecycle::{DreamRunner, LifecycleController};
use dte_llm::{generate_with_retry, GenerateOpts, Provider};
use dte_memory::MemoryStore;
use dte_persistence::{distribute, restore_or_init, CheckpointStore, SessionHandle, SessionLog};
use dte_stream::{ContextSource, ThoughtStream};
use dte_types::{Checkpoint, Counters, Goal, Identity, Thought, ThoughtKind, ThoughtSource, WisdomDomain, CHECKPOINT_VERSION};
use dte_wisdom::WisdomSynthesizer;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::context::LiveContext;
use crate::handlers::{DreamEndedHandler, ThoughtGeneratedHandler, WisdomGainedHandler};
use crate::self_model::{awareness, CoreMetrics, SelfModel, Status};

/// The fixed core values that make up half of the identity signature's
/// preimage. Not separately configurable: they describe what this
/// instance is, not a deployment knob.
const CORE_VALUES: &[&str] = &["curiosity", "care", "integrity", "growth"];

pub struct Orchestrator {
    cfg: DteConfig,
    bus: EventBus,
    clock: Arc<Mutex<Clock>>,
    clock_tx: watch::Sender<dte_types::ClockState>,
    engines: Arc<Mutex<EnginePool>>,
    lifecycle: Arc<LifecycleController>,
    stream: Arc<ThoughtStream>,
    consolidator: Arc<Consolidator>,
    wisdom: Arc<WisdomSynthesizer>,
    interests: InterestMap,
    discussions: DiscussionTracker,
    goals: Arc<RwLock<Vec<Goal>>>,
    context: Arc<LiveContext>,
    provider: Arc<dyn Provider>,
    checkpoint_store: Arc<CheckpointStore>,
    session_log: Arc<SessionLog>,
    session_handle: RwLock<Option<SessionHandle>>,
    identity: Identity,
    counters: Arc<RwLock<Counters>>,
    started_at: RwLock<Option<Instant>>,
    wisdom_at_start: RwLock<f32>,
    stop_tx: watch::Sender<bool>,
    running: AtomicBool,
    tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
    subscriptions: Mutex<Vec<SubscriptionToken>>,
    thought_counter: AtomicU64,
}

impl Orchestrator {
    /// Builds every collaborator and replays the last checkpoint (if any
    /// and if its identity signature still verifies) into them. Does not
    /// start any background work; call `start` for that.
    ///
    /// Fails only when a checkpoint file exists but is syntactically
    /// invalid and the operator has not opted into discarding it (see
    /// `dte_config::reset_on_corrupt_checkpoint`); the caller is expected
    /// to exit with code 2 in that case rather than run on an identity it
    /// could not actually restore.
    pub async fn new(cfg: DteConfig, provider: Arc<dyn Provider>, memory: Arc<dyn MemoryStore>) -> anyhow::Result<Arc<Self>> {
        let bus = EventBus::new(cfg.bus.subscriber_queue_depth);
        let checkpoint_store = Arc::new(CheckpointStore::new(cfg.persistence.state_file.clone()));
        let session_log = Arc::new(SessionLog::new(cfg.persistence.session_log_file.clone()));

        let core_values: Vec<String> = CORE_VALUES.iter().map(|s| s.to_string()).collect();
        let outcome = restore_or_init(&checkpoint_store, core_values).await?;
        if outcome.restored_from_checkpoint {
            info!(signature = %outcome.identity.signature, "restored from checkpoint");
        } else {
            info!(signature = %outcome.identity.signature, "starting with a fresh identity");
        }

        let clock = Arc::new(Mutex::new(Clock::restore(outcome.clock)));
        let (clock_tx, _) = watch::channel(outcome.clock);

        let engines = Arc::new(Mutex::new(EnginePool::build(&cfg.clock)));

        let lifecycle = Arc::new(LifecycleController::new(cfg.lifecycle.clone(), cfg.clock.engine_count as u32));
        lifecycle.restore_vitals(outcome.vital_signs).await;

        let stream = Arc::new(ThoughtStream::new(cfg.stream.buffer_cap));

        let interests = InterestMap::new();
        distribute(&outcome, &stream.buffer(), &interests).await;

        let discussions = DiscussionTracker::new();
        let goals = Arc::new(RwLock::new(outcome.goals));

        let wisdom = Arc::new(WisdomSynthesizer::new(cfg.wisdom.clone(), cfg.provider.clone(), provider.clone(), bus.clone()));
        wisdom.restore(outcome.principles, outcome.wisdom_level).await;

        let pattern_sink: Arc<dyn PatternSink> = wisdom.clone();
        let consolidator = Arc::new(Consolidator::new(
            cfg.consolidator.clone(),
            cfg.provider.clone(),
            provider.clone(),
            memory,
            bus.clone(),
            stream.buffer(),
            pattern_sink,
        ));

        let context = Arc::new(LiveContext::new(interests.clone(), goals.clone(), lifecycle.clone()));

        let (stop_tx, _) = watch::channel(false);

        Ok(Arc::new(Self {
            cfg,
            bus,
            clock,
            clock_tx,
            engines,
            lifecycle,
            stream,
            consolidator,
            wisdom,
            interests,
            discussions,
            goals,
            context,
            provider,
            checkpoint_store,
            session_log,
            session_handle: RwLock::new(None),
            identity: outcome.identity,
            counters: Arc::new(RwLock::new(outcome.counters)),
            started_at: RwLock::new(None),
            wisdom_at_start: RwLock::new(0.0),
            stop_tx,
            running: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            thought_counter: AtomicU64::new(1),
        }))
    }

    /// Idempotent: a second call while already running is a no-op.
    pub async fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.started_at.write().await = Some(Instant::now());
        *self.wisdom_at_start.write().await = self.wisdom.wisdom_level().await;

        let session_n = {
            let mut counters = self.counters.write().await;
            counters.session_n += 1;
            counters.session_n
        };
        *self.session_handle.write().await = Some(self.session_log.begin(session_n));

        {
            let mut subs = self.subscriptions.lock().await;
            subs.push(
                self.bus
                    .subscribe(
                        EventType::ThoughtGenerated,
                        ThoughtGeneratedHandler {
                            interests: self.interests.clone(),
                            lifecycle: self.lifecycle.clone(),
                            counters: self.counters.clone(),
                        },
                    )
                    .await,
            );
            subs.push(
                self.bus
                    .subscribe(EventType::DreamEnded, DreamEndedHandler { counters: self.counters.clone() })
                    .await,
            );
            subs.push(
                self.bus
                    .subscribe(EventType::WisdomGained, WisdomGainedHandler { counters: self.counters.clone() })
                    .await,
            );
        }

        let stop_rx = self.stop_tx.subscribe();

        {
            let mut engines = self.engines.lock().await;
            engines.spawn(
                self.provider.clone(),
                self.cfg.provider.clone(),
                self.lifecycle.clock_active_rx(),
                (self.cfg.clock.engine_min_cadence, self.cfg.clock.engine_max_cadence),
            );
        }

        let mut tasks = Vec::new();

        tasks.push((
            "wisdom",
            tokio::spawn(wisdom_loop(
                self.wisdom.clone(),
                self.context.clone(),
                self.lifecycle.clone(),
                self.cfg.wisdom.clone(),
                stop_rx.clone(),
            )),
        ));

        tasks.push((
            "discussion",
            tokio::spawn(discussion_loop(
                self.discussions.clone(),
                self.interests.clone(),
                self.lifecycle.clone(),
                self.cfg.interest.clone(),
                self.cfg.provider.clone(),
                self.provider.clone(),
                self.bus.clone(),
                stop_rx.clone(),
            )),
        ));

        tasks.push(("interest", tokio::spawn(interest_decay_loop(self.interests.clone(), stop_rx.clone()))));

        let lifecycle = self.lifecycle.clone();
        let lifecycle_bus = self.bus.clone();
        let dream_runner: Arc<dyn DreamRunner> = self.consolidator.clone();
        let lifecycle_stop = stop_rx.clone();
        tasks.push((
            "wake_rest",
            tokio::spawn(async move {
                lifecycle.run(lifecycle_bus, dream_runner, lifecycle_stop).await;
            }),
        ));

        let stream = self.stream.clone();
        let stream_bus = self.bus.clone();
        let stream_provider = self.provider.clone();
        let stream_provider_cfg = self.cfg.provider.clone();
        let stream_context: Arc<dyn ContextSource> = self.context.clone();
        let stream_clock_rx = self.clock_tx.subscribe();
        let stream_lifecycle_rx = self.lifecycle.state_rx();
        let stream_cfg = self.cfg.stream.clone();
        let stream_stop = stop_rx.clone();
        tasks.push((
            "stream",
            tokio::spawn(async move {
                stream
                    .run(
                        stream_bus,
                        stream_provider,
                        stream_provider_cfg,
                        stream_context,
                        stream_clock_rx,
                        stream_lifecycle_rx,
                        stream_cfg,
                        stream_stop,
                    )
                    .await;
            }),
        ));

        tasks.push((
            "clock",
            tokio::spawn(clock_loop(
                self.clock.clone(),
                self.bus.clone(),
                self.clock_tx.clone(),
                self.counters.clone(),
                self.cfg.clock.step_duration,
                stop_rx.clone(),
            )),
        ));

        tasks.push((
            "checkpoint",
            tokio::spawn(checkpoint_loop(Arc::clone(self), self.cfg.persistence.checkpoint_interval, stop_rx)),
        ));

        *self.tasks.lock().await = tasks;
        info!("orchestrator started");
    }

    /// Idempotent: stopping twice, or stopping before starting, is a
    /// no-op. Shuts down dependency-first: wisdom synthesis, discussion
    /// and interest gating, the wake/rest machine (which folds in
    /// consolidation), the thought stream, the clock, the engine pool,
    /// then the event bus itself.
    pub async fn stop(self: &Arc<Self>) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.stop_tx.send(true);

        let tasks = {
            let mut tasks = self.tasks.lock().await;
            std::mem::take(&mut *tasks)
        };
        for (name, handle) in tasks {
            let abort = handle.abort_handle();
            match tokio::time::timeout(Duration::from_secs(5), handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("{name} task ended with an error: {err}"),
                Err(_) => {
                    warn!("{name} task did not stop within its shutdown budget, forcing it");
                    abort.abort();
                }
            }
        }

        self.engines.lock().await.shutdown().await;

        let subscriptions = {
            let mut subs = self.subscriptions.lock().await;
            std::mem::take(&mut *subs)
        };
        for token in subscriptions {
            self.bus.unsubscribe(token).await;
        }

        self.save_checkpoint().await;
        if let Some(handle) = self.session_handle.write().await.take() {
            let counters = *self.counters.read().await;
            let wisdom_delta = self.wisdom.wisdom_level().await - *self.wisdom_at_start.read().await;
            if let Err(err) = self
                .session_log
                .record_end(handle, counters.cycles, counters.thoughts_generated, wisdom_delta)
                .await
            {
                warn!("failed to record session log entry: {err}");
            }
        }
        info!("orchestrator stopped");
    }

    /// `Think(input) -> reply`: injects a perception thought for the
    /// input (so it joins the same buffer driving prompts and
    /// consolidation) and returns one generated reply.
    pub async fn think(&self, input: &str) -> String {
        let id = self.thought_counter.fetch_add(1, Ordering::SeqCst);
        let phase = self.clock.lock().await.state();
        let thought = Thought::new(id, input, ThoughtKind::Perception, 0.8, [], ThoughtSource::External, phase);
        self.stream.buffer().push(thought.clone()).await;
        self.bus.publish(EventPayload::ThoughtGenerated(thought)).await;

        let prompt = format!("Reflect on and respond to: {input}");
        match generate_with_retry(self.provider.as_ref(), &prompt, GenerateOpts::new(0.7, 200), &self.cfg.provider).await {
            Ok(text) => text,
            Err(err) => {
                warn!("think() generation failed: {err}");
                format!("I need a moment to gather my thoughts about {input}.")
            }
        }
    }

    /// `ProcessMessage(conversationId, sender, content) -> reply?`: gates
    /// engagement through the same decision table `ConsiderSkill` uses,
    /// then folds the turn into (or starts) that conversation's
    /// discussion.
    pub async fn process_message(&self, conversation_id: &str, sender: &str, content: &str) -> Option<String> {
        let state = *self.lifecycle.state_rx().borrow();
        let fatigue = self.lifecycle.fatigue().await;
        let wisdom_level = self.wisdom.wisdom_level().await;

        let interest_score = match self.discussions.get(conversation_id).await {
            Some(discussion) => discussion.interest_level,
            None => {
                self.interests.update_interest(conversation_id, content.len()).await;
                self.interests.score_of(conversation_id).await
            }
        };

        let decision = consider_skill(interest_score, state, fatigue, wisdom_level, &self.cfg.interest);
        if decision == EngagementDecision::Refuse {
            return None;
        }

        if self.discussions.get(conversation_id).await.is_none() {
            self.discussions
                .start(conversation_id.to_string(), conversation_id.to_string(), interest_score)
                .await;
        }

        let reply = self
            .discussions
            .respond(conversation_id, content, self.provider.as_ref(), &self.cfg.provider)
            .await;
        if reply.is_some() {
            info!(conversation_id, sender, "engaged with incoming message");
        }
        reply
    }

    pub async fn status(&self) -> Status {
        let vitals = self.lifecycle.vitals().await;
        let state = *self.lifecycle.state_rx().borrow();
        let uptime = self.started_at.read().await.map(|t| t.elapsed()).unwrap_or_default();
        let counters = *self.counters.read().await;
        Status {
            state,
            uptime,
            cycles: counters.cycles,
            thoughts: counters.thoughts_generated,
            wisdom_level: self.wisdom.wisdom_level().await,
            awareness: awareness(&vitals),
            load: vitals.cognitive_load,
            fatigue: vitals.fatigue,
            principles: self.wisdom.principles_snapshot().await.len(),
            active_conversations: self.discussions.active_count().await,
        }
    }

    pub async fn get_wisdom_principles(&self) -> Vec<dte_types::WisdomPrinciple> {
        self.wisdom.principles_snapshot().await
    }

    pub async fn get_self_model(&self) -> SelfModel {
        let principles = self.wisdom.principles_snapshot().await;
        let mut by_domain: HashMap<WisdomDomain, (f32, u32)> = HashMap::new();
        for principle in &principles {
            let entry = by_domain.entry(principle.domain).or_insert((0.0, 0));
            entry.0 += principle.depth * principle.confidence;
            entry.1 += 1;
        }
        let mut top_domains: Vec<(WisdomDomain, f32)> = by_domain
            .into_iter()
            .map(|(domain, (sum, count))| (domain, sum / count as f32))
            .collect();
        top_domains.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        top_domains.truncate(3);

        SelfModel {
            identity_signature: self.identity.signature.clone(),
            birth_time: self.identity.birth_time,
            core_values: self.identity.core_values.clone(),
            wisdom_level: self.wisdom.wisdom_level().await,
            top_domains,
            vitals: self.lifecycle.vitals().await,
        }
    }

    pub async fn get_metrics(&self) -> CoreMetrics {
        CoreMetrics {
            engines: self.engines.lock().await.metrics().await,
            bus_subscriber_count: self.bus.subscriber_count().await,
            interest_topic_count: self.interests.topic_count().await,
            active_discussions: self.discussions.active_count().await,
            pattern_count: self.consolidator.patterns_snapshot().await.len(),
        }
    }

    async fn save_checkpoint(&self) {
        let clock_state = *self.clock_tx.borrow();
        let checkpoint = Checkpoint {
            version: CHECKPOINT_VERSION,
            timestamp: Utc::now(),
            identity: self.identity.clone(),
            counters: *self.counters.read().await,
            thoughts: self.stream.buffer().recent(self.cfg.stream.buffer_cap).await,
            interests: self.interests.snapshot().await,
            goals: self.goals.read().await.clone(),
            principles: self.wisdom.principles_snapshot().await,
            vital_signs: self.lifecycle.vitals().await,
            clock: clock_state,
            wisdom_level: self.wisdom.wisdom_level().await,
        };
        if let Err(err) = self.checkpoint_store.save(&checkpoint).await {
            warn!("failed to save checkpoint: {err}");
        }
    }
}

async fn clock_loop(
    clock: Arc<Mutex<Clock>>,
    bus: EventBus,
    clock_tx: watch::Sender<dte_types::ClockState>,
    counters: Arc<RwLock<Counters>>,
    step_duration: Duration,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return;
                }
            }
            _ = tokio::time::sleep(step_duration) => {
                let result = {
                    let mut clock = clock.lock().await;
                    clock.advance_and_publish(&bus).await
                };
                let _ = clock_tx.send(result.state);
                if result.syncs.contains(&SyncKind::Cycle) {
                    counters.write().await.cycles += 1;
                }
            }
        }
    }
}

async fn discussion_loop(
    discussions: DiscussionTracker,
    interests: InterestMap,
    lifecycle: Arc<LifecycleController>,
    cfg: InterestConfig,
    provider_cfg: ProviderConfig,
    provider: Arc<dyn Provider>,
    bus: EventBus,
    mut stop: watch::Receiver<bool>,
) {
    let tick_period = Duration::from_secs(1);
    let mut since_initiation = Duration::ZERO;
    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return;
                }
            }
            _ = tokio::time::sleep(tick_period) => {
                let fatigue = lifecycle.fatigue().await;
                discussions.tick(&cfg, fatigue).await;

                since_initiation += tick_period;
                if since_initiation >= cfg.initiation_interval {
                    since_initiation = Duration::ZERO;
                    maybe_initiate(&discussions, &interests, &cfg, fatigue, provider.as_ref(), &provider_cfg, &bus).await;
                }
            }
        }
    }
}

async fn interest_decay_loop(interests: InterestMap, mut stop: watch::Receiver<bool>) {
    let period = Duration::from_secs(24 * 3600);
    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return;
                }
            }
            _ = tokio::time::sleep(period) => {
                interests.decay_all(1.0).await;
            }
        }
    }
}

async fn wisdom_loop(
    wisdom: Arc<WisdomSynthesizer>,
    context: Arc<LiveContext>,
    lifecycle: Arc<LifecycleController>,
    cfg: WisdomConfig,
    mut stop: watch::Receiver<bool>,
) {
    let tick_period = Duration::from_secs(5);
    let mut last_synthesis = Instant::now();
    let mut last_evolution = Instant::now();
    let mut last_application = Instant::now();
    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return;
                }
            }
            _ = tokio::time::sleep(tick_period) => {
                if last_synthesis.elapsed() >= cfg.synthesis_tick {
                    wisdom.on_synthesis_tick().await;
                    last_synthesis = Instant::now();
                }
                if last_evolution.elapsed() >= cfg.evolution_tick {
                    wisdom.on_evolution_tick().await;
                    last_evolution = Instant::now();
                }
                let awake = *lifecycle.state_rx().borrow() == dte_types::LifecycleState::Awake;
                if awake && last_application.elapsed() >= cfg.application_tick {
                    let current_context = format!("{} | {}", context.current_focus().await, context.current_mood().await);
                    wisdom.on_application_tick(&current_context).await;
                    last_application = Instant::now();
                }
            }
        }
    }
}

async fn checkpoint_loop(orchestrator: Arc<Orchestrator>, interval: Duration, mut stop: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return;
                }
            }
            _ = tokio::time::sleep(interval) => {
                orchestrator.save_checkpoint().await;
            }
        }
    }
}
