//! The narrow view of the rest of the system a thought needs to build
//! its prompt: current interests, goals, focus and mood. Concrete
//! sourcing (interest scores, goal tracking, mood derivation) lives in
//! whichever module owns that state; this crate only consumes it.

use async_trait::async_trait;

#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn top_interests(&self, n: usize) -> Vec<String>;
    async fn active_goals(&self) -> Vec<String>;
    async fn current_focus(&self) -> String;
    async fn current_mood(&self) -> String;
}

/// A fixed context, useful for tests and for running the stream before
/// the rest of the system is wired in.
pub struct StaticContext {
    pub interests: Vec<String>,
    pub goals: Vec<String>,
    pub focus: String,
    pub mood: String,
}

impl Default for StaticContext {
    fn default() -> Self {
        Self {
            interests: Vec::new(),
            goals: Vec::new(),
            focus: "the present moment".to_string(),
            mood: "curious".to_string(),
        }
    }
}

#[async_trait]
impl ContextSource for StaticContext {
    async fn top_interests(&self, n: usize) -> Vec<String> {
        self.interests.iter().take(n).cloned().collect()
    }

    async fn active_goals(&self) -> Vec<String> {
        self.goals.clone()
    }

    async fn current_focus(&self) -> String {
        self.focus.clone()
    }

    async fn current_mood(&self) -> String {
        self.mood.clone()
    }
}
