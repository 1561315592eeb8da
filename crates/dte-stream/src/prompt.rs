//! Templated prompt construction for one generated thought.

use dte_types::{Thought, ThoughtKind};

use crate::gaps::KnowledgeGap;

pub struct PromptContext {
    pub recent_thoughts: Vec<Thought>,
    pub gaps: Vec<KnowledgeGap>,
    pub interests: Vec<String>,
    pub goals: Vec<String>,
    pub focus: String,
    pub mood: String,
}

pub fn build_prompt(kind: ThoughtKind, ctx: &PromptContext) -> String {
    let recent = ctx
        .recent_thoughts
        .iter()
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join(" | ");
    let gaps = ctx
        .gaps
        .iter()
        .map(|g| g.topic.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let interests = ctx.interests.join(", ");
    let goals = ctx.goals.join(", ");

    format!(
        "Generate a {kind:?} thought.\n\
         Recent thoughts: {recent}\n\
         Knowledge gaps: {gaps}\n\
         Interests: {interests}\n\
         Active goals: {goals}\n\
         Current focus: {focus}\n\
         Current mood: {mood}",
        focus = ctx.focus,
        mood = ctx.mood,
    )
}

pub fn fallback_content(focus: &str) -> String {
    format!("I wonder about {focus}…")
}

pub const FALLBACK_IMPORTANCE: f32 = 0.30;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_all_context_sections() {
        let ctx = PromptContext {
            recent_thoughts: Vec::new(),
            gaps: Vec::new(),
            interests: vec!["rust".to_string()],
            goals: vec!["ship the scheduler".to_string()],
            focus: "the build".to_string(),
            mood: "steady".to_string(),
        };
        let prompt = build_prompt(ThoughtKind::Reflection, &ctx);
        assert!(prompt.contains("rust"));
        assert!(prompt.contains("ship the scheduler"));
        assert!(prompt.contains("the build"));
        assert!(prompt.contains("steady"));
    }

    #[test]
    fn fallback_mentions_focus() {
        assert_eq!(fallback_content("the horizon"), "I wonder about the horizon…");
    }
}
