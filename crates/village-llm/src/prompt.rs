//! Prompt construction via `minijinja`.
//!
//! The teacher loads agent prompt templates from disk so operators can
//! retune wording without recompiling. This simulation's prompt shape is
//! fixed by spec.md §4.8 step 3 (personality, mood, needs, location,
//! memories, goals, available actions in a canonical line-oriented
//! format) and isn't meant to be operator-tunable, so the templates are
//! compiled into the binary as string constants instead of loaded from a
//! directory -- same engine, same rendering idiom, no filesystem
//! dependency.

use minijinja::{context, Environment};

use crate::error::LlmError;

const SYSTEM_TEMPLATE: &str = "\
You are {{ agent_name }}, a resident of a small simulated village. You \
perceive your surroundings and decide on one action per turn. Respond \
with a short first-person justification followed by exactly one line in \
the form `ACTION: <verb> [args]` naming the action you choose from the \
list given to you. Never invent an action not on that list.";

const USER_TEMPLATE: &str = "\
## Personality
{% for line in personality_lines %}{{ line }}
{% endfor %}
## Mood
{{ mood_line }}

## Needs
{{ needs_line }}

## Location
{{ location_line }}

## Recent memories
{% for m in memories %}- {{ m }}
{% endfor %}
## Active goals
{% for g in goals %}- {{ g }}
{% endfor %}
## Available actions
{% for a in available_actions %}- {{ a }}
{% endfor %}
Choose one action from the list above.";

/// Everything the Action Decider assembles about one agent's turn,
/// already rendered into display strings. Keeping this crate agnostic of
/// `village_types` avoids a dependency cycle; `village-core` is
/// responsible for turning `Agent`/`Needs`/`Goal`/`Memory` into these
/// plain strings before calling [`build_prompt`].
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// The acting agent's display name.
    pub agent_name: String,
    /// One line per personality trait (e.g. `"curiosity: 7/10"`).
    pub personality_lines: Vec<String>,
    /// One line summarizing current mood.
    pub mood_line: String,
    /// One line summarizing current needs.
    pub needs_line: String,
    /// One line describing the current location.
    pub location_line: String,
    /// Recent memories, working tier first then recent tier, most
    /// recent last.
    pub memories: Vec<String>,
    /// Top active goals, highest priority first.
    pub goals: Vec<String>,
    /// Available actions in canonical line-oriented format (e.g.
    /// `"move to bakery"`, `"talk to bob"`).
    pub available_actions: Vec<String>,
}

/// The complete rendered prompt ready to send to an LLM backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the agent's reality and response format.
    pub system: String,
    /// User message containing personality, perception, memory, goals,
    /// and the available-actions menu.
    pub user: String,
}

/// Render a [`PromptContext`] into a [`RenderedPrompt`].
pub fn build_prompt(ctx: &PromptContext) -> Result<RenderedPrompt, LlmError> {
    let mut env = Environment::new();
    env.add_template("system", SYSTEM_TEMPLATE)
        .map_err(|e| LlmError::Config(format!("invalid system template: {e}")))?;
    env.add_template("user", USER_TEMPLATE)
        .map_err(|e| LlmError::Config(format!("invalid user template: {e}")))?;

    let system = env
        .get_template("system")
        .and_then(|t| t.render(context! { agent_name => ctx.agent_name }))
        .map_err(|e| LlmError::Config(format!("system render failed: {e}")))?;

    let user = env
        .get_template("user")
        .and_then(|t| {
            t.render(context! {
                personality_lines => ctx.personality_lines,
                mood_line => ctx.mood_line,
                needs_line => ctx.needs_line,
                location_line => ctx.location_line,
                memories => ctx.memories,
                goals => ctx.goals,
                available_actions => ctx.available_actions,
            })
        })
        .map_err(|e| LlmError::Config(format!("user render failed: {e}")))?;

    Ok(RenderedPrompt { system, user })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> PromptContext {
        PromptContext {
            agent_name: "Agnes".to_owned(),
            personality_lines: vec!["curiosity: 7/10".to_owned()],
            mood_line: "happiness 6/10, energy 5/10".to_owned(),
            needs_line: "hunger 3.0, energy 7.0, social 4.0".to_owned(),
            location_line: "Bakery: a warm room smelling of fresh bread".to_owned(),
            memories: vec!["Shared bread with Bob yesterday".to_owned()],
            goals: vec!["Help Bob (priority 6)".to_owned()],
            available_actions: vec!["wait".to_owned(), "move to town_square".to_owned()],
        }
    }

    #[test]
    fn render_includes_agent_name_and_actions() {
        let rendered = build_prompt(&sample_context()).expect("render");
        assert!(rendered.system.contains("Agnes"));
        assert!(rendered.user.contains("move to town_square"));
        assert!(rendered.user.contains("Shared bread with Bob"));
    }

    #[test]
    fn render_with_no_memories_or_goals_still_succeeds() {
        let mut ctx = sample_context();
        ctx.memories.clear();
        ctx.goals.clear();
        let rendered = build_prompt(&ctx).expect("render");
        assert!(rendered.user.contains("Available actions"));
    }
}
