//! The Action Decider: turns a perceived moment into an [`ActionRequest`].
//!
//! Implements the five-step contract: enumerate available actions,
//! render a prompt, call the LLM client, parse the `ACTION:` line back
//! out, and resolve its tokens into a concrete request. Never fails
//! outward: every dead end (no LLM configured, empty response, an
//! unrecognized verb) resolves to [`ActionRequest::wait`].

use village_llm::{build_prompt, parse_action_line, LlmClient, LlmError, PromptContext};
use village_types::{Agent, ActionParameters, ActionRequest, ActionType, AgentId, Goal, Location, Memory, Perception};
use village_world::{WorldError, WorldStore};

use crate::perception::perceive;

/// Errors surfaced while deciding an agent's action.
///
/// Both variants are rare: `World` means the agent vanished between the
/// scheduler's own lookup and this call; `Prompt` means the compiled-in
/// prompt templates failed to render, which would be a programming error
/// rather than a runtime condition.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The world store could not resolve the agent or its location.
    #[error("world error while deciding: {0}")]
    World(#[from] WorldError),
    /// Prompt rendering failed.
    #[error("prompt error while deciding: {0}")]
    Prompt(#[from] LlmError),
}

/// Prepositions the menu text uses for readability that the model
/// sometimes echoes back; stripped when resolving a verb's arguments.
const ARG_STOPWORDS: [&str; 4] = ["to", "with", "about", "at"];

/// The Action Decider: wraps an [`LlmClient`] with the prompt-and-parse
/// pipeline spec.md §4.8 describes.
pub struct ActionDecider {
    llm: LlmClient,
    use_llm: bool,
}

impl ActionDecider {
    /// Build a decider over the given client. `use_llm = false` makes
    /// every decision `wait` without ever calling `llm`.
    #[must_use]
    pub const fn new(llm: LlmClient, use_llm: bool) -> Self {
        Self { llm, use_llm }
    }

    /// The wrapped client, for callers that want to inspect usage after
    /// a run.
    #[must_use]
    pub const fn llm(&self) -> &LlmClient {
        &self.llm
    }

    /// Decide one agent's action for this tick.
    ///
    /// # Errors
    ///
    /// See [`DecisionError`].
    pub async fn decide(
        &self,
        agent_id: &AgentId,
        world: &WorldStore,
        memories: &[Memory],
        goals: &[Goal],
    ) -> Result<ActionRequest, DecisionError> {
        if !self.use_llm {
            return Ok(ActionRequest::wait(agent_id.clone()));
        }

        let agent = world.agent(agent_id).await?;
        let perception = perceive(agent_id, world).await?;
        let location = world.location(&agent.location_id).await?;

        let available = available_actions(&perception, &location, &agent);
        if available.is_empty() {
            return Ok(ActionRequest::wait(agent_id.clone()));
        }

        let ctx = PromptContext {
            agent_name: agent.display_name.clone(),
            personality_lines: personality_lines(&agent),
            mood_line: format!("happiness {}/10, energy {}/10", agent.mood.happiness, agent.mood.energy),
            needs_line: format!(
                "hunger {:.1}, energy {:.1}, social {:.1}",
                agent.needs.hunger, agent.needs.energy, agent.needs.social
            ),
            location_line: format!("{}: {}", location.name, location.description),
            memories: memory_lines(memories),
            goals: goal_lines(goals),
            available_actions: available,
        };
        let rendered = build_prompt(&ctx)?;

        let tick = world.read().await.clock.current_tick;
        let response = self
            .llm
            .complete_for(
                &rendered.user,
                Some(&rendered.system),
                100,
                0.7,
                true,
                tick,
                Some(agent_id.to_string()),
                Some("decide".to_owned()),
            )
            .await;

        let Some(decoded) = parse_action_line(&response.content) else {
            return Ok(ActionRequest::wait(agent_id.clone()));
        };

        let roster = agent_roster(world).await;
        Ok(build_request(agent_id, &decoded.verb, &decoded.args, &roster))
    }
}

fn personality_lines(agent: &Agent) -> Vec<String> {
    let p = &agent.personality;
    vec![
        format!("curiosity: {}/10", p.curiosity),
        format!("empathy: {}/10", p.empathy),
        format!("ambition: {}/10", p.ambition),
        format!("discretion: {}/10", p.discretion),
        format!("energy: {}/10", p.energy),
        format!("courage: {}/10", p.courage),
        format!("charm: {}/10", p.charm),
        format!("perception: {}/10", p.perception),
    ]
}

fn memory_lines(memories: &[Memory]) -> Vec<String> {
    memories.iter().map(|m| m.content.clone()).collect()
}

fn goal_lines(goals: &[Goal]) -> Vec<String> {
    goals
        .iter()
        .map(|g| format!("{} (priority {})", g.description, g.priority))
        .collect()
}

/// Per spec.md §4.8 step 1: at least wait, move to each connected
/// location, greet/talk each co-located agent, examine/take each local
/// object, and drop each inventory-eligible item.
///
/// `Perception` omits the location's connection graph by design (§4.3
/// lists only location name, co-located agents, and objects), so the
/// Decider reads `connections` from the location directly.
fn available_actions(perception: &Perception, location: &Location, agent: &Agent) -> Vec<String> {
    let mut actions = vec!["wait".to_owned()];

    for connection in &location.connections {
        actions.push(format!("move to {connection}"));
    }
    for co_located in &perception.co_located_agents {
        actions.push(format!("greet {co_located}"));
        actions.push(format!("talk to {co_located}"));
    }
    for object in &perception.objects {
        actions.push(format!("examine {object}"));
        actions.push(format!("take {object}"));
    }
    for item in &agent.inventory {
        actions.push(format!("drop {item}"));
    }

    actions
}

/// Snapshot of every agent's id and display name, used to resolve a
/// name token the model echoed back into a stable [`AgentId`].
async fn agent_roster(world: &WorldStore) -> Vec<(AgentId, String)> {
    world
        .read()
        .await
        .agents
        .values()
        .map(|a| (a.id.clone(), a.display_name.clone()))
        .collect()
}

fn resolve_agent_token(token: &str, roster: &[(AgentId, String)]) -> AgentId {
    roster
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(token))
        .map_or_else(|| AgentId::from(token), |(id, _)| id.clone())
}

/// Indices of `args` that are not menu-readability prepositions (`to`,
/// `with`, `about`, `at`), in original order.
fn significant_indices(args: &[String]) -> Vec<usize> {
    args.iter()
        .enumerate()
        .filter(|(_, t)| !ARG_STOPWORDS.contains(&t.to_lowercase().as_str()))
        .map(|(idx, _)| idx)
        .collect()
}

fn build_request(agent_id: &AgentId, verb: &str, args: &[String], roster: &[(AgentId, String)]) -> ActionRequest {
    let significant = significant_indices(args);
    let first = significant.first().map(|&idx| args[idx].as_str());
    let second = significant.get(1).map(|&idx| args[idx].as_str());
    // The free-text message for talk/ask/tell keeps everything after the
    // target token verbatim (stopwords like "about" included), since
    // that is natural phrasing rather than a second target to resolve.
    let message = significant
        .first()
        .and_then(|&idx| args.get(idx + 1..))
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.join(" "));

    let (action_type, parameters) = match verb {
        "move" => simple_target(ActionType::Move, first),
        "examine" => simple_target(ActionType::Examine, first),
        "take" => simple_target(ActionType::Take, first),
        "drop" => simple_target(ActionType::Drop, first),
        "use" => simple_target(ActionType::Use, first),
        "work" => simple_target(ActionType::Work, first),
        "investigate" => simple_target(ActionType::Investigate, first),
        "sleep" => (ActionType::Sleep, ActionParameters::default()),
        "observe" => (ActionType::Observe, ActionParameters::default()),
        "scheme" => (ActionType::Scheme, ActionParameters::default()),
        "confess" => (ActionType::Confess, ActionParameters::default()),
        "greet" => agent_target(ActionType::Greet, first, roster, None),
        "talk" => agent_target(ActionType::Talk, first, roster, message.clone()),
        "ask" => agent_target(ActionType::Ask, first, roster, message.clone()),
        "tell" => agent_target(ActionType::Tell, first, roster, message.clone()),
        "help" => agent_target(ActionType::Help, first, roster, None),
        "confront" => agent_target(ActionType::Confront, first, roster, None),
        "avoid" => agent_target(ActionType::Avoid, first, roster, None),
        "give" => (
            ActionType::Give,
            ActionParameters {
                target: first.map(|t| resolve_agent_token(t, roster).into_inner()),
                secondary: second.map(ToOwned::to_owned),
                message: None,
            },
        ),
        "gossip" => {
            let rumor = significant
                .get(1)
                .and_then(|&idx| args.get(idx + 1..))
                .filter(|rest| !rest.is_empty())
                .map(|rest| rest.join(" "));
            (
                ActionType::Gossip,
                ActionParameters {
                    target: first.map(|t| resolve_agent_token(t, roster).into_inner()),
                    secondary: second.map(|t| resolve_agent_token(t, roster).into_inner()),
                    message: rumor,
                },
            )
        }
        _ => return ActionRequest::wait(agent_id.clone()),
    };

    ActionRequest {
        agent_id: agent_id.clone(),
        action_type,
        parameters,
    }
}

fn simple_target(action_type: ActionType, target: Option<&str>) -> (ActionType, ActionParameters) {
    (
        action_type,
        ActionParameters {
            target: target.map(ToOwned::to_owned),
            secondary: None,
            message: None,
        },
    )
}

fn agent_target(
    action_type: ActionType,
    target: Option<&str>,
    roster: &[(AgentId, String)],
    message: Option<String>,
) -> (ActionType, ActionParameters) {
    (
        action_type,
        ActionParameters {
            target: target.map(|t| resolve_agent_token(t, roster).into_inner()),
            secondary: None,
            message,
        },
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use village_types::{AgentActivityState, Mood, Needs, Personality};
    use village_world::WorldState;

    use super::*;

    const NEUTRAL_PERSONALITY: Personality = Personality {
        curiosity: 5,
        empathy: 5,
        ambition: 5,
        discretion: 5,
        energy: 5,
        courage: 5,
        charm: 5,
        perception: 5,
    };

    fn make_agent(id: &str, name: &str, location: &str) -> Agent {
        Agent {
            id: AgentId::from(id),
            display_name: name.to_owned(),
            personality: NEUTRAL_PERSONALITY,
            narrative_prompt: String::new(),
            location_id: village_types::LocationId::from(location),
            inventory: BTreeSet::new(),
            mood: Mood::neutral(),
            needs: Needs::neutral(),
            state: AgentActivityState::Idle,
        }
    }

    fn make_location(id: &str, connections: &[&str], objects: &[&str]) -> Location {
        Location {
            id: village_types::LocationId::from(id),
            name: id.to_owned(),
            description: "a quiet place".to_owned(),
            connections: connections.iter().map(|c| village_types::LocationId::from(*c)).collect(),
            objects: objects.iter().map(|o| (*o).to_owned()).collect(),
            capacity: 10,
        }
    }

    async fn seeded_world() -> WorldStore {
        let world = WorldStore::new(WorldState::default());
        let _ = world.seed_location(make_location("bakery", &["town_square"], &["oven"])).await;
        let _ = world.seed_location(make_location("town_square", &["bakery"], &[])).await;
        let _ = world.seed_agent(make_agent("agnes", "Agnes", "bakery")).await;
        let _ = world.seed_agent(make_agent("bob", "Bob", "town_square")).await;
        world
    }

    #[tokio::test]
    async fn use_llm_false_always_waits() {
        let decider = ActionDecider::new(LlmClient::mock(vec!["ACTION: move town_square".to_owned()]), false);
        let world = seeded_world().await;
        let request = decider
            .decide(&AgentId::from("agnes"), &world, &[], &[])
            .await
            .expect("decide succeeds");
        assert_eq!(request.action_type, ActionType::Wait);
    }

    #[tokio::test]
    async fn mock_move_resolves_to_location_token() {
        let decider = ActionDecider::new(LlmClient::mock(vec!["ACTION: move town_square".to_owned()]), true);
        let world = seeded_world().await;
        let request = decider
            .decide(&AgentId::from("agnes"), &world, &[], &[])
            .await
            .expect("decide succeeds");
        assert_eq!(request.action_type, ActionType::Move);
        assert_eq!(request.parameters.target.as_deref(), Some("town_square"));
    }

    #[tokio::test]
    async fn mock_talk_resolves_display_name_to_agent_id() {
        let decider = ActionDecider::new(
            LlmClient::mock(vec!["ACTION: talk to Bob about the harvest".to_owned()]),
            true,
        );
        let world = seeded_world().await;
        let _ = world
            .move_agent(&AgentId::from("agnes"), &village_types::LocationId::from("town_square"))
            .await;
        let request = decider
            .decide(&AgentId::from("agnes"), &world, &[], &[])
            .await
            .expect("decide succeeds");
        assert_eq!(request.action_type, ActionType::Talk);
        assert_eq!(request.parameters.target.as_deref(), Some("bob"));
        assert_eq!(request.parameters.message.as_deref(), Some("about the harvest"));
    }

    #[tokio::test]
    async fn unrecognized_verb_falls_back_to_wait() {
        let decider = ActionDecider::new(LlmClient::mock(vec!["ACTION: teleport moon".to_owned()]), true);
        let world = seeded_world().await;
        let request = decider
            .decide(&AgentId::from("agnes"), &world, &[], &[])
            .await
            .expect("decide succeeds");
        assert_eq!(request.action_type, ActionType::Wait);
    }

    #[tokio::test]
    async fn empty_response_falls_back_to_wait() {
        let decider = ActionDecider::new(LlmClient::mock(vec![String::new()]), true);
        let world = seeded_world().await;
        let request = decider
            .decide(&AgentId::from("agnes"), &world, &[], &[])
            .await
            .expect("decide succeeds");
        assert_eq!(request.action_type, ActionType::Wait);
    }
}
