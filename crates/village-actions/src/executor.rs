//! The Action Executor: precondition validation and effect application
//! for the closed 21-variant [`ActionType`] catalog.
//!
//! `execute` never mutates world state on a rejected action: every
//! precondition is checked before any mutator runs, mirroring the
//! "check first, mutate once" shape of `village-world`'s own mutators.
//! On success it additionally returns the single [`Event`] the action
//! produces, per spec.md §4.4 ("every execution yields exactly one
//! event of the right `EventType`").

use village_memory::significance::{compute_significance, MemoryEventCategory, SignificanceInput};
use village_types::{
    ActionRequest, ActionResult, ActionType, AgentId, Event, EventType, LocationId,
    RejectionReason,
};
use village_world::{NeedKind, WorldStore};

use crate::error::ActionError;

/// Execute one [`ActionRequest`] against `world`.
///
/// Returns `Ok((result, event))`: `event` is `Some` exactly when `result`
/// is a success. Returns `Err` only for store-level invariant
/// violations (spec.md §7 kind 4) — an agent disappearing mid-tick, or a
/// mutator failing after its precondition already passed.
pub async fn execute(
    request: &ActionRequest,
    world: &WorldStore,
) -> Result<(ActionResult, Option<Event>), ActionError> {
    let actor = world
        .agent(&request.agent_id)
        .await
        .map_err(|_| ActionError::ActorMissing(request.agent_id.clone()))?;

    let sleeping = actor.is_sleeping();
    let target_token = request.parameters.target.as_deref();

    // Every non-`sleep` action requires the actor to be awake.
    if sleeping && request.action_type != ActionType::Sleep {
        return Ok((rejected(RejectionReason::AgentAsleep), None));
    }

    match request.action_type {
        ActionType::Move => {
            let Some(dest) = target_token else {
                return Ok((rejected(RejectionReason::MalformedArguments), None));
            };
            let destination = LocationId::new(dest);
            match world.move_agent(&actor.id, &destination).await {
                Ok(()) => {
                    let narration = format!("{} moves to {destination}.", actor.display_name);
                    let event = build_event(
                        EventType::Movement,
                        &narration,
                        world.read().await.clock.current_tick,
                        vec![actor.id.clone()],
                        Some(destination),
                        MemoryEventCategory::Routine,
                        false,
                    );
                    Ok((success(narration), Some(event)))
                }
                Err(village_world::WorldError::LocationAtCapacity { .. }) => {
                    Ok((rejected(RejectionReason::LocationFull), None))
                }
                Err(_) => Ok((rejected(RejectionReason::NoSuchConnection), None)),
            }
        }

        ActionType::Use => {
            let Some(item) = target_token else {
                return Ok((rejected(RejectionReason::MalformedArguments), None));
            };
            if !actor.inventory.contains(item) {
                return Ok((rejected(RejectionReason::ItemNotHeld), None));
            }
            world.remove_item(&actor.id, item).await?;
            let narration = format!("{} uses the {item}.", actor.display_name);
            let event = routine_event(EventType::Action, &narration, world, &actor.id, Some(actor.location_id.clone())).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Examine => {
            let Some(obj) = target_token else {
                return Ok((rejected(RejectionReason::MalformedArguments), None));
            };
            let location = world.location(&actor.location_id).await?;
            if !location.objects.contains(obj) {
                return Ok((rejected(RejectionReason::ObjectNotFound), None));
            }
            let narration = format!("{} examines the {obj}.", actor.display_name);
            let event = routine_event(EventType::Action, &narration, world, &actor.id, Some(actor.location_id.clone())).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Take => {
            let Some(item) = target_token else {
                return Ok((rejected(RejectionReason::MalformedArguments), None));
            };
            let taken = world.remove_location_object(&actor.location_id, item).await?;
            if !taken {
                return Ok((rejected(RejectionReason::ObjectNotFound), None));
            }
            world.add_item(&actor.id, item).await?;
            let narration = format!("{} takes the {item}.", actor.display_name);
            let event = routine_event(EventType::Action, &narration, world, &actor.id, Some(actor.location_id.clone())).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Drop => {
            let Some(item) = target_token else {
                return Ok((rejected(RejectionReason::MalformedArguments), None));
            };
            let removed = world.remove_item(&actor.id, item).await?;
            if !removed {
                return Ok((rejected(RejectionReason::ItemNotHeld), None));
            }
            world.add_location_object(&actor.location_id, item).await?;
            let narration = format!("{} drops the {item}.", actor.display_name);
            let event = routine_event(EventType::Action, &narration, world, &actor.id, Some(actor.location_id.clone())).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Wait | ActionType::Observe => {
            let narration = format!("{} waits and observes.", actor.display_name);
            let event = routine_event(EventType::Action, &narration, world, &actor.id, Some(actor.location_id.clone())).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Sleep => {
            world.set_state(&actor.id, village_types::AgentActivityState::Sleeping).await?;
            let narration = format!("{} goes to sleep.", actor.display_name);
            let event = routine_event(EventType::Action, &narration, world, &actor.id, Some(actor.location_id.clone())).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Work => {
            world.adjust_need(&actor.id, NeedKind::Hunger, 0.5).await?;
            world.adjust_need(&actor.id, NeedKind::Energy, -1.0).await?;
            let kind = target_token.unwrap_or("a trade");
            let narration = format!("{} puts in a bout of work at {kind}.", actor.display_name);
            let event = routine_event(EventType::Action, &narration, world, &actor.id, Some(actor.location_id.clone())).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Greet => {
            let target = match resolve_co_located_target(&actor, target_token, world).await? {
                Ok(target) => target,
                Err(reason) => return Ok((rejected(reason), None)),
            };
            world.upsert_relationship(&actor.id, &target, 1, Some("greeted")).await?;
            let narration = format!("{} greets {target}.", actor.display_name);
            let event = social_event(EventType::Dialogue, &narration, world, &actor.id, &target, MemoryEventCategory::Dialogue).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Talk => {
            let target = match resolve_co_located_target(&actor, target_token, world).await? {
                Ok(target) => target,
                Err(reason) => return Ok((rejected(reason), None)),
            };
            world.adjust_need(&actor.id, NeedKind::Social, 1.0).await?;
            world.adjust_need(&target, NeedKind::Social, 1.0).await?;
            world.upsert_relationship(&actor.id, &target, 1, request.parameters.message.as_deref()).await?;
            world.upsert_relationship(&target, &actor.id, 1, request.parameters.message.as_deref()).await?;
            let topic = request.parameters.message.clone().unwrap_or_default();
            let narration = format!("{} talks with {target} about {topic}.", actor.display_name);
            let event = social_event(EventType::Dialogue, &narration, world, &actor.id, &target, MemoryEventCategory::Dialogue).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Ask => {
            let target = match resolve_co_located_target(&actor, target_token, world).await? {
                Ok(target) => target,
                Err(reason) => return Ok((rejected(reason), None)),
            };
            world.upsert_relationship(&actor.id, &target, 0, None).await?;
            let narration = format!("{} asks {target} a question.", actor.display_name);
            let event = social_event(EventType::Dialogue, &narration, world, &actor.id, &target, MemoryEventCategory::Dialogue).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Tell => {
            let target = match resolve_co_located_target(&actor, target_token, world).await? {
                Ok(target) => target,
                Err(reason) => return Ok((rejected(reason), None)),
            };
            world.upsert_relationship(&actor.id, &target, 1, request.parameters.message.as_deref()).await?;
            let narration = format!("{} tells {target} something.", actor.display_name);
            let event = social_event(EventType::Dialogue, &narration, world, &actor.id, &target, MemoryEventCategory::Dialogue).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Give => {
            let target = match resolve_co_located_target(&actor, target_token, world).await? {
                Ok(target) => target,
                Err(reason) => return Ok((rejected(reason), None)),
            };
            let Some(item) = request.parameters.secondary.as_deref() else {
                return Ok((rejected(RejectionReason::MalformedArguments), None));
            };
            let removed = world.remove_item(&actor.id, item).await?;
            if !removed {
                return Ok((rejected(RejectionReason::ItemNotHeld), None));
            }
            world.add_item(&target, item).await?;
            world.upsert_relationship(&actor.id, &target, 2, Some("gave a gift")).await?;
            world.upsert_relationship(&target, &actor.id, 2, Some("received a gift")).await?;
            let narration = format!("{} gives {item} to {target}.", actor.display_name);
            let event = social_event(EventType::Action, &narration, world, &actor.id, &target, MemoryEventCategory::Routine).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Help => {
            let target = match resolve_co_located_target(&actor, target_token, world).await? {
                Ok(target) => target,
                Err(reason) => return Ok((rejected(reason), None)),
            };
            world.upsert_relationship(&target, &actor.id, 2, Some("was helped")).await?;
            world.upsert_relationship(&actor.id, &target, 1, Some("helped a neighbor")).await?;
            let narration = format!("{} helps {target}.", actor.display_name);
            let event = social_event(EventType::Action, &narration, world, &actor.id, &target, MemoryEventCategory::Routine).await;
            Ok((success(narration), Some(event)))
        }

        ActionType::Confront => {
            let Some(target_raw) = target_token else {
                return Ok((rejected(RejectionReason::MalformedArguments), None));
            };
            let target = AgentId::new(target_raw);
            if target == actor.id {
                return Ok((rejected(RejectionReason::CannotTargetSelf), None));
            }
            if !co_located(&actor.id, &target, world).await? {
                return Ok((rejected(RejectionReason::AgentNotFound), None));
            }
            world.upsert_relationship(&target, &actor.id, -2, Some("was confronted")).await?;
            world.upsert_relationship(&actor.id, &target, -1, Some("confronted someone")).await?;
            let narration = format!("{} confronts {target}.", actor.display_name);
            let event = build_event(
                EventType::Action,
                &narration,
                world.read().await.clock.current_tick,
                vec![actor.id.clone(), target],
                Some(actor.location_id.clone()),
                MemoryEventCategory::Conflict,
                false,
            );
            Ok((success(narration), Some(event)))
        }

        ActionType::Avoid => {
            let Some(target_raw) = target_token else {
                return Ok((rejected(RejectionReason::MalformedArguments), None));
            };
            let target = AgentId::new(target_raw);
            world.upsert_relationship(&actor.id, &target, -1, Some("avoided")).await?;
            let narration = format!("{} avoids {target}.", actor.display_name);
            let event = build_event(
                EventType::Action,
                &narration,
                world.read().await.clock.current_tick,
                vec![actor.id.clone(), target],
                Some(actor.location_id.clone()),
                MemoryEventCategory::Routine,
                false,
            );
            Ok((success(narration), Some(event)))
        }

        ActionType::Investigate => {
            let narration = format!(
                "{} investigates {}.",
                actor.display_name,
                target_token.unwrap_or("a rumor")
            );
            let event = build_event(
                EventType::Discovery,
                &narration,
                world.read().await.clock.current_tick,
                vec![actor.id.clone()],
                Some(actor.location_id.clone()),
                MemoryEventCategory::Discovery,
                false,
            );
            Ok((success(narration), Some(event)))
        }

        ActionType::Gossip => {
            let Some(target_raw) = target_token else {
                return Ok((rejected(RejectionReason::MalformedArguments), None));
            };
            let target = AgentId::new(target_raw);
            let Some(subject_raw) = request.parameters.secondary.as_deref() else {
                return Ok((rejected(RejectionReason::MalformedArguments), None));
            };
            let subject = AgentId::new(subject_raw);
            if subject == actor.id || subject == target {
                return Ok((rejected(RejectionReason::CannotTargetSelf), None));
            }
            if !co_located(&actor.id, &target, world).await? {
                return Ok((rejected(RejectionReason::AgentNotFound), None));
            }
            world.upsert_relationship(&actor.id, &target, 1, request.parameters.message.as_deref()).await?;
            world.upsert_relationship(&actor.id, &subject, -1, Some("was gossiped about")).await?;
            let narration = format!("{} gossips to {target} about {subject}.", actor.display_name);
            let event = build_event(
                EventType::Dialogue,
                &narration,
                world.read().await.clock.current_tick,
                vec![actor.id.clone(), target, subject],
                Some(actor.location_id.clone()),
                MemoryEventCategory::Conflict,
                false,
            );
            Ok((success(narration), Some(event)))
        }

        ActionType::Scheme => {
            let narration = format!("{} schemes quietly.", actor.display_name);
            let event = build_event(
                EventType::Action,
                &narration,
                world.read().await.clock.current_tick,
                vec![actor.id.clone()],
                Some(actor.location_id.clone()),
                MemoryEventCategory::Conflict,
                false,
            );
            Ok((success(narration), Some(event)))
        }

        ActionType::Confess => {
            let narration = format!("{} confesses.", actor.display_name);
            let event = build_event(
                EventType::Action,
                &narration,
                world.read().await.clock.current_tick,
                vec![actor.id.clone()],
                Some(actor.location_id.clone()),
                MemoryEventCategory::Conflict,
                false,
            );
            Ok((success(narration), Some(event)))
        }
    }
}

fn success(narration: String) -> ActionResult {
    ActionResult::Success { narration }
}

fn rejected(reason: RejectionReason) -> ActionResult {
    ActionResult::Rejected { reason }
}

/// Parse `target_token` as an [`AgentId`], verify it is co-located with
/// `actor` and distinct from it. `Ok(Ok(target))` on success; `Ok(Err(reason))`
/// carries the specific rejection when a precondition fails.
async fn resolve_co_located_target(
    actor: &village_types::Agent,
    target_token: Option<&str>,
    world: &WorldStore,
) -> Result<Result<AgentId, RejectionReason>, ActionError> {
    let Some(raw) = target_token else {
        return Ok(Err(RejectionReason::MalformedArguments));
    };
    let target = AgentId::new(raw);
    if target == actor.id {
        return Ok(Err(RejectionReason::CannotTargetSelf));
    }
    if !co_located(&actor.id, &target, world).await? {
        return Ok(Err(RejectionReason::AgentNotFound));
    }
    Ok(Ok(target))
}


async fn co_located(actor: &AgentId, target: &AgentId, world: &WorldStore) -> Result<bool, ActionError> {
    Ok(world.co_located(actor).await?.contains(target))
}

#[allow(clippy::too_many_arguments)]
fn build_event(
    event_type: EventType,
    summary: &str,
    timestamp: u64,
    actors: Vec<AgentId>,
    location_id: Option<LocationId>,
    category: MemoryEventCategory,
    first_time: bool,
) -> Event {
    let significance = compute_significance(SignificanceInput {
        category,
        involves_self: true,
        involves_friend_or_rival: false,
        first_time,
        emotional_impact: 0,
    });
    Event {
        event_type,
        summary: summary.to_owned(),
        timestamp,
        actors,
        location_id,
        detail: None,
        significance,
        data: serde_json::Map::new(),
    }
}

async fn routine_event(
    event_type: EventType,
    summary: &str,
    world: &WorldStore,
    actor: &AgentId,
    location_id: Option<LocationId>,
) -> Event {
    let tick = world.read().await.clock.current_tick;
    build_event(
        event_type,
        summary,
        tick,
        vec![actor.clone()],
        location_id,
        MemoryEventCategory::Routine,
        false,
    )
}

async fn social_event(
    event_type: EventType,
    summary: &str,
    world: &WorldStore,
    actor: &AgentId,
    target: &AgentId,
    category: MemoryEventCategory,
) -> Event {
    let relationship = world.relationship(actor, target).await;
    let involves_friend_or_rival = matches!(
        relationship.map(|r| r.relationship_type),
        Some(village_types::RelationshipType::Friend | village_types::RelationshipType::Rival)
    );
    let tick = world.read().await.clock.current_tick;
    let significance = compute_significance(SignificanceInput {
        category,
        involves_self: true,
        involves_friend_or_rival,
        first_time: false,
        emotional_impact: 0,
    });
    Event {
        event_type,
        summary: summary.to_owned(),
        timestamp: tick,
        actors: vec![actor.clone(), target.clone()],
        location_id: None,
        detail: None,
        significance,
        data: serde_json::Map::new(),
    }
}
