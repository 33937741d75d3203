//! Applies a chosen side of a card to the game state.

use crate::rng::RandomSource;
use crate::scheduler::ChainScheduler;
use serde::Serialize;
use throne_core::{
    Card, CardId, CharacterId, Era, GameState, HistoryEntry, Resource, Side, RELATIONSHIP_MAX,
    RELATIONSHIP_MIN,
};
use tracing::{debug, info};

/// Realized change on one resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResourceChange {
    pub resource: Resource,
    /// Sum of the sampled deltas before clamping.
    pub rolled: i32,
    pub old: i32,
    pub new: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelationshipChange {
    pub character: CharacterId,
    pub old: i32,
    pub new: i32,
    pub interaction_count: u32,
}

/// Everything one resolution did, in application order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateDelta {
    pub card: CardId,
    pub side: Side,
    pub resources: Vec<ResourceChange>,
    pub flags_set: Vec<String>,
    pub flags_removed: Vec<String>,
    pub relationship: Option<RelationshipChange>,
    pub era_change: Option<(Era, Era)>,
    pub triggered: Vec<CardId>,
    /// Turn on which the card was resolved.
    pub turn: u32,
}

impl StateDelta {
    /// Net change on a resource, zero if the choice did not touch it.
    pub fn net(&self, resource: Resource) -> i32 {
        self.resources
            .iter()
            .find(|c| c.resource == resource)
            .map_or(0, |c| c.new - c.old)
    }
}

/// Resolve `side` of `card` against `state`.
///
/// Effects are sampled from `rng` and summed per resource in first-seen
/// order, then each resource is clamped once. Flags follow (set before
/// remove), then character counters, era change, chained triggers and
/// history. The turn advances last. Every step is infallible on
/// a validated catalog, so callers never observe a half-applied choice.
pub fn resolve(
    card: &Card,
    side: Side,
    state: &mut GameState,
    scheduler: &mut ChainScheduler,
    rng: &mut dyn RandomSource,
) -> StateDelta {
    let choice = card.choice(side);
    let turn = state.turn;

    // Deltas on the same resource add up before the single clamp.
    let mut totals: Vec<(Resource, i32)> = Vec::with_capacity(choice.effects.len());
    for e in &choice.effects {
        let rolled = rng.roll_range(e.min, e.max);
        match totals.iter_mut().find(|(r, _)| *r == e.resource) {
            Some((_, sum)) => *sum = sum.saturating_add(rolled),
            None => totals.push((e.resource, rolled)),
        }
    }
    let resources = totals
        .into_iter()
        .map(|(resource, rolled)| {
            let (old, new) = state.adjust_resource(resource, rolled);
            ResourceChange {
                resource,
                rolled,
                old,
                new,
            }
        })
        .collect();

    let mut flags_set = Vec::new();
    for f in &choice.set_flags {
        if state.flags.insert(f.clone()) {
            flags_set.push(f.clone());
        }
    }
    let mut flags_removed = Vec::new();
    for f in &choice.remove_flags {
        if state.flags.remove(f) {
            flags_removed.push(f.clone());
        }
    }

    let relationship = card.character.as_ref().map(|id| {
        let cs = state.character_mut(id);
        cs.interaction_count = cs.interaction_count.saturating_add(1);
        cs.last_interaction_turn = Some(turn);
        let old = cs.relationship;
        if let Some(delta) = choice.relationship_change {
            cs.relationship = old
                .saturating_add(delta)
                .clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX);
        }
        RelationshipChange {
            character: id.clone(),
            old,
            new: cs.relationship,
            interaction_count: cs.interaction_count,
        }
    });

    // Eras only move forward.
    let era_change = match choice.era_change {
        Some(to) if to > state.era => {
            let from = std::mem::replace(&mut state.era, to);
            info!(%from, %to, turn, "era changed");
            Some((from, to))
        }
        _ => None,
    };

    scheduler.enqueue(&choice.triggered_events);

    state.history.push(HistoryEntry {
        card: card.id.clone(),
        turn,
    });
    state.turn = turn.saturating_add(1);

    debug!(card = %card.id, %side, turn, "choice resolved");
    StateDelta {
        card: card.id.clone(),
        side,
        resources,
        flags_set,
        flags_removed,
        relationship,
        era_change,
        triggered: choice.triggered_events.clone(),
        turn,
    }
}
