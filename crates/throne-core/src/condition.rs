//! Eligibility conditions and their evaluation against [`GameState`].

use crate::catalog::{CharacterId, Resource};
use crate::state::GameState;
use serde::{Deserialize, Serialize};

/// A single test against game state. Records combine conditions with AND.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    ResourceAbove { resource: Resource, value: i32 },
    ResourceBelow { resource: Resource, value: i32 },
    TurnAbove { value: u32 },
    FlagSet { flag: String },
    FlagNotSet { flag: String },
    /// Holds once the character has been interacted with at least `value` times.
    CharacterInteractionCount { character: CharacterId, value: u32 },
    CharacterRelationshipAbove { character: CharacterId, value: i32 },
}

impl Condition {
    pub fn evaluate(&self, state: &GameState) -> bool {
        match self {
            Condition::ResourceAbove { resource, value } => state.resource(*resource) > *value,
            Condition::ResourceBelow { resource, value } => state.resource(*resource) < *value,
            Condition::TurnAbove { value } => state.turn > *value,
            Condition::FlagSet { flag } => state.has_flag(flag),
            Condition::FlagNotSet { flag } => !state.has_flag(flag),
            Condition::CharacterInteractionCount { character, value } => {
                state.interaction_count(character) >= *value
            }
            Condition::CharacterRelationshipAbove { character, value } => {
                state.relationship(character) > *value
            }
        }
    }

    /// Flag name read by this condition, if any.
    pub fn flag(&self) -> Option<&str> {
        match self {
            Condition::FlagSet { flag } | Condition::FlagNotSet { flag } => Some(flag.as_str()),
            _ => None,
        }
    }

    /// Character read by this condition, if any.
    pub fn character(&self) -> Option<&CharacterId> {
        match self {
            Condition::CharacterInteractionCount { character, .. }
            | Condition::CharacterRelationshipAbove { character, .. } => Some(character),
            _ => None,
        }
    }
}

/// Evaluate one condition.
pub fn evaluate(condition: &Condition, state: &GameState) -> bool {
    condition.evaluate(state)
}

/// AND over all conditions; an empty list holds unconditionally.
pub fn evaluate_all(conditions: &[Condition], state: &GameState) -> bool {
    conditions.iter().all(|c| c.evaluate(state))
}
