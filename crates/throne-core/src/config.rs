//! Session configuration.

use crate::catalog::Era;
use serde::{Deserialize, Serialize};

/// Parameters of one playthrough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the deterministic random source.
    pub rng_seed: u64,
    /// Initial value of every resource.
    pub starting_resource: i32,
    pub starting_era: Era,
    /// Resolved turns after which the reign ends in victory. `None` plays until collapse.
    pub victory_turns: Option<u32>,
    /// Score added for every resolved card.
    pub score_per_turn: u64,
    /// Extra score for resolving a rarity-flagged card.
    pub rare_card_bonus: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            starting_resource: 50,
            starting_era: Era::Medieval,
            victory_turns: None,
            score_per_turn: 10,
            rare_card_bonus: 50,
        }
    }
}
