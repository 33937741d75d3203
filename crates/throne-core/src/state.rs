//! Mutable game state, cross-session profile and the save record.

use crate::catalog::{AchievementId, CardId, CharacterId, EndingId, Era, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Relationship bounds toward a character.
pub const RELATIONSHIP_MIN: i32 = -100;
pub const RELATIONSHIP_MAX: i32 = 100;

/// Current version of [`SaveData`].
pub const SAVE_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Playing,
    Paused,
    GameOver,
    Victory,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::GameOver | GameStatus::Victory)
    }
}

/// Per-character counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterState {
    pub interaction_count: u32,
    pub last_interaction_turn: Option<u32>,
    /// In `[-100, 100]`.
    pub relationship: i32,
}

/// One resolved card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub card: CardId,
    pub turn: u32,
}

/// Single source of truth for one playthrough.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub resources: BTreeMap<Resource, i32>,
    /// Starts at 1 and advances once per resolved card.
    pub turn: u32,
    pub era: Era,
    pub status: GameStatus,
    pub flags: BTreeSet<String>,
    pub characters: BTreeMap<CharacterId, CharacterState>,
    pub history: Vec<HistoryEntry>,
    pub score: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(50, Era::Medieval)
    }
}

impl GameState {
    /// Fresh state with every resource at `start` (clamped) and empty flags/history.
    pub fn new(start: i32, era: Era) -> Self {
        let start = start.clamp(Resource::MIN, Resource::MAX);
        Self {
            resources: Resource::ALL.iter().map(|&r| (r, start)).collect(),
            turn: 1,
            era,
            status: GameStatus::Playing,
            flags: BTreeSet::new(),
            characters: BTreeMap::new(),
            history: Vec::new(),
            score: 0,
        }
    }

    pub fn resource(&self, r: Resource) -> i32 {
        self.resources.get(&r).copied().unwrap_or(Resource::MIN)
    }

    /// Set a resource, clamping into `[0, 100]`.
    pub fn set_resource(&mut self, r: Resource, value: i32) {
        self.resources
            .insert(r, value.clamp(Resource::MIN, Resource::MAX));
    }

    /// Add `delta` to a resource and clamp. Returns `(old, new)`.
    pub fn adjust_resource(&mut self, r: Resource, delta: i32) -> (i32, i32) {
        let old = self.resource(r);
        let new = old.saturating_add(delta).clamp(Resource::MIN, Resource::MAX);
        self.resources.insert(r, new);
        (old, new)
    }

    /// First resource sitting on a bound, with `true` for the upper bound.
    pub fn resource_at_bound(&self) -> Option<(Resource, bool)> {
        Resource::ALL.iter().find_map(|&r| match self.resource(r) {
            v if v <= Resource::MIN => Some((r, false)),
            v if v >= Resource::MAX => Some((r, true)),
            _ => None,
        })
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn character(&self, id: &CharacterId) -> Option<&CharacterState> {
        self.characters.get(id)
    }

    pub fn character_mut(&mut self, id: &CharacterId) -> &mut CharacterState {
        self.characters.entry(id.clone()).or_default()
    }

    pub fn interaction_count(&self, id: &CharacterId) -> u32 {
        self.character(id).map_or(0, |c| c.interaction_count)
    }

    pub fn relationship(&self, id: &CharacterId) -> i32 {
        self.character(id).map_or(0, |c| c.relationship)
    }

    pub fn has_seen(&self, card: &CardId) -> bool {
        self.history.iter().any(|h| &h.card == card)
    }

    /// Turn at which the card was most recently resolved.
    pub fn last_shown_turn(&self, card: &CardId) -> Option<u32> {
        self.history
            .iter()
            .rev()
            .find(|h| &h.card == card)
            .map(|h| h.turn)
    }

    /// Number of cards resolved so far.
    pub fn turns_played(&self) -> u32 {
        self.turn.saturating_sub(1)
    }

    /// Snapshot for persistence.
    pub fn to_save(&self, timestamp: DateTime<Utc>) -> SaveData {
        SaveData {
            version: SAVE_VERSION,
            resources: self.resources.clone(),
            turn: self.turn,
            era: self.era,
            status: self.status,
            characters: self.characters.clone(),
            flags: self.flags.clone(),
            history: self.history.clone(),
            score: self.score,
            timestamp,
        }
    }

    /// Rebuild state from a save. Resources are re-clamped.
    pub fn from_save(save: SaveData) -> Self {
        let mut state = Self {
            resources: BTreeMap::new(),
            turn: save.turn.max(1),
            era: save.era,
            status: save.status,
            flags: save.flags,
            characters: save.characters,
            history: save.history,
            score: save.score,
        };
        for r in Resource::ALL {
            let v = save.resources.get(&r).copied().unwrap_or(Resource::MIN);
            state.set_resource(r, v);
        }
        for c in state.characters.values_mut() {
            c.relationship = c.relationship.clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX);
        }
        state
    }
}

/// Serialized form of [`GameState`]. Mirrors it field for field; the chain
/// queue is intentionally absent, so in-flight chains do not survive a reload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub resources: BTreeMap<Resource, i32>,
    pub turn: u32,
    pub era: Era,
    pub status: GameStatus,
    pub characters: BTreeMap<CharacterId, CharacterState>,
    pub flags: BTreeSet<String>,
    pub history: Vec<HistoryEntry>,
    pub score: u64,
    pub timestamp: DateTime<Utc>,
}

/// Meta-progression that outlives individual sessions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub games_completed: u32,
    pub total_cards_played: u64,
    /// Achievement reward points earned so far.
    pub total_pp: u64,
    pub endings_reached: BTreeSet<EndingId>,
    pub characters_met: BTreeSet<CharacterId>,
    pub unlocked: BTreeSet<AchievementId>,
}

impl Profile {
    pub fn is_unlocked(&self, id: &AchievementId) -> bool {
        self.unlocked.contains(id)
    }

    /// Record an unlock. Returns false (and awards nothing) if already unlocked.
    pub fn unlock(&mut self, id: &AchievementId, points: u32) -> bool {
        if !self.unlocked.insert(id.clone()) {
            return false;
        }
        self.total_pp = self.total_pp.saturating_add(points as u64);
        true
    }

    pub fn record_card(&mut self, character: Option<&CharacterId>) {
        self.total_cards_played = self.total_cards_played.saturating_add(1);
        if let Some(c) = character {
            self.characters_met.insert(c.clone());
        }
    }

    pub fn record_game(&mut self, ending: &EndingId) {
        self.games_completed = self.games_completed.saturating_add(1);
        self.endings_reached.insert(ending.clone());
    }
}
