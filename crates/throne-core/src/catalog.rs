//! Content records: characters, cards, endings and achievements.
//!
//! Everything in this module is immutable once a [`Catalog`] has been built.
//! The engine only ever reads these records.

use crate::condition::Condition;
use crate::validate::{validate_catalog, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Bounded counters perturbed by choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Gold,
    Happiness,
    Military,
    Faith,
}

impl Resource {
    /// Every resource, in display order.
    pub const ALL: [Resource; 4] = [
        Resource::Gold,
        Resource::Happiness,
        Resource::Military,
        Resource::Faith,
    ];

    /// Lower bound of every resource.
    pub const MIN: i32 = 0;
    /// Upper bound of every resource.
    pub const MAX: i32 = 100;

    /// Era-specific display label. Slots are reused across eras under new names.
    pub fn label(self, era: Era) -> &'static str {
        match (self, era) {
            (Resource::Gold, _) => "Gold",
            (Resource::Happiness, _) => "Happiness",
            (Resource::Military, Era::Future) => "Security",
            (Resource::Military, _) => "Military",
            (Resource::Faith, Era::Modern | Era::Future) => "Approval",
            (Resource::Faith, _) => "Faith",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resource::Gold => "gold",
            Resource::Happiness => "happiness",
            Resource::Military => "military",
            Resource::Faith => "faith",
        };
        f.write_str(s)
    }
}

/// Narrative phase gating which cards are eligible.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    #[default]
    Medieval,
    Renaissance,
    Industrial,
    Modern,
    Future,
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Era::Medieval => "medieval",
            Era::Renaissance => "renaissance",
            Era::Industrial => "industrial",
            Era::Modern => "modern",
            Era::Future => "future",
        };
        f.write_str(s)
    }
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier of a card, e.g. "medieval_tax_01".
    CardId
);
string_id!(
    /// Unique identifier of a character, e.g. "advisor".
    CharacterId
);
string_id!(
    /// Unique identifier of an ending.
    EndingId
);
string_id!(
    /// Unique identifier of an achievement.
    AchievementId
);

/// A recurring figure presenting cards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub title: String,
    /// Eras the character appears in. Empty means every era.
    #[serde(default)]
    pub eras: Vec<Era>,
}

impl Character {
    pub fn appears_in(&self, era: Era) -> bool {
        self.eras.is_empty() || self.eras.contains(&era)
    }
}

/// Authoring category of a card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    #[default]
    Random,
    Story,
    Character,
    /// Served only as a follow-up through the chain queue.
    Chain,
    Rare,
}

/// Which of the two choices was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "left",
            Side::Right => "right",
        })
    }
}

/// A randomized delta on one resource, sampled uniformly in `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEffect {
    pub resource: Resource,
    pub min: i32,
    pub max: i32,
}

impl ResourceEffect {
    pub fn new(resource: Resource, min: i32, max: i32) -> Self {
        Self { resource, min, max }
    }

    /// Midpoint of the range, used for expectation estimates.
    pub fn expected(&self) -> f32 {
        (self.min as f32 + self.max as f32) / 2.0
    }
}

/// One of the two options on a card.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub effects: Vec<ResourceEffect>,
    #[serde(default)]
    pub set_flags: Vec<String>,
    #[serde(default)]
    pub remove_flags: Vec<String>,
    /// Applied to the owning character's relationship.
    #[serde(default)]
    pub relationship_change: Option<i32>,
    /// Follow-up cards queued in declaration order.
    #[serde(default)]
    pub triggered_events: Vec<CardId>,
    /// Moves the game into another era.
    #[serde(default)]
    pub era_change: Option<Era>,
}

impl Choice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_effect(mut self, resource: Resource, min: i32, max: i32) -> Self {
        self.effects.push(ResourceEffect::new(resource, min, max));
        self
    }
}

fn default_weight() -> f64 {
    1.0
}

/// One presentable narrative unit with two choices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Owning era; `None` makes the card era-agnostic.
    #[serde(default)]
    pub era: Option<Era>,
    #[serde(default)]
    pub category: CardCategory,
    #[serde(default)]
    pub character: Option<CharacterId>,
    pub text: String,
    pub left: Choice,
    pub right: Choice,
    /// Unnormalized probability mass within a priority band.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub rare: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub repeatable: bool,
    /// Minimum number of turns between two showings of a repeatable card.
    #[serde(default)]
    pub cooldown: u32,
    /// Designated filler served when nothing else is eligible.
    #[serde(default)]
    pub fallback: bool,
}

impl Card {
    /// A minimal random card with empty choices, convenient for tests and tools.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: CardId::new(id),
            era: None,
            category: CardCategory::Random,
            character: None,
            text: text.into(),
            left: Choice::new("No"),
            right: Choice::new("Yes"),
            weight: default_weight(),
            priority: 0,
            rare: false,
            conditions: Vec::new(),
            repeatable: false,
            cooldown: 0,
            fallback: false,
        }
    }

    pub fn choice(&self, side: Side) -> &Choice {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn choices(&self) -> [&Choice; 2] {
        [&self.left, &self.right]
    }
}

/// Narrative flavour of an ending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingKind {
    #[default]
    Defeat,
    Victory,
    Neutral,
    Secret,
}

/// A terminal narrative outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ending {
    pub id: EndingId,
    #[serde(default)]
    pub kind: EndingKind,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    #[default]
    Survival,
    Progression,
    Story,
    Character,
    Collection,
    Secret,
}

/// Unlock condition of an achievement. Reads both the session state and the
/// cross-session profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementCondition {
    TurnsSurvived { value: u32 },
    GamesCompleted { value: u32 },
    SpecificScore { value: u64 },
    EndingReached { ending: EndingId },
    AllCharactersMet,
    CharacterInteractionCount { character: CharacterId, value: u32 },
    TotalPpEarned { value: u64 },
    FlagSet { flag: String },
    ResourceReached { resource: Resource, value: i32 },
    TotalCardsPlayed { value: u64 },
}

/// A persistent, monotonic meta-unlock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: AchievementCategory,
    pub condition: AchievementCondition,
    #[serde(default)]
    pub reward_points: u32,
    #[serde(default)]
    pub secret: bool,
}

/// Raw catalog contents as supplied by a content loader, before validation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub endings: Vec<Ending>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

/// Validated, indexed, read-only content.
#[derive(Clone, Debug)]
pub struct Catalog {
    characters: Vec<Character>,
    cards: Vec<Card>,
    endings: Vec<Ending>,
    achievements: Vec<Achievement>,
    card_index: BTreeMap<CardId, usize>,
    character_index: BTreeMap<CharacterId, usize>,
    fallback: usize,
}

impl Catalog {
    /// Validate raw content and build lookup indices.
    pub fn new(data: CatalogData) -> Result<Self, ValidationError> {
        validate_catalog(&data)?;
        let card_index = data
            .cards
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        let character_index = data
            .characters
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        let fallback = data
            .cards
            .iter()
            .position(|c| c.fallback)
            .ok_or(ValidationError::MissingFallbackCard)?;
        Ok(Self {
            characters: data.characters,
            cards: data.cards,
            endings: data.endings,
            achievements: data.achievements,
            card_index,
            character_index,
            fallback,
        })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn endings(&self) -> &[Ending] {
        &self.endings
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.card_index.get(id).map(|&i| &self.cards[i])
    }

    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.character_index.get(id).map(|&i| &self.characters[i])
    }

    /// The designated filler card.
    pub fn fallback_card(&self) -> &Card {
        &self.cards[self.fallback]
    }

    /// The lowest-priority unconditional ending; first declared wins ties.
    pub fn default_ending(&self) -> Option<&Ending> {
        self.endings
            .iter()
            .filter(|e| e.conditions.is_empty())
            .fold(None, |best: Option<&Ending>, e| match best {
                Some(b) if b.priority <= e.priority => Some(b),
                _ => Some(e),
            })
    }
}
