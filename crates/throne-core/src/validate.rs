//! Load-time content integrity checks.
//!
//! Any error here is an authoring bug. Catalogs that fail validation are never
//! handed to the engine.

use crate::catalog::{AchievementCondition, CardCategory, CatalogData, CharacterId};
use crate::condition::Condition;
use crate::config::GameConfig;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Content-integrity and configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("duplicate card id: {0}")]
    DuplicateCard(String),
    #[error("duplicate character id: {0}")]
    DuplicateCharacter(String),
    #[error("duplicate ending id: {0}")]
    DuplicateEnding(String),
    #[error("duplicate achievement id: {0}")]
    DuplicateAchievement(String),
    #[error("{owner} references unknown character {character}")]
    UnknownCharacter { owner: String, character: String },
    #[error("card {card} triggers unknown card {target}")]
    UnknownTriggeredEvent { card: String, target: String },
    #[error("achievement {achievement} references unknown ending {ending}")]
    UnknownEnding { achievement: String, ending: String },
    #[error("{owner} reads flag {flag} which no choice ever sets")]
    UnknownFlag { owner: String, flag: String },
    #[error("card {card} has an empty flag name")]
    EmptyFlag { card: String },
    #[error("card {card}: effect range [{min}, {max}] is inverted")]
    InvertedRange { card: String, min: i32, max: i32 },
    #[error("card {0}: weight must be finite and > 0")]
    InvalidWeight(String),
    #[error("card {0}: relationship change without an owning character")]
    RelationshipWithoutCharacter(String),
    #[error("card {card}: flag {flag} is both set and removed by one choice")]
    FlagSetAndRemoved { card: String, flag: String },
    #[error("card {0}: cooldown set on a non-repeatable card")]
    CooldownWithoutRepeat(String),
    #[error("card {0}: era change does not move forward")]
    EraRegression(String),
    #[error("card {0}: era change on an era-agnostic card")]
    EraChangeWithoutEra(String),
    #[error("no fallback card declared")]
    MissingFallbackCard,
    #[error("more than one fallback card: {0}")]
    MultipleFallbackCards(String),
    #[error("fallback card {0} must be unconditional, repeatable, era-agnostic and not a chain card")]
    InvalidFallbackCard(String),
    #[error("no unconditional ending declared")]
    MissingDefaultEnding,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Validate raw catalog contents. Cross-references are checked after all ids
/// have been collected, so declaration order does not matter.
pub fn validate_catalog(data: &CatalogData) -> Result<(), ValidationError> {
    let mut characters = BTreeSet::new();
    for c in &data.characters {
        if !characters.insert(&c.id) {
            return Err(ValidationError::DuplicateCharacter(c.id.0.clone()));
        }
    }

    let mut cards = BTreeSet::new();
    for c in &data.cards {
        if !cards.insert(&c.id) {
            return Err(ValidationError::DuplicateCard(c.id.0.clone()));
        }
    }

    // Flag vocabulary: every flag some choice can set.
    let known_flags: BTreeSet<&str> = data
        .cards
        .iter()
        .flat_map(|c| c.choices())
        .flat_map(|ch| ch.set_flags.iter().map(String::as_str))
        .collect();

    let mut fallback = None;
    for card in &data.cards {
        let id = card.id.0.as_str();
        if !(card.weight.is_finite() && card.weight > 0.0) {
            return Err(ValidationError::InvalidWeight(id.to_string()));
        }
        if card.cooldown > 0 && !card.repeatable {
            return Err(ValidationError::CooldownWithoutRepeat(id.to_string()));
        }
        if let Some(ch) = &card.character {
            if !characters.contains(ch) {
                return Err(ValidationError::UnknownCharacter {
                    owner: id.to_string(),
                    character: ch.0.clone(),
                });
            }
        }
        validate_conditions(id, &card.conditions, &characters, &known_flags)?;
        for choice in card.choices() {
            for e in &choice.effects {
                if e.min > e.max {
                    return Err(ValidationError::InvertedRange {
                        card: id.to_string(),
                        min: e.min,
                        max: e.max,
                    });
                }
            }
            if choice.relationship_change.is_some() && card.character.is_none() {
                return Err(ValidationError::RelationshipWithoutCharacter(
                    id.to_string(),
                ));
            }
            for f in choice.set_flags.iter().chain(&choice.remove_flags) {
                if f.trim().is_empty() {
                    return Err(ValidationError::EmptyFlag {
                        card: id.to_string(),
                    });
                }
            }
            if let Some(f) = choice
                .set_flags
                .iter()
                .find(|f| choice.remove_flags.contains(f))
            {
                return Err(ValidationError::FlagSetAndRemoved {
                    card: id.to_string(),
                    flag: f.clone(),
                });
            }
            for t in &choice.triggered_events {
                if !cards.contains(t) {
                    return Err(ValidationError::UnknownTriggeredEvent {
                        card: id.to_string(),
                        target: t.0.clone(),
                    });
                }
            }
            match (choice.era_change, card.era) {
                (Some(to), Some(from)) if to <= from => {
                    return Err(ValidationError::EraRegression(id.to_string()));
                }
                (Some(_), None) => {
                    return Err(ValidationError::EraChangeWithoutEra(id.to_string()));
                }
                _ => {}
            }
        }
        if card.fallback {
            if let Some(prev) = fallback.replace(id) {
                return Err(ValidationError::MultipleFallbackCards(format!(
                    "{prev}, {id}"
                )));
            }
            if !card.conditions.is_empty()
                || !card.repeatable
                || card.era.is_some()
                || card.character.is_some()
                || card.category == CardCategory::Chain
            {
                return Err(ValidationError::InvalidFallbackCard(id.to_string()));
            }
        }
    }
    if fallback.is_none() {
        return Err(ValidationError::MissingFallbackCard);
    }

    let mut endings = BTreeSet::new();
    for e in &data.endings {
        if !endings.insert(&e.id) {
            return Err(ValidationError::DuplicateEnding(e.id.0.clone()));
        }
        validate_conditions(&e.id.0, &e.conditions, &characters, &known_flags)?;
    }
    if !data.endings.iter().any(|e| e.conditions.is_empty()) {
        return Err(ValidationError::MissingDefaultEnding);
    }

    let mut achievements = BTreeSet::new();
    for a in &data.achievements {
        if !achievements.insert(&a.id) {
            return Err(ValidationError::DuplicateAchievement(a.id.0.clone()));
        }
        let owner = a.id.0.as_str();
        match &a.condition {
            AchievementCondition::EndingReached { ending } if !endings.contains(ending) => {
                return Err(ValidationError::UnknownEnding {
                    achievement: owner.to_string(),
                    ending: ending.0.clone(),
                });
            }
            AchievementCondition::CharacterInteractionCount { character, .. }
                if !characters.contains(character) =>
            {
                return Err(ValidationError::UnknownCharacter {
                    owner: owner.to_string(),
                    character: character.0.clone(),
                });
            }
            AchievementCondition::FlagSet { flag } if !known_flags.contains(flag.as_str()) => {
                return Err(ValidationError::UnknownFlag {
                    owner: owner.to_string(),
                    flag: flag.clone(),
                });
            }
            _ => {}
        }
    }

    debug!(
        characters = data.characters.len(),
        cards = data.cards.len(),
        endings = data.endings.len(),
        achievements = data.achievements.len(),
        flags = known_flags.len(),
        "catalog validated"
    );
    Ok(())
}

fn validate_conditions(
    owner: &str,
    conditions: &[Condition],
    characters: &BTreeSet<&CharacterId>,
    known_flags: &BTreeSet<&str>,
) -> Result<(), ValidationError> {
    for c in conditions {
        if let Some(ch) = c.character() {
            if !characters.contains(ch) {
                return Err(ValidationError::UnknownCharacter {
                    owner: owner.to_string(),
                    character: ch.0.clone(),
                });
            }
        }
        if let Some(flag) = c.flag() {
            if !known_flags.contains(flag) {
                return Err(ValidationError::UnknownFlag {
                    owner: owner.to_string(),
                    flag: flag.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Validate configuration values.
pub fn validate_config(cfg: &GameConfig) -> Result<(), ValidationError> {
    if !(1..=99).contains(&cfg.starting_resource) {
        return Err(ValidationError::InvalidConfig(format!(
            "starting_resource {} must be within [1, 99]",
            cfg.starting_resource
        )));
    }
    if cfg.victory_turns == Some(0) {
        return Err(ValidationError::InvalidConfig(
            "victory_turns must be > 0".into(),
        ));
    }
    Ok(())
}
