#![deny(warnings)]

//! Core domain models and invariants for Throne.
//!
//! This crate defines the serializable content records (characters, cards,
//! endings, achievements), the mutable game state, the condition evaluator and
//! load-time validation. It has no notion of randomness or turn flow; those
//! live in `throne-engine`.

pub mod catalog;
pub mod condition;
pub mod config;
pub mod state;
pub mod validate;

pub use catalog::{
    Achievement, AchievementCategory, AchievementCondition, AchievementId, Card, CardCategory,
    CardId, Catalog, CatalogData, Character, CharacterId, Choice, Ending, EndingId, EndingKind,
    Era, Resource, ResourceEffect, Side,
};
pub use condition::{evaluate, evaluate_all, Condition};
pub use config::GameConfig;
pub use state::{
    CharacterState, GameState, GameStatus, HistoryEntry, Profile, SaveData, RELATIONSHIP_MAX,
    RELATIONSHIP_MIN, SAVE_VERSION,
};
pub use validate::{validate_catalog, validate_config, ValidationError};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalog_data() -> CatalogData {
        let mut filler = Card::new("filler", "Nothing happens.");
        filler.fallback = true;
        filler.repeatable = true;
        CatalogData {
            characters: vec![],
            cards: vec![filler, Card::new("harvest", "A good harvest.")],
            endings: vec![Ending {
                id: EndingId::new("old_age"),
                kind: EndingKind::Neutral,
                title: "Old Age".into(),
                description: "You die peacefully.".into(),
                conditions: vec![],
                priority: 0,
            }],
            achievements: vec![],
        }
    }

    #[test]
    fn catalog_indexes_cards() {
        let cat = Catalog::new(catalog_data()).unwrap();
        assert_eq!(cat.cards().len(), 2);
        assert_eq!(cat.fallback_card().id, CardId::new("filler"));
        assert!(cat.card(&CardId::new("harvest")).is_some());
        assert!(cat.card(&CardId::new("nope")).is_none());
        assert_eq!(cat.default_ending().unwrap().id, EndingId::new("old_age"));
    }

    #[test]
    fn catalog_data_json_roundtrip() {
        let s = serde_json::to_string_pretty(&catalog_data()).unwrap();
        let back: CatalogData = serde_json::from_str(&s).unwrap();
        assert!(Catalog::new(back).is_ok());
    }

    #[test]
    fn default_ending_prefers_lowest_priority_then_first() {
        let mut d = catalog_data();
        let mut second = d.endings[0].clone();
        second.id = EndingId::new("exile");
        second.priority = -5;
        let mut third = second.clone();
        third.id = EndingId::new("exile_again");
        d.endings.push(second);
        d.endings.push(third);
        let cat = Catalog::new(d).unwrap();
        assert_eq!(cat.default_ending().unwrap().id, EndingId::new("exile"));
    }

    #[test]
    fn era_labels() {
        assert_eq!(Resource::Faith.label(Era::Medieval), "Faith");
        assert_eq!(Resource::Faith.label(Era::Modern), "Approval");
        assert_eq!(Resource::Military.label(Era::Future), "Security");
    }

    proptest! {
        #[test]
        fn adjust_always_stays_bounded(
            start in -50i32..150,
            deltas in proptest::collection::vec(-300i32..300, 0..40),
        ) {
            let mut s = GameState::new(start, Era::Medieval);
            for d in deltas {
                s.adjust_resource(Resource::Military, d);
                let v = s.resource(Resource::Military);
                prop_assert!((0..=100).contains(&v));
            }
        }
    }
}
