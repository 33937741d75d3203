//! Ending and achievement matching.

use throne_core::{
    evaluate_all, Achievement, AchievementCondition, Character, Condition, Ending, GameState,
    Profile,
};

/// Highest-priority ending whose conditions all hold. Ties go to the first
/// declared ending. `None` only when no ending holds at all, which a
/// validated catalog rules out with its unconditional default ending.
pub fn match_ending<'a>(endings: &'a [Ending], state: &GameState) -> Option<&'a Ending> {
    endings
        .iter()
        .filter(|e| evaluate_all(&e.conditions, state))
        .fold(None, |best: Option<&Ending>, e| match best {
            Some(b) if b.priority >= e.priority => Some(b),
            _ => Some(e),
        })
}

/// Evaluate one achievement condition against session state and profile.
pub fn achievement_holds(
    condition: &AchievementCondition,
    characters: &[Character],
    state: &GameState,
    profile: &Profile,
) -> bool {
    match condition {
        AchievementCondition::TurnsSurvived { value } => state.turns_played() >= *value,
        AchievementCondition::GamesCompleted { value } => profile.games_completed >= *value,
        AchievementCondition::SpecificScore { value } => state.score >= *value,
        AchievementCondition::EndingReached { ending } => profile.endings_reached.contains(ending),
        AchievementCondition::AllCharactersMet => {
            !characters.is_empty()
                && characters.iter().all(|c| {
                    state.interaction_count(&c.id) > 0 || profile.characters_met.contains(&c.id)
                })
        }
        AchievementCondition::CharacterInteractionCount { character, value } => {
            Condition::CharacterInteractionCount {
                character: character.clone(),
                value: *value,
            }
            .evaluate(state)
        }
        AchievementCondition::TotalPpEarned { value } => profile.total_pp >= *value,
        AchievementCondition::FlagSet { flag } => state.has_flag(flag),
        AchievementCondition::ResourceReached { resource, value } => {
            state.resource(*resource) >= *value
        }
        AchievementCondition::TotalCardsPlayed { value } => profile.total_cards_played >= *value,
    }
}

/// Achievements not yet in `profile.unlocked` whose condition now holds, in
/// catalog order. The caller records them; nothing here ever re-locks.
pub fn match_new_achievements<'a>(
    achievements: &'a [Achievement],
    characters: &[Character],
    state: &GameState,
    profile: &Profile,
) -> Vec<&'a Achievement> {
    achievements
        .iter()
        .filter(|a| !profile.is_unlocked(&a.id))
        .filter(|a| achievement_holds(&a.condition, characters, state, profile))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use throne_core::{
        AchievementCategory, AchievementId, CharacterId, EndingId, EndingKind, Era, Resource,
    };

    fn ending(id: &str, priority: i32, conditions: Vec<Condition>) -> Ending {
        Ending {
            id: EndingId::new(id),
            kind: EndingKind::Defeat,
            title: id.to_string(),
            description: String::new(),
            conditions,
            priority,
        }
    }

    fn endings() -> Vec<Ending> {
        vec![
            ending("deposed", 0, vec![]),
            ending(
                "strong_army",
                10,
                vec![Condition::ResourceAbove {
                    resource: Resource::Military,
                    value: 70,
                }],
            ),
            ending(
                "crusade",
                50,
                vec![
                    Condition::ResourceAbove {
                        resource: Resource::Military,
                        value: 85,
                    },
                    Condition::FlagSet {
                        flag: "sefer_basladi".into(),
                    },
                    Condition::TurnAbove { value: 30 },
                ],
            ),
        ]
    }

    #[test]
    fn campaign_ending_beats_lower_priority() {
        let mut s = GameState::new(50, Era::Medieval);
        s.set_resource(Resource::Military, 90);
        s.flags.insert("sefer_basladi".into());
        s.turn = 31;
        let all = endings();
        assert_eq!(match_ending(&all, &s).unwrap().id, EndingId::new("crusade"));
        s.turn = 30;
        assert_eq!(
            match_ending(&all, &s).unwrap().id,
            EndingId::new("strong_army")
        );
    }

    #[test]
    fn default_when_nothing_specific_holds() {
        let s = GameState::default();
        assert_eq!(
            match_ending(&endings(), &s).unwrap().id,
            EndingId::new("deposed")
        );
        assert!(match_ending(&endings()[1..], &s).is_none());
    }

    #[test]
    fn ties_go_to_first_declared_and_are_stable() {
        let all = vec![
            ending("fallback", -1, vec![]),
            ending("first", 5, vec![]),
            ending("second", 5, vec![]),
        ];
        let s = GameState::default();
        for _ in 0..10 {
            assert_eq!(match_ending(&all, &s).unwrap().id, EndingId::new("first"));
        }
    }

    fn achievement(id: &str, condition: AchievementCondition) -> Achievement {
        Achievement {
            id: AchievementId::new(id),
            name: id.to_string(),
            description: String::new(),
            category: AchievementCategory::Survival,
            condition,
            reward_points: 10,
            secret: false,
        }
    }

    #[test]
    fn achievements_are_monotonic() {
        let list = vec![achievement(
            "rich",
            AchievementCondition::ResourceReached {
                resource: Resource::Gold,
                value: 90,
            },
        )];
        let mut s = GameState::default();
        let mut p = Profile::default();
        assert!(match_new_achievements(&list, &[], &s, &p).is_empty());
        s.set_resource(Resource::Gold, 95);
        let found = match_new_achievements(&list, &[], &s, &p);
        assert_eq!(found.len(), 1);
        p.unlock(&found[0].id, found[0].reward_points);
        s.set_resource(Resource::Gold, 10);
        assert!(match_new_achievements(&list, &[], &s, &p).is_empty());
        assert!(p.is_unlocked(&AchievementId::new("rich")));
    }

    #[test]
    fn profile_backed_conditions() {
        let mut p = Profile::default();
        let s = GameState::default();
        let games = AchievementCondition::GamesCompleted { value: 2 };
        let pp = AchievementCondition::TotalPpEarned { value: 15 };
        let cards = AchievementCondition::TotalCardsPlayed { value: 3 };
        assert!(!achievement_holds(&games, &[], &s, &p));
        p.games_completed = 2;
        p.total_pp = 20;
        p.total_cards_played = 3;
        assert!(achievement_holds(&games, &[], &s, &p));
        assert!(achievement_holds(&pp, &[], &s, &p));
        assert!(achievement_holds(&cards, &[], &s, &p));
        p.endings_reached.insert(EndingId::new("deposed"));
        assert!(achievement_holds(
            &AchievementCondition::EndingReached {
                ending: EndingId::new("deposed")
            },
            &[],
            &s,
            &p
        ));
    }

    #[test]
    fn all_characters_met_combines_session_and_profile() {
        let chars = vec![
            Character {
                id: CharacterId::new("a"),
                name: "A".into(),
                title: String::new(),
                eras: vec![],
            },
            Character {
                id: CharacterId::new("b"),
                name: "B".into(),
                title: String::new(),
                eras: vec![],
            },
        ];
        let mut s = GameState::default();
        let mut p = Profile::default();
        let cond = AchievementCondition::AllCharactersMet;
        s.character_mut(&CharacterId::new("a")).interaction_count = 1;
        assert!(!achievement_holds(&cond, &chars, &s, &p));
        p.characters_met.insert(CharacterId::new("b"));
        assert!(achievement_holds(&cond, &chars, &s, &p));
        assert!(!achievement_holds(&cond, &[], &s, &p));
    }

    #[test]
    fn score_and_turns() {
        let mut s = GameState::default();
        let p = Profile::default();
        s.turn = 21;
        s.score = 200;
        assert!(achievement_holds(
            &AchievementCondition::TurnsSurvived { value: 20 },
            &[],
            &s,
            &p
        ));
        assert!(achievement_holds(
            &AchievementCondition::SpecificScore { value: 200 },
            &[],
            &s,
            &p
        ));
        assert!(!achievement_holds(
            &AchievementCondition::SpecificScore { value: 201 },
            &[],
            &s,
            &p
        ));
    }
}
