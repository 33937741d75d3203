//! One playthrough: owns the state, the chain queue, the random source and
//! the listeners. All mutation goes through [`GameSession::choose_left`] and
//! [`GameSession::choose_right`].

use crate::events::{EventBus, GameEvent, GameListener, GameOverReason};
use crate::matcher::{match_ending, match_new_achievements};
use crate::resolver::{resolve, StateDelta};
use crate::rng::{RandomSource, SeededRng};
use crate::scheduler::ChainScheduler;
use crate::selector::select_next;
use crate::EngineError;
use chrono::Utc;
use std::sync::Arc;
use throne_core::{
    validate_config, AchievementId, Card, CardId, Catalog, Ending, EndingId, GameConfig,
    GameState, GameStatus, Profile, SaveData, Side, SAVE_VERSION,
};
use tracing::{debug, info};

/// Result of one resolved choice.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub delta: StateDelta,
    pub status: GameStatus,
    /// Card presented for the following turn, if the game goes on.
    pub next_card: Option<CardId>,
    /// Ending reached on this turn.
    pub ending: Option<EndingId>,
    pub achievements: Vec<AchievementId>,
}

pub struct GameSession {
    catalog: Arc<Catalog>,
    config: GameConfig,
    state: GameState,
    scheduler: ChainScheduler,
    rng: Box<dyn RandomSource>,
    current: Option<CardId>,
    ending: Option<EndingId>,
    profile: Profile,
    bus: EventBus,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("scheduler", &self.scheduler)
            .field("current", &self.current)
            .field("ending", &self.ending)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// New session seeded from `config.rng_seed`.
    pub fn new(
        catalog: Arc<Catalog>,
        config: GameConfig,
        profile: Profile,
    ) -> Result<Self, EngineError> {
        let rng = Box::new(SeededRng::from_seed(config.rng_seed));
        Self::with_rng(catalog, config, profile, rng)
    }

    /// New session drawing from a caller-supplied random source.
    pub fn with_rng(
        catalog: Arc<Catalog>,
        config: GameConfig,
        profile: Profile,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, EngineError> {
        validate_config(&config)?;
        let state = GameState::new(config.starting_resource, config.starting_era);
        info!(
            seed = config.rng_seed,
            era = %config.starting_era,
            cards = catalog.cards().len(),
            "session created"
        );
        Ok(Self {
            catalog,
            config,
            state,
            scheduler: ChainScheduler::new(),
            rng,
            current: None,
            ending: None,
            profile,
            bus: EventBus::default(),
        })
    }

    pub fn subscribe<L>(&mut self, listener: L)
    where
        L: GameListener + 'static,
    {
        self.bus.subscribe(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Hand the profile back, e.g. for persisting it after the session.
    pub fn into_profile(self) -> Profile {
        self.profile
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.current.as_ref().and_then(|id| self.catalog.card(id))
    }

    /// Queued chain cards, front first.
    pub fn pending_chain(&self) -> impl Iterator<Item = &CardId> {
        self.scheduler.pending()
    }

    /// Ending reached by this playthrough, once terminal.
    pub fn ending(&self) -> Option<&Ending> {
        let id = self.ending.as_ref()?;
        self.catalog.endings().iter().find(|e| &e.id == id)
    }

    /// Ending the current state would produce if the reign ended now.
    pub fn current_ending(&self) -> Option<&Ending> {
        match_ending(self.catalog.endings(), &self.state)
    }

    /// Discard the current playthrough and start over. The profile is kept
    /// and the random stream continues.
    pub fn new_game(&mut self) {
        self.state = GameState::new(self.config.starting_resource, self.config.starting_era);
        self.scheduler.clear();
        self.current = None;
        self.ending = None;
        info!(games = self.profile.games_completed, "new game");
    }

    /// Present the next card. While a card is presented this returns it again
    /// without drawing.
    pub fn next_card(&mut self) -> Result<&Card, EngineError> {
        if self.state.status != GameStatus::Playing {
            return Err(EngineError::NotPlaying(self.state.status));
        }
        if let Some(id) = self.current.clone() {
            return self
                .catalog
                .card(&id)
                .ok_or(EngineError::UnknownCard(id.0));
        }
        let card = select_next(
            &self.catalog,
            &self.state,
            &mut self.scheduler,
            self.rng.as_mut(),
        )?;
        self.current = Some(card.id.clone());
        self.bus.emit(GameEvent::NewCard {
            card: card.id.clone(),
        });
        Ok(card)
    }

    pub fn choose_left(&mut self) -> Result<TurnOutcome, EngineError> {
        self.choose(Side::Left)
    }

    pub fn choose_right(&mut self) -> Result<TurnOutcome, EngineError> {
        self.choose(Side::Right)
    }

    fn choose(&mut self, side: Side) -> Result<TurnOutcome, EngineError> {
        if self.state.status != GameStatus::Playing {
            return Err(EngineError::NotPlaying(self.state.status));
        }
        let id = self.current.clone().ok_or(EngineError::NoCardPresented)?;
        let catalog = Arc::clone(&self.catalog);
        let card = catalog
            .card(&id)
            .ok_or_else(|| EngineError::UnknownCard(id.0.clone()))?;
        self.current = None;

        let delta = resolve(
            card,
            side,
            &mut self.state,
            &mut self.scheduler,
            self.rng.as_mut(),
        );
        let gained = if card.rare {
            self.config.score_per_turn + self.config.rare_card_bonus
        } else {
            self.config.score_per_turn
        };
        self.state.score = self.state.score.saturating_add(gained);
        self.profile.record_card(card.character.as_ref());

        self.bus.emit(GameEvent::ChoiceMade {
            card: card.id.clone(),
            side,
        });
        for c in &delta.resources {
            self.bus.emit(GameEvent::ResourceChange {
                resource: c.resource,
                old: c.old,
                new: c.new,
            });
        }
        if let Some((from, to)) = delta.era_change {
            self.bus.emit(GameEvent::EraChanged { from, to });
        }

        let ending = self.check_terminal()?;
        let achievements = self.check_achievements();
        let next_card = if self.state.status == GameStatus::Playing {
            Some(self.next_card()?.id.clone())
        } else {
            None
        };

        Ok(TurnOutcome {
            delta,
            status: self.state.status,
            next_card,
            ending,
            achievements,
        })
    }

    /// Apply collapse and victory rules; on a terminal transition match the
    /// ending and record the game in the profile.
    fn check_terminal(&mut self) -> Result<Option<EndingId>, EngineError> {
        let turn = self.state.turns_played();
        let score = self.state.score;
        let event = if let Some((resource, upper)) = self.state.resource_at_bound() {
            let reason = if upper {
                GameOverReason::Overflowed { resource }
            } else {
                GameOverReason::Depleted { resource }
            };
            info!(%reason, turn, score, "game over");
            self.state.status = GameStatus::GameOver;
            GameEvent::GameOver {
                reason,
                turn,
                score,
            }
        } else if self.config.victory_turns.is_some_and(|v| turn >= v) {
            info!(turn, score, "victory");
            self.state.status = GameStatus::Victory;
            GameEvent::Victory { turn, score }
        } else {
            return Ok(None);
        };

        let ending = match_ending(self.catalog.endings(), &self.state)
            .or_else(|| self.catalog.default_ending())
            .map(|e| e.id.clone())
            .ok_or(EngineError::NoEndingMatched)?;
        info!(ending = %ending, "ending reached");
        self.profile.record_game(&ending);
        self.ending = Some(ending.clone());
        self.bus.emit(event);
        self.bus.emit(GameEvent::EndingReached {
            ending: ending.clone(),
        });
        Ok(Some(ending))
    }

    /// Unlock every achievement that now holds. Repeats until a pass finds
    /// nothing, so points earned by one unlock count toward `total_pp_earned`
    /// conditions on the same turn.
    fn check_achievements(&mut self) -> Vec<AchievementId> {
        let catalog = Arc::clone(&self.catalog);
        let mut unlocked = Vec::new();
        loop {
            let found = match_new_achievements(
                catalog.achievements(),
                catalog.characters(),
                &self.state,
                &self.profile,
            );
            if found.is_empty() {
                break;
            }
            for a in found {
                if self.profile.unlock(&a.id, a.reward_points) {
                    info!(achievement = %a.id, points = a.reward_points, "achievement unlocked");
                    self.bus.emit(GameEvent::AchievementUnlocked {
                        achievement: a.id.clone(),
                        points: a.reward_points,
                    });
                    unlocked.push(a.id.clone());
                }
            }
        }
        unlocked
    }

    pub fn pause(&mut self) -> Result<(), EngineError> {
        match self.state.status {
            GameStatus::Playing => {
                self.state.status = GameStatus::Paused;
                Ok(())
            }
            s => Err(EngineError::NotPlaying(s)),
        }
    }

    pub fn resume(&mut self) -> Result<(), EngineError> {
        match self.state.status {
            GameStatus::Paused => {
                self.state.status = GameStatus::Playing;
                Ok(())
            }
            s => Err(EngineError::NotPaused(s)),
        }
    }

    /// Snapshot of the game state. The chain queue is not included.
    pub fn serialize(&self) -> SaveData {
        self.state.to_save(Utc::now())
    }

    /// Replace the whole state with `save`.
    ///
    /// References are checked against the catalog before anything changes.
    /// Pending chains and the presented card are dropped, and the random
    /// source is re-seeded from the config seed and the loaded turn.
    pub fn deserialize(&mut self, save: SaveData) -> Result<(), EngineError> {
        if save.version != SAVE_VERSION {
            return Err(EngineError::UnsupportedSaveVersion(save.version));
        }
        if let Some(h) = save
            .history
            .iter()
            .find(|h| self.catalog.card(&h.card).is_none())
        {
            return Err(EngineError::UnknownSaveReference {
                kind: "card",
                id: h.card.0.clone(),
            });
        }
        if let Some(id) = save
            .characters
            .keys()
            .find(|id| self.catalog.character(id).is_none())
        {
            return Err(EngineError::UnknownSaveReference {
                kind: "character",
                id: id.0.clone(),
            });
        }

        let dropped = self.scheduler.len();
        self.state = GameState::from_save(save);
        self.scheduler.clear();
        self.current = None;
        self.ending = if self.state.status.is_terminal() {
            self.current_ending().map(|e| e.id.clone())
        } else {
            None
        };
        self.rng
            .reseed(self.config.rng_seed ^ u64::from(self.state.turn));
        if dropped > 0 {
            debug!(dropped, "pending chain cards dropped on load");
        }
        info!(turn = self.state.turn, era = %self.state.era, "state loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::testing::MinRng;
    use std::cell::RefCell;
    use std::rc::Rc;
    use throne_core::{
        Achievement, AchievementCategory, AchievementCondition, CardCategory, CatalogData,
        Character, CharacterId, Choice, EndingKind, Era, Resource,
    };

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::new(catalog_data()).unwrap())
    }

    fn catalog_data() -> CatalogData {
        let mut filler = Card::new("filler", "The court is quiet.");
        filler.fallback = true;
        filler.repeatable = true;
        filler.left = Choice::new("Rest").with_effect(Resource::Gold, -5, 5);
        filler.right = Choice::new("Feast").with_effect(Resource::Happiness, -5, 5);

        let mut tax = Card::new("tax", "Raise taxes?");
        tax.character = Some(CharacterId::new("treasurer"));
        tax.left = Choice::new("No").with_effect(Resource::Gold, -10, -5);
        tax.right = Choice::new("Yes")
            .with_effect(Resource::Gold, 10, 20)
            .with_effect(Resource::Happiness, -20, -10);
        tax.right.triggered_events = vec![CardId::new("riot")];
        tax.priority = 1;

        let mut riot = Card::new("riot", "Peasants riot!");
        riot.category = CardCategory::Chain;
        riot.left = Choice::new("Crush").with_effect(Resource::Military, -10, -10);
        riot.right = Choice::new("Concede").with_effect(Resource::Gold, -10, -10);

        let mut plague = Card::new("plague", "Plague in the capital");
        plague.repeatable = true;
        plague.left = Choice::new("Pray").with_effect(Resource::Faith, -30, -30);
        plague.right = Choice::new("Quarantine").with_effect(Resource::Happiness, -30, -30);

        CatalogData {
            characters: vec![Character {
                id: CharacterId::new("treasurer"),
                name: "Mirela".into(),
                title: "Treasurer".into(),
                eras: vec![],
            }],
            cards: vec![filler, tax, riot, plague],
            endings: vec![
                Ending {
                    id: EndingId::new("forgotten"),
                    kind: EndingKind::Neutral,
                    title: "Forgotten".into(),
                    description: String::new(),
                    conditions: vec![],
                    priority: 0,
                },
                Ending {
                    id: EndingId::new("heretic"),
                    kind: EndingKind::Defeat,
                    title: "Burned as a heretic".into(),
                    description: String::new(),
                    conditions: vec![throne_core::Condition::ResourceBelow {
                        resource: Resource::Faith,
                        value: 1,
                    }],
                    priority: 10,
                },
            ],
            achievements: vec![
                Achievement {
                    id: AchievementId::new("first_steps"),
                    name: "First Steps".into(),
                    description: String::new(),
                    category: AchievementCategory::Progression,
                    condition: AchievementCondition::TotalCardsPlayed { value: 1 },
                    reward_points: 5,
                    secret: false,
                },
                Achievement {
                    id: AchievementId::new("heretic_end"),
                    name: "Heretic".into(),
                    description: String::new(),
                    category: AchievementCategory::Story,
                    condition: AchievementCondition::EndingReached {
                        ending: EndingId::new("heretic"),
                    },
                    reward_points: 20,
                    secret: true,
                },
            ],
        }
    }

    fn session() -> GameSession {
        GameSession::with_rng(
            catalog(),
            GameConfig::default(),
            Profile::default(),
            Box::new(MinRng),
        )
        .unwrap()
    }

    fn recorder(s: &mut GameSession) -> Rc<RefCell<Vec<GameEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        s.subscribe(move |e: &GameEvent| sink.borrow_mut().push(e.clone()));
        log
    }

    #[test]
    fn choosing_without_a_card_fails() {
        let mut s = session();
        assert_eq!(s.choose_left().unwrap_err(), EngineError::NoCardPresented);
    }

    #[test]
    fn next_card_is_idempotent_until_resolved() {
        let mut s = session();
        let a = s.next_card().unwrap().id.clone();
        let b = s.next_card().unwrap().id.clone();
        assert_eq!(a, b);
        assert_eq!(a, CardId::new("tax"));
    }

    #[test]
    fn turn_flow_emits_events_and_chains() {
        let mut s = session();
        let log = recorder(&mut s);
        s.next_card().unwrap();
        let out = s.choose_right().unwrap();
        assert_eq!(out.delta.card, CardId::new("tax"));
        assert_eq!(out.next_card, Some(CardId::new("riot")));
        assert_eq!(s.state().resource(Resource::Gold), 60);
        assert_eq!(s.state().resource(Resource::Happiness), 30);
        assert_eq!(s.state().score, 10);
        assert_eq!(out.achievements, vec![AchievementId::new("first_steps")]);
        assert_eq!(s.profile().total_pp, 5);

        let events = log.borrow();
        assert_eq!(
            events[0],
            GameEvent::NewCard {
                card: CardId::new("tax")
            }
        );
        assert_eq!(
            events[1],
            GameEvent::ChoiceMade {
                card: CardId::new("tax"),
                side: Side::Right
            }
        );
        assert_eq!(
            events[2],
            GameEvent::ResourceChange {
                resource: Resource::Gold,
                old: 50,
                new: 60
            }
        );
        assert!(matches!(events.last(), Some(GameEvent::NewCard { card }) if card.0 == "riot"));
    }

    #[test]
    fn pause_blocks_input() {
        let mut s = session();
        s.next_card().unwrap();
        s.pause().unwrap();
        assert_eq!(
            s.choose_left().unwrap_err(),
            EngineError::NotPlaying(GameStatus::Paused)
        );
        assert!(s.pause().is_err());
        s.resume().unwrap();
        assert!(s.resume().is_err());
        assert!(s.choose_left().is_ok());
    }

    #[test]
    fn depletion_ends_the_game_with_matched_ending() {
        let mut s = session();
        let log = recorder(&mut s);
        // tax (left) exhausts the only priority-1 card, plague follows.
        s.next_card().unwrap();
        s.choose_left().unwrap();
        let mut last = None;
        for _ in 0..2 {
            assert_eq!(s.next_card().unwrap().id, CardId::new("plague"));
            last = Some(s.choose_left().unwrap());
        }
        let out = last.unwrap();
        assert_eq!(s.state().resource(Resource::Faith), 0);
        assert_eq!(out.status, GameStatus::GameOver);
        assert_eq!(out.ending, Some(EndingId::new("heretic")));
        assert_eq!(out.next_card, None);
        assert!(out
            .achievements
            .contains(&AchievementId::new("heretic_end")));
        assert_eq!(s.ending().unwrap().id, EndingId::new("heretic"));
        assert_eq!(s.profile().games_completed, 1);
        assert!(log.borrow().iter().any(|e| matches!(
            e,
            GameEvent::GameOver {
                reason: GameOverReason::Depleted {
                    resource: Resource::Faith
                },
                turn: 3,
                ..
            }
        )));
        assert!(matches!(
            s.next_card().unwrap_err(),
            EngineError::NotPlaying(GameStatus::GameOver)
        ));
    }

    #[test]
    fn victory_after_configured_turns() {
        let cfg = GameConfig {
            victory_turns: Some(2),
            ..GameConfig::default()
        };
        let mut s =
            GameSession::with_rng(catalog(), cfg, Profile::default(), Box::new(MinRng)).unwrap();
        s.next_card().unwrap();
        s.choose_left().unwrap();
        s.next_card().unwrap();
        let out = s.choose_right().unwrap();
        assert_eq!(out.status, GameStatus::Victory);
        assert_eq!(out.ending, Some(EndingId::new("forgotten")));
    }

    #[test]
    fn save_load_replaces_state_and_drops_chain() {
        let mut s = session();
        s.next_card().unwrap();
        s.choose_right().unwrap();
        assert_eq!(s.pending_chain().count(), 0);
        let save = s.serialize();
        let before = s.state().clone();

        let mut other = session();
        other.next_card().unwrap();
        other.deserialize(save).unwrap();
        assert_eq!(other.state(), &before);
        assert!(other.current_card().is_none());
        // riot was already popped into the presented slot; after load the
        // weighted pool serves the next card instead.
        assert_ne!(other.next_card().unwrap().id, CardId::new("riot"));
    }

    #[test]
    fn load_rejects_unknown_references() {
        let mut s = session();
        let mut save = s.serialize();
        save.history.push(throne_core::HistoryEntry {
            card: CardId::new("ghost"),
            turn: 1,
        });
        assert!(matches!(
            s.deserialize(save).unwrap_err(),
            EngineError::UnknownSaveReference { kind: "card", .. }
        ));
        let mut save = s.serialize();
        save.version = 99;
        assert_eq!(
            s.deserialize(save).unwrap_err(),
            EngineError::UnsupportedSaveVersion(99)
        );
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = GameConfig {
            starting_resource: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            GameSession::new(catalog(), cfg, Profile::default()).unwrap_err(),
            EngineError::Config(_)
        ));
    }

    #[test]
    fn new_game_resets_state_but_keeps_profile() {
        let mut s = session();
        s.next_card().unwrap();
        s.choose_left().unwrap();
        s.new_game();
        assert_eq!(s.state().turn, 1);
        assert_eq!(s.state().era, Era::Medieval);
        assert_eq!(s.profile().total_cards_played, 1);
        assert!(s.current_card().is_none());
    }

    #[test]
    fn points_from_this_turn_count_toward_point_achievements() {
        let mut data = catalog_data();
        data.achievements.push(Achievement {
            id: AchievementId::new("collector"),
            name: "Collector".into(),
            description: String::new(),
            category: AchievementCategory::Collection,
            condition: AchievementCondition::TotalPpEarned { value: 5 },
            reward_points: 10,
            secret: false,
        });
        let cfg = GameConfig {
            victory_turns: Some(1),
            ..GameConfig::default()
        };
        let mut s = GameSession::with_rng(
            Arc::new(Catalog::new(data).unwrap()),
            cfg,
            Profile::default(),
            Box::new(MinRng),
        )
        .unwrap();
        let log = recorder(&mut s);
        s.next_card().unwrap();
        let out = s.choose_left().unwrap();
        assert_eq!(out.status, GameStatus::Victory);
        assert_eq!(
            out.achievements,
            vec![
                AchievementId::new("first_steps"),
                AchievementId::new("collector")
            ]
        );
        assert_eq!(s.profile().total_pp, 15);
        let unlocks = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, GameEvent::AchievementUnlocked { .. }))
            .count();
        assert_eq!(unlocks, 2);
    }
}
