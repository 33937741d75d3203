//! Notifications delivered synchronously to the presentation layer.

use serde::Serialize;
use throne_core::{AchievementId, CardId, EndingId, Era, Resource, Side};

/// Why a reign ended in defeat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameOverReason {
    /// A resource fell to zero.
    Depleted { resource: Resource },
    /// A resource reached the cap.
    Overflowed { resource: Resource },
}

impl std::fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOverReason::Depleted { resource } => write!(f, "{resource} depleted"),
            GameOverReason::Overflowed { resource } => write!(f, "{resource} overflowed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    NewCard {
        card: CardId,
    },
    ResourceChange {
        resource: Resource,
        old: i32,
        new: i32,
    },
    ChoiceMade {
        card: CardId,
        side: Side,
    },
    EraChanged {
        from: Era,
        to: Era,
    },
    GameOver {
        reason: GameOverReason,
        turn: u32,
        score: u64,
    },
    Victory {
        turn: u32,
        score: u64,
    },
    EndingReached {
        ending: EndingId,
    },
    AchievementUnlocked {
        achievement: AchievementId,
        points: u32,
    },
}

/// Receiver of [`GameEvent`]s. Implemented for any `FnMut(&GameEvent)`.
pub trait GameListener {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F> GameListener for F
where
    F: FnMut(&GameEvent),
{
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Ordered fan-out to subscribed listeners.
#[derive(Default)]
pub(crate) struct EventBus {
    listeners: Vec<Box<dyn GameListener>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self, listener: Box<dyn GameListener>) {
        self.listeners.push(listener);
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        for l in &mut self.listeners {
            l.on_event(&event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
