#![deny(warnings)]

//! Decision resolution engine for Throne.
//!
//! Selects the next card, resolves choices into state changes, runs chained
//! follow-ups through a FIFO queue and matches endings and achievements.
//! [`GameSession`] ties these together and is the only mutation entry point.

pub mod events;
pub mod matcher;
pub mod resolver;
pub mod rng;
pub mod scheduler;
pub mod selector;
pub mod session;

use thiserror::Error;
use throne_core::{GameStatus, ValidationError};

pub use events::{GameEvent, GameListener, GameOverReason};
pub use matcher::{achievement_holds, match_ending, match_new_achievements};
pub use resolver::{resolve, RelationshipChange, ResourceChange, StateDelta};
pub use rng::{RandomSource, SeededRng};
pub use scheduler::ChainScheduler;
pub use selector::{eligible_cards, select_next};
pub use session::{GameSession, TurnOutcome};

/// Runtime contract violations by the engine's caller.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("no card is currently presented")]
    NoCardPresented,
    #[error("game is not playing (status: {0:?})")]
    NotPlaying(GameStatus),
    #[error("game is not paused (status: {0:?})")]
    NotPaused(GameStatus),
    #[error("queued card {0} is not in the catalog")]
    UnknownQueuedCard(String),
    #[error("card {0} is not in the catalog")]
    UnknownCard(String),
    #[error("save references unknown {kind} {id}")]
    UnknownSaveReference { kind: &'static str, id: String },
    #[error("unsupported save version {0}")]
    UnsupportedSaveVersion(u32),
    #[error("no ending matched the final state")]
    NoEndingMatched,
    #[error(transparent)]
    Config(#[from] ValidationError),
}
