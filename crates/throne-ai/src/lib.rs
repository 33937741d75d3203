#![deny(warnings)]

//! Autoplay policies: pick a side for a card and drive a session headlessly.

use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use throne_core::{AchievementId, Card, Choice, EndingId, GameState, GameStatus, Resource, Side};
use throne_engine::{EngineError, GameSession};
use tracing::debug;

/// Penalty for an expected outcome that touches a resource bound.
const BOUND_PENALTY: f32 = 1000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Policy {
    /// Keep every resource as close to the centre as possible.
    #[default]
    Balanced,
    AlwaysLeft,
    AlwaysRight,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown policy {0:?} (expected balanced, left or right)")]
pub struct UnknownPolicy(pub String);

impl FromStr for Policy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balanced" => Ok(Policy::Balanced),
            "left" => Ok(Policy::AlwaysLeft),
            "right" => Ok(Policy::AlwaysRight),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl Policy {
    pub fn pick(self, card: &Card, state: &GameState) -> Side {
        match self {
            Policy::AlwaysLeft => Side::Left,
            Policy::AlwaysRight => Side::Right,
            Policy::Balanced => {
                let left = utility(&expected_outcome(&card.left, state));
                let right = utility(&expected_outcome(&card.right, state));
                debug!(card = %card.id, left, right, "balanced policy scores");
                if right > left {
                    Side::Right
                } else {
                    Side::Left
                }
            }
        }
    }
}

/// Resources after `choice` if every effect landed on its midpoint. Effects
/// on the same resource are summed and clamped once, as resolution does.
pub fn expected_outcome(choice: &Choice, state: &GameState) -> BTreeMap<Resource, i32> {
    let mut deltas: BTreeMap<Resource, f32> = BTreeMap::new();
    for e in &choice.effects {
        *deltas.entry(e.resource).or_insert(0.0) += e.expected();
    }
    let mut out = state.resources.clone();
    for (resource, delta) in deltas {
        let v = out.entry(resource).or_insert(0);
        *v = (*v + delta.round() as i32).clamp(Resource::MIN, Resource::MAX);
    }
    out
}

/// Higher is better. Quadratic pull toward the centre plus a hard penalty
/// for any resource sitting on a bound.
pub fn utility(resources: &BTreeMap<Resource, i32>) -> f32 {
    let centre = (Resource::MIN + Resource::MAX) as f32 / 2.0;
    resources
        .values()
        .map(|&v| {
            if v <= Resource::MIN || v >= Resource::MAX {
                -BOUND_PENALTY
            } else {
                let d = (v as f32 - centre) / centre;
                -d * d
            }
        })
        .sum()
}

/// Summary of one headless run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutoplayReport {
    pub turns: u32,
    pub status: GameStatus,
    pub score: u64,
    pub ending: Option<EndingId>,
    pub achievements: Vec<AchievementId>,
}

/// Play `session` with `policy` until it leaves `Playing` or `max_turns`
/// choices have been made.
pub fn autoplay(
    session: &mut GameSession,
    policy: Policy,
    max_turns: u32,
) -> Result<AutoplayReport, EngineError> {
    let mut report = AutoplayReport::default();
    while report.turns < max_turns && session.state().status == GameStatus::Playing {
        let id = session.next_card()?.id.clone();
        let card = session
            .catalog()
            .card(&id)
            .ok_or_else(|| EngineError::UnknownCard(id.0.clone()))?;
        let outcome = match policy.pick(card, session.state()) {
            Side::Left => session.choose_left()?,
            Side::Right => session.choose_right()?,
        };
        report.turns += 1;
        report.achievements.extend(outcome.achievements);
        if outcome.ending.is_some() {
            report.ending = outcome.ending;
        }
    }
    report.status = session.state().status;
    report.score = session.state().score;
    Ok(report)
}
