//! Card selection: chain queue first, then the top priority band by weight.

use crate::rng::RandomSource;
use crate::scheduler::ChainScheduler;
use crate::EngineError;
use throne_core::{evaluate_all, Card, CardCategory, Catalog, GameState};
use tracing::{debug, warn};

/// Whether a repeatable card is still cooling down, or a one-shot card is spent.
pub fn is_exhausted(card: &Card, state: &GameState) -> bool {
    match state.last_shown_turn(&card.id) {
        None => false,
        Some(_) if !card.repeatable => true,
        Some(last) => state.turn.saturating_sub(last) < card.cooldown,
    }
}

/// Era gate: the card's era (if any) and its character's eras (if declared).
pub fn matches_era(card: &Card, catalog: &Catalog, state: &GameState) -> bool {
    if card.era.is_some_and(|e| e != state.era) {
        return false;
    }
    card.character
        .as_ref()
        .and_then(|id| catalog.character(id))
        .map_or(true, |c| c.appears_in(state.era))
}

/// Cards that may compete in weighted selection this turn, in catalog order.
pub fn eligible_cards<'a>(catalog: &'a Catalog, state: &GameState) -> Vec<&'a Card> {
    catalog
        .cards()
        .iter()
        .filter(|c| !c.fallback && c.category != CardCategory::Chain)
        .filter(|c| matches_era(c, catalog, state))
        .filter(|c| !is_exhausted(c, state))
        .filter(|c| evaluate_all(&c.conditions, state))
        .collect()
}

/// Weighted pick over `cards` using each card's weight as probability mass.
/// Returns `None` only for an empty slice.
pub fn weighted_pick<'a>(cards: &[&'a Card], rng: &mut dyn RandomSource) -> Option<&'a Card> {
    let total: f64 = cards.iter().map(|c| c.weight).sum();
    let mut roll = rng.roll_unit() * total;
    for c in cards {
        roll -= c.weight;
        if roll < 0.0 {
            return Some(c);
        }
    }
    // Float drift can leave a sliver of mass unassigned.
    cards.last().copied()
}

/// Choose the next card to present.
///
/// A queued chain card is returned without any eligibility check. Otherwise
/// the eligible set is narrowed to its highest priority band and one card is
/// drawn by weight. An empty eligible set yields the fallback card.
pub fn select_next<'a>(
    catalog: &'a Catalog,
    state: &GameState,
    scheduler: &mut ChainScheduler,
    rng: &mut dyn RandomSource,
) -> Result<&'a Card, EngineError> {
    if let Some(id) = scheduler.dequeue_next() {
        let card = catalog
            .card(&id)
            .ok_or_else(|| EngineError::UnknownQueuedCard(id.0.clone()))?;
        debug!(card = %card.id, pending = scheduler.len(), "chain card selected");
        return Ok(card);
    }

    let eligible = eligible_cards(catalog, state);
    let Some(top) = eligible.iter().map(|c| c.priority).max() else {
        let card = catalog.fallback_card();
        warn!(turn = state.turn, card = %card.id, "no eligible card, serving fallback");
        return Ok(card);
    };
    let band: Vec<&Card> = eligible
        .into_iter()
        .filter(|c| c.priority == top)
        .collect();
    let card = weighted_pick(&band, rng).unwrap_or_else(|| catalog.fallback_card());
    debug!(
        turn = state.turn,
        card = %card.id,
        priority = top,
        band = band.len(),
        "card selected"
    );
    Ok(card)
}
