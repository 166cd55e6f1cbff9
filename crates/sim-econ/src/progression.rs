//! Power, experience and levels.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sim_core::{Catalog, PlayerState, RulesConfig};
use tracing::info;

/// A level increase caused by an experience grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    /// Level before the grant.
    pub from: u32,
    /// Level after the grant.
    pub to: u32,
}

/// Total combat power: sum of `count * power` over owned units, scaled by
/// `1 + level * level_power_coefficient` and floored.
///
/// Units missing from the catalog contribute nothing.
pub fn total_power(state: &PlayerState, catalog: &Catalog, rules: &RulesConfig) -> u64 {
    let raw = state
        .military
        .iter()
        .filter_map(|(id, &count)| {
            catalog
                .asset(id)
                .map(|a| a.power.saturating_mul(u64::from(count)))
        })
        .fold(0u64, u64::saturating_add);
    if raw == 0 {
        return 0;
    }
    let bonus = Decimal::ONE + Decimal::from(state.level) * rules.level_power_coefficient;
    Decimal::from(raw)
        .checked_mul(bonus)
        .and_then(|p| p.floor().to_u64())
        .unwrap_or(u64::MAX)
}

/// Level reached with `experience` under the catalog thresholds.
pub fn experience_to_level(catalog: &Catalog, experience: u64) -> u32 {
    catalog.level_requirements.level_for(experience)
}

/// Add experience and recompute the level. Returns the level change when
/// the level went up; a grant that crosses no threshold is a no-op.
pub fn apply_experience(state: &mut PlayerState, catalog: &Catalog, delta: u64) -> Option<LevelUp> {
    state.experience = state.experience.saturating_add(delta);
    let from = state.level;
    let to = experience_to_level(catalog, state.experience);
    state.level = to;
    if to > from {
        info!(player = %state.name, from, to, "level up");
        Some(LevelUp { from, to })
    } else {
        None
    }
}

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// Player name.
    pub name: String,
    /// Country display name, if chosen.
    pub country: Option<String>,
    /// Current level.
    pub level: u32,
    /// Experience total.
    pub experience: u64,
    /// Experience needed for the next level, if any.
    pub next_level_at: Option<u64>,
    /// Current total power.
    pub power: u64,
    /// Treasury.
    pub treasury: u64,
    /// Units owned.
    pub units: u64,
    /// Battles won.
    pub battles_won: u32,
    /// Battles lost.
    pub battles_lost: u32,
    /// Territories held.
    pub territories: usize,
    /// Conquest score.
    pub score: u64,
}

/// Summarize the player for display and leaderboards.
pub fn standing(state: &PlayerState, catalog: &Catalog, rules: &RulesConfig) -> Standing {
    Standing {
        name: state.name.clone(),
        country: state
            .country
            .as_ref()
            .and_then(|c| catalog.country(c))
            .map(|c| c.name.clone()),
        level: state.level,
        experience: state.experience,
        next_level_at: catalog.level_requirements.threshold(state.level + 1),
        power: total_power(state, catalog, rules),
        treasury: state.treasury,
        units: state.total_units(),
        battles_won: state.battles_won,
        battles_lost: state.battles_lost,
        territories: state.owned_territories.len(),
        score: state.score,
    }
}
