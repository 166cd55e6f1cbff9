//! Battle resolution.
//!
//! Two modes share the player's forces:
//! - abstract battles against a generated AI army, paying out or costing
//!   treasury;
//! - territorial battles against a map territory, resolved as a single
//!   odds draw `you / (you + ai)` that grows the player's holdings or costs
//!   conquest score.
//!
//! Neither mode is replayable unless the caller seeds the RNG.

use crate::conquest::is_adjacent;
use rand::Rng;
use serde::Serialize;
use sim_core::{Catalog, GameError, PlayerState, RulesConfig, TerritoryId, TerritoryMap};
use sim_econ::{apply_experience, total_power, LevelUp};
use tracing::{debug, info};

/// Minimum experience for an abstract victory.
const MIN_VICTORY_EXPERIENCE: u64 = 15;

/// Outcome of an abstract battle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AiBattleReport {
    /// Attacker won.
    pub victory: bool,
    /// Player power at battle time.
    pub your_power: u64,
    /// Generated AI power.
    pub ai_power: u64,
    /// Final attack strength.
    pub attack: f64,
    /// Final defense strength.
    pub defense: f64,
    /// Reward on victory, loss on defeat.
    pub amount: u64,
    /// Experience granted (victory only).
    pub experience_gained: u64,
    /// Level change, if any.
    pub level_up: Option<LevelUp>,
}

/// Outcome of a territorial battle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TerritoryBattleReport {
    /// Territory attacked.
    pub target: TerritoryId,
    /// Attacker won and now owns the target.
    pub victory: bool,
    /// Player combat power used for the odds.
    pub your_power: u32,
    /// Defender power used for the odds.
    pub ai_power: u32,
    /// Chance the attack had to succeed.
    pub win_probability: f64,
    /// Score change applied.
    pub score_delta: i64,
}

/// Fight a generated AI army scaled to the player's power.
pub fn resolve_ai_battle<R: Rng + ?Sized>(
    state: &mut PlayerState,
    catalog: &Catalog,
    rules: &RulesConfig,
    rng: &mut R,
) -> Result<AiBattleReport, GameError> {
    state.require_country()?;
    let your_power = total_power(state, catalog, rules);
    if your_power == 0 {
        return Err(GameError::NoForce);
    }
    let yp = your_power as f64;
    let ai_power = (yp * rng.gen_range(0.6..1.6)).floor() as u64;
    let tech_bonus = 1.0 + state.technologies.len() as f64 * rules.tech_combat_coefficient;
    let level_bonus = 1.0 + f64::from(state.level) * rules.level_combat_coefficient;
    let attack = yp * rng.gen_range(0.7..1.3) * tech_bonus * level_bonus;
    let defense = ai_power as f64 * rng.gen_range(0.7..1.3);
    debug!(your_power, ai_power, attack, defense, "abstract battle drawn");

    let report = if attack > defense {
        let margin = ((attack - defense) / attack * 0.4).min(0.25);
        let reward = (ai_power as f64 * margin * 100.0).floor() as u64;
        let experience_gained = (reward / 10).max(MIN_VICTORY_EXPERIENCE);
        state.treasury = state.treasury.saturating_add(reward);
        state.battles_won = state.battles_won.saturating_add(1);
        let level_up = apply_experience(state, catalog, experience_gained);
        info!(player = %state.name, reward, "abstract battle won");
        AiBattleReport {
            victory: true,
            your_power,
            ai_power,
            attack,
            defense,
            amount: reward,
            experience_gained,
            level_up,
        }
    } else {
        let margin = ((defense - attack) / defense * 0.3).min(0.15);
        let loss = (state.treasury as f64 * margin).floor() as u64;
        state.treasury = state.treasury.saturating_sub(loss);
        state.battles_lost = state.battles_lost.saturating_add(1);
        info!(player = %state.name, loss, "abstract battle lost");
        AiBattleReport {
            victory: false,
            your_power,
            ai_power,
            attack,
            defense,
            amount: loss,
            experience_gained: 0,
            level_up: None,
        }
    };
    Ok(report)
}

/// Attack a territory adjacent to the player's holdings.
pub fn resolve_territory_attack<R: Rng + ?Sized>(
    state: &mut PlayerState,
    catalog: &Catalog,
    rules: &RulesConfig,
    map: &TerritoryMap,
    target: &TerritoryId,
    rng: &mut R,
) -> Result<TerritoryBattleReport, GameError> {
    state.require_country()?;
    if total_power(state, catalog, rules) == 0 {
        return Err(GameError::NoForce);
    }
    let territory = map
        .get(target)
        .ok_or_else(|| GameError::UnknownTerritory(target.0.clone()))?;
    if state.owned_territories.contains(target) {
        return Err(GameError::AlreadyOwned);
    }
    if !is_adjacent(state, map, target) {
        return Err(GameError::NotAdjacent);
    }

    let your_power = rules
        .territorial_base_attack
        .saturating_add(state.level.saturating_mul(rules.territorial_level_attack));
    let ai_power = (8 + rng.gen_range(0..8u32)).max(6);
    let win_probability = f64::from(your_power) / (f64::from(your_power) + f64::from(ai_power));
    let victory = rng.gen::<f64>() < win_probability;
    debug!(your_power, ai_power, win_probability, "territorial battle drawn");

    let score_delta = if victory {
        state.owned_territories.insert(target.clone());
        state.battles_won = state.battles_won.saturating_add(1);
        state.score = state.score.saturating_add(rules.territorial_win_score);
        info!(player = %state.name, territory = %territory.name, "territory annexed");
        i64::try_from(rules.territorial_win_score).unwrap_or(i64::MAX)
    } else {
        let before = state.score;
        state.score = state.score.saturating_sub(rules.territorial_loss_penalty);
        state.battles_lost = state.battles_lost.saturating_add(1);
        info!(player = %state.name, territory = %territory.name, "territorial attack repelled");
        -i64::try_from(before - state.score).unwrap_or(i64::MAX)
    };

    Ok(TerritoryBattleReport {
        target: target.clone(),
        victory,
        your_power,
        ai_power,
        win_probability,
        score_delta,
    })
}
