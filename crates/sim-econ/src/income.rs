//! Income accrual with a per-player cooldown.
//!
//! Each income method yields
//! `floor(base * multiplier * (1 + level * lc) * (1 + techs * tc))`
//! where `lc` and `tc` come from [`RulesConfig`]. Decimal arithmetic keeps
//! the result exact.

use crate::progression::{apply_experience, LevelUp};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sim_core::{Catalog, GameError, IncomeMethod, PlayerState, RulesConfig, Timestamp};
use tracing::{debug, info};

/// Whether income can be collected now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IncomeStatus {
    /// Cooldown elapsed.
    pub ready: bool,
    /// Seconds left when not ready, 0 otherwise.
    pub remaining_secs: i64,
}

/// Result of a successful collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IncomeReport {
    /// Amount credited to the treasury.
    pub amount: u64,
    /// Experience granted (`amount / 20`).
    pub experience_gained: u64,
    /// Experience total afterwards.
    pub new_experience: u64,
    /// Level change, if any.
    pub level_up: Option<LevelUp>,
}

/// Cooldown check against the last successful collection.
pub fn income_due(state: &PlayerState, now: Timestamp) -> IncomeStatus {
    let elapsed = now.saturating_sub(state.last_income_collection);
    if elapsed >= state.income_cooldown_secs {
        IncomeStatus {
            ready: true,
            remaining_secs: 0,
        }
    } else {
        IncomeStatus {
            ready: false,
            remaining_secs: state.income_cooldown_secs - elapsed,
        }
    }
}

/// Per-method income for the player's country, in catalog order.
/// Empty when no country is chosen.
pub fn income_breakdown<'c>(
    state: &PlayerState,
    catalog: &'c Catalog,
    rules: &RulesConfig,
) -> Vec<(&'c IncomeMethod, u64)> {
    let Some(country) = state.country.as_ref().and_then(|c| catalog.country(c)) else {
        return Vec::new();
    };
    let level_bonus = Decimal::ONE + Decimal::from(state.level) * rules.level_income_coefficient;
    let techs = u64::try_from(state.technologies.len()).unwrap_or(u64::MAX);
    let tech_bonus = Decimal::ONE + Decimal::from(techs) * rules.tech_income_coefficient;
    country
        .income_methods
        .iter()
        .map(|m| {
            let amount = Decimal::from(m.base_income)
                .checked_mul(m.multiplier)
                .and_then(|v| v.checked_mul(level_bonus))
                .and_then(|v| v.checked_mul(tech_bonus))
                .and_then(|v| v.floor().to_u64())
                .unwrap_or(u64::MAX);
            (m, amount)
        })
        .collect()
}

/// Total income one collection would credit.
pub fn compute_income(state: &PlayerState, catalog: &Catalog, rules: &RulesConfig) -> u64 {
    income_breakdown(state, catalog, rules)
        .into_iter()
        .map(|(_, amount)| amount)
        .fold(0u64, u64::saturating_add)
}

/// Collect income if the cooldown has elapsed. At most once per window.
pub fn collect_income(
    state: &mut PlayerState,
    catalog: &Catalog,
    rules: &RulesConfig,
    now: Timestamp,
) -> Result<IncomeReport, GameError> {
    let code = state.require_country()?;
    if catalog.country(code).is_none() {
        return Err(GameError::UnknownCountry(code.clone()));
    }
    let status = income_due(state, now);
    if !status.ready {
        debug!(remaining = status.remaining_secs, "income not ready");
        return Err(GameError::NotReady {
            remaining_secs: status.remaining_secs,
        });
    }
    let amount = compute_income(state, catalog, rules);
    state.treasury = state.treasury.saturating_add(amount);
    state.last_income_collection = now;
    let experience_gained = amount / 20;
    let level_up = apply_experience(state, catalog, experience_gained);
    info!(player = %state.name, amount, treasury = state.treasury, "income collected");
    Ok(IncomeReport {
        amount,
        experience_gained,
        new_experience: state.experience,
        level_up,
    })
}
