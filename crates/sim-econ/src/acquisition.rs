//! Unit purchases and technology research.

use crate::progression::{apply_experience, LevelUp};
use serde::Serialize;
use sim_core::{
    utc_day, AssetId, Catalog, GameError, Ineligibility, MilitaryAsset, PlayerState, RulesConfig,
    TechId, Technology, Timestamp,
};
use tracing::info;

/// A completed purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Purchase {
    /// Asset bought.
    pub asset: AssetId,
    /// Units bought after clamping.
    pub quantity: u32,
    /// Amount debited.
    pub total_cost: u64,
    /// Units of this asset now owned.
    pub owned: u32,
    /// Units still purchasable today.
    pub remaining_today: u32,
}

/// A completed research.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResearchReport {
    /// Technology researched.
    pub tech: TechId,
    /// Amount debited.
    pub cost: u64,
    /// Experience granted (`cost / 10`).
    pub experience_gained: u64,
    /// Level change, if any.
    pub level_up: Option<LevelUp>,
}

/// Country restriction and technology gate for a unit.
pub fn can_buy_unit<'c>(
    state: &PlayerState,
    catalog: &'c Catalog,
    asset_id: &AssetId,
) -> Result<&'c MilitaryAsset, Ineligibility> {
    let asset = catalog
        .asset(asset_id)
        .ok_or_else(|| Ineligibility::UnknownAsset(asset_id.clone()))?;
    if let Some(only) = &asset.country_restricted {
        if state.country.as_ref() != Some(only) {
            return Err(Ineligibility::CountryRestricted(only.clone()));
        }
    }
    if let Some(tech) = &asset.tech_required {
        if !state.technologies.contains(tech) {
            return Err(Ineligibility::MissingTechnology(tech.clone()));
        }
    }
    Ok(asset)
}

/// Buy `quantity` units of an asset. The quantity is clamped into the
/// configured bounds; the daily cap counts units, not transactions.
pub fn purchase_unit(
    state: &mut PlayerState,
    catalog: &Catalog,
    rules: &RulesConfig,
    asset_id: &AssetId,
    quantity: u32,
    now: Timestamp,
) -> Result<Purchase, GameError> {
    state.require_country()?;
    utc_day(now).ok_or(GameError::InvalidTimestamp(now))?;
    let asset = can_buy_unit(state, catalog, asset_id)?;
    let quantity = rules.clamp_quantity(quantity);
    let total_cost = asset
        .cost
        .checked_mul(u64::from(quantity))
        .unwrap_or(u64::MAX);
    if state.treasury < total_cost {
        return Err(GameError::InsufficientFunds {
            needed: total_cost,
            available: state.treasury,
        });
    }
    let today = state.purchases_today(now);
    if today.saturating_add(quantity) > rules.daily_purchase_limit {
        return Err(GameError::DailyLimitExceeded {
            remaining: rules.daily_purchase_limit.saturating_sub(today),
        });
    }

    state.treasury -= total_cost;
    let owned = state.military.entry(asset_id.clone()).or_insert(0);
    *owned = owned.saturating_add(quantity);
    let owned = *owned;
    state.roll_day(now);
    state.daily.purchases += quantity;
    info!(
        player = %state.name,
        asset = %asset_id,
        quantity,
        total_cost,
        treasury = state.treasury,
        "units purchased"
    );
    Ok(Purchase {
        asset: asset_id.clone(),
        quantity,
        total_cost,
        owned,
        remaining_today: rules.daily_purchase_limit.saturating_sub(state.daily.purchases),
    })
}

/// Level requirement and direct-prerequisite check for a technology.
pub fn can_research<'c>(
    state: &PlayerState,
    catalog: &'c Catalog,
    tech_id: &TechId,
) -> Result<&'c Technology, Ineligibility> {
    let tech = catalog
        .technology(tech_id)
        .ok_or_else(|| Ineligibility::UnknownTech(tech_id.clone()))?;
    if state.technologies.contains(tech_id) {
        return Err(Ineligibility::AlreadyResearched);
    }
    if state.level < tech.required_level {
        return Err(Ineligibility::LevelTooLow {
            required: tech.required_level,
        });
    }
    if let Some(missing) = tech
        .prerequisites
        .iter()
        .find(|p| !state.technologies.contains(*p))
    {
        return Err(Ineligibility::MissingPrerequisite(missing.clone()));
    }
    Ok(tech)
}

/// Research a technology, paying its cost.
pub fn research(
    state: &mut PlayerState,
    catalog: &Catalog,
    tech_id: &TechId,
) -> Result<ResearchReport, GameError> {
    state.require_country()?;
    let tech = can_research(state, catalog, tech_id)?;
    if state.treasury < tech.cost {
        return Err(GameError::InsufficientFunds {
            needed: tech.cost,
            available: state.treasury,
        });
    }
    state.treasury -= tech.cost;
    state.technologies.insert(tech_id.clone());
    let experience_gained = tech.cost / 10;
    let level_up = apply_experience(state, catalog, experience_gained);
    info!(player = %state.name, tech = %tech_id, cost = tech.cost, "technology researched");
    Ok(ResearchReport {
        tech: tech_id.clone(),
        cost: tech.cost,
        experience_gained,
        level_up,
    })
}
