//! Daily missions: progress tracking and once-per-day reward claims.

use crate::progression::{apply_experience, total_power, LevelUp};
use serde::Serialize;
use sim_core::{
    utc_day, Catalog, GameError, Mission, MissionId, MissionSource, PlayerState, RulesConfig,
    Timestamp,
};
use tracing::info;

/// Progress of one mission for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MissionStatus {
    /// Mission id.
    pub id: MissionId,
    /// Current progress.
    pub progress: u64,
    /// Value needed to claim.
    pub target: u64,
    /// Reward already taken today.
    pub claimed: bool,
}

impl MissionStatus {
    /// Target reached.
    pub fn completed(&self) -> bool {
        self.progress >= self.target
    }
}

/// A claimed reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MissionClaim {
    /// Mission id.
    pub id: MissionId,
    /// Treasury credited.
    pub points: u64,
    /// Experience granted.
    pub experience_gained: u64,
    /// Level change, if any.
    pub level_up: Option<LevelUp>,
}

/// Current progress value for `mission`.
pub fn mission_progress(
    state: &PlayerState,
    catalog: &Catalog,
    rules: &RulesConfig,
    mission: &Mission,
    now: Timestamp,
) -> u64 {
    match mission.source {
        MissionSource::Messages => state.total_messages,
        MissionSource::Purchases => u64::from(state.purchases_today(now)),
        MissionSource::Battles => u64::from(state.battles_won),
        MissionSource::Power => total_power(state, catalog, rules),
    }
}

/// Status of every catalog mission, in catalog order.
pub fn mission_board(
    state: &PlayerState,
    catalog: &Catalog,
    rules: &RulesConfig,
    now: Timestamp,
) -> Vec<MissionStatus> {
    catalog
        .daily_missions
        .iter()
        .map(|m| MissionStatus {
            id: m.id.clone(),
            progress: mission_progress(state, catalog, rules, m, now),
            target: m.target,
            claimed: state.mission_claimed_today(&m.id, now),
        })
        .collect()
}

/// Take a completed mission's reward. Each mission pays once per UTC day.
pub fn claim_mission(
    state: &mut PlayerState,
    catalog: &Catalog,
    rules: &RulesConfig,
    id: &MissionId,
    now: Timestamp,
) -> Result<MissionClaim, GameError> {
    state.require_country()?;
    utc_day(now).ok_or(GameError::InvalidTimestamp(now))?;
    let mission = catalog
        .mission(id)
        .ok_or_else(|| GameError::UnknownMission(id.clone()))?;
    if state.mission_claimed_today(id, now) {
        return Err(GameError::MissionAlreadyClaimed);
    }
    let progress = mission_progress(state, catalog, rules, mission, now);
    if progress < mission.target {
        return Err(GameError::MissionIncomplete {
            progress,
            target: mission.target,
        });
    }

    state.roll_day(now);
    state.daily.claimed_missions.insert(id.clone());
    state.treasury = state.treasury.saturating_add(mission.points);
    let level_up = apply_experience(state, catalog, mission.exp);
    info!(player = %state.name, mission = %id, points = mission.points, "mission claimed");
    Ok(MissionClaim {
        id: id.clone(),
        points: mission.points,
        experience_gained: mission.exp,
        level_up,
    })
}
