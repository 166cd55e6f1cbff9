//! The single mutable aggregate: one [`PlayerState`] per game.

use crate::catalog::{Catalog, Country};
use crate::config::RulesConfig;
use crate::error::GameError;
use crate::{AssetId, CountryId, MissionId, TechId, TerritoryId, Timestamp};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// UTC calendar day containing `ts`.
pub fn utc_day(ts: Timestamp) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

/// Counters that reset at the UTC day boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyCounters {
    /// Day the counters belong to.
    pub day: Option<NaiveDate>,
    /// Units bought during `day`.
    pub purchases: u32,
    /// Missions whose reward was taken during `day`.
    pub claimed_missions: BTreeSet<MissionId>,
}

/// Everything that changes during a game. Serialized as-is by persistence;
/// unknown fields are ignored and missing ones take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    /// Player display name.
    pub name: String,
    /// Chosen country; fixed once set.
    pub country: Option<CountryId>,
    /// Currency balance.
    pub treasury: u64,
    /// Owned unit counts.
    pub military: BTreeMap<AssetId, u32>,
    /// Researched technologies; only ever grows.
    pub technologies: BTreeSet<TechId>,
    /// Current level, always consistent with `experience`.
    pub level: u32,
    /// Accumulated experience.
    pub experience: u64,
    /// Battles won, abstract and territorial.
    pub battles_won: u32,
    /// Battles lost, abstract and territorial.
    pub battles_lost: u32,
    /// Conquest score, adjusted by territorial battles.
    pub score: u64,
    /// Per-day counters.
    pub daily: DailyCounters,
    /// Messages recorded over the whole game.
    pub total_messages: u64,
    /// Last recorded activity.
    pub last_activity: Option<Timestamp>,
    /// Last successful income collection.
    pub last_income_collection: Timestamp,
    /// Cooldown between collections, copied from the rules at creation.
    pub income_cooldown_secs: i64,
    /// Territories under the player's control.
    pub owned_territories: BTreeSet<TerritoryId>,
    /// First territory placed; never changes afterwards.
    pub command_post: Option<TerritoryId>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            name: String::new(),
            country: None,
            treasury: 0,
            military: BTreeMap::new(),
            technologies: BTreeSet::new(),
            level: 1,
            experience: 0,
            battles_won: 0,
            battles_lost: 0,
            score: 0,
            daily: DailyCounters::default(),
            total_messages: 0,
            last_activity: None,
            last_income_collection: 0,
            income_cooldown_secs: RulesConfig::default().income_cooldown_secs,
            owned_territories: BTreeSet::new(),
            command_post: None,
        }
    }
}

impl PlayerState {
    /// Start a new game for `name`.
    pub fn new(name: &str, rules: &RulesConfig) -> Result<Self, GameError> {
        let name = name.trim();
        if name.chars().count() < rules.min_name_len {
            return Err(GameError::InvalidPlayerName {
                min_len: rules.min_name_len,
            });
        }
        Ok(Self {
            name: name.to_string(),
            income_cooldown_secs: rules.income_cooldown_secs,
            ..Self::default()
        })
    }

    /// Choose a country and receive its starting treasury. Allowed once.
    pub fn select_country<'c>(
        &mut self,
        catalog: &'c Catalog,
        code: &CountryId,
    ) -> Result<&'c Country, GameError> {
        if self.country.is_some() {
            return Err(GameError::CountryAlreadySelected);
        }
        let country = catalog
            .country(code)
            .ok_or_else(|| GameError::UnknownCountry(code.clone()))?;
        self.country = Some(code.clone());
        self.treasury = country.starting_money;
        info!(player = %self.name, country = %code, treasury = self.treasury, "country selected");
        Ok(country)
    }

    /// The chosen country, or `CountryNotSelected`.
    pub fn require_country(&self) -> Result<&CountryId, GameError> {
        self.country.as_ref().ok_or(GameError::CountryNotSelected)
    }

    /// Units owned of `asset`.
    pub fn owned(&self, asset: &AssetId) -> u32 {
        self.military.get(asset).copied().unwrap_or(0)
    }

    /// Total unit count across all assets.
    pub fn total_units(&self) -> u64 {
        self.military.values().map(|&c| u64::from(c)).sum()
    }

    /// Reset the daily counters when `now` falls on a later UTC day.
    /// Returns true when a reset happened.
    pub fn roll_day(&mut self, now: Timestamp) -> bool {
        let today = utc_day(now);
        if today.is_none() || self.daily.day == today {
            return false;
        }
        debug!(?today, previous = ?self.daily.day, "daily counters reset");
        self.daily = DailyCounters {
            day: today,
            ..DailyCounters::default()
        };
        true
    }

    /// Units bought on the UTC day of `now`, without rolling the counters.
    pub fn purchases_today(&self, now: Timestamp) -> u32 {
        if self.daily.day.is_some() && self.daily.day == utc_day(now) {
            self.daily.purchases
        } else {
            0
        }
    }

    /// Whether `mission` was claimed on the UTC day of `now`.
    pub fn mission_claimed_today(&self, mission: &MissionId, now: Timestamp) -> bool {
        self.daily.day.is_some()
            && self.daily.day == utc_day(now)
            && self.daily.claimed_missions.contains(mission)
    }

    /// Record a sent message for activity tracking.
    pub fn record_message(&mut self, now: Timestamp) -> u64 {
        self.total_messages = self.total_messages.saturating_add(1);
        self.last_activity = Some(now);
        self.total_messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Timestamp = 86_400;

    #[test]
    fn new_player_defaults() {
        let p = PlayerState::new("  Kaveh ", &RulesConfig::default()).unwrap();
        assert_eq!(p.name, "Kaveh");
        assert_eq!(p.level, 1);
        assert_eq!(p.treasury, 0);
        assert_eq!(p.income_cooldown_secs, 3600);
        assert!(p.country.is_none());
        assert!(p.owned_territories.is_empty());
    }

    #[test]
    fn short_name_rejected() {
        let err = PlayerState::new(" a ", &RulesConfig::default()).unwrap_err();
        assert_eq!(err, GameError::InvalidPlayerName { min_len: 2 });
    }

    #[test]
    fn select_country_once() {
        let catalog = Catalog::builtin().unwrap();
        let mut p = PlayerState::new("Ali", &RulesConfig::default()).unwrap();
        p.select_country(&catalog, &CountryId::from("iran")).unwrap();
        assert_eq!(p.treasury, 500_000);
        let again = p.select_country(&catalog, &CountryId::from("usa"));
        assert_eq!(again.unwrap_err(), GameError::CountryAlreadySelected);
        assert_eq!(p.country, Some(CountryId::from("iran")));
        assert_eq!(p.treasury, 500_000);
    }

    #[test]
    fn unknown_country_rejected() {
        let catalog = Catalog::builtin().unwrap();
        let mut p = PlayerState::new("Ali", &RulesConfig::default()).unwrap();
        let err = p.select_country(&catalog, &CountryId::from("atlantis")).unwrap_err();
        assert_eq!(err, GameError::UnknownCountry(CountryId::from("atlantis")));
        assert!(p.country.is_none());
    }

    #[test]
    fn roll_day_resets_only_on_new_day() {
        let mut p = PlayerState::default();
        assert!(p.roll_day(10 * DAY + 5));
        p.daily.purchases = 7;
        assert!(!p.roll_day(10 * DAY + 80_000));
        assert_eq!(p.daily.purchases, 7);
        assert!(p.roll_day(11 * DAY));
        assert_eq!(p.daily.purchases, 0);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let p: PlayerState = serde_json::from_str(r#"{"name":"Old","treasury":42,"extra":true}"#).unwrap();
        assert_eq!(p.name, "Old");
        assert_eq!(p.treasury, 42);
        assert_eq!(p.level, 1);
        assert_eq!(p.income_cooldown_secs, 3600);
    }
}
