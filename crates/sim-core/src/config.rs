//! Tunable game rules.

use crate::error::CatalogError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rules shared by every engine. Missing fields fall back to the defaults,
/// so a partial YAML file only needs to list what it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Seconds between income collections.
    pub income_cooldown_secs: i64,
    /// Units purchasable per UTC day.
    pub daily_purchase_limit: u32,
    /// Smallest quantity accepted per purchase.
    pub min_purchase_quantity: u32,
    /// Largest quantity accepted per purchase.
    pub max_purchase_quantity: u32,
    /// Power bonus per level (0.03 = +3% per level).
    pub level_power_coefficient: Decimal,
    /// Income bonus per level.
    pub level_income_coefficient: Decimal,
    /// Income bonus per researched technology.
    pub tech_income_coefficient: Decimal,
    /// Abstract battle attack bonus per researched technology.
    pub tech_combat_coefficient: f64,
    /// Abstract battle attack bonus per level.
    pub level_combat_coefficient: f64,
    /// Base attack used by territorial battles before the level bonus.
    pub territorial_base_attack: u32,
    /// Attack added per level in territorial battles.
    pub territorial_level_attack: u32,
    /// Score deducted after a lost territorial battle.
    pub territorial_loss_penalty: u64,
    /// Score granted after a won territorial battle.
    pub territorial_win_score: u64,
    /// Seconds between automatic saves.
    pub autosave_interval_secs: i64,
    /// Battle log entries retained by a session.
    pub battle_log_capacity: usize,
    /// Minimum player name length in characters.
    pub min_name_len: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            income_cooldown_secs: 3600,
            daily_purchase_limit: 50,
            min_purchase_quantity: 1,
            max_purchase_quantity: 100,
            level_power_coefficient: Decimal::new(3, 2),
            level_income_coefficient: Decimal::new(2, 2),
            tech_income_coefficient: Decimal::new(5, 2),
            tech_combat_coefficient: 0.05,
            level_combat_coefficient: 0.03,
            territorial_base_attack: 10,
            territorial_level_attack: 2,
            territorial_loss_penalty: 5,
            territorial_win_score: 10,
            autosave_interval_secs: 30,
            battle_log_capacity: 20,
            min_name_len: 2,
        }
    }
}

impl RulesConfig {
    /// Parse rules from YAML and validate them.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let rules: RulesConfig = serde_yaml::from_str(text)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.income_cooldown_secs < 0 {
            return Err(CatalogError::InvalidRules("income cooldown must be >= 0"));
        }
        if self.min_purchase_quantity == 0 || self.min_purchase_quantity > self.max_purchase_quantity
        {
            return Err(CatalogError::InvalidRules(
                "purchase quantity bounds must satisfy 1 <= min <= max",
            ));
        }
        if self.level_power_coefficient < Decimal::ZERO
            || self.level_income_coefficient < Decimal::ZERO
            || self.tech_income_coefficient < Decimal::ZERO
        {
            return Err(CatalogError::InvalidRules("coefficients must be non-negative"));
        }
        if !(self.tech_combat_coefficient.is_finite() && self.level_combat_coefficient.is_finite())
        {
            return Err(CatalogError::InvalidRules("combat coefficients must be finite"));
        }
        if self.tech_combat_coefficient < 0.0 || self.level_combat_coefficient < 0.0 {
            return Err(CatalogError::InvalidRules(
                "combat coefficients must be non-negative",
            ));
        }
        Ok(())
    }

    /// Clamp a requested purchase quantity into the accepted range.
    pub fn clamp_quantity(&self, requested: u32) -> u32 {
        requested.clamp(self.min_purchase_quantity, self.max_purchase_quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let r = RulesConfig::default();
        assert_eq!(r.income_cooldown_secs, 3600);
        assert_eq!(r.daily_purchase_limit, 50);
        assert_eq!(r.level_power_coefficient, Decimal::new(3, 2));
        assert!(r.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let r = RulesConfig::from_yaml_str("daily_purchase_limit: 10\n").unwrap();
        assert_eq!(r.daily_purchase_limit, 10);
        assert_eq!(r.income_cooldown_secs, 3600);
    }

    #[test]
    fn inverted_quantity_bounds_rejected() {
        let err = RulesConfig::from_yaml_str("min_purchase_quantity: 5\nmax_purchase_quantity: 2\n");
        assert!(matches!(err, Err(CatalogError::InvalidRules(_))));
    }

    #[test]
    fn negative_combat_coefficients_rejected() {
        for yaml in ["tech_combat_coefficient: -0.1\n", "level_combat_coefficient: -0.01\n"] {
            assert!(matches!(
                RulesConfig::from_yaml_str(yaml),
                Err(CatalogError::InvalidRules("combat coefficients must be non-negative"))
            ));
        }
        assert!(RulesConfig::from_yaml_str("tech_combat_coefficient: 0.0\n").is_ok());
    }

    #[test]
    fn clamp_quantity_bounds() {
        let r = RulesConfig::default();
        assert_eq!(r.clamp_quantity(0), 1);
        assert_eq!(r.clamp_quantity(7), 7);
        assert_eq!(r.clamp_quantity(500), 100);
    }
}
