//! Static reference data: countries, military assets, technology tree,
//! daily missions and level thresholds. Loaded once and never mutated.

use crate::error::CatalogError;
use crate::{AssetId, CountryId, MissionId, TechId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../assets/catalog.yaml"
));

/// One way a country earns money each collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncomeMethod {
    /// Stable key, e.g. "military_exports".
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base income per collection.
    pub base_income: u64,
    /// Country-specific multiplier applied to the base.
    pub multiplier: Decimal,
}

/// A playable country.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Country {
    /// Display name.
    pub name: String,
    /// Flavor description.
    pub description: String,
    /// Treasury granted on selection.
    pub starting_money: u64,
    /// Income methods in display order.
    pub income_methods: Vec<IncomeMethod>,
    /// Flavor bonus text.
    #[serde(default)]
    pub bonus: String,
}

/// Broad grouping used by front ends to list assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    /// Foot soldiers and special forces.
    Infantry,
    /// Tanks and armored vehicles.
    Armor,
    /// Fixed and rotary wing aircraft.
    Air,
    /// Surface ships and submarines.
    Navy,
    /// Missiles and drones.
    Missiles,
}

/// A purchasable military unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MilitaryAsset {
    /// Display name.
    pub name: String,
    /// Listing category.
    pub category: AssetCategory,
    /// Price per unit.
    pub cost: u64,
    /// Power rating per unit.
    pub power: u64,
    /// Flavor ability text.
    #[serde(default)]
    pub ability: String,
    /// Technology that must be researched first.
    #[serde(default)]
    pub tech_required: Option<TechId>,
    /// Only this country may buy the unit.
    #[serde(default)]
    pub country_restricted: Option<CountryId>,
}

/// A node in the technology tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Technology {
    /// Display name.
    pub name: String,
    /// Research cost.
    pub cost: u64,
    /// Minimum player level.
    pub required_level: u32,
    /// Direct prerequisites.
    #[serde(default)]
    pub prerequisites: Vec<TechId>,
}

/// Where a mission reads its progress from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionSource {
    /// Messages recorded by the player.
    Messages,
    /// Units purchased today.
    Purchases,
    /// Battles won.
    Battles,
    /// Current total power.
    Power,
}

/// A daily mission with a one-shot reward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mission {
    /// Mission id.
    pub id: MissionId,
    /// Display name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Progress value needed to claim.
    pub target: u64,
    /// Treasury reward.
    pub points: u64,
    /// Experience reward.
    pub exp: u64,
    /// Progress source.
    pub source: MissionSource,
}

/// Cumulative experience thresholds; index + 1 is the level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThresholds(pub Vec<u64>);

impl LevelThresholds {
    /// Largest `i + 1` with `experience >= thresholds[i]`, or 1 if none match.
    pub fn level_for(&self, experience: u64) -> u32 {
        let met = self.0.partition_point(|&t| t <= experience);
        u32::try_from(met).unwrap_or(u32::MAX).max(1)
    }

    /// Highest reachable level.
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.0.len()).unwrap_or(u32::MAX).max(1)
    }

    /// Experience needed to reach `level`, if that level exists.
    pub fn threshold(&self, level: u32) -> Option<u64> {
        let idx = usize::try_from(level.checked_sub(1)?).ok()?;
        self.0.get(idx).copied()
    }
}

/// The full static catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    /// Playable countries by code.
    pub countries: BTreeMap<CountryId, Country>,
    /// Military assets by id.
    pub military_assets: BTreeMap<AssetId, MilitaryAsset>,
    /// Technology tree by id.
    pub tech_tree: BTreeMap<TechId, Technology>,
    /// Daily missions in display order.
    #[serde(default)]
    pub daily_missions: Vec<Mission>,
    /// Level thresholds.
    pub level_requirements: LevelThresholds,
}

impl Catalog {
    /// The catalog bundled with the game.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Parse a catalog from YAML and validate it.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Look up a country.
    pub fn country(&self, id: &CountryId) -> Option<&Country> {
        self.countries.get(id)
    }

    /// Look up a military asset.
    pub fn asset(&self, id: &AssetId) -> Option<&MilitaryAsset> {
        self.military_assets.get(id)
    }

    /// Look up a technology.
    pub fn technology(&self, id: &TechId) -> Option<&Technology> {
        self.tech_tree.get(id)
    }

    /// Look up a daily mission.
    pub fn mission(&self, id: &MissionId) -> Option<&Mission> {
        self.daily_missions.iter().find(|m| &m.id == id)
    }

    /// Assets in a category, ordered by cost.
    pub fn assets_in(&self, category: AssetCategory) -> Vec<(&AssetId, &MilitaryAsset)> {
        let mut out: Vec<_> = self
            .military_assets
            .iter()
            .filter(|(_, a)| a.category == category)
            .collect();
        out.sort_by_key(|(_, a)| a.cost);
        out
    }

    /// Validate cross references, the prerequisite DAG and level thresholds.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let thresholds = &self.level_requirements.0;
        if thresholds.first() != Some(&0) || thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CatalogError::InvalidThresholds);
        }

        for (id, asset) in &self.military_assets {
            if let Some(tech) = &asset.tech_required {
                if !self.tech_tree.contains_key(tech) {
                    return Err(CatalogError::UnknownReference {
                        kind: "military asset",
                        id: tech.0.clone(),
                    });
                }
            }
            if let Some(country) = &asset.country_restricted {
                if !self.countries.contains_key(country) {
                    // Units of non-playable nations stay listed but can never be bought.
                    debug!(asset = %id, %country, "asset restricted to a non-playable country");
                }
            }
        }

        for tech in self.tech_tree.values() {
            for pre in &tech.prerequisites {
                if !self.tech_tree.contains_key(pre) {
                    return Err(CatalogError::UnknownReference {
                        kind: "technology",
                        id: pre.0.clone(),
                    });
                }
            }
        }
        self.check_acyclic()?;

        let mut seen = BTreeSet::new();
        for m in &self.daily_missions {
            if !seen.insert(&m.id) {
                return Err(CatalogError::Duplicate(m.id.0.clone()));
            }
        }
        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), CatalogError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            id: &'a TechId,
            tree: &'a BTreeMap<TechId, Technology>,
            marks: &mut BTreeMap<&'a TechId, Mark>,
        ) -> Result<(), CatalogError> {
            match marks.get(id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(CatalogError::PrerequisiteCycle(id.0.clone())),
                None => {}
            }
            marks.insert(id, Mark::Visiting);
            if let Some(tech) = tree.get(id) {
                for pre in &tech.prerequisites {
                    visit(pre, tree, marks)?;
                }
            }
            marks.insert(id, Mark::Done);
            Ok(())
        }

        let mut marks = BTreeMap::new();
        for id in self.tech_tree.keys() {
            visit(id, &self.tech_tree, &mut marks)?;
        }
        Ok(())
    }
}
