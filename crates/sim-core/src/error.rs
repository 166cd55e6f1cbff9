//! Typed failures reported by the engines and by catalog loading.

use crate::{AssetId, CountryId, MissionId, TechId, Timestamp};
use thiserror::Error;

/// Why a purchase or research action is not permitted.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Ineligibility {
    /// Asset id is not in the catalog.
    #[error("unknown military asset: {0}")]
    UnknownAsset(AssetId),
    /// Technology id is not in the catalog.
    #[error("unknown technology: {0}")]
    UnknownTech(TechId),
    /// Asset can only be fielded by another country.
    #[error("only available to {0}")]
    CountryRestricted(CountryId),
    /// Asset needs a technology the player has not researched.
    #[error("requires technology: {0}")]
    MissingTechnology(TechId),
    /// Technology is already in the player's set.
    #[error("already researched")]
    AlreadyResearched,
    /// Player level is below the technology's requirement.
    #[error("requires level {required}")]
    LevelTooLow {
        /// Level the technology asks for.
        required: u32,
    },
    /// A direct prerequisite has not been researched yet.
    #[error("requires prerequisite: {0}")]
    MissingPrerequisite(TechId),
}

/// Recoverable engine failure. Player state is left unchanged whenever one
/// of these is returned.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// The player owns no combat power.
    #[error("no forces available for battle")]
    NoForce,
    /// Income cooldown has not elapsed.
    #[error("income not ready, {remaining_secs}s remaining")]
    NotReady {
        /// Seconds until the next collection is allowed.
        remaining_secs: i64,
    },
    /// Treasury cannot cover the cost.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds {
        /// Total cost of the action.
        needed: u64,
        /// Current treasury.
        available: u64,
    },
    /// Eligibility rules reject the action.
    #[error("not eligible: {0}")]
    Ineligible(Ineligibility),
    /// Daily purchase cap would be exceeded.
    #[error("daily purchase limit reached, {remaining} remaining today")]
    DailyLimitExceeded {
        /// Units still purchasable today.
        remaining: u32,
    },
    /// Target territory is already held.
    #[error("territory already owned")]
    AlreadyOwned,
    /// Target territory does not touch any owned territory.
    #[error("territory is not adjacent to any owned territory")]
    NotAdjacent,
    /// A command post already exists.
    #[error("command post already placed")]
    AlreadyPlaced,
    /// Territory is not on the map.
    #[error("unknown territory: {0}")]
    UnknownTerritory(String),
    /// The action needs a chosen country.
    #[error("no country selected")]
    CountryNotSelected,
    /// Country choice is fixed once made.
    #[error("country already selected")]
    CountryAlreadySelected,
    /// Country code is not in the catalog.
    #[error("unknown country: {0}")]
    UnknownCountry(CountryId),
    /// Player name fails the length rule.
    #[error("player name must be at least {min_len} characters")]
    InvalidPlayerName {
        /// Minimum accepted length in characters.
        min_len: usize,
    },
    /// Mission id is not in the catalog.
    #[error("unknown mission: {0}")]
    UnknownMission(MissionId),
    /// Mission target not yet reached.
    #[error("mission incomplete: {progress}/{target}")]
    MissionIncomplete {
        /// Current progress value.
        progress: u64,
        /// Value required to claim.
        target: u64,
    },
    /// Mission reward already taken today.
    #[error("mission already claimed today")]
    MissionAlreadyClaimed,
    /// Timestamp falls outside the calendar.
    #[error("timestamp {0} has no calendar day")]
    InvalidTimestamp(Timestamp),
}

impl From<Ineligibility> for GameError {
    fn from(reason: Ineligibility) -> Self {
        GameError::Ineligible(reason)
    }
}

/// Errors raised while loading or validating static data.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// YAML text could not be parsed into the expected shape.
    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// A reference points at an id that does not exist.
    #[error("{kind} references unknown id: {id}")]
    UnknownReference {
        /// What holds the dangling reference.
        kind: &'static str,
        /// The missing id.
        id: String,
    },
    /// Technology prerequisites form a cycle.
    #[error("technology prerequisite cycle through: {0}")]
    PrerequisiteCycle(String),
    /// Level thresholds must start at 0 and strictly ascend.
    #[error("level thresholds must start at 0 and strictly ascend")]
    InvalidThresholds,
    /// Duplicate identifier.
    #[error("duplicate id: {0}")]
    Duplicate(String),
    /// Territory bounding box is inverted or non-finite.
    #[error("invalid bounds for territory: {0}")]
    InvalidBounds(String),
    /// Rules configuration is inconsistent.
    #[error("invalid rules: {0}")]
    InvalidRules(&'static str),
}
