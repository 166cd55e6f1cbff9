#![deny(warnings)]

//! Core domain models and invariants for Warfront.
//!
//! This crate defines the immutable catalog, the tunable rules, the single
//! mutable [`PlayerState`] aggregate and the territory map, together with
//! the typed errors every engine reports.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod catalog;
pub mod config;
pub mod error;
pub mod state;
pub mod territory;

pub use catalog::{
    AssetCategory, Catalog, Country, IncomeMethod, LevelThresholds, MilitaryAsset, Mission,
    MissionSource, Technology,
};
pub use config::RulesConfig;
pub use error::{CatalogError, GameError, Ineligibility};
pub use state::{utc_day, DailyCounters, PlayerState};
pub use territory::{BoundingBox, Territory, TerritoryMap};

/// Wall-clock instant in whole seconds since the UNIX epoch.
pub type Timestamp = i64;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_type!(
    /// Country code, e.g. "iran" or "usa".
    CountryId
);
id_type!(
    /// Military asset identifier, e.g. "militia".
    AssetId
);
id_type!(
    /// Technology identifier, e.g. "rocket_science".
    TechId
);
id_type!(
    /// Daily mission identifier, e.g. "purchases".
    MissionId
);
id_type!(
    /// Stable territory identifier, independent of the display name.
    TerritoryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = AssetId::from("militia");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"militia\"");
        let back: AssetId = serde_json::from_str("\"militia\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(id.to_string(), "militia");
    }
}
