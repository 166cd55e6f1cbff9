#![deny(warnings)]

//! Battle resolution and territorial conquest for Warfront.
//!
//! Randomness is always injected as `&mut impl Rng`; seed a
//! `rand_chacha::ChaCha8Rng` for reproducible battles.

pub mod combat;
pub mod conquest;

pub use combat::{resolve_ai_battle, resolve_territory_attack, AiBattleReport, TerritoryBattleReport};
pub use conquest::{attack_targets, is_adjacent, place_command_post};

#[cfg(test)]
pub(crate) mod testutil {
    use sim_core::{
        BoundingBox, Catalog, CountryId, PlayerState, RulesConfig, Territory, TerritoryId,
        TerritoryMap,
    };

    pub fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    pub fn player(country: &str) -> PlayerState {
        let mut p = PlayerState::new("Tester", &RulesConfig::default()).unwrap();
        p.select_country(&catalog(), &CountryId::from(country)).unwrap();
        p
    }

    /// Three boxes in a row sharing edges: west-middle and middle-east touch.
    pub fn strip_map() -> TerritoryMap {
        let t = |id: &str, name: &str, lng: f64| Territory {
            id: TerritoryId::from(id),
            name: name.to_string(),
            bounds: BoundingBox::new(0.0, lng, 10.0, lng + 10.0),
        };
        TerritoryMap::from_territories([
            t("wst", "West", 0.0),
            t("mid", "Middle", 10.0),
            t("est", "East", 20.0),
        ])
        .unwrap()
    }
}
