//! Named map regions with bounding boxes used for adjacency tests.
//!
//! Adjacency is approximated by bounding-box intersection, not true border
//! contact. Boxes that straddle the antimeridian are not split.

use crate::error::CatalogError;
use crate::TerritoryId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const BUILTIN_MAP: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../assets/territories.yaml"
));

/// Axis-aligned latitude/longitude box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f64,
    /// Western edge.
    pub min_lng: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Eastern edge.
    pub max_lng: f64,
}

impl BoundingBox {
    /// Build a box from its corners.
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
        }
    }

    /// Finite and not inverted.
    pub fn is_valid(&self) -> bool {
        [self.min_lat, self.min_lng, self.max_lat, self.max_lng]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lat <= self.max_lat
            && self.min_lng <= self.max_lng
    }

    /// Boxes intersect when they overlap or share an edge.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lng <= other.max_lng
            && other.min_lng <= self.max_lng
    }

    /// Geometric center as (lat, lng).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// A conquerable region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    /// Stable id.
    pub id: TerritoryId,
    /// Display name as reported by the map source.
    pub name: String,
    /// Boundary approximation.
    pub bounds: BoundingBox,
}

#[derive(Deserialize)]
struct MapFile {
    territories: Vec<Territory>,
}

/// All territories known to the map data source.
#[derive(Clone, Debug, Default)]
pub struct TerritoryMap {
    territories: BTreeMap<TerritoryId, Territory>,
}

impl TerritoryMap {
    /// The world map bundled with the game.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_MAP)
    }

    /// Parse a `territories:` list from YAML.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let file: MapFile = serde_yaml::from_str(text)?;
        Self::from_territories(file.territories)
    }

    /// Build a map, rejecting duplicate ids and invalid boxes.
    pub fn from_territories(
        list: impl IntoIterator<Item = Territory>,
    ) -> Result<Self, CatalogError> {
        let mut territories = BTreeMap::new();
        for t in list {
            if !t.bounds.is_valid() {
                return Err(CatalogError::InvalidBounds(t.id.0.clone()));
            }
            let id = t.id.clone();
            if territories.insert(id.clone(), t).is_some() {
                return Err(CatalogError::Duplicate(id.0));
            }
        }
        Ok(Self { territories })
    }

    /// Look up by id.
    pub fn get(&self, id: &TerritoryId) -> Option<&Territory> {
        self.territories.get(id)
    }

    /// Resolve free text to a territory: exact id first, then a
    /// case-insensitive match on id or display name.
    pub fn resolve(&self, query: &str) -> Option<&Territory> {
        let query = query.trim();
        if let Some(t) = self.territories.get(&TerritoryId::from(query)) {
            return Some(t);
        }
        self.territories.values().find(|t| {
            t.id.0.eq_ignore_ascii_case(query) || t.name.to_lowercase() == query.to_lowercase()
        })
    }

    /// Iterate territories in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Territory> {
        self.territories.values()
    }

    /// Number of territories.
    pub fn len(&self) -> usize {
        self.territories.len()
    }

    /// True when the map holds no territories.
    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn builtin_map_loads() {
        let map = TerritoryMap::builtin().unwrap();
        assert!(map.len() >= 10);
        let france = map.resolve("france").unwrap();
        assert_eq!(france.id, TerritoryId::from("fra"));
        assert_eq!(map.resolve("FRA").unwrap().name, "France");
        assert!(map.resolve("Atlantis").is_none());
    }

    #[test]
    fn neighbours_intersect_distant_do_not() {
        let map = TerritoryMap::builtin().unwrap();
        let fra = map.resolve("France").unwrap();
        let esp = map.resolve("Spain").unwrap();
        let chn = map.resolve("China").unwrap();
        assert!(fra.bounds.intersects(&esp.bounds));
        assert!(!fra.bounds.intersects(&chn.bounds));
    }

    #[test]
    fn inverted_box_rejected() {
        let bad = Territory {
            id: TerritoryId::from("x"),
            name: "X".into(),
            bounds: BoundingBox::new(10.0, 0.0, 5.0, 1.0),
        };
        assert!(matches!(
            TerritoryMap::from_territories([bad]),
            Err(CatalogError::InvalidBounds(_))
        ));
    }

    #[test]
    fn shared_edge_counts_as_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(1.0, 0.5, 2.0, 2.0);
        assert!(a.intersects(&b));
    }

    proptest! {
        #[test]
        fn intersection_is_symmetric(a in -80.0f64..80.0, b in -170.0f64..170.0,
                                     c in -80.0f64..80.0, d in -170.0f64..170.0,
                                     h in 0.0f64..20.0, w in 0.0f64..20.0) {
            let x = BoundingBox::new(a, b, a + h, b + w);
            let y = BoundingBox::new(c, d, c + w, d + h);
            prop_assert_eq!(x.intersects(&y), y.intersects(&x));
            prop_assert!(x.intersects(&x));
        }
    }
}
