//! Territory ownership: command post placement and adjacency.

use sim_core::{GameError, PlayerState, Territory, TerritoryId, TerritoryMap};
use tracing::info;

/// Place the command post. Only allowed while no territory is owned; the
/// post seeds ownership with that single territory.
pub fn place_command_post<'m>(
    state: &mut PlayerState,
    map: &'m TerritoryMap,
    target: &TerritoryId,
) -> Result<&'m Territory, GameError> {
    state.require_country()?;
    if state.command_post.is_some() || !state.owned_territories.is_empty() {
        return Err(GameError::AlreadyPlaced);
    }
    let territory = map
        .get(target)
        .ok_or_else(|| GameError::UnknownTerritory(target.0.clone()))?;
    state.command_post = Some(target.clone());
    state.owned_territories.insert(target.clone());
    info!(player = %state.name, territory = %territory.name, "command post placed");
    Ok(territory)
}

/// True when `target`'s bounding box intersects that of at least one owned
/// territory. Owned ids missing from the map are skipped.
pub fn is_adjacent(state: &PlayerState, map: &TerritoryMap, target: &TerritoryId) -> bool {
    let Some(target) = map.get(target) else {
        return false;
    };
    state
        .owned_territories
        .iter()
        .filter_map(|id| map.get(id))
        .any(|owned| owned.bounds.intersects(&target.bounds))
}

/// Unowned territories adjacent to the player's holdings.
pub fn attack_targets<'m>(state: &PlayerState, map: &'m TerritoryMap) -> Vec<&'m Territory> {
    map.iter()
        .filter(|t| !state.owned_territories.contains(&t.id))
        .filter(|t| is_adjacent(state, map, &t.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{player, strip_map};

    fn id(s: &str) -> TerritoryId {
        TerritoryId::from(s)
    }

    #[test]
    fn command_post_seeds_ownership_once() {
        let map = strip_map();
        let mut p = player("iran");
        let t = place_command_post(&mut p, &map, &id("wst")).unwrap();
        assert_eq!(t.name, "West");
        assert_eq!(p.command_post, Some(id("wst")));
        assert_eq!(p.owned_territories.len(), 1);

        let before = p.clone();
        assert_eq!(
            place_command_post(&mut p, &map, &id("mid")).unwrap_err(),
            GameError::AlreadyPlaced
        );
        assert_eq!(p, before);
    }

    #[test]
    fn unknown_territory_rejected() {
        let map = strip_map();
        let mut p = player("iran");
        assert_eq!(
            place_command_post(&mut p, &map, &id("zzz")).unwrap_err(),
            GameError::UnknownTerritory("zzz".into())
        );
        assert!(p.command_post.is_none());
    }

    #[test]
    fn adjacency_follows_bounding_boxes() {
        let map = strip_map();
        let mut p = player("iran");
        assert!(!is_adjacent(&p, &map, &id("mid")));
        place_command_post(&mut p, &map, &id("wst")).unwrap();
        assert!(is_adjacent(&p, &map, &id("mid")));
        assert!(!is_adjacent(&p, &map, &id("est")));
        let targets: Vec<_> = attack_targets(&p, &map).iter().map(|t| t.id.clone()).collect();
        assert_eq!(targets, vec![id("mid")]);

        p.owned_territories.insert(id("mid"));
        assert!(is_adjacent(&p, &map, &id("est")));
    }
}
