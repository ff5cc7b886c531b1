//! Place registry and geofence resolver.
//!
//! The registry holds an immutable snapshot of the place catalog, loaded
//! once per deployment epoch. [`PlaceRegistry::reload`] swaps in a complete
//! new snapshot atomically: in-flight resolves observe either the old or
//! the new catalog, never a partial one.
//!
//! Resolution is flat bounding-box containment. When boxes overlap, the
//! first place in catalog order wins; this is the defined tie-break, not an
//! error. Unknown place ids resolve to `false`/`None` rather than failing:
//! absence of a place is a normal outcome.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::types::{Place, PlaceDefinition};

/// One immutable catalog generation.
#[derive(Debug, Default)]
struct PlaceSnapshot {
    /// Places in catalog order; resolution iterates this order.
    places: Vec<Place>,
    by_id: HashMap<String, usize>,
}

impl PlaceSnapshot {
    fn from_definitions(definitions: Vec<PlaceDefinition>) -> Result<Self> {
        let mut places = Vec::with_capacity(definitions.len());
        let mut by_id = HashMap::with_capacity(definitions.len());
        for def in definitions {
            let place = Place::from_definition(def)?;
            by_id.insert(place.id.clone(), places.len());
            places.push(place);
        }
        Ok(Self { places, by_id })
    }
}

/// Reloadable catalog of named geofenced areas.
///
/// # Examples
///
/// ```
/// use waitpoint::geofence::PlaceRegistry;
/// use waitpoint::types::PlaceDefinition;
///
/// let registry = PlaceRegistry::from_definitions(vec![PlaceDefinition {
///     id: "dock".to_string(),
///     name: "Dock".to_string(),
///     polygon: vec![[10.0, 20.0], [15.0, 20.0], [15.0, 25.0], [10.0, 25.0]],
///     attributes: Default::default(),
/// }])
/// .unwrap();
///
/// assert_eq!(registry.resolve(22.0, 12.0).map(|p| p.id), Some("dock".to_string()));
/// assert!(registry.resolve(22.0, 16.0).is_none());
/// assert!(registry.contains_area(22.0, 12.0, "dock"));
/// assert!(!registry.contains_area(22.0, 12.0, "unknown"));
/// ```
#[derive(Debug, Default)]
pub struct PlaceRegistry {
    snapshot: RwLock<Arc<PlaceSnapshot>>,
}

impl PlaceRegistry {
    /// Creates an empty registry. Every resolve misses until a catalog is
    /// loaded via [`reload`](Self::reload).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from catalog definitions, deriving bounding boxes.
    pub fn from_definitions(definitions: Vec<PlaceDefinition>) -> Result<Self> {
        let registry = Self::new();
        registry.reload(definitions)?;
        Ok(registry)
    }

    /// Atomically replaces the catalog with a new snapshot.
    ///
    /// On validation failure the previous snapshot stays in effect.
    pub fn reload(&self, definitions: Vec<PlaceDefinition>) -> Result<()> {
        let next = Arc::new(PlaceSnapshot::from_definitions(definitions)?);
        *self.snapshot.write() = next;
        Ok(())
    }

    /// Resolves a coordinate to the first containing place in catalog
    /// order, if any.
    pub fn resolve(&self, lat: f64, lon: f64) -> Option<Place> {
        let snapshot = self.snapshot.read().clone();
        snapshot
            .places
            .iter()
            .find(|place| place.contains(lat, lon))
            .cloned()
    }

    /// Tests containment against one named place. Unknown ids are `false`.
    pub fn contains_area(&self, lat: f64, lon: f64, place_id: &str) -> bool {
        let snapshot = self.snapshot.read().clone();
        snapshot
            .by_id
            .get(place_id)
            .map(|&idx| snapshot.places[idx].contains(lat, lon))
            .unwrap_or(false)
    }

    /// Looks up a place by id.
    pub fn get(&self, place_id: &str) -> Option<Place> {
        let snapshot = self.snapshot.read().clone();
        snapshot
            .by_id
            .get(place_id)
            .map(|&idx| snapshot.places[idx].clone())
    }

    /// Number of places in the current snapshot.
    pub fn len(&self) -> usize {
        self.snapshot.read().places.len()
    }

    /// `true` if the current snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot.read().places.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, polygon: Vec<[f64; 2]>) -> PlaceDefinition {
        PlaceDefinition {
            id: id.to_string(),
            name: id.to_string(),
            polygon,
            attributes: HashMap::new(),
        }
    }

    fn dock_and_yard() -> PlaceRegistry {
        PlaceRegistry::from_definitions(vec![
            def(
                "dock",
                vec![[10.0, 20.0], [15.0, 20.0], [15.0, 25.0], [10.0, 25.0]],
            ),
            def(
                "yard",
                vec![[14.0, 24.0], [18.0, 24.0], [18.0, 28.0], [14.0, 28.0]],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn resolve_first_match_wins_on_overlap() {
        let registry = dock_and_yard();
        // (24.5, 14.5) is inside both bboxes; dock is first in catalog order.
        let place = registry.resolve(24.5, 14.5).unwrap();
        assert_eq!(place.id, "dock");
    }

    #[test]
    fn resolve_misses_outside_all_places() {
        let registry = dock_and_yard();
        assert!(registry.resolve(0.0, 0.0).is_none());
    }

    #[test]
    fn contains_area_unknown_id_is_false() {
        let registry = dock_and_yard();
        assert!(!registry.contains_area(22.0, 12.0, "nowhere"));
    }

    #[test]
    fn contains_area_is_scoped_to_the_named_place() {
        let registry = dock_and_yard();
        assert!(registry.contains_area(22.0, 12.0, "dock"));
        assert!(!registry.contains_area(22.0, 12.0, "yard"));
    }

    #[test]
    fn reload_replaces_catalog_atomically() {
        let registry = dock_and_yard();
        registry
            .reload(vec![def(
                "depot",
                vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            )])
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve(22.0, 12.0).is_none());
        assert_eq!(registry.resolve(0.5, 0.5).unwrap().id, "depot");
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let registry = dock_and_yard();
        let result = registry.reload(vec![def("bad", vec![])]);
        assert!(result.is_err());
        assert_eq!(registry.len(), 2);
        assert!(registry.contains_area(22.0, 12.0, "dock"));
    }

    #[test]
    fn empty_registry_misses_everything() {
        let registry = PlaceRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.resolve(22.0, 12.0).is_none());
        assert!(!registry.contains_area(22.0, 12.0, "dock"));
        assert!(registry.get("dock").is_none());
    }
}
