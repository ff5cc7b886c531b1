//! Places: named geofenced areas with derived bounding boxes.
//!
//! A [`Place`] is loaded once per deployment epoch from a serde-friendly
//! [`PlaceDefinition`]. The polygon is immutable after load; the axis-aligned
//! [`BoundingBox`] is derived at load time and cached. Containment is a flat
//! bounding-box test, inclusive on all four edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::ATTR_TEMPERATURE;
use crate::error::{EngineError, Result};

/// A validated latitude/longitude pair.
///
/// Construction rejects out-of-range coordinates, so every `GeoPoint` that
/// reaches the stores is well-formed.
///
/// # Examples
///
/// ```
/// use waitpoint::types::GeoPoint;
///
/// let point = GeoPoint::new(22.0, 12.0).unwrap();
/// assert_eq!(point.lat, 22.0);
/// assert!(GeoPoint::new(91.0, 0.0).is_err());
/// assert!(GeoPoint::new(0.0, -180.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, [-180, 180].
    pub lon: f64,
}

impl GeoPoint {
    /// Validates and constructs a coordinate pair.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) || lat.is_nan() {
            return Err(EngineError::CoordinatesOutOfRange { lat, lon });
        }
        Ok(Self { lat, lon })
    }
}

/// Axis-aligned bounding box derived from a polygon.
///
/// # Examples
///
/// ```
/// use waitpoint::types::BoundingBox;
///
/// // lon/lat pairs, as supplied by the catalog
/// let bbox = BoundingBox::from_polygon(&[[10.0, 20.0], [15.0, 20.0], [15.0, 25.0], [10.0, 25.0]]).unwrap();
/// assert!(bbox.contains(22.0, 12.0));
/// // Edges are inclusive
/// assert!(bbox.contains(20.0, 10.0));
/// assert!(bbox.contains(25.0, 15.0));
/// assert!(!bbox.contains(22.0, 16.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western edge.
    pub min_lon: f64,
    /// Eastern edge.
    pub max_lon: f64,
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
}

impl BoundingBox {
    /// Derives the bounding box of a polygon given as `[lon, lat]` pairs.
    ///
    /// Returns `None` for an empty polygon.
    pub fn from_polygon(polygon: &[[f64; 2]]) -> Option<Self> {
        let first = polygon.first()?;
        let mut bbox = Self {
            min_lon: first[0],
            max_lon: first[0],
            min_lat: first[1],
            max_lat: first[1],
        };
        for point in &polygon[1..] {
            bbox.min_lon = bbox.min_lon.min(point[0]);
            bbox.max_lon = bbox.max_lon.max(point[0]);
            bbox.min_lat = bbox.min_lat.min(point[1]);
            bbox.max_lat = bbox.max_lat.max(point[1]);
        }
        Some(bbox)
    }

    /// Inclusive containment test on all four edges.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Catalog entry for a place, as deserialized from the deployment's place
/// catalog.
///
/// # Examples
///
/// ```
/// use waitpoint::types::PlaceDefinition;
///
/// let def: PlaceDefinition = serde_json::from_str(
///     r#"{"id": "dock", "name": "Dock", "polygon": [[10.0, 20.0], [15.0, 20.0], [15.0, 25.0]]}"#,
/// ).unwrap();
/// assert_eq!(def.id, "dock");
/// assert!(def.attributes.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceDefinition {
    /// Stable identifier referenced by wait-tasks.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Ordered `[lon, lat]` vertices. Must be non-empty.
    pub polygon: Vec<[f64; 2]>,
    /// Free-form attributes, e.g. a temperature source.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// A named geofenced area with its cached bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    /// Stable identifier referenced by wait-tasks.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Ordered `[lon, lat]` vertices, immutable after load.
    pub polygon: Vec<[f64; 2]>,
    /// Bounding box derived from the polygon at load time.
    pub bounding_box: BoundingBox,
    /// Free-form attributes carried through from the catalog.
    pub attributes: HashMap<String, String>,
}

impl Place {
    /// Builds a place from its catalog definition, deriving the bounding
    /// box. Rejects definitions with an empty polygon.
    pub fn from_definition(def: PlaceDefinition) -> Result<Self> {
        let bounding_box =
            BoundingBox::from_polygon(&def.polygon).ok_or_else(|| EngineError::InvalidPlace {
                place_id: def.id.clone(),
                reason: "polygon is empty".to_string(),
            })?;
        Ok(Self {
            id: def.id,
            name: def.name,
            polygon: def.polygon,
            bounding_box,
            attributes: def.attributes,
        })
    }

    /// Inclusive bounding-box containment test.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.bounding_box.contains(lat, lon)
    }

    /// Interprets the `temperature` attribute, if present.
    ///
    /// A numeric value is a static reading; anything else is treated as a
    /// URL to poll.
    pub fn temperature_source(&self) -> Option<TemperatureSource> {
        let raw = self.attributes.get(ATTR_TEMPERATURE)?;
        match raw.parse::<f64>() {
            Ok(value) => Some(TemperatureSource::Static(value)),
            Err(_) => Some(TemperatureSource::Url(raw.clone())),
        }
    }
}

/// Where a place's temperature reading comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TemperatureSource {
    /// A fixed value from the catalog.
    Static(f64),
    /// A URL to fetch the reading from.
    Url(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dock() -> Place {
        Place::from_definition(PlaceDefinition {
            id: "dock".to_string(),
            name: "Dock".to_string(),
            polygon: vec![[10.0, 20.0], [15.0, 20.0], [15.0, 25.0], [10.0, 25.0]],
            attributes: HashMap::new(),
        })
        .unwrap()
    }

    #[test]
    fn geo_point_accepts_extremes() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn geo_point_rejects_out_of_range() {
        assert!(matches!(
            GeoPoint::new(90.01, 0.0),
            Err(EngineError::CoordinatesOutOfRange { .. })
        ));
        assert!(matches!(
            GeoPoint::new(0.0, 180.01),
            Err(EngineError::CoordinatesOutOfRange { .. })
        ));
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn bbox_from_polygon_spans_all_vertices() {
        let bbox = BoundingBox::from_polygon(&[[12.0, 22.0], [10.0, 25.0], [15.0, 20.0]]).unwrap();
        assert_eq!(bbox.min_lon, 10.0);
        assert_eq!(bbox.max_lon, 15.0);
        assert_eq!(bbox.min_lat, 20.0);
        assert_eq!(bbox.max_lat, 25.0);
    }

    #[test]
    fn bbox_from_empty_polygon_is_none() {
        assert!(BoundingBox::from_polygon(&[]).is_none());
    }

    #[test]
    fn containment_is_boundary_inclusive() {
        let place = dock();
        // Interior
        assert!(place.contains(22.0, 12.0));
        // All four edges
        assert!(place.contains(20.0, 12.0));
        assert!(place.contains(25.0, 12.0));
        assert!(place.contains(22.0, 10.0));
        assert!(place.contains(22.0, 15.0));
        // Corner
        assert!(place.contains(20.0, 10.0));
        // Outside
        assert!(!place.contains(22.0, 16.0));
        assert!(!place.contains(19.9, 12.0));
    }

    #[test]
    fn empty_polygon_rejected_at_load() {
        let result = Place::from_definition(PlaceDefinition {
            id: "void".to_string(),
            name: "Void".to_string(),
            polygon: vec![],
            attributes: HashMap::new(),
        });
        assert!(matches!(
            result,
            Err(EngineError::InvalidPlace { place_id, .. }) if place_id == "void"
        ));
    }

    #[test]
    fn temperature_source_static_and_url() {
        let mut place = dock();
        assert_eq!(place.temperature_source(), None);

        place
            .attributes
            .insert(ATTR_TEMPERATURE.to_string(), "21.5".to_string());
        assert_eq!(
            place.temperature_source(),
            Some(TemperatureSource::Static(21.5))
        );

        place.attributes.insert(
            ATTR_TEMPERATURE.to_string(),
            "https://weather.example/dock".to_string(),
        );
        assert_eq!(
            place.temperature_source(),
            Some(TemperatureSource::Url(
                "https://weather.example/dock".to_string()
            ))
        );
    }
}
