//! GeoJSON-compatible output types.

use serde::Serialize;
use serde_json::{Map, Value};

/// A `[longitude, latitude]` position
pub type Position = [f64; 2];

/// A closed ring: the first position equals the last
pub type Ring = Vec<Position>;

/// Feature geometry
///
/// Every ring is an outer boundary; holes are not modeled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Promote a list of rings: none gives `None`, one a polygon,
    /// several a multipolygon with one polygon per ring.
    pub fn from_rings(mut rings: Vec<Ring>) -> Option<Self> {
        match rings.len() {
            0 => None,
            1 => rings.pop().map(|ring| Geometry::Polygon(vec![ring])),
            _ => Some(Geometry::MultiPolygon(
                rings.into_iter().map(|ring| vec![ring]).collect(),
            )),
        }
    }

    /// All rings in order
    pub fn rings(&self) -> Vec<&Ring> {
        match self {
            Geometry::Polygon(rings) => rings.iter().collect(),
            Geometry::MultiPolygon(polygons) => polygons.iter().flatten().collect(),
        }
    }
}

/// One alert area ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    /// `None` for metadata-only areas
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Property value as a string, if present
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// GeoJSON FeatureCollection, features in archive order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl From<Vec<Feature>> for FeatureCollection {
    fn from(features: Vec<Feature>) -> Self {
        Self { features }
    }
}
