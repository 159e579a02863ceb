//! GeoJSON containment.
//!
//! The specification carries a GeoJSON `Point` or `Polygon` under
//! `"geojson"`; the message value is itself a GeoJSON `Point` or `Polygon`.
//! The predicate matches when the message geometry is within the
//! specification geometry.
//!
//! ```json
//! {
//!   "__match__": "geojson-within",
//!   "geojson": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]}
//! }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::matcher::geometry::{Geometry, Point, Polygon, PolygonError};

/// Registration name.
pub const WITHIN_NAME: &str = "geojson-within";

/// Why a GeoJSON value could not be turned into a [`Geometry`].
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// Missing `"geojson"` object in the specification.
    #[error("match specification has no `geojson` object")]
    MissingSpecGeometry,

    /// Not a `Point` or `Polygon`, or malformed coordinates.
    #[error("unsupported or malformed GeoJSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// No coordinates at all.
    #[error("GeoJSON geometry has no coordinates")]
    Empty,

    /// A position with fewer than two components.
    #[error("GeoJSON position needs at least two components")]
    ShortPosition,

    /// A polygon with inner rings.
    #[error("GeoJSON polygons with holes are not supported")]
    Holes,

    /// Ring too small to enclose an area.
    #[error(transparent)]
    Polygon(#[from] PolygonError),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJson {
    Point { coordinates: Vec<f64> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
}

/// Decodes a GeoJSON `Point` or `Polygon` object.
///
/// # Errors
///
/// Returns a [`GeometryError`] for any other type, malformed coordinates,
/// or polygons with holes.
pub fn decode(value: &Value) -> Result<Geometry, GeometryError> {
    match GeoJson::deserialize(value)? {
        GeoJson::Point { coordinates } => Ok(Geometry::Point(position(&coordinates)?)),
        GeoJson::Polygon { coordinates } => {
            let mut rings = coordinates.into_iter();
            let outer = rings.next().ok_or(GeometryError::Empty)?;
            if rings.next().is_some() {
                return Err(GeometryError::Holes);
            }
            let ring = outer
                .iter()
                .map(|p| position(p))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Geometry::Polygon(Polygon::new(ring)?))
        }
    }
}

fn position(coordinates: &[f64]) -> Result<Point, GeometryError> {
    match coordinates {
        [] => Err(GeometryError::Empty),
        [x, y, ..] => Ok(Point::new(*x, *y)),
        [_] => Err(GeometryError::ShortPosition),
    }
}

/// `geojson-within` predicate. Any decode failure is a non-match.
#[must_use]
pub fn geojson_within(value: &Value, spec: &Map<String, Value>) -> bool {
    match evaluate(value, spec) {
        Ok(within) => within,
        Err(err) => {
            tracing::debug!(extension = WITHIN_NAME, %err, "geojson predicate failed closed");
            false
        }
    }
}

fn evaluate(value: &Value, spec: &Map<String, Value>) -> Result<bool, GeometryError> {
    let region = spec
        .get("geojson")
        .filter(|v| v.is_object())
        .ok_or(GeometryError::MissingSpecGeometry)?;
    let region = decode(region)?;
    let candidate = decode(value)?;
    Ok(candidate.within(&region))
}
