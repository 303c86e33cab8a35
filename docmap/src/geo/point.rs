use crate::document::{Document, Value};
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A 2D point. `x` is the longitude and `y` the latitude when the point is
/// geographic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point at the given coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a geographic point, validating the coordinate ranges.
    ///
    /// # Errors
    /// Returns an error if the latitude is outside -90..=90 or the longitude
    /// outside -180..=180.
    pub fn geographic(longitude: f64, latitude: f64) -> DocmapResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            log::error!("Latitude {} out of range", latitude);
            return Err(DocmapError::new(
                &format!("Latitude must be between -90 and 90, got {}", latitude),
                ErrorKind::ValidationError,
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            log::error!("Longitude {} out of range", longitude);
            return Err(DocmapError::new(
                &format!("Longitude must be between -180 and 180, got {}", longitude),
                ErrorKind::ValidationError,
            ));
        }
        Ok(Self::new(longitude, latitude))
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Legacy coordinate pair encoding: `[x, y]`.
    pub fn to_legacy_pair(&self) -> Value {
        Value::Array(vec![Value::F64(self.x), Value::F64(self.y)])
    }

    /// GeoJSON encoding: `{ "type": "Point", "coordinates": [x, y] }`.
    pub fn to_geo_json(&self) -> DocmapResult<Document> {
        let mut doc = Document::new();
        doc.put("type", "Point")?;
        doc.put("coordinates", self.to_legacy_pair())?;
        Ok(doc)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POINT({} {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_pair_is_x_then_y() {
        let point = Point::new(-73.99, 40.73);
        assert_eq!(
            point.to_legacy_pair(),
            Value::Array(vec![Value::F64(-73.99), Value::F64(40.73)])
        );
    }

    #[test]
    fn geo_json_has_type_and_coordinates() {
        let doc = Point::new(1.0, 2.0).to_geo_json().unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["type", "coordinates"]);
        assert_eq!(doc.get("type"), Some(&Value::from("Point")));
    }

    #[test]
    fn geographic_validates_ranges() {
        assert!(Point::geographic(-93.265, 45.0).is_ok());
        let err = Point::geographic(0.0, 91.0).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert!(Point::geographic(181.0, 0.0).is_err());
    }

    #[test]
    fn display_uses_wkt() {
        assert_eq!(Point::new(1.0, 2.5).to_string(), "POINT(1 2.5)");
    }
}
