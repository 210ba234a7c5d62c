// src/geometry.rs

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Well-known ID of WGS84, the spatial reference assumed when none is given.
pub const WGS84_WKID: u32 = 4326;

fn default_wkid() -> u32 {
    WGS84_WKID
}

/// A location in a given spatial reference.
///
/// For geographic references such as WGS84 `x` is the longitude and `y` the latitude.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    #[serde(alias = "lon", alias = "longitude")]
    pub x: f64,
    #[serde(alias = "lat", alias = "latitude")]
    pub y: f64,
    #[serde(default = "default_wkid")]
    pub wkid: u32,
}

impl Coordinates {
    pub fn new(x: f64, y: f64, wkid: u32) -> Self {
        Coordinates { x, y, wkid }
    }

    /// Creates WGS84 coordinates from a longitude and a latitude.
    pub fn wgs84(longitude: f64, latitude: f64) -> Self {
        Coordinates::new(longitude, latitude, WGS84_WKID)
    }

    /// Serializes the coordinates as an ArcGIS REST point geometry, e.g.
    /// `{"x":-122.3,"y":47.6,"spatialReference":{"wkid":4326}}`.
    pub fn to_geometry_json(&self) -> String {
        json!({
            "x": self.x,
            "y": self.y,
            "spatialReference": { "wkid": self.wkid }
        })
        .to_string()
    }
}

/// A named query location.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Point {
    pub name: String,
    pub coordinates: Coordinates,
}

impl Point {
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Point {
            name: name.into(),
            coordinates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_json_uses_arcgis_point_layout() {
        let c = Coordinates::wgs84(-122.5, 47.25);
        assert_eq!(
            c.to_geometry_json(),
            r#"{"x":-122.5,"y":47.25,"spatialReference":{"wkid":4326}}"#
        );
    }

    #[test]
    fn test_geometry_json_keeps_custom_wkid() {
        let c = Coordinates::new(500000.0, 4649776.0, 32610);
        assert!(c.to_geometry_json().contains(r#""wkid":32610"#));
    }

    #[test]
    fn test_coordinates_deserialize_aliases_and_default_wkid() {
        let c: Coordinates = serde_json::from_str(r#"{"lon": 10.0, "lat": 20.0}"#).unwrap();
        assert_eq!(c, Coordinates::new(10.0, 20.0, 4326));
    }

    #[test]
    fn test_point_serialization() {
        let p = Point::new("Seattle", Coordinates::wgs84(-122.33, 47.61));
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["name"], "Seattle");
        assert_eq!(v["coordinates"]["wkid"], 4326);
    }
}
