// src/raster.rs

use crate::geometry::Point;
use crate::types::from_epoch_millis_value;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Catalog attribute holding the issue time of a forecast raster (epoch millis).
pub const ISSUED_DATE_ATTRIBUTE: &str = "idp_issueddate";
/// Catalog attribute holding the time a forecast raster is valid for (epoch millis).
pub const VALID_TIME_ATTRIBUTE: &str = "idp_validtime";

/// A single pixel value returned by an image service, together with the catalog
/// item it was read from and the point that was queried.
///
/// Serializes to the nested record that the CSV output flattens:
/// `location`, `idp_issueddate`, `idp_validtime`, `value`, `attributes`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Raster {
    #[serde(rename = "location")]
    pub point: Point,
    pub idp_issueddate: Option<DateTime<Utc>>,
    pub idp_validtime: Option<DateTime<Utc>>,
    pub value: String,
    pub attributes: Map<String, Value>,
}

impl Raster {
    /// Creates a raster, deriving its issue and valid times from the catalog attributes.
    pub fn new(point: Point, value: impl Into<String>, attributes: Map<String, Value>) -> Self {
        let idp_issueddate = from_epoch_millis_value(attributes.get(ISSUED_DATE_ATTRIBUTE));
        let idp_validtime = from_epoch_millis_value(attributes.get(VALID_TIME_ATTRIBUTE));
        Raster {
            point,
            idp_issueddate,
            idp_validtime,
            value: value.into(),
            attributes,
        }
    }

    /// Returns the pixel value as a number, or `None` for `NoData` and other non-numeric values.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok()
    }

    /// Compares two rasters by issue date, then valid time. Missing times sort first.
    pub fn cmp_time(&self, other: &Raster) -> Ordering {
        (self.idp_issueddate, self.idp_validtime).cmp(&(other.idp_issueddate, other.idp_validtime))
    }
}

/// Sorts rasters by `(idp_issueddate, idp_validtime)`, keeping service order for ties.
pub fn sort_rasters(rasters: &mut [Raster]) {
    rasters.sort_by(Raster::cmp_time);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinates;
    use chrono::TimeZone;
    use rand::seq::SliceRandom;
    use serde_json::json;

    fn attrs(issued: Value, valid: Value) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert(ISSUED_DATE_ATTRIBUTE.to_string(), issued);
        m.insert(VALID_TIME_ATTRIBUTE.to_string(), valid);
        m
    }

    fn point() -> Point {
        Point::new("Boise", Coordinates::wgs84(-116.2, 43.6))
    }

    #[test]
    fn test_new_converts_epoch_millis() {
        let r = Raster::new(
            point(),
            "7.5",
            attrs(json!(1_718_409_600_000i64), json!(1_718_413_200_000i64)),
        );
        assert_eq!(
            r.idp_issueddate,
            Some(Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(
            r.idp_validtime,
            Some(Utc.with_ymd_and_hms(2024, 6, 15, 1, 0, 0).unwrap())
        );
        assert_eq!(r.numeric_value(), Some(7.5));
    }

    #[test]
    fn test_null_times_stay_absent() {
        let r = Raster::new(point(), "NoData", attrs(Value::Null, Value::Null));
        assert!(r.idp_issueddate.is_none());
        assert!(r.idp_validtime.is_none());
        assert!(r.numeric_value().is_none());
    }

    #[test]
    fn test_sort_orders_by_issued_then_valid() {
        let hour = 3_600_000i64;
        let base = 1_718_409_600_000i64;
        let mut expected = Vec::new();
        expected.push(Raster::new(point(), "0", attrs(Value::Null, Value::Null)));
        for issued in 0..3 {
            for valid in 0..4 {
                expected.push(Raster::new(
                    point(),
                    format!("{}-{}", issued, valid),
                    attrs(
                        json!(base + issued * 24 * hour),
                        json!(base + issued * 24 * hour + valid * hour),
                    ),
                ));
            }
        }

        let mut shuffled = expected.clone();
        shuffled.shuffle(&mut rand::thread_rng());
        sort_rasters(&mut shuffled);

        let values: Vec<&str> = shuffled.iter().map(|r| r.value.as_str()).collect();
        let expected_values: Vec<&str> = expected.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, expected_values);
    }

    #[test]
    fn test_sort_is_stable_for_equal_times() {
        let a = attrs(json!(1_000), json!(2_000));
        let mut rasters = vec![
            Raster::new(point(), "first", a.clone()),
            Raster::new(point(), "second", a),
        ];
        sort_rasters(&mut rasters);
        assert_eq!(rasters[0].value, "first");
        assert_eq!(rasters[1].value, "second");
    }

    #[test]
    fn test_serializes_nested_record() {
        let r = Raster::new(point(), "3", attrs(json!(0), json!(0)));
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["location"]["name"], "Boise");
        assert_eq!(v["location"]["coordinates"]["x"], -116.2);
        assert_eq!(v["idp_issueddate"], "1970-01-01T00:00:00Z");
        assert_eq!(v["value"], "3");
        assert_eq!(v["attributes"][ISSUED_DATE_ATTRIBUTE], 0);
    }
}
