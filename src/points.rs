// src/points.rs

use crate::error::ImageServerError;
use crate::geometry::{Coordinates, Point, WGS84_WKID};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

// One row of a points file: `name,x,y[,wkid]`. Fields are spelled out since
// csv cannot deserialize numbers through `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
struct PointRow {
    name: String,
    #[serde(alias = "lon", alias = "longitude")]
    x: f64,
    #[serde(alias = "lat", alias = "latitude")]
    y: f64,
    #[serde(default)]
    wkid: Option<u32>,
}

/// Reads query points from a CSV file with a `name,x,y[,wkid]` header.
///
/// `lon`/`longitude` and `lat`/`latitude` are accepted for `x` and `y`;
/// a missing `wkid` column means WGS84.
pub fn read_points<P: AsRef<Path>>(path: P) -> Result<Vec<Point>, ImageServerError> {
    let file = std::fs::File::open(path.as_ref())?;
    let points = read_points_from(file)?;
    log::info!(
        "Read {} points from {}",
        points.len(),
        path.as_ref().display()
    );
    Ok(points)
}

/// Reads query points from any CSV source. See [`read_points`].
pub fn read_points_from<R: Read>(reader: R) -> Result<Vec<Point>, ImageServerError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut points = Vec::new();
    for row in csv_reader.deserialize() {
        let row: PointRow = row?;
        if row.name.is_empty() {
            return Err(ImageServerError::InvalidInput(format!(
                "point at ({}, {}) has an empty name",
                row.x, row.y
            )));
        }
        let wkid = row.wkid.unwrap_or(WGS84_WKID);
        points.push(Point::new(row.name, Coordinates::new(row.x, row.y, wkid)));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_points_with_wkid() {
        let data = "name,x,y,wkid\nSacramento,-121.49,38.58,4326\nUTM point, 500000 , 4649776 ,32610\n";
        let points = read_points_from(data.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], Point::new("Sacramento", Coordinates::wgs84(-121.49, 38.58)));
        assert_eq!(points[1].coordinates.wkid, 32610);
        assert_eq!(points[1].coordinates.x, 500000.0);
    }

    #[test]
    fn test_read_points_lat_lon_aliases_default_wkid() {
        let data = "name,lat,lon\nDenver,39.74,-104.99\n";
        let points = read_points_from(data.as_bytes()).unwrap();
        assert_eq!(points, vec![Point::new("Denver", Coordinates::wgs84(-104.99, 39.74))]);
    }

    #[test]
    fn test_read_points_rejects_bad_rows() {
        assert!(read_points_from("name,x,y\nA,not-a-number,1\n".as_bytes()).is_err());
        assert!(read_points_from("name,x,y\n,1,2\n".as_bytes()).is_err());
    }
}
