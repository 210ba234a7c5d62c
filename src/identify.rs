// src/identify.rs

use crate::error::ImageServerError;
use crate::geometry::{Coordinates, Point};
use crate::raster::{sort_rasters, Raster};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// What to do when an identify response lists a different number of pixel values
/// than catalog items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthMismatch {
    /// Return [`ImageServerError::LengthMismatch`].
    Fail,
    /// Log a warning and pair values with items up to the shorter list.
    #[default]
    Warn,
}

impl FromStr for LengthMismatch {
    type Err = ImageServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "error" => Ok(LengthMismatch::Fail),
            "warn" | "warning" => Ok(LengthMismatch::Warn),
            other => Err(ImageServerError::InvalidInput(format!(
                "unknown length mismatch policy '{}', expected 'fail' or 'warn'",
                other
            ))),
        }
    }
}

/// Query parameters of an image service `identify` request.
///
/// The defaults ask for pixel values and catalog items of a single point and
/// leave out the geometry of the result.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifyParams {
    geometry: String,
    return_geometry: bool,
    return_catalog_items: bool,
    return_pixel_values: bool,
    process_as_multidimensional: bool,
    mosaic_rule: Option<Value>,
    rendering_rule: Option<Value>,
    pixel_size: Option<(f64, f64)>,
    time: Option<(DateTime<Utc>, DateTime<Utc>)>,
    max_item_count: Option<u32>,
}

impl IdentifyParams {
    /// Creates the parameters for identifying the pixels under `coordinates`.
    pub fn for_coordinates(coordinates: &Coordinates) -> Self {
        Self {
            geometry: coordinates.to_geometry_json(),
            return_geometry: false,
            return_catalog_items: true,
            return_pixel_values: true,
            process_as_multidimensional: false,
            mosaic_rule: None,
            rendering_rule: None,
            pixel_size: None,
            time: None,
            max_item_count: None,
        }
    }

    pub fn return_geometry(&mut self, value: bool) -> &mut Self {
        self.return_geometry = value;
        self
    }

    pub fn return_catalog_items(&mut self, value: bool) -> &mut Self {
        self.return_catalog_items = value;
        self
    }

    pub fn return_pixel_values(&mut self, value: bool) -> &mut Self {
        self.return_pixel_values = value;
        self
    }

    pub fn process_as_multidimensional(&mut self, value: bool) -> &mut Self {
        self.process_as_multidimensional = value;
        self
    }

    /// Sets the mosaic rule JSON, e.g. `{"mosaicMethod": "esriMosaicAttribute"}`.
    pub fn mosaic_rule(&mut self, rule: Value) -> &mut Self {
        self.mosaic_rule = Some(rule);
        self
    }

    /// Sets the raster function applied before identifying, e.g. `{"rasterFunction": "None"}`.
    pub fn rendering_rule(&mut self, rule: Value) -> &mut Self {
        self.rendering_rule = Some(rule);
        self
    }

    /// Sets the pixel size (in units of the request's spatial reference) at which to identify.
    pub fn pixel_size(&mut self, x: f64, y: f64) -> &mut Self {
        self.pixel_size = Some((x, y));
        self
    }

    /// Restricts the catalog items to those overlapping the given time range.
    pub fn time(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> &mut Self {
        self.time = Some((start, end));
        self
    }

    pub fn max_item_count(&mut self, count: u32) -> &mut Self {
        self.max_item_count = Some(count);
        self
    }

    /// Returns the query pairs in the order they are sent. Unset options are omitted.
    pub fn build_query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("geometry".to_string(), self.geometry.clone()),
            ("geometryType".to_string(), "esriGeometryPoint".to_string()),
            ("returnGeometry".to_string(), self.return_geometry.to_string()),
            (
                "returnCatalogItems".to_string(),
                self.return_catalog_items.to_string(),
            ),
            (
                "returnPixelValues".to_string(),
                self.return_pixel_values.to_string(),
            ),
            (
                "processAsMultidimensional".to_string(),
                self.process_as_multidimensional.to_string(),
            ),
        ];
        if let Some(rule) = &self.mosaic_rule {
            params.push(("mosaicRule".to_string(), rule.to_string()));
        }
        if let Some(rule) = &self.rendering_rule {
            params.push(("renderingRule".to_string(), rule.to_string()));
        }
        if let Some((x, y)) = self.pixel_size {
            params.push((
                "pixelSize".to_string(),
                serde_json::json!({ "x": x, "y": y }).to_string(),
            ));
        }
        if let Some((start, end)) = self.time {
            params.push((
                "time".to_string(),
                format!("{},{}", start.timestamp_millis(), end.timestamp_millis()),
            ));
        }
        if let Some(count) = self.max_item_count {
            params.push(("maxItemCount".to_string(), count.to_string()));
        }
        params.push(("f".to_string(), "json".to_string()));
        params
    }
}

/// The parts of an identify response that are mapped onto rasters.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResponse {
    pub name: Option<String>,
    pub value: Option<Value>,
    pub properties: Option<IdentifyProperties>,
    pub catalog_items: Option<CatalogItems>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IdentifyProperties {
    #[serde(rename = "Values", default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogItems {
    #[serde(default)]
    pub features: Vec<CatalogFeature>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogFeature {
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// All rasters returned for one point by one identify request.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct IdentifyResult {
    pub point: Point,
    pub rasters: Vec<Raster>,
    pub content: Value,
    pub requested_at: DateTime<Utc>,
}

impl IdentifyResult {
    /// Maps a raw identify response onto sorted rasters.
    ///
    /// Pixel values and catalog items are paired by list position. Without
    /// catalog items every pixel value becomes a raster with empty attributes.
    /// Only a response without a `properties` block falls back to its
    /// top-level `value`; an empty `Values` list yields no rasters.
    pub fn from_content(
        point: Point,
        content: Value,
        requested_at: DateTime<Utc>,
        on_mismatch: LengthMismatch,
    ) -> Result<Self, ImageServerError> {
        if content.get("error").is_some() {
            return Err(ImageServerError::from_response(200, content));
        }

        let response: IdentifyResponse =
            serde_json::from_value(content.clone()).map_err(|e| {
                ImageServerError::JsonDeserializationFailed(format!(
                    "identify response for '{}' has an unexpected layout: {}",
                    point.name, e
                ))
            })?;

        let has_properties = response.properties.is_some();
        let values = response
            .properties
            .map(|p| p.values)
            .unwrap_or_default();
        let features = response
            .catalog_items
            .map(|c| c.features)
            .unwrap_or_default();

        log::debug!(
            "Identify for '{}': {} values, {} catalog items",
            point.name,
            values.len(),
            features.len()
        );

        let mut rasters: Vec<Raster> = if values.is_empty() && features.is_empty() {
            match response.value {
                Some(v) if !has_properties && !v.is_null() => {
                    vec![Raster::new(point.clone(), pixel_text(&v), Map::new())]
                }
                _ => Vec::new(),
            }
        } else if features.is_empty() {
            // Catalog items were not requested (`catalogItems: null`).
            values
                .iter()
                .map(|v| Raster::new(point.clone(), pixel_text(v), Map::new()))
                .collect()
        } else {
            if values.len() != features.len() {
                match on_mismatch {
                    LengthMismatch::Fail => {
                        return Err(ImageServerError::LengthMismatch {
                            values: values.len(),
                            items: features.len(),
                        })
                    }
                    LengthMismatch::Warn => log::warn!(
                        "Identify for '{}' returned {} values but {} catalog items, pairing the first {}",
                        point.name,
                        values.len(),
                        features.len(),
                        values.len().min(features.len())
                    ),
                }
            }
            values
                .iter()
                .zip(features)
                .map(|(v, f)| Raster::new(point.clone(), pixel_text(v), f.attributes))
                .collect()
        };

        sort_rasters(&mut rasters);

        Ok(IdentifyResult {
            point,
            rasters,
            content,
            requested_at,
        })
    }
}

// Pixel values arrive as strings ("12.5", "NoData"); numbers are tolerated.
fn pixel_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
