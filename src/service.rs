// src/service.rs

use crate::types::from_epoch_millis;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Description of an image service as returned by `<service>?f=json`.
///
/// Only the commonly used keys are typed; everything else stays in `other`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: Option<String>,
    pub service_description: Option<String>,
    pub description: Option<String>,
    pub pixel_type: Option<String>,
    pub band_count: Option<u32>,
    pub has_multidimensions: Option<bool>,
    pub time_info: Option<TimeInfo>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeInfo {
    pub start_time_field: Option<String>,
    pub end_time_field: Option<String>,
    /// `[start, end]` in epoch milliseconds.
    pub time_extent: Option<Vec<Option<i64>>>,
}

impl ServiceInfo {
    /// Retrieves an untyped key of the service description and deserializes it into `T`.
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.other
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Returns the service's time extent as UTC datetimes, if it publishes one.
    pub fn time_extent(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let extent = self.time_info.as_ref()?.time_extent.as_ref()?;
        match extent.as_slice() {
            [Some(start), Some(end)] => Some((from_epoch_millis(*start)?, from_epoch_millis(*end)?)),
            _ => None,
        }
    }
}
