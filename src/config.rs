// src/config.rs

use crate::identify::LengthMismatch;
use crate::ImageServerError;
use std::path::PathBuf;
use std::time::Duration;

/// NOAA NDGD hourly PM2.5 (bias corrected) forecast image service.
pub const DEFAULT_SERVICE_URL: &str =
    "https://mapservices.weather.noaa.gov/raster/rest/services/air_quality/ndgd_apm25_hr01_bc/ImageServer";

pub const ENV_SERVICE_URL: &str = "IMAGESERVER_URL";
pub const ENV_POINTS: &str = "IMAGESERVER_POINTS";
pub const ENV_OUTPUT_DIR: &str = "IMAGESERVER_OUTPUT_DIR";
pub const ENV_REQUEST_DELAY_MS: &str = "IMAGESERVER_REQUEST_DELAY_MS";
pub const ENV_TIMEOUT_SECS: &str = "IMAGESERVER_TIMEOUT_SECS";
pub const ENV_SKIP_EXISTING: &str = "IMAGESERVER_SKIP_EXISTING";
pub const ENV_ON_MISMATCH: &str = "IMAGESERVER_ON_MISMATCH";

/// Settings of a sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    /// The `.../ImageServer` URL to query.
    pub service_url: String,
    /// CSV file with the points to query.
    pub points_path: PathBuf,
    /// Directory receiving one CSV file per point.
    pub output_dir: PathBuf,
    /// Fixed pause between two consecutive identify requests.
    pub request_delay: Duration,
    /// Per-request timeout. `None` leaves reqwest's default.
    pub timeout: Option<Duration>,
    /// Skip points whose output file already exists.
    pub skip_existing: bool,
    pub on_mismatch: LengthMismatch,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            points_path: PathBuf::from("data/points.csv"),
            output_dir: PathBuf::from("output"),
            request_delay: Duration::from_secs(1),
            timeout: Some(Duration::from_secs(60)),
            skip_existing: true,
            on_mismatch: LengthMismatch::default(),
        }
    }
}

impl SamplerConfig {
    /// Loads the configuration from `IMAGESERVER_*` environment variables,
    /// falling back to the defaults for unset ones.
    pub fn from_env() -> Result<Self, ImageServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ImageServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SamplerConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_SERVICE_URL) {
            config.service_url = url;
        }
        if let Some(path) = get(ENV_POINTS) {
            config.points_path = PathBuf::from(path);
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(ms) = get(ENV_REQUEST_DELAY_MS) {
            config.request_delay = Duration::from_millis(parse_number(ENV_REQUEST_DELAY_MS, &ms)?);
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            let secs = parse_number(ENV_TIMEOUT_SECS, &secs)?;
            config.timeout = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }
        if let Some(flag) = get(ENV_SKIP_EXISTING) {
            config.skip_existing = parse_flag(ENV_SKIP_EXISTING, &flag)?;
        }
        if let Some(policy) = get(ENV_ON_MISMATCH) {
            config.on_mismatch = policy.parse()?;
        }
        Ok(config)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ImageServerError> {
    value.parse::<u64>().map_err(|e| {
        ImageServerError::ConfigError(format!("{} must be a non-negative integer, got '{}': {}", key, value, e))
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ImageServerError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ImageServerError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = SamplerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SamplerConfig::default());
        assert_eq!(config.service_url, DEFAULT_SERVICE_URL);
    }

    #[test]
    fn test_values_from_lookup() {
        let config = SamplerConfig::from_lookup(lookup(&[
            (ENV_SERVICE_URL, "http://localhost:9000/ImageServer"),
            (ENV_POINTS, "points.csv"),
            (ENV_OUTPUT_DIR, " out "),
            (ENV_REQUEST_DELAY_MS, "250"),
            (ENV_TIMEOUT_SECS, "0"),
            (ENV_SKIP_EXISTING, "no"),
            (ENV_ON_MISMATCH, "fail"),
        ]))
        .unwrap();
        assert_eq!(config.service_url, "http://localhost:9000/ImageServer");
        assert_eq!(config.points_path, PathBuf::from("points.csv"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.request_delay, Duration::from_millis(250));
        assert_eq!(config.timeout, None);
        assert!(!config.skip_existing);
        assert_eq!(config.on_mismatch, LengthMismatch::Fail);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(SamplerConfig::from_lookup(lookup(&[(ENV_REQUEST_DELAY_MS, "-5")])).is_err());
        assert!(SamplerConfig::from_lookup(lookup(&[(ENV_SKIP_EXISTING, "maybe")])).is_err());
        assert!(SamplerConfig::from_lookup(lookup(&[(ENV_ON_MISMATCH, "ignore")])).is_err());
    }
}
