// src/sampler.rs

use crate::client::ImageServerClient;
use crate::error::ImageServerError;
use crate::geometry::Point;
use crate::output::write_results;
use crate::SamplerConfig;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Turns a point name into a file stem: lowercase, with every run of other
/// characters replaced by a single `_`.
pub fn slug(name: &str) -> String {
    let lower = name.to_lowercase();
    let slug = NON_ALPHANUMERIC.replace_all(&lower, "_");
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "point".to_string()
    } else {
        slug.to_string()
    }
}

/// Outcome of a sampling run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Output files written in this run.
    pub written: Vec<PathBuf>,
    /// Names of points skipped because their output already existed.
    pub skipped: Vec<String>,
    /// Names of points whose request failed, with the error message.
    pub failed: Vec<(String, String)>,
    /// Names of points the service answered without any raster. Nothing is
    /// written for them, so the next run asks again.
    pub empty: Vec<String>,
    /// Total data rows written.
    pub rows: usize,
}

/// Runs identify requests for a list of points, one after the other, and
/// writes each point's rasters to `<output_dir>/<slug>.csv`.
///
/// An instance is obtained through [`ImageServerClient::sampler`].
#[derive(Debug)]
pub struct Sampler<'a> {
    client: &'a ImageServerClient,
    output_dir: PathBuf,
    request_delay: Duration,
    skip_existing: bool,
}

impl<'a> Sampler<'a> {
    pub(crate) fn new(client: &'a ImageServerClient, config: &SamplerConfig) -> Self {
        Sampler {
            client,
            output_dir: config.output_dir.clone(),
            request_delay: config.request_delay,
            skip_existing: config.skip_existing,
        }
    }

    /// The file that receives the rows of `point`.
    pub fn output_path(&self, point: &Point) -> PathBuf {
        self.output_dir.join(format!("{}.csv", slug(&point.name)))
    }

    /// Processes `points` in order.
    ///
    /// Points whose output file exists are skipped when `skip_existing` is set,
    /// which lets an interrupted run resume. The fixed request delay is slept
    /// between two requests. A failing request is logged and recorded in the
    /// summary; I/O errors while writing abort the run.
    pub async fn run(&self, points: &[Point]) -> Result<RunSummary, ImageServerError> {
        self.check_unique_outputs(points)?;
        std::fs::create_dir_all(&self.output_dir)?;

        let mut summary = RunSummary::default();
        let mut requested = false;

        for (i, point) in points.iter().enumerate() {
            let path = self.output_path(point);
            if self.skip_existing && path.exists() {
                log::info!(
                    "[{}/{}] Skipping '{}', {} exists",
                    i + 1,
                    points.len(),
                    point.name,
                    path.display()
                );
                summary.skipped.push(point.name.clone());
                continue;
            }

            if requested && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            requested = true;

            log::info!("[{}/{}] Identifying '{}'", i + 1, points.len(), point.name);
            match self.client.identify(point).await {
                Ok(result) if result.rasters.is_empty() => {
                    log::warn!(
                        "Identify for '{}' returned no rasters, nothing written",
                        point.name
                    );
                    summary.empty.push(point.name.clone());
                }
                Ok(result) => {
                    let rows = write_atomically(&path, std::slice::from_ref(&result))?;
                    summary.rows += rows;
                    summary.written.push(path);
                }
                Err(e) => {
                    log::error!("Identify for '{}' failed: {}", point.name, e);
                    summary.failed.push((point.name.clone(), e.to_string()));
                }
            }
        }

        log::info!(
            "Run finished: {} written, {} skipped, {} empty, {} failed, {} rows",
            summary.written.len(),
            summary.skipped.len(),
            summary.empty.len(),
            summary.failed.len(),
            summary.rows
        );
        Ok(summary)
    }

    fn check_unique_outputs(&self, points: &[Point]) -> Result<(), ImageServerError> {
        let mut seen: HashMap<PathBuf, &str> = HashMap::new();
        for point in points {
            if let Some(other) = seen.insert(self.output_path(point), &point.name) {
                return Err(ImageServerError::InvalidInput(format!(
                    "points '{}' and '{}' would write to the same file {}",
                    other,
                    point.name,
                    self.output_path(point).display()
                )));
            }
        }
        Ok(())
    }
}

// A partially written file must never look like a finished checkpoint.
fn write_atomically(
    path: &Path,
    results: &[crate::identify::IdentifyResult],
) -> Result<usize, ImageServerError> {
    let part = path.with_extension("csv.part");
    let written = write_results(&part, results)
        .and_then(|rows| std::fs::rename(&part, path).map(|_| rows).map_err(Into::into));
    if written.is_err() && part.exists() {
        if let Err(e) = std::fs::remove_file(&part) {
            log::warn!("Could not remove {}: {}", part.display(), e);
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coordinates;
    use crate::identify::{IdentifyResult, LengthMismatch};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Salt Lake City, UT"), "salt_lake_city_ut");
        assert_eq!(slug("  --Boise-- "), "boise");
        assert_eq!(slug("A/B\\C"), "a_b_c");
        assert_eq!(slug("***"), "point");
    }

    #[test]
    fn test_failed_write_leaves_no_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let point = Point::new("Reno", Coordinates::wgs84(-119.81, 39.53));
        let result = IdentifyResult::from_content(
            point,
            json!({ "value": "4.2" }),
            Utc::now(),
            LengthMismatch::Fail,
        )
        .unwrap();

        // A directory in place of the target makes the final rename fail.
        let path = dir.path().join("reno.csv");
        std::fs::create_dir(&path).unwrap();

        assert!(write_atomically(&path, std::slice::from_ref(&result)).is_err());
        assert!(!dir.path().join("reno.csv.part").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_write_atomically_renames_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let point = Point::new("Reno", Coordinates::wgs84(-119.81, 39.53));
        let result =
            IdentifyResult::from_content(point, json!({ "value": "4.2" }), Utc::now(), LengthMismatch::Fail)
                .unwrap();
        let path = dir.path().join("reno.csv");

        assert_eq!(write_atomically(&path, std::slice::from_ref(&result)).unwrap(), 1);
        assert!(path.is_file());
        assert!(!dir.path().join("reno.csv.part").exists());
    }

    #[tokio::test]
    async fn test_duplicate_slugs_are_rejected() {
        let client = ImageServerClient::new("http://127.0.0.1:9/ImageServer", None).unwrap();
        let config = SamplerConfig {
            output_dir: PathBuf::from("unused"),
            ..SamplerConfig::default()
        };
        let sampler = client.sampler(&config);
        let points = vec![
            Point::new("Las Vegas", Coordinates::wgs84(-115.14, 36.17)),
            Point::new("las-vegas", Coordinates::wgs84(-115.14, 36.17)),
        ];
        let err = sampler.run(&points).await.unwrap_err();
        assert!(matches!(err, ImageServerError::InvalidInput(_)));
        assert_eq!(
            sampler.output_path(&points[0]),
            PathBuf::from("unused").join("las_vegas.csv")
        );
    }
}
