// src/client.rs

use crate::error::ImageServerError;
use crate::geometry::Point;
use crate::identify::{IdentifyParams, IdentifyResult, LengthMismatch};
use crate::sampler::Sampler;
use crate::service::ServiceInfo;
use crate::SamplerConfig;

use chrono::Utc;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;

/// The client for querying an ArcGIS REST image service.
///
/// `ImageServerClient` holds the normalized service URL (the `.../ImageServer`
/// resource) and an underlying `reqwest::Client`. Each call to
/// [`identify`](ImageServerClient::identify) issues one GET request to the
/// service's `identify` endpoint and maps the response onto an [`IdentifyResult`].
///
/// ```rust,no_run
/// use imageserver_rs::{Coordinates, ImageServerClient, ImageServerError, Point};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), ImageServerError> {
/// let client = ImageServerClient::new(
///     "https://mapservices.weather.noaa.gov/raster/rest/services/air_quality/ndgd_apm25_hr01_bc/ImageServer",
///     None,
/// )?;
///
/// let point = Point::new("Sacramento", Coordinates::wgs84(-121.49, 38.58));
/// let result = client.identify(&point).await?;
/// for raster in &result.rasters {
///     println!("{:?} {}", raster.idp_validtime, raster.value);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ImageServerClient {
    pub service_url: String,
    pub(crate) http_client: Client,
    pub(crate) on_mismatch: LengthMismatch,
}

impl ImageServerClient {
    /// Creates a new client for the image service at `service_url`.
    ///
    /// The URL is normalized: a missing scheme becomes `https://`, and trailing
    /// slashes as well as a trailing `/identify` are removed, so both the service
    /// URL and its identify endpoint are accepted.
    ///
    /// # Arguments
    ///
    /// * `service_url`: The `.../ImageServer` URL of the service.
    /// * `timeout`: Optional. Total timeout for each request.
    pub fn new(service_url: &str, timeout: Option<Duration>) -> Result<Self, ImageServerError> {
        let mut temp_url_string = service_url.trim().to_string();

        if !temp_url_string.starts_with("http://") && !temp_url_string.starts_with("https://") {
            temp_url_string = format!("https://{}", temp_url_string);
        }

        let parsed_service_url = Url::parse(&temp_url_string)?;

        if parsed_service_url.cannot_be_a_base() || parsed_service_url.host_str().is_none() {
            return Err(ImageServerError::InvalidUrl(format!(
                "The service_url '{}' resolved to '{}', which is not a usable service URL.",
                service_url, parsed_service_url
            )));
        }

        let mut final_service_url = parsed_service_url.as_str().trim_end_matches('/').to_string();
        if let Some(stripped) = final_service_url.strip_suffix("/identify") {
            final_service_url = stripped.trim_end_matches('/').to_string();
        }

        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http_client = builder.build().map_err(ImageServerError::ReqwestError)?;

        log::debug!(
            "ImageServerClient initialized with service_url: {}",
            final_service_url
        );

        Ok(Self {
            service_url: final_service_url,
            http_client,
            on_mismatch: LengthMismatch::default(),
        })
    }

    /// Sets how responses with unequal pixel value and catalog item counts are handled.
    pub fn set_length_mismatch(&mut self, policy: LengthMismatch) -> &mut Self {
        self.on_mismatch = policy;
        self
    }

    pub fn length_mismatch(&self) -> LengthMismatch {
        self.on_mismatch
    }

    /// Identifies the pixels under `point` with the default parameters
    /// (pixel values and catalog items, no geometry).
    pub async fn identify(&self, point: &Point) -> Result<IdentifyResult, ImageServerError> {
        let params = IdentifyParams::for_coordinates(&point.coordinates);
        self.identify_with(point, &params).await
    }

    /// Identifies the pixels under `point` with explicit parameters.
    ///
    /// # Returns
    ///
    /// An `IdentifyResult` holding the sorted rasters, the raw response and the
    /// request time. A service error payload is returned as
    /// [`ImageServerError::ServiceError`] carrying the error body.
    pub async fn identify_with(
        &self,
        point: &Point,
        params: &IdentifyParams,
    ) -> Result<IdentifyResult, ImageServerError> {
        let requested_at = Utc::now();
        let content: Value = self
            ._get_with_url_params("identify", &params.build_query_params())
            .await?;
        let result =
            IdentifyResult::from_content(point.clone(), content, requested_at, self.on_mismatch)?;
        log::info!(
            "Identified {} rasters for '{}'",
            result.rasters.len(),
            point.name
        );
        Ok(result)
    }

    /// Fetches the service description (`<service>?f=json`).
    pub async fn service_info(&self) -> Result<ServiceInfo, ImageServerError> {
        let params = vec![("f".to_string(), "json".to_string())];
        self._get_with_url_params("", &params).await
    }

    /// Returns a `Sampler` that runs identify requests for a list of points and
    /// writes one CSV file per point.
    pub fn sampler(&self, config: &SamplerConfig) -> Sampler<'_> {
        Sampler::new(self, config)
    }
}
