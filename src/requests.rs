// src/requests.rs
use crate::error::ImageServerError;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

impl crate::ImageServerClient {
    /// Resolves `endpoint` against the service URL. An empty endpoint is the service itself.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url, ImageServerError> {
        let endpoint = endpoint.trim_matches('/');
        let full = if endpoint.is_empty() {
            self.service_url.clone()
        } else {
            format!("{}/{}", self.service_url, endpoint)
        };
        Url::parse(&full).map_err(|e| {
            ImageServerError::InvalidUrl(format!(
                "Failed to build URL for endpoint '{}' from service URL '{}': {}",
                endpoint, self.service_url, e
            ))
        })
    }

    // Central GET helper. ArcGIS reports errors in the body, often with HTTP 200,
    // so every JSON body is checked for an `error` object before deserializing.
    pub(crate) async fn _get_with_url_params<R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<R, ImageServerError> {
        let mut full_url = self.endpoint_url(endpoint)?;
        if !params.is_empty() {
            let mut pairs = full_url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        log::debug!("GET {}", full_url.as_str());

        let response = self
            .http_client
            .get(full_url.clone())
            .send()
            .await
            .map_err(ImageServerError::ReqwestError)?;

        let status = response.status();
        log::debug!("Response status {} from {}", status, full_url.as_str());

        let body_bytes = response.bytes().await.map_err(ImageServerError::ReqwestError)?;

        if !status.is_success() {
            let body_string = String::from_utf8_lossy(&body_bytes).to_string();
            log::warn!(
                "Request failed with status {} and body: {}",
                status,
                body_string
            );
            let error_body = match serde_json::from_slice::<Value>(&body_bytes) {
                Ok(json_value) => json_value,
                Err(_) => serde_json::json!({
                    "error": {
                        "code": status.as_u16(),
                        "message": format!("HTTP error {} with non-JSON body", status),
                        "details": [body_string.chars().take(100).collect::<String>()]
                    }
                }),
            };
            return Err(ImageServerError::from_response(status.as_u16(), error_body));
        }

        let body: Value = serde_json::from_slice(&body_bytes).map_err(|e| {
            log::error!(
                "Response from '{}' is not JSON. Error: {}. Body: {}",
                full_url,
                e,
                String::from_utf8_lossy(&body_bytes)
            );
            ImageServerError::UnexpectedResponse(format!(
                "Response from '{}' is not JSON: {}",
                full_url, e
            ))
        })?;

        if body.get("error").is_some() {
            log::warn!("Service returned an error payload: {}", body);
            return Err(ImageServerError::from_response(status.as_u16(), body));
        }

        serde_json::from_value::<R>(body).map_err(|e| {
            ImageServerError::JsonDeserializationFailed(format!(
                "Failed to deserialize response from '{}': {}",
                full_url, e
            ))
        })
    }
}
