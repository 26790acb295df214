//! Vision labeling client for the external image-labeling service.
//!
//! This crate provides the `VisionLabelClient` seam the orchestrator depends on
//! and an HTTP implementation of it. It handles:
//! - Downloading the image bytes behind an `ImageRef`
//! - Sending the bytes to the labeling endpoint
//! - Converting the response into ordered `Label`s
//! - Mapping every transport failure to `ServiceUnavailable`
//!
//! No retries are performed; a retry is a new user action.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use domain::{ImageRef, Label, PipelineError, Result};

const SERVICE: &str = "vision";

/// Anything that can turn an image reference into an ordered label list.
#[async_trait]
pub trait VisionLabelClient: Send + Sync {
    /// Detect labels in the referenced image.
    ///
    /// Returns the labels in the service's own order, possibly empty.
    async fn detect_labels(&self, image: &ImageRef) -> Result<Vec<Label>>;
}

/// Configuration for the HTTP labeling client
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Base URL of the labeling service (the client posts to `{base_url}/detect-labels`)
    pub base_url: String,
    /// Timeout applied to both the image download and the labeling call
    pub timeout: Duration,
    /// Upper bound on labels the service should return
    pub max_labels: u32,
    /// Minimum confidence (percent) the service should report
    pub min_confidence: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_owned(),
            timeout: Duration::from_secs(30),
            max_labels: 10,
            min_confidence: 70.0,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsRequest {
    image: ImagePayload,
    max_labels: u32,
    min_confidence: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ImagePayload {
    bytes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsResponse {
    #[serde(default)]
    labels: Vec<WireLabel>,
}

/// Label as reported on the wire; confidence is a percentage
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireLabel {
    name: String,
    confidence: f32,
}

impl From<WireLabel> for Label {
    fn from(wire: WireLabel) -> Self {
        Label::new(wire.name, wire.confidence / 100.0)
    }
}

/// HTTP client for the labeling service.
pub struct HttpVisionClient {
    client: Client,
    config: VisionConfig,
}

impl HttpVisionClient {
    /// Create a new client from configuration
    pub fn new(config: VisionConfig) -> Self {
        info!("Vision service configured at {}", config.base_url);
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// Get the base URL of the labeling service this client talks to.
    pub fn service_address(&self) -> &str {
        &self.config.base_url
    }

    /// Download the bytes behind an image reference
    async fn fetch_image_bytes(&self, image: &ImageRef) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(image.url())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!("Failed to download image {}: {}", image, e);
                PipelineError::unavailable(SERVICE, format!("image download failed: {e}"))
            })?;

        let bytes = response.bytes().await.map_err(|e| {
            error!("Failed to read image body {}: {}", image, e);
            PipelineError::unavailable(SERVICE, format!("image download failed: {e}"))
        })?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl VisionLabelClient for HttpVisionClient {
    #[instrument(skip(self, image), fields(image = %image))]
    async fn detect_labels(&self, image: &ImageRef) -> Result<Vec<Label>> {
        let bytes = self.fetch_image_bytes(image).await?;
        debug!("Downloaded {} bytes, requesting labels", bytes.len());

        let request = DetectLabelsRequest {
            image: ImagePayload {
                bytes: STANDARD.encode(&bytes),
            },
            max_labels: self.config.max_labels,
            min_confidence: self.config.min_confidence,
        };

        let url = format!("{}/detect-labels", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!("Labeling request failed: {}", e);
                PipelineError::unavailable(SERVICE, e)
            })?;

        let body: DetectLabelsResponse = response.json().await.map_err(|e| {
            error!("Invalid response from labeling service: {}", e);
            PipelineError::unavailable(SERVICE, format!("invalid response: {e}"))
        })?;

        let labels: Vec<Label> = body.labels.into_iter().map(Label::from).collect();
        debug!("Labeling service returned {} labels", labels.len());
        Ok(labels)
    }
}
