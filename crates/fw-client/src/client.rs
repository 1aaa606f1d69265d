//! One-shot detection requests over HTTP.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, warn};

use fw_models::{BatchInput, DetectionParameters, DetectionResult, VideoEntry};

use crate::config::DetectClientConfig;
use crate::error::{ClientError, ClientResult};

/// Client for the detection service's batch endpoints.
pub struct DetectClient {
    http: Client,
    config: DetectClientConfig,
}

impl DetectClient {
    /// Create a new client.
    pub fn new(config: DetectClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(DetectClientConfig::from_env())
    }

    pub fn config(&self) -> &DetectClientConfig {
        &self.config
    }

    /// Submit one batch input and normalize the response.
    ///
    /// Parameters are clamped into range before transmission. Invalid
    /// inputs are rejected before any network call.
    pub async fn submit(
        &self,
        input: &BatchInput,
        params: &DetectionParameters,
    ) -> ClientResult<DetectionResult> {
        input.validate()?;

        debug!(kind = input.kind(), "submitting batch detection request");
        match input {
            BatchInput::Image(bytes) => {
                let annotated = self.detect_image(bytes.clone(), params).await?;
                Ok(DetectionResult::annotated_image(annotated))
            }
            BatchInput::Video(bytes) => {
                let entries = self.detect_video(bytes.clone(), params).await?;
                Ok(DetectionResult::video_annotation(entries))
            }
            BatchInput::RemoteUrl(url) => {
                let annotated = self.detect_url(url, params).await?;
                Ok(DetectionResult::annotated_image(annotated))
            }
        }
    }

    /// `POST /detect/image`: multipart image upload, annotated image back.
    pub async fn detect_image(
        &self,
        bytes: Vec<u8>,
        params: &DetectionParameters,
    ) -> ClientResult<Vec<u8>> {
        let params = params.clamped();
        let url = format!("{}/detect/image", self.config.base_url);

        let response = self
            .with_retry(|| async {
                let form = param_fields(Form::new(), &params)
                    .part("image", Part::bytes(bytes.clone()).file_name("frame.jpg"));
                self.http
                    .post(&url)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| self.map_send_error(e))
            })
            .await?;

        let response = check_status(response).await?;
        Ok(response.bytes().await.map_err(ClientError::Network)?.to_vec())
    }

    /// `POST /detect/video`: multipart video upload, per-frame detections
    /// back as a JSON array.
    pub async fn detect_video(
        &self,
        bytes: Vec<u8>,
        params: &DetectionParameters,
    ) -> ClientResult<Vec<VideoEntry>> {
        let params = params.clamped();
        let url = format!("{}/detect/video", self.config.base_url);

        let response = self
            .with_retry(|| async {
                let form = param_fields(Form::new(), &params)
                    .part("video", Part::bytes(bytes.clone()).file_name("input.mp4"));
                self.http
                    .post(&url)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| self.map_send_error(e))
            })
            .await?;

        let response = check_status(response).await?;
        let entries: Vec<VideoEntry> = response.json().await.map_err(ClientError::Network)?;
        Ok(entries)
    }

    /// `POST /detect/url`: JSON body, annotated image back.
    pub async fn detect_url(
        &self,
        remote_url: &str,
        params: &DetectionParameters,
    ) -> ClientResult<Vec<u8>> {
        let params = params.clamped();
        let url = format!("{}/detect/url", self.config.base_url);
        let body = serde_json::json!({
            "url": remote_url,
            "conf": params.confidence,
            "iou": params.iou,
            "imgsz": params.image_size,
        });

        let response = self
            .with_retry(|| async {
                self.http
                    .post(&url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| self.map_send_error(e))
            })
            .await?;

        let response = check_status(response).await?;
        Ok(response.bytes().await.map_err(ClientError::Network)?.to_vec())
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.config.timeout.as_secs())
        } else {
            ClientError::Network(e)
        }
    }

    /// Execute with retry logic for retryable failures. The last attempt's
    /// error is returned as-is.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> ClientResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ClientResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "batch request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Exponential backoff, capped so large retry counts cannot overflow the
/// shift.
fn backoff_delay(attempt: u32) -> std::time::Duration {
    std::time::Duration::from_millis(500 * 2u64.pow(attempt.min(10)))
}

/// Attach the conf/iou/imgsz text fields the service expects.
fn param_fields(form: Form, params: &DetectionParameters) -> Form {
    form.text("conf", params.confidence.to_string())
        .text("iou", params.iou.to_string())
        .text("imgsz", params.image_size.to_string())
}

/// Map a non-2xx response into a status error carrying the body text.
async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
