//! The media client: candidate iteration over planned endpoints.

use reqwest::Client;
use tracing::{debug, warn};

use crate::endpoints::{finalize_url, ApiConfig, EndpointPlan, ImageRequest, MediaKind};
use crate::error::{ClientError, ClientResult};

/// A fetched binary asset together with the candidate URL that produced it.
///
/// The URL is kept as the asset's stable, re-fetchable locator.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub source_url: String,
    pub bytes: Vec<u8>,
}

/// Client for the generative media API.
#[derive(Debug, Clone)]
pub struct MediaClient {
    http: Client,
    config: ApiConfig,
}

impl MediaClient {
    /// Create a client with the given API configuration.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Generate narrative text from a prompt.
    pub async fn generate_text(&self, prompt: &str) -> ClientResult<String> {
        let plan = EndpointPlan::text(&self.config, prompt);
        let media = self.fetch_first_ok(&plan).await?;
        Ok(String::from_utf8_lossy(&media.bytes).into_owned())
    }

    /// Generate one image, trying the plan's candidates in order.
    pub async fn generate_image(&self, request: &ImageRequest) -> ClientResult<FetchedMedia> {
        let plan = EndpointPlan::image(&self.config, request);
        self.fetch_first_ok(&plan).await
    }

    /// Generate narration audio for a text segment.
    pub async fn generate_audio(&self, text: &str, voice: &str) -> ClientResult<FetchedMedia> {
        let plan = EndpointPlan::audio(&self.config, text, voice);
        self.fetch_first_ok(&plan).await
    }

    /// Try each candidate in order; the first success status is accepted.
    ///
    /// Per-candidate failures are logged and swallowed; only full
    /// exhaustion surfaces, carrying the last error.
    async fn fetch_first_ok(&self, plan: &EndpointPlan) -> ClientResult<FetchedMedia> {
        let attempts = plan.candidates.len();
        let mut last_error = String::from("no candidates");

        for candidate in &plan.candidates {
            match self.fetch_candidate(plan.kind, candidate).await {
                Ok(media) => return Ok(media),
                Err(e) => {
                    debug!(kind = %plan.kind, url = %candidate, "endpoint failed: {e}");
                    last_error = e.to_string();
                }
            }
        }

        warn!(kind = %plan.kind, attempts, "all endpoints exhausted");
        Err(ClientError::all_endpoints_failed(
            plan.kind, attempts, last_error,
        ))
    }

    async fn fetch_candidate(&self, kind: MediaKind, candidate: &str) -> ClientResult<FetchedMedia> {
        let url = finalize_url(&self.config, candidate);
        let response = self
            .http
            .get(&url)
            .header("Referer", &self.config.referer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::BadStatus {
                kind,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedMedia {
            source_url: candidate.to_string(),
            bytes,
        })
    }
}
