//! Endpoint planning for the generative media API.
//!
//! Each logical request resolves to an ordered list of candidate URLs,
//! best-quality first. Authentication and the proxy strategy are applied
//! uniformly when the request is finalized.

use serde::{Deserialize, Serialize};

/// Logical request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Text,
    Image,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MediaKind::Text => "text",
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
        };
        write!(f, "{s}")
    }
}

/// Requested image quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    #[default]
    High,
    Standard,
}

impl QualityTier {
    fn quality_param(&self) -> &'static str {
        match self {
            QualityTier::High => "best",
            QualityTier::Standard => "standard",
        }
    }

    fn enhance(&self) -> bool {
        matches!(self, QualityTier::High)
    }
}

impl std::str::FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(QualityTier::High),
            "standard" => Ok(QualityTier::Standard),
            other => Err(format!("unknown quality tier: {other}")),
        }
    }
}

/// How outbound requests reach the API.
///
/// The proxy variant routes through a forwarding service that takes the
/// percent-encoded target URL as its query; behaviorally equivalent to
/// direct fetching, useful where direct cross-origin calls are blocked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    #[default]
    Direct,
    Proxy {
        base: String,
    },
}

/// Connection parameters for the generative API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL for text and audio generation
    pub text_base: String,
    /// Base URL for image generation
    pub image_base: String,
    /// Shared-secret token, appended as a query parameter
    pub api_token: Option<String>,
    /// The single preflight-safe header sent with every request
    pub referer: String,
    pub strategy: FetchStrategy,
    /// Preferred image model
    pub image_model: String,
    /// Text model used for script generation
    pub text_model: String,
    /// Audio model used for narration
    pub audio_model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            text_base: "https://pollinations.ai/api/text".to_string(),
            image_base: "https://image.pollinations.ai/prompt".to_string(),
            api_token: None,
            referer: "https://slidecast.app".to_string(),
            strategy: FetchStrategy::Direct,
            image_model: "flux".to_string(),
            text_model: "openai".to_string(),
            audio_model: "openai-audio".to_string(),
        }
    }
}

impl ApiConfig {
    /// Read the token and optional overrides from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(token) = std::env::var("SLIDECAST_API_TOKEN") {
            if !token.is_empty() {
                config.api_token = Some(token);
            }
        }
        if let Ok(base) = std::env::var("SLIDECAST_TEXT_BASE_URL") {
            config.text_base = base;
        }
        if let Ok(base) = std::env::var("SLIDECAST_IMAGE_BASE_URL") {
            config.image_base = base;
        }
        if let Ok(proxy) = std::env::var("SLIDECAST_PROXY_BASE_URL") {
            if !proxy.is_empty() {
                config.strategy = FetchStrategy::Proxy { base: proxy };
            }
        }
        config
    }
}

/// Parameters for one image generation request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Raw prompt; sanitized during endpoint planning
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    /// Deterministic seed (the image's batch index)
    pub seed: u64,
    pub quality: QualityTier,
}

/// Ordered candidate URLs for one logical request.
#[derive(Debug, Clone)]
pub struct EndpointPlan {
    pub kind: MediaKind,
    pub candidates: Vec<String>,
}

impl EndpointPlan {
    /// Single-candidate plan for script text.
    pub fn text(config: &ApiConfig, prompt: &str) -> Self {
        let url = format!(
            "{}/{}?model={}",
            config.text_base,
            urlencoding::encode(prompt),
            config.text_model
        );
        Self {
            kind: MediaKind::Text,
            candidates: vec![url],
        }
    }

    /// Single-candidate plan for a narration segment.
    pub fn audio(config: &ApiConfig, text: &str, voice: &str) -> Self {
        let url = format!(
            "{}/{}?model={}&voice={}",
            config.text_base,
            urlencoding::encode(text),
            config.audio_model,
            voice
        );
        Self {
            kind: MediaKind::Audio,
            candidates: vec![url],
        }
    }

    /// Three-candidate plan for an image: preferred model with quality
    /// parameters, the cheaper turbo model, then a minimal last resort.
    pub fn image(config: &ApiConfig, request: &ImageRequest) -> Self {
        let prompt = crate::sanitize::clean_prompt(&request.prompt);
        let encoded = urlencoding::encode(&prompt).into_owned();
        let base = &config.image_base;
        let (w, h, seed) = (request.width, request.height, request.seed);

        let mut preferred = format!(
            "{base}/{encoded}?width={w}&height={h}&seed={seed}&model={}&quality={}&nologo=true",
            config.image_model,
            request.quality.quality_param()
        );
        if request.quality.enhance() {
            preferred.push_str("&enhance=true");
        }

        let turbo =
            format!("{base}/{encoded}?width={w}&height={h}&seed={seed}&model=turbo&nologo=true");
        let minimal = format!("{base}/{encoded}?seed={seed}");

        Self {
            kind: MediaKind::Image,
            candidates: vec![preferred, turbo, minimal],
        }
    }
}

/// Append the auth token and apply the fetch strategy to a candidate URL.
pub fn finalize_url(config: &ApiConfig, url: &str) -> String {
    let mut finalized = url.to_string();
    if let Some(token) = &config.api_token {
        let separator = if finalized.contains('?') { '&' } else { '?' };
        finalized.push(separator);
        finalized.push_str("apiKey=");
        finalized.push_str(token);
    }
    match &config.strategy {
        FetchStrategy::Direct => finalized,
        FetchStrategy::Proxy { base } => {
            format!("{base}{}", urlencoding::encode(&finalized))
        }
    }
}
