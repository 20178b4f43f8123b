//! HTTP adapter for the generative media API.
//!
//! Three logical operations (text, image, audio) over simple GET
//! request/response. Authentication is a shared-secret token appended as a
//! query parameter, never a header, and the only header sent is `Referer` —
//! the restricted, preflight-safe set the upstream service expects from
//! browser-originated traffic.
//!
//! Image requests carry an ordered fallback plan: the preferred model with
//! full quality parameters first, a cheaper model second, a minimal
//! no-parameter request last. The first success wins.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod sanitize;

pub use client::{FetchedMedia, MediaClient};
pub use endpoints::{ApiConfig, EndpointPlan, FetchStrategy, ImageRequest, MediaKind, QualityTier};
pub use error::{ClientError, ClientResult};
pub use sanitize::clean_prompt;
