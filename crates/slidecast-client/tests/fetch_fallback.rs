//! Endpoint fallback behavior against a mock upstream.

use slidecast_client::{ApiConfig, ImageRequest, MediaClient, QualityTier};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ApiConfig {
    let mut config = ApiConfig::default();
    config.text_base = format!("{}/api/text", server.uri());
    config.image_base = format!("{}/prompt", server.uri());
    config.api_token = Some("test-token".into());
    config
}

fn image_request() -> ImageRequest {
    ImageRequest {
        prompt: "sunset over mountains".into(),
        width: 64,
        height: 64,
        seed: 0,
        quality: QualityTier::High,
    }
}

#[tokio::test]
async fn falls_back_to_next_endpoint_on_failure() {
    let server = MockServer::start().await;

    // Preferred model rejected, turbo model accepted
    Mock::given(method("GET"))
        .and(query_param("model", "flux"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("model", "turbo"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"image-bytes".to_vec()))
        .mount(&server)
        .await;

    let client = MediaClient::new(config_for(&server));
    let media = client.generate_image(&image_request()).await.unwrap();

    assert_eq!(media.bytes, b"image-bytes");
    assert!(media.source_url.contains("model=turbo"));
}

#[tokio::test]
async fn exhausted_endpoints_surface_terminal_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = MediaClient::new(config_for(&server));
    let err = client.generate_image(&image_request()).await.unwrap_err();

    assert!(err.is_exhausted());
    assert!(err.to_string().contains("all 3 endpoint(s) exhausted"));
}

#[tokio::test]
async fn auth_token_and_referer_travel_with_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("apiKey", "test-token"))
        .and(wiremock::matchers::header("Referer", "https://slidecast.app"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Once upon a time."))
        .mount(&server)
        .await;

    let client = MediaClient::new(config_for(&server));
    let script = client.generate_text("tell me a story").await.unwrap();
    assert_eq!(script, "Once upon a time.");
}

#[tokio::test]
async fn image_locator_is_the_winning_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
        .mount(&server)
        .await;

    let client = MediaClient::new(config_for(&server));
    let media = client.generate_image(&image_request()).await.unwrap();

    // First candidate won; locator does not carry the auth token
    assert!(media.source_url.contains("model=flux"));
    assert!(!media.source_url.contains("apiKey"));
}
