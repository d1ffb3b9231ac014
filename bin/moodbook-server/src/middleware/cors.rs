//! Open-access CORS policy.
//!
//! Browsers may call the API from any origin. Preflight `OPTIONS` requests
//! are answered by [`CorsLayer`]; every other response, errors included,
//! carries the same three headers via [`cors_headers`].

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

type HeaderLayer = SetResponseHeaderLayer<HeaderValue>;

/// Layers stamping the CORS header set onto every response.
pub fn cors_headers() -> [HeaderLayer; 3] {
    [
        overriding(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        overriding(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
        overriding(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
    ]
}

fn overriding(name: HeaderName, value: &'static str) -> HeaderLayer {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}
