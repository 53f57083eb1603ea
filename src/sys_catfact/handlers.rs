//! HTTP glue for the cat-fact proxy.

use hyper::{header::CONTENT_TYPE, Body, Response, StatusCode};
use serde_json::json;
use tracing::warn;

use crate::sys_catfact::core;

pub async fn handler_catfact() -> Response<Body> {
    let (status, payload) = match core::api_fetch_fact().await {
        Ok(fact) => (StatusCode::OK, json!({ "success": true, "fact": fact })),
        Err(e) => {
            warn!("cat fact fetch failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                json!({ "success": false, "error": e.to_string() }),
            )
        }
    };
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}
