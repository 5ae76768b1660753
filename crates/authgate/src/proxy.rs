//! Upstream request forwarder.
//!
//! The continuation after the gate: whatever URI and headers the gate left
//! on the request are what the configured upstream receives.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode, Uri, header},
    response::Response,
};
use log::{debug, error, warn};

use crate::api::AppState;

/// Forward a request to the configured upstream, preserving method,
/// version, headers, and path+query.
pub async fn forward(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, StatusCode> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target_uri = format!(
        "{}{}",
        state.upstream.base_url.trim_end_matches('/'),
        path_and_query
    );

    let uri: Uri = target_uri.parse().map_err(|e| {
        error!("invalid upstream uri {target_uri}: {e:?}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    debug!("forwarding request to {uri}");

    let (parts, body) = req.into_parts();

    enforce_body_limit(&parts.headers, state.upstream.max_body_bytes)?;
    let body_bytes = axum::body::to_bytes(body, state.upstream.max_body_bytes)
        .await
        .map_err(|e| {
            if e.to_string().contains("length limit") {
                warn!(
                    "request body exceeded limit of {} bytes",
                    state.upstream.max_body_bytes
                );
                return StatusCode::PAYLOAD_TOO_LARGE;
            }
            error!("failed to buffer request body: {e:?}");
            StatusCode::BAD_GATEWAY
        })?;

    let mut forwarded = Request::builder()
        .method(parts.method.clone())
        .uri(uri)
        .version(parts.version)
        .body(Body::from(body_bytes.clone()))
        .map_err(|e| {
            error!("failed to build forwarded request: {e:?}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    *forwarded.headers_mut() = parts.headers.clone();

    // The body was buffered: forward a fixed length, not the original
    // framing.
    forwarded.headers_mut().remove(header::TRANSFER_ENCODING);
    if !body_bytes.is_empty() || parts.headers.contains_key(header::CONTENT_LENGTH) {
        forwarded
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(body_bytes.len()));
    }

    match state.upstream.client.request(forwarded).await {
        Ok(response) => Ok(response.map(Body::new)),
        Err(e) => {
            warn!("upstream request failed: {e:?}");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

fn enforce_body_limit(headers: &HeaderMap, max_body_bytes: usize) -> Result<(), StatusCode> {
    if let Some(value) = headers.get(header::CONTENT_LENGTH) {
        let length = value
            .to_str()
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .ok_or(StatusCode::BAD_REQUEST)?;
        if length > max_body_bytes {
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_accepts_small_and_absent_lengths() {
        let mut headers = HeaderMap::new();
        assert!(enforce_body_limit(&headers, 1024).is_ok());

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(512));
        assert!(enforce_body_limit(&headers, 1024).is_ok());
    }

    #[test]
    fn test_body_limit_rejects_oversize_and_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(2048));
        assert_eq!(
            enforce_body_limit(&headers, 1024),
            Err(StatusCode::PAYLOAD_TOO_LARGE)
        );

        headers.insert(
            header::CONTENT_LENGTH,
            HeaderValue::from_static("not-a-number"),
        );
        assert_eq!(
            enforce_body_limit(&headers, 1024),
            Err(StatusCode::BAD_REQUEST)
        );
    }
}
