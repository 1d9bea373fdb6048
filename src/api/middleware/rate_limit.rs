//! Rate limiting middleware using Redis cache.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::api::AppState;
use crate::config::{RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW_SECONDS};

/// Rate limit error response
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", HeaderValue::from(self.retry_after));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));

        (
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            "Too many requests. Please try again later.",
        )
            .into_response()
    }
}

/// Client identifier for rate limiting.
///
/// Behind a trusted proxy the first X-Forwarded-For hop wins, then X-Real-IP.
/// Otherwise those headers are client-controlled and only the peer address counts.
pub fn client_identifier(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(ip) = forwarded_address(request) {
            return ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_address(request: &Request) -> Option<String> {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("X-Forwarded-For")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header("X-Real-IP"))
        .map(str::to_string)
}

/// General rate limiting middleware.
///
/// Limits each client to RATE_LIMIT_REQUESTS per RATE_LIMIT_WINDOW_SECONDS.
/// Without a cache every request passes; a failing cache denies.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let Some(cache) = state.cache.as_ref() else {
        return Ok(next.run(request).await);
    };

    let client_id = client_identifier(&request, state.trust_proxy);
    let key = format!("api:{}", client_id);

    let (count, allowed) = match cache
        .check_rate_limit(&key, RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW_SECONDS)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "Rate limit check failed - denying request");
            return Err(RateLimitError {
                retry_after: RATE_LIMIT_WINDOW_SECONDS,
            });
        }
    };

    if !allowed {
        tracing::warn!(client = %client_id, count = count, "Rate limit exceeded");
        return Err(RateLimitError {
            retry_after: RATE_LIMIT_WINDOW_SECONDS,
        });
    }

    let mut response = next.run(request).await;

    let remaining = RATE_LIMIT_REQUESTS.saturating_sub(count);
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(RATE_LIMIT_REQUESTS));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn rate_limit_error_is_429_with_retry_after() {
        let response = RateLimitError { retry_after: 60 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["Retry-After"], "60");
    }

    fn spoofed_request(peer: &str) -> Request {
        let mut request = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header("X-Real-IP", "10.0.0.2")
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[test]
    fn forwarded_headers_ignored_without_trusted_proxy() {
        let request = spoofed_request("198.51.100.4:5000");
        assert_eq!(client_identifier(&request, false), "198.51.100.4");
    }

    #[test]
    fn trusted_proxy_uses_first_forwarded_hop() {
        let request = spoofed_request("10.0.0.1:443");
        assert_eq!(client_identifier(&request, true), "203.0.113.7");

        let mut request = Request::builder()
            .header("X-Real-IP", "192.0.2.9")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_identifier(&request, true), "192.0.2.9");

        request.headers_mut().remove("X-Real-IP");
        assert_eq!(client_identifier(&request, true), "unknown");
    }

    #[test]
    fn falls_back_to_peer_address_then_unknown() {
        let mut request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_identifier(&request, false), "unknown");

        let addr: SocketAddr = "198.51.100.4:5000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_identifier(&request, false), "198.51.100.4");
    }
}
