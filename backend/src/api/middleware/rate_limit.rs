//! Rate limiting for the unauthenticated auth endpoints.
//!
//! Counts login and registration attempts per client address in a fixed
//! window and rejects the excess with `429 Too Many Requests`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;

use crate::error::AppError;

/// Fixed-window request counter keyed by client.
#[derive(Debug)]
pub struct RateLimiter {
    /// key -> (requests in window, window start)
    requests: RwLock<HashMap<String, (u32, Instant)>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    /// Allow `max_requests` per client every `window_secs` seconds.
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            requests: RwLock::new(HashMap::new()),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Record one request for `key`.
    ///
    /// Returns `Ok(remaining)` if allowed, or `Err(retry_after_secs)` once
    /// the window is exhausted.
    pub async fn check(&self, key: &str) -> Result<u32, u64> {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        // Drop stale windows so the map does not grow with one-off clients.
        if requests.len() > 10_000 {
            let window = self.window;
            requests.retain(|_, (_, start)| now.duration_since(*start) < window);
        }

        let entry = requests.entry(key.to_string()).or_insert((0, now));
        if now.duration_since(entry.1) >= self.window {
            *entry = (0, now);
        }

        if entry.0 >= self.max_requests {
            let elapsed = now.duration_since(entry.1).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed).max(1));
        }

        entry.0 += 1;
        Ok(self.max_requests.saturating_sub(entry.0))
    }
}

/// Middleware applying a [`RateLimiter`] keyed on the peer address.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);

    match limiter.check(&key).await {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(limiter.max_requests()));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
            response
        }
        Err(retry_after) => {
            tracing::warn!(client = %key, retry_after, "Auth rate limit exceeded");
            let mut response = AppError::RateLimited { retry_after }.into_response();
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(limiter.max_requests()));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
            response
        }
    }
}

/// Socket peer address. Forwarding headers are ignored since clients can
/// set them freely.
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| format!("ip:{}", info.0.ip()))
        .unwrap_or_else(|| "ip:unknown".to_string())
}
