//! Fixed-window request rate limiting keyed by client IP.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::RwLock;
use tracing::warn;

use crate::config;
use crate::error::ApiError;

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<IpAddr, Window>>>,
    max_requests: u32,
    window: Duration,
    enabled: bool,
}

#[derive(Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn from_config() -> Self {
        let api = &config::config().api;
        Self::new(
            api.enable_rate_limiting,
            api.rate_limit_requests,
            Duration::from_secs(api.rate_limit_window_secs),
        )
    }

    pub fn new(enabled: bool, max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
            enabled,
        }
    }

    /// Record one request from `ip`; returns false once the window's quota
    /// is exhausted
    pub async fn allow(&self, ip: IpAddr) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        let mut windows = self.windows.write().await;

        let window = windows.entry(ip).or_insert(Window { started: now, count: 0 });
        if now.duration_since(window.started) > self.window {
            window.started = now;
            window.count = 0;
        }

        window.count += 1;
        window.count <= self.max_requests
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !limiter.allow(addr.ip()).await {
        warn!("Rate limit exceeded for {}", addr.ip());
        return Err(ApiError::too_many_requests(
            "Too many requests. Try again later.",
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[tokio::test]
    async fn quota_is_enforced_per_window() {
        let limiter = RateLimiter::new(true, 2, Duration::from_secs(60));
        assert!(limiter.allow(ip(1)).await);
        assert!(limiter.allow(ip(1)).await);
        assert!(!limiter.allow(ip(1)).await);
    }

    #[tokio::test]
    async fn addresses_are_limited_independently() {
        let limiter = RateLimiter::new(true, 1, Duration::from_secs(60));
        assert!(limiter.allow(ip(1)).await);
        assert!(!limiter.allow(ip(1)).await);
        assert!(limiter.allow(ip(2)).await);
    }

    #[tokio::test]
    async fn disabled_limiter_always_allows() {
        let limiter = RateLimiter::new(false, 0, Duration::from_secs(60));
        for _ in 0..10 {
            assert!(limiter.allow(ip(1)).await);
        }
    }
}
