//! Per-client rate limiting
//!
//! Token bucket keyed by client IP. Mutations cost more than reads so a
//! polling client never starves its own writes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

/// Cost of a mutating request in tokens; reads cost one
const WRITE_COST: f64 = 2.0;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// Rate limiter state
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
    refill_per_sec: f64,
    capacity: f64,
}

impl RateLimiter {
    /// Allow `requests_per_second` sustained, bursting to twice that
    pub fn new(requests_per_second: u32) -> Self {
        let rate = requests_per_second.max(1) as f64;
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            refill_per_sec: rate,
            capacity: rate * 2.0,
        }
    }

    /// Take `cost` tokens for `key`. On refusal returns how long until
    /// enough tokens are available.
    pub async fn acquire(&self, key: &str, cost: f64) -> Result<(), Duration> {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: self.capacity,
            refilled_at: now,
        });

        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.refilled_at = now;

        if bucket.tokens >= cost {
            bucket.tokens -= cost;
            Ok(())
        } else {
            let missing = cost - bucket.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_per_sec))
        }
    }

    /// Forget clients idle for longer than `max_idle`
    pub async fn evict_idle(&self, max_idle: Duration) {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| now.duration_since(bucket.refilled_at) < max_idle);
    }

    /// Periodically evict idle clients
    pub fn spawn_eviction(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                limiter.evict_idle(every).await;
            }
        })
    }
}

/// Middleware: use with `axum::middleware::from_fn_with_state`
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(request.headers());
    let cost = match *request.method() {
        Method::GET | Method::HEAD | Method::OPTIONS => 1.0,
        _ => WRITE_COST,
    };

    if let Err(retry_after) = limiter.acquire(&client, cost).await {
        tracing::warn!(client = %client, "Rate limit exceeded");
        let secs = retry_after.as_secs().max(1).to_string();
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, secs)],
            "Too many requests. Please try again later.",
        )
            .into_response();
    }

    next.run(request).await
}

fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|h| h.to_str().ok()))
        .map(|ip| ip.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_refuse() {
        let limiter = RateLimiter::new(5);

        for _ in 0..10 {
            assert!(limiter.acquire("a", 1.0).await.is_ok());
        }
        let wait = limiter.acquire("a", 1.0).await.unwrap_err();
        assert!(wait <= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_writes_cost_more() {
        let limiter = RateLimiter::new(2);

        assert!(limiter.acquire("a", WRITE_COST).await.is_ok());
        assert!(limiter.acquire("a", WRITE_COST).await.is_ok());
        assert!(limiter.acquire("a", WRITE_COST).await.is_err());
        // separate bucket
        assert!(limiter.acquire("b", WRITE_COST).await.is_ok());
    }

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());
        assert_eq!(client_key(&headers), "10.0.0.2");

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_key(&headers), "203.0.113.7");

        assert_eq!(client_key(&HeaderMap::new()), "unknown");
    }
}
