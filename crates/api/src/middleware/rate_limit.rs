//! Rate limiting middleware for the public endpoints.
//!
//! Limiting is keyed by client IP and sits behind the `RateLimitStore`
//! trait, with an in-process governor-backed implementation. The in-process
//! store is only correct for single-instance deployments; a multi-instance
//! deployment swaps in a store backed by something shared.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use crate::app::AppState;
use crate::error::ApiError;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub allowed: bool,
    /// Seconds until the next request would be allowed. Zero when allowed.
    pub retry_after_secs: u64,
}

impl Decision {
    fn allow() -> Self {
        Self {
            allowed: true,
            retry_after_secs: 0,
        }
    }

    fn deny(retry_after_secs: u64) -> Self {
        Self {
            allowed: false,
            retry_after_secs,
        }
    }
}

/// Storage interface for rate limit state.
pub trait RateLimitStore: Send + Sync {
    fn check(&self, key: &str) -> Decision;
}

type KeyRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

struct ClientLimiter {
    limiter: Arc<KeyRateLimiter>,
    last_seen: Instant,
}

/// In-process store holding one governor limiter per client key.
///
/// The map grows by one entry per client ever seen, so once it holds
/// `sweep_threshold` entries the next lookup drops every entry idle longer
/// than `idle_after` before inserting.
pub struct GovernorStore {
    limiters: RwLock<HashMap<String, ClientLimiter>>,
    per_minute: u32,
    sweep_threshold: usize,
    idle_after: Duration,
}

impl GovernorStore {
    pub fn new(per_minute: u32) -> Self {
        Self::with_eviction(per_minute, 1024, Duration::from_secs(600))
    }

    pub fn with_eviction(per_minute: u32, sweep_threshold: usize, idle_after: Duration) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            per_minute,
            sweep_threshold,
            idle_after,
        }
    }

    fn get_or_create_limiter(&self, key: &str) -> Arc<KeyRateLimiter> {
        let now = Instant::now();
        let mut limiters = self.limiters.write().unwrap();

        if limiters.len() >= self.sweep_threshold && !limiters.contains_key(key) {
            let idle_after = self.idle_after;
            limiters.retain(|_, entry| now.duration_since(entry.last_seen) < idle_after);
        }

        let quota = Quota::per_minute(
            NonZeroU32::new(self.per_minute).unwrap_or(NonZeroU32::new(60).unwrap()),
        );
        let entry = limiters
            .entry(key.to_string())
            .or_insert_with(|| ClientLimiter {
                limiter: Arc::new(GovRateLimiter::direct(quota)),
                last_seen: now,
            });
        entry.last_seen = now;
        entry.limiter.clone()
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.limiters.read().unwrap().len()
    }
}

impl RateLimitStore for GovernorStore {
    fn check(&self, key: &str) -> Decision {
        let limiter = self.get_or_create_limiter(key);
        match limiter.check() {
            Ok(_) => Decision::allow(),
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(governor::clock::Clock::now(
                    &governor::clock::DefaultClock::default(),
                ));
                Decision::deny(wait_time.as_secs().max(1))
            }
        }
    }
}

/// Rate limiter state shared across all requests.
pub struct RateLimiterState {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiterState {
    /// Creates a state backed by the in-process governor store.
    pub fn new(per_minute: u32) -> Self {
        Self {
            store: Arc::new(GovernorStore::new(per_minute)),
        }
    }

    /// Creates a state backed by an externally provided store.
    pub fn with_store(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    pub fn check(&self, key: &str) -> Decision {
        self.store.check(key)
    }
}

/// Middleware that applies per-client-IP rate limiting.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = &state.rate_limiter else {
        return next.run(req).await;
    };

    let key = client_key(&req);
    let decision = limiter.check(&key);

    if !decision.allowed {
        tracing::warn!(client = %key, retry_after = decision.retry_after_secs, "Rate limit exceeded");
        let mut response = ApiError::RateLimited.into_response();
        if let Ok(value) = HeaderValue::from_str(&decision.retry_after_secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    next.run(req).await
}

/// Client key for limiting: first X-Forwarded-For hop when present (the
/// service runs behind a reverse proxy), otherwise the peer address.
fn client_key(req: &Request<Body>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_within_quota() {
        let store = GovernorStore::new(10);
        for _ in 0..10 {
            assert!(store.check("10.0.0.1").allowed);
        }
    }

    #[test]
    fn test_denies_over_quota_with_retry_after() {
        let store = GovernorStore::new(2);
        assert!(store.check("10.0.0.2").allowed);
        assert!(store.check("10.0.0.2").allowed);
        let decision = store.check("10.0.0.2");
        assert!(!decision.allowed);
        assert!(decision.retry_after_secs >= 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let store = GovernorStore::new(1);
        assert!(store.check("10.0.0.3").allowed);
        assert!(!store.check("10.0.0.3").allowed);
        assert!(store.check("10.0.0.4").allowed);
    }

    #[test]
    fn test_idle_clients_are_evicted_once_threshold_is_hit() {
        let store = GovernorStore::with_eviction(10, 2, Duration::ZERO);
        assert!(store.check("10.0.0.5").allowed);
        assert!(store.check("10.0.0.6").allowed);
        assert_eq!(store.tracked_clients(), 2);

        // The next new client triggers the sweep; with a zero idle window
        // both existing entries count as idle.
        assert!(store.check("10.0.0.7").allowed);
        assert_eq!(store.tracked_clients(), 1);
    }

    #[test]
    fn test_active_clients_survive_the_sweep() {
        let store = GovernorStore::with_eviction(10, 2, Duration::from_secs(600));
        assert!(store.check("10.0.0.8").allowed);
        assert!(store.check("10.0.0.9").allowed);
        assert!(store.check("10.0.0.10").allowed);
        assert_eq!(store.tracked_clients(), 3);
    }

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "203.0.113.9");
    }

    #[test]
    fn test_client_key_falls_back_to_unknown() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&req), "unknown");
    }
}
