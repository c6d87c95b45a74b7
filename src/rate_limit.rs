//! Fixed-window request counter keyed by client IP.
//!
//! Shared across in-flight requests on the same process; check-and-increment
//! is atomic per call. The map is unbounded, which is only acceptable for a
//! single-instance, low-cardinality deployment; multi-instance deployments
//! need an external keyed counter behind the same interface.

use axum::http::HeaderMap;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;

/// Window length for the per-client counter.
pub const RATE_LIMIT_WINDOW_MS: i64 = 60_000;
/// Requests allowed per client per window.
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 10;

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    window_start_ms: i64,
}

#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one request for `key` at `now_ms` and reports whether the
    /// client is over quota.
    ///
    /// A fresh or expired window resets to `{count: 1, window_start: now}`;
    /// otherwise the count is incremented and the client is limited iff it
    /// exceeds [`RATE_LIMIT_MAX_REQUESTS`].
    pub fn check_and_record(&self, key: &str, now_ms: i64) -> bool {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            window_start_ms: now_ms,
        });

        if entry.count == 0 || now_ms - entry.window_start_ms > RATE_LIMIT_WINDOW_MS {
            entry.count = 1;
            entry.window_start_ms = now_ms;
            return false;
        }

        entry.count += 1;
        entry.count > RATE_LIMIT_MAX_REQUESTS
    }
}

/// Derives the rate-limit key for a request: first `x-forwarded-for` entry,
/// else `x-real-ip`, else the transport peer address, else `"unknown"`.
///
/// All `"unknown"` clients share one bucket, a known precision loss when no
/// proxy headers and no peer address are available.
pub fn client_key(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn eleventh_request_in_window_is_limited() {
        let limiter = RateLimiter::new();
        let start = 1_000_000;

        for i in 0..RATE_LIMIT_MAX_REQUESTS {
            assert!(
                !limiter.check_and_record("203.0.113.7", start + i as i64),
                "request {} should pass",
                i + 1
            );
        }
        assert!(limiter.check_and_record("203.0.113.7", start + 500));
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let limiter = RateLimiter::new();
        let start = 1_000_000;

        for i in 0..=RATE_LIMIT_MAX_REQUESTS {
            limiter.check_and_record("203.0.113.7", start + i as i64);
        }
        // Past the window boundary the count starts over at 1.
        assert!(!limiter.check_and_record("203.0.113.7", start + RATE_LIMIT_WINDOW_MS + 1));
        assert!(!limiter.check_and_record("203.0.113.7", start + RATE_LIMIT_WINDOW_MS + 2));
    }

    #[test]
    fn distinct_keys_do_not_interfere() {
        let limiter = RateLimiter::new();
        for i in 0..=RATE_LIMIT_MAX_REQUESTS {
            limiter.check_and_record("203.0.113.7", 1_000 + i as i64);
        }
        assert!(!limiter.check_and_record("198.51.100.2", 2_000));
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        let peer: Option<IpAddr> = Some("10.0.0.3".parse().unwrap());
        assert_eq!(client_key(&headers, peer), "203.0.113.7");
    }

    #[test]
    fn client_key_falls_back_in_order() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        let peer: Option<IpAddr> = Some("10.0.0.3".parse().unwrap());
        assert_eq!(client_key(&headers, peer), "10.0.0.2");

        let headers = HeaderMap::new();
        assert_eq!(client_key(&headers, peer), "10.0.0.3");
        assert_eq!(client_key(&headers, None), "unknown");
    }
}
