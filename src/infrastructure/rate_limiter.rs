//! Per-client rate limiter.
//!
//! Implements a sliding window rate limiter keyed by client IP address to
//! enforce a per-minute request budget on the public endpoints. Entries
//! outside the window are pruned on every check, so an idle client's
//! history drains away instead of accumulating.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Rate limiter tracking request instants per client
pub struct ClientRateLimiter {
    limit: u32,
    window: Duration,
    clients: RwLock<HashMap<IpAddr, Vec<Instant>>>,
}

impl ClientRateLimiter {
    /// Create a new rate limiter with the specified requests per minute
    /// budget for each client.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            limit: requests_per_minute,
            window: Duration::from_secs(60),
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Check whether `client` may make a request now, recording it if so.
    ///
    /// Returns true if the request is allowed, false if the client's window
    /// budget is exhausted.
    pub async fn check_and_record(&self, client: IpAddr) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.write().await;
        let requests = clients.entry(client).or_default();

        // Remove requests outside the current window
        requests.retain(|&time| now.duration_since(time) < self.window);

        if requests.len() < self.limit as usize {
            requests.push(now);
            true
        } else {
            false
        }
    }

    /// Current window statistics for one client.
    pub async fn stats_for(&self, client: IpAddr) -> RateLimitStats {
        let now = Instant::now();
        let clients = self.clients.read().await;
        let used = clients
            .get(&client)
            .map_or(0, |requests| {
                requests
                    .iter()
                    .filter(|&&time| now.duration_since(time) < self.window)
                    .count()
            }) as u32;

        // Reset at the next minute boundary of wall-clock time
        let system_now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        let seconds_until_reset = 60 - system_now.as_secs() % 60;
        let reset_timestamp = system_now.as_secs() as i64 + seconds_until_reset as i64;

        RateLimitStats {
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
            used,
            reset: reset_timestamp,
        }
    }
}

/// Rate limit statistics for one client window
#[derive(Debug, Clone)]
pub struct RateLimitStats {
    pub limit: u32,
    pub remaining: u32,
    pub used: u32,
    pub reset: i64, // Unix timestamp
}
