use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

use crate::metrics::RATE_LIMIT_CLIENTS;

// Records are swept once their window ended this many windows ago
const STALE_WINDOWS: u32 = 5;

/// Longest window the limiter accepts; larger values are clamped.
pub const MAX_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// Rate limit entry - tracks requests per client identifier
#[derive(Debug, Clone, Copy)]
pub struct RateRecord {
    pub count: u32,
    pub expires_at: Instant,
}

/// Fixed-window request counter keyed by client identifier.
///
/// Advisory only: identifiers come from request headers and can be spoofed.
#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<String, RateRecord>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    /// `max_requests == 0` disables limiting. `window` is capped at `MAX_WINDOW`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window: window.min(MAX_WINDOW),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, id: &str) -> bool {
        self.check_at(id, Instant::now())
    }

    pub fn check_at(&self, id: &str, now: Instant) -> bool {
        if self.max_requests == 0 {
            return true;
        }

        // The shard lock is held for the whole read-modify-write
        match self.entries.entry(id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(self.fresh_record(now));
                true
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();

                // window expired..? start a new one
                if now >= record.expires_at {
                    *record = self.fresh_record(now);
                    return true;
                }

                record.count = record.count.saturating_add(1);
                record.count <= self.max_requests
            }
        }
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Drop records whose window ended at least `STALE_WINDOWS` windows before `now`.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let stale_after = self.window.saturating_mul(STALE_WINDOWS);
        let before = self.entries.len();
        self.entries.retain(|_, record| {
            now.checked_duration_since(record.expires_at)
                .is_none_or(|expired_for| expired_for < stale_after)
        });
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record(&self, id: &str) -> Option<RateRecord> {
        self.entries.get(id).map(|entry| *entry)
    }

    fn fresh_record(&self, now: Instant) -> RateRecord {
        RateRecord {
            count: 1,
            expires_at: now.checked_add(self.window).unwrap_or(now),
        }
    }
}

// Sweeps stale records forever - runs once per window
pub async fn sweeper(limiter: Arc<RateLimiter>, every: Duration) {
    let mut interval = interval(every.max(Duration::from_secs(1)));

    tracing::debug!(interval = ?every, "rate limit sweeper started");

    loop {
        interval.tick().await;

        let removed = limiter.sweep();
        RATE_LIMIT_CLIENTS.set(limiter.len() as f64);

        if removed > 0 {
            tracing::debug!(removed, remaining = limiter.len(), "swept stale rate limit records");
        }
    }
}
