use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use crate::error::AppError;
use crate::state::AppState;

/// Stale windows are swept once the table grows past this many clients.
const SWEEP_THRESHOLD: usize = 10_000;

/// At most `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateTier {
    pub limit: u32,
    pub window: Duration,
}

impl RateTier {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counters keyed by client address, one per tier.
///
/// A request is admitted only if every tier has room, and then counts against all of them.
pub struct RateLimiter {
    tiers: Vec<RateTier>,
    windows: RwLock<HashMap<String, Vec<Window>>>,
}

impl RateLimiter {
    pub fn new(tiers: Vec<RateTier>) -> Self {
        Self {
            tiers,
            windows: RwLock::new(HashMap::new()),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(vec![RateTier::new(limit, Duration::from_secs(60))])
    }

    /// Count a request for `key`; false once any tier's current window is used up.
    pub async fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.write().await;

        if windows.len() > SWEEP_THRESHOLD {
            let tiers = &self.tiers;
            windows.retain(|_, ws| {
                ws.iter()
                    .zip(tiers)
                    .any(|(w, tier)| now.duration_since(w.started) < tier.window)
            });
        }

        let entry = windows
            .entry(key.to_string())
            .or_insert_with(|| vec![Window { started: now, count: 0 }; self.tiers.len()]);

        for (window, tier) in entry.iter_mut().zip(&self.tiers) {
            if now.duration_since(window.started) >= tier.window {
                *window = Window { started: now, count: 0 };
            }
        }

        let exhausted = entry
            .iter()
            .zip(&self.tiers)
            .find(|(window, tier)| window.count >= tier.limit);
        if let Some((_, tier)) = exhausted {
            tracing::warn!(
                "Rate limit exceeded for {}: {} per {}s",
                key,
                tier.limit,
                tier.window.as_secs()
            );
            return false;
        }

        for window in entry.iter_mut() {
            window.count += 1;
        }
        true
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    // Without connect info (e.g. in-process tests) the limiter fails open
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    match ip {
        Some(ip) if !state.rate_limiter.check(&ip).await => AppError::RateLimited.into_response(),
        _ => next.run(req).await,
    }
}
