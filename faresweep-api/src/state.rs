use std::sync::Arc;
use std::time::Duration;
use faresweep_core::FlightProvider;
use crate::middleware::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn FlightProvider>,
    pub rate_limiter: Arc<RateLimiter>,
    /// Pause between streamed combinations
    pub pacing: Duration,
}

impl AppState {
    pub fn new(provider: Arc<dyn FlightProvider>, rate_limiter: RateLimiter, pacing: Duration) -> Self {
        Self {
            provider,
            rate_limiter: Arc::new(rate_limiter),
            pacing,
        }
    }
}
