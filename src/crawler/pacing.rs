//! Request pacing
//!
//! Every outbound request first waits a jittered delay drawn from a
//! configured window. Limiters aimed at the same host share a [`HostGate`],
//! so the wait and the request slot it buys are taken under one lock and two
//! requests to the host can never be closer than the active window's minimum.

use crate::config::PacingConfig;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A uniform [min, max] window of durations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayWindow {
    min: Duration,
    max: Duration,
}

impl DelayWindow {
    /// Builds a window from seconds
    ///
    /// Negative or NaN bounds are clamped to zero and an inverted window
    /// collapses to its lower bound; configuration validation rejects both
    /// before they get here.
    pub fn from_secs(min: f64, max: f64) -> Self {
        let min = min.max(0.0);
        let max = max.max(min);
        Self {
            min: Duration::from_secs_f64(min),
            max: Duration::from_secs_f64(max),
        }
    }

    /// Lower bound of the window
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound of the window
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draws a duration uniformly from the window
    pub fn draw(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }

        let secs = rand::rng().random_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Serialises outbound requests to one host
///
/// Cloning a gate shares it.
#[derive(Debug, Clone, Default)]
pub struct HostGate {
    last_outbound: Arc<Mutex<Option<Instant>>>,
}

impl HostGate {
    /// Creates a gate with no request on record
    pub fn new() -> Self {
        Self::default()
    }
}

/// Computes and enforces the wait before each request
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: DelayWindow,
    gate: HostGate,
}

impl RateLimiter {
    /// Creates a limiter with its own gate
    pub fn new(window: DelayWindow) -> Self {
        Self::with_gate(window, HostGate::new())
    }

    /// Creates a limiter sharing `gate` with other limiters for the same host
    pub fn with_gate(window: DelayWindow, gate: HostGate) -> Self {
        Self { window, gate }
    }

    /// Limiter for listing-page requests
    pub fn for_listings(config: &PacingConfig, gate: HostGate) -> Self {
        Self::with_gate(DelayWindow::from_secs(config.min_delay, config.max_delay), gate)
    }

    /// Limiter for detail-page requests (shorter window, same host gate)
    pub fn for_details(config: &PacingConfig, gate: HostGate) -> Self {
        Self::with_gate(
            DelayWindow::from_secs(config.detail_min_delay, config.detail_max_delay),
            gate,
        )
    }

    /// The configured window
    pub fn window(&self) -> DelayWindow {
        self.window
    }

    /// Draws the wait for the next request
    pub fn next_delay(&self) -> Duration {
        self.window.draw()
    }

    /// Waits for this caller's turn to send a request
    ///
    /// Holds the host gate for the whole wait, so concurrent callers queue
    /// behind each other and each one pays its full delay. Returns the delay
    /// that was slept.
    pub async fn wait_turn(&self) -> Duration {
        let mut last_outbound = self.gate.last_outbound.lock().await;

        let delay = self.next_delay();
        tracing::info!("Waiting {:.1}s before request", delay.as_secs_f64());
        tokio::time::sleep(delay).await;

        let now = Instant::now();
        if let Some(previous) = *last_outbound {
            tracing::debug!(
                gap_ms = now.duration_since(previous).as_millis() as u64,
                "Gap since previous request"
            );
        }
        *last_outbound = Some(now);

        delay
    }
}
