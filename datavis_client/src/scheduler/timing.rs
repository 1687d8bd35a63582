use tokio::time::{Duration, Instant};

/// Start of one tick and the period it was scheduled at.
#[derive(Debug, Clone, Copy)]
pub struct TickTiming {
    pub start: Instant,
    pub period: Duration,
}

impl TickTiming {
    /// Actual minus nominal spacing from the previous tick start (ms).
    /// Positive when the tick came late.
    pub fn jitter_ms(&self, last: Instant) -> f64 {
        let actual = self.start.duration_since(last).as_secs_f64();
        (actual - self.period.as_secs_f64()) * 1000.0
    }
}
