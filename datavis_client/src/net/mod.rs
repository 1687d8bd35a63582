pub mod tcp;

pub use tcp::{connect_with_retry, fetch_packet, read_packet};

use std::num::NonZeroU32;
use std::time::Duration;

/// How hard to try reaching a server that is not accepting yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// `None` retries forever
    pub max_attempts: Option<NonZeroU32>,
    /// sleep between attempts; zero just yields to the runtime
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn bounded(max_attempts: NonZeroU32, backoff: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff,
        }
    }

    /// Whether attempt number `attempt` (1-based) was the last allowed one.
    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|m| attempt >= m.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_exhausts() {
        assert!(!RetryPolicy::unlimited().exhausted(u32::MAX));
    }

    #[test]
    fn bounded_stops_at_limit() {
        let p = RetryPolicy::bounded(NonZeroU32::new(3).unwrap(), Duration::ZERO);
        assert!(!p.exhausted(2));
        assert!(p.exhausted(3));
    }
}
