use std::time::Duration;

/// Configures the per-request HTTP timeout.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

/// Fixed-interval polling configuration for [`crate::repeat_until`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PollOptions {
    /// Delay between a `false` evaluation and the next one, in milliseconds.
    pub interval_ms: u64,
    /// Overall deadline for the whole poll, in milliseconds.
    pub timeout_ms: u64,
}

impl PollOptions {
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval_ms,
            timeout_ms,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval_ms: 200,
            timeout_ms: 10_000,
        }
    }
}
