use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Deadline token scoped to one [`crate::repeat_until`] invocation.
///
/// The signal holds nothing but its deadline, so copies are free and
/// dropping it releases nothing. It "fires" once the deadline is reached.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CancellationSignal {
    started: Instant,
    deadline: Instant,
}

impl CancellationSignal {
    /// Creates a signal that fires `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + timeout,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Time left until the deadline, zero once fired.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Time since the signal was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Completes when the deadline is reached.
    pub async fn cancelled(&self) {
        sleep_until(self.deadline).await;
    }
}
