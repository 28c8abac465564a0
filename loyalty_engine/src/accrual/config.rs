use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 3;
pub const DEFAULT_BATCH_SIZE: u32 = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// How hard the accrual client tries before giving up on an order for this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Fixed pause between consecutive attempts.
    pub retry_delay: Duration,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// The longest a single `fetch` can take: every attempt times out, with a delay between each.
    pub fn worst_case_latency(&self) -> Duration {
        let attempts = self.attempts();
        self.attempt_timeout * attempts + self.retry_delay * (attempts - 1)
    }
}

#[derive(Clone, Debug)]
pub struct AccrualConfig {
    /// Base URL of the accrual oracle, e.g. `http://localhost:8080`
    pub oracle_url: String,
    /// Maximum number of oracle calls in flight at any instant.
    pub concurrency: usize,
    /// Maximum number of pending orders picked up per cycle.
    pub batch_size: u32,
    /// Pause between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
    /// How long an in-flight batch may keep running after shutdown is requested.
    pub shutdown_grace_period: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            oracle_url: String::default(),
            concurrency: DEFAULT_CONCURRENCY,
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry: RetryPolicy::default(),
            shutdown_grace_period: DEFAULT_SHUTDOWN_GRACE_PERIOD,
        }
    }
}
