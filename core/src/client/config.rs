// Client configuration — endpoint and retry policy

use std::time::Duration;

/// Default endpoint the communicator talks to.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/actor";

/// Capacity of the status event channel.
pub const DEFAULT_STATUS_CAPACITY: usize = 256;

/// What to do after a failed exchange.
///
/// The default retries immediately and forever. A non-zero delay or a cap on
/// consecutive failures can be set explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Pause before the next attempt
    pub delay: Duration,
    /// Give up after this many consecutive failures (`None` = never)
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retry immediately, without limit.
    pub const fn forever() -> Self {
        Self {
            delay: Duration::ZERO,
            max_attempts: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Whether another attempt is allowed after `failures` consecutive failures.
    pub fn allows(&self, failures: u32) -> bool {
        self.max_attempts.map_or(true, |max| failures < max)
    }
}

/// Actor client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote actor endpoint
    pub endpoint: String,
    /// Pause between successful polling rounds
    pub poll_interval: Duration,
    /// Retry policy for the discovery loop
    pub discovery_retry: RetryPolicy,
    /// Retry policy for the polling loop
    pub poll_retry: RetryPolicy,
    /// Buffered status events per subscriber before the oldest are dropped
    pub status_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval: Duration::ZERO,
            discovery_retry: RetryPolicy::forever(),
            poll_retry: RetryPolicy::forever(),
            status_capacity: DEFAULT_STATUS_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_discovery_retry(mut self, policy: RetryPolicy) -> Self {
        self.discovery_retry = policy;
        self
    }

    pub fn with_poll_retry(mut self, policy: RetryPolicy) -> Self {
        self.poll_retry = policy;
        self
    }
}
