use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::Response;

type RetryPredicate = Arc<dyn Fn(&Response) -> bool + Send + Sync>;
type RetryCallback = Arc<dyn Fn(&Response) + Send + Sync>;

/// Decides whether, how often and how a request is re-attempted.
///
/// Only completed responses are ever retried; transport failures and timeouts
/// surface immediately.
///
/// ```
/// use std::time::Duration;
/// use reqwrap::RetryPolicy;
///
/// let policy = RetryPolicy::new()
///     .max_attempts(5)
///     .should_retry(|response| response.status().is_server_error())
///     .retry_delay(Duration::from_millis(100));
/// assert_eq!(policy.attempts(), 5);
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    should_retry: Option<RetryPredicate>,
    retry_delay: Option<Duration>,
    on_retry: Option<RetryCallback>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("should_retry", &self.should_retry.is_some())
            .field("retry_delay", &self.retry_delay)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            should_retry: None,
            retry_delay: None,
            on_retry: None,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that sends exactly once and accepts whatever comes back.
    pub fn single_attempt() -> Self {
        Self::default().max_attempts(1)
    }

    /// Total number of attempts, the first one included. `0` is treated as `1`.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Flags a response as failing. Without a predicate the first response is
    /// always returned.
    pub fn should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Response) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }

    /// Retries whenever the status is one of `statuses`.
    pub fn retry_on_status(self, statuses: &[u16]) -> Self {
        let statuses = statuses.to_vec();
        self.should_retry(move |response| statuses.contains(&response.status().as_u16()))
    }

    /// Fixed pause between a flagged response and the next attempt.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Called with the failing response right before the next attempt.
    pub fn on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Configured attempt ceiling.
    pub fn attempts(&self) -> usize {
        self.max_attempts
    }

    /// Configured pause between attempts, if any.
    pub fn delay(&self) -> Option<Duration> {
        self.retry_delay
    }

    /// Returns `true` when a retry predicate is set.
    pub fn has_predicate(&self) -> bool {
        self.should_retry.is_some()
    }

    pub(crate) fn wants_retry(&self, response: &Response) -> bool {
        self.should_retry
            .as_ref()
            .is_some_and(|predicate| predicate(response))
    }

    pub(crate) fn notify_retry(&self, response: &Response) -> bool {
        match &self.on_retry {
            Some(callback) => {
                callback(response);
                true
            }
            None => false,
        }
    }
}
