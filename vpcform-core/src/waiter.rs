//! Waiter - Poll a remote object until its status settles
//!
//! One generic poller replaces the per-resource wait loops: callers supply
//! the status sets and a refresh function, the waiter owns the timing.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use log::debug;
use tokio::time::{Instant, sleep};

use crate::provider::{ErrorKind, ProviderError, ProviderResult};

/// Default delay between two polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default overall deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Consecutive "not found" answers tolerated while waiting for an object to appear
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

/// Outcome of one refresh call
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh<T> {
    /// The object exists and reports `status`
    Found { value: T, status: String },
    /// The object does not exist (HTTP 404)
    Gone,
}

impl<T> Refresh<T> {
    pub fn found(value: T, status: impl Into<String>) -> Self {
        Refresh::Found {
            value,
            status: status.into(),
        }
    }
}

/// Error returned by [`StatusWaiter::wait`]
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("timeout after {timeout:?} waiting for {description} (last status: {})", last_status.as_deref().unwrap_or("none"))]
    Timeout {
        description: String,
        timeout: Duration,
        last_status: Option<String>,
    },

    #[error("{description} entered failed status '{status}'")]
    FailedState { description: String, status: String },

    #[error("unexpected status '{status}' while waiting for {description}, expected one of: {expected}")]
    UnexpectedState {
        description: String,
        status: String,
        expected: String,
    },

    #[error("{description} still not found after {checks} checks")]
    NotFound { description: String, checks: u32 },

    #[error("refresh failed while waiting for {description}")]
    Refresh {
        description: String,
        #[source]
        source: ProviderError,
    },
}

impl From<WaitError> for ProviderError {
    fn from(err: WaitError) -> Self {
        let kind = match &err {
            WaitError::Timeout { .. } => ErrorKind::Timeout,
            WaitError::FailedState { .. } => ErrorKind::FailedState,
            WaitError::NotFound { .. } => ErrorKind::NotFound,
            WaitError::UnexpectedState { .. } => ErrorKind::Other,
            WaitError::Refresh { source, .. } => source.kind,
        };
        match err {
            WaitError::Refresh {
                description,
                source,
            } => ProviderError::with_kind(
                kind,
                format!("refresh failed while waiting for {}", description),
            )
            .with_cause(source),
            other => ProviderError::with_kind(kind, other.to_string()),
        }
    }
}

/// Fixed-interval status poller
///
/// A status in `target` ends the wait successfully, a status in `failed`
/// ends it with [`WaitError::FailedState`], a status in `pending` keeps
/// polling, and anything else is [`WaitError::UnexpectedState`].
#[derive(Debug, Clone)]
pub struct StatusWaiter {
    description: String,
    pending: HashSet<String>,
    target: HashSet<String>,
    failed: HashSet<String>,
    delay: Duration,
    poll_interval: Duration,
    timeout: Duration,
    not_found_checks: u32,
    gone_is_target: bool,
}

impl StatusWaiter {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            pending: HashSet::new(),
            target: HashSet::new(),
            failed: HashSet::new(),
            delay: Duration::ZERO,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            gone_is_target: false,
        }
    }

    pub fn pending(mut self, statuses: &[&str]) -> Self {
        self.pending.extend(statuses.iter().map(|s| s.to_string()));
        self
    }

    pub fn target(mut self, statuses: &[&str]) -> Self {
        self.target.extend(statuses.iter().map(|s| s.to_string()));
        self
    }

    pub fn failed(mut self, statuses: &[&str]) -> Self {
        self.failed.extend(statuses.iter().map(|s| s.to_string()));
        self
    }

    /// Sleep before the first poll
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Treat disappearance of the object as success (delete waits)
    pub fn gone_is_target(mut self) -> Self {
        self.gone_is_target = true;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Poll `refresh` until the status settles
    ///
    /// Returns the last observed object, or `None` when the wait ended
    /// because the object is gone and `gone_is_target` is set.
    pub async fn wait<T, F, Fut>(&self, mut refresh: F) -> Result<Option<T>, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<Refresh<T>>>,
    {
        let deadline = Instant::now() + self.timeout;
        if !self.delay.is_zero() {
            sleep(self.delay.min(self.timeout)).await;
        }

        let mut last_status: Option<String> = None;
        let mut not_found = 0u32;

        loop {
            let observed = refresh().await.map_err(|source| WaitError::Refresh {
                description: self.description.clone(),
                source,
            })?;

            match observed {
                Refresh::Gone if self.gone_is_target => {
                    debug!("{}: object is gone", self.description);
                    return Ok(None);
                }
                Refresh::Gone => {
                    not_found += 1;
                    debug!(
                        "{}: not found ({}/{})",
                        self.description, not_found, self.not_found_checks
                    );
                    if not_found > self.not_found_checks {
                        return Err(WaitError::NotFound {
                            description: self.description.clone(),
                            checks: not_found,
                        });
                    }
                }
                Refresh::Found { value, status } => {
                    not_found = 0;
                    debug!("{}: status '{}'", self.description, status);
                    if self.target.contains(&status) {
                        return Ok(Some(value));
                    }
                    if self.failed.contains(&status) {
                        return Err(WaitError::FailedState {
                            description: self.description.clone(),
                            status,
                        });
                    }
                    if !self.pending.contains(&status) {
                        return Err(WaitError::UnexpectedState {
                            description: self.description.clone(),
                            status,
                            expected: self.expected_statuses(),
                        });
                    }
                    last_status = Some(status);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WaitError::Timeout {
                    description: self.description.clone(),
                    timeout: self.timeout,
                    last_status,
                });
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    fn expected_statuses(&self) -> String {
        let mut all: Vec<&str> = self
            .pending
            .iter()
            .chain(self.target.iter())
            .map(String::as_str)
            .collect();
        all.sort_unstable();
        all.join(", ")
    }
}
