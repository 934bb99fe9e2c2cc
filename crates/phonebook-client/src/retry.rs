use std::thread;
use std::time::Duration;

use phonebook_core::ServiceError;
use tracing::warn;

pub const DEFAULT_RETRY_STATUSES: [u16; 4] = [429, 502, 503, 504];

/// Result of a single attempt.
#[derive(Debug)]
pub enum Step<T> {
    Ready(T),
    /// Worth another attempt while retries remain.
    Transient(ServiceError),
    Fatal(ServiceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
    pub statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(2),
            statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
            statuses: Vec::new(),
        }
    }

    pub fn retries_status(&self, status: u16) -> bool {
        self.statuses.contains(&status)
    }

    /// Runs `attempt` until it is ready, fails fatally, or the retry budget
    /// is spent. Waits `delay` between attempts.
    pub fn run<T>(&self, mut attempt: impl FnMut() -> Step<T>) -> Result<T, ServiceError> {
        let mut retries_left = self.max_retries;
        loop {
            match attempt() {
                Step::Ready(value) => return Ok(value),
                Step::Fatal(err) => return Err(err),
                Step::Transient(err) if retries_left == 0 => return Err(err),
                Step::Transient(err) => {
                    retries_left -= 1;
                    warn!(
                        error = %err,
                        retries_left,
                        delay_ms = self.delay.as_millis() as u64,
                        "transient failure, retrying"
                    );
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                }
            }
        }
    }
}
