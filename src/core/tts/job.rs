//! Polling state machine for vendors with asynchronous synthesis.
//!
//! Some vendors (ATEN AIVoice) accept a submission and resolve it later:
//! `Submitted -> {Waiting, Processing} -> {Success, Error}`. The poller
//! refetches job status on a fixed retry delay until the job resolves or the
//! wall-clock budget runs out.
//!
//! Transport failures while polling are swallowed into one more
//! retry-after-delay cycle rather than aborting — the overall timeout is the
//! only thing that stops a flaky status endpoint. This is deliberately the
//! opposite of the remote task poller in `core::video`, which treats a query
//! failure as terminal; both behaviors are preserved from the source system.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::base::{TtsError, TtsResult};

/// Vendor-reported state of an asynchronous synthesis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Waiting,
    Processing,
    Success,
    Error,
}

/// One status snapshot for a submitted job.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub state: JobState,
    /// Locator for the finished artifact; required when `state == Success`.
    pub result_locator: Option<String>,
    /// Vendor diagnostic; meaningful when `state == Error`.
    pub error_message: Option<String>,
}

/// Awaits resolution of a submitted synthesis job.
#[derive(Debug, Clone)]
pub struct SynthesisJobPoller {
    retry_delay: Duration,
    max_wait: Duration,
}

impl Default for SynthesisJobPoller {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(2),
            max_wait: Duration::from_secs(300),
        }
    }
}

impl SynthesisJobPoller {
    pub fn new(retry_delay: Duration, max_wait: Duration) -> Self {
        Self {
            retry_delay,
            max_wait,
        }
    }

    /// Poll `fetch` until the job resolves, returning the result locator.
    ///
    /// The fetch closure is the vendor status query; tests drive this with
    /// scripted snapshots instead of HTTP.
    pub async fn wait<F, Fut>(&self, job_id: &str, mut fetch: F) -> TtsResult<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TtsResult<JobSnapshot>>,
    {
        let deadline = Instant::now() + self.max_wait;

        while Instant::now() < deadline {
            match fetch().await {
                Ok(snapshot) => match snapshot.state {
                    JobState::Success => {
                        return match snapshot.result_locator {
                            Some(locator) if !locator.is_empty() => {
                                debug!(job_id, "synthesis job resolved");
                                Ok(locator)
                            }
                            // A Success without a locator is a vendor error,
                            // not a success.
                            _ => Err(TtsError::Vendor(
                                "synthesis completed without a result locator".to_string(),
                            )),
                        };
                    }
                    JobState::Error => {
                        let msg = snapshot
                            .error_message
                            .unwrap_or_else(|| "unknown synthesis error".to_string());
                        return Err(TtsError::Vendor(msg));
                    }
                    JobState::Waiting | JobState::Processing => {
                        debug!(job_id, state = ?snapshot.state, "synthesis in progress");
                    }
                },
                // Never abort on a transport error here; retry under the
                // same overall budget.
                Err(e) => {
                    warn!(job_id, error = %e, "status query failed, retrying");
                }
            }

            tokio::time::sleep(self.retry_delay).await;
        }

        Err(TtsError::Timeout(self.max_wait))
    }
}
