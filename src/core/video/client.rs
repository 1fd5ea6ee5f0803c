//! Client for awaiting a long-running remote task.
//!
//! The video generation service accepts a task submission elsewhere and
//! exposes a status endpoint keyed by task code. This client polls that
//! endpoint until the task reaches a terminal state or the attempt budget is
//! exhausted. It is independent of the TTS registry: one status endpoint per
//! call, no provider bookkeeping.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Envelope code the task API uses for "request accepted".
const API_OK: i64 = 10000;

/// Task status values reported by the remote service.
pub const STATUS_PENDING: i64 = 1;
pub const STATUS_DONE: i64 = 2;
pub const STATUS_FAILED: i64 = 3;

/// Errors from the remote task await.
#[derive(Debug, Error)]
pub enum RemoteTaskError {
    /// Status query failed at the transport layer. Terminal for the whole
    /// wait — unlike the synthesis job poller, this loop never retries a
    /// failed query.
    #[error("status query failed: {0}")]
    Query(String),

    /// The service reported the task as failed; message surfaced verbatim.
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// The service replied outside its documented envelope or status set.
    #[error("unrecognized API response: {0}")]
    Unrecognized(String),

    /// Done status without a result URL.
    #[error("task completed without a result URL")]
    MissingResult,

    /// Attempt budget exhausted without a terminal status.
    #[error("task timed out after {0} attempts")]
    Timeout(u64),
}

/// Read-only snapshot of the remote task, refreshed on each poll tick.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTaskSnapshot {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<RemoteTaskSnapshot>,
}

/// Configuration for the remote task client.
#[derive(Debug, Clone)]
pub struct RemoteTaskConfig {
    /// Base URL of the task service, e.g. `http://gen-video:8383/easy`.
    pub base_url: String,
    /// Base URL joined with the relative result path on completion.
    pub result_base_url: String,
    /// Nominal overall timeout in seconds.
    pub timeout_seconds: u64,
    /// Seconds between status queries.
    pub poll_interval_seconds: u64,
}

impl Default for RemoteTaskConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8383/easy".to_string(),
            result_base_url: "http://127.0.0.1:8383".to_string(),
            timeout_seconds: 1200,
            poll_interval_seconds: 2,
        }
    }
}

/// Polls the remote task status endpoint until completion.
#[derive(Debug, Clone)]
pub struct RemoteTaskClient {
    http: reqwest::Client,
    config: RemoteTaskConfig,
}

impl RemoteTaskClient {
    pub fn new(config: RemoteTaskConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// One-shot status query for `code`.
    pub async fn check_task_status(&self, code: &str) -> Result<RemoteTaskSnapshot, RemoteTaskError> {
        let url = format!("{}/query", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("code", code)])
            .send()
            .await
            .map_err(|e| RemoteTaskError::Query(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteTaskError::Query(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        let envelope: QueryEnvelope = response
            .json()
            .await
            .map_err(|e| RemoteTaskError::Query(format!("invalid status payload: {e}")))?;

        if envelope.code != API_OK {
            let msg = if envelope.msg.is_empty() {
                format!("API error code {}", envelope.code)
            } else {
                envelope.msg
            };
            return Err(RemoteTaskError::Unrecognized(msg));
        }

        envelope
            .data
            .ok_or_else(|| RemoteTaskError::Unrecognized("missing data field".to_string()))
    }

    /// Await completion of the task identified by `code`.
    ///
    /// The budget is a fixed attempt count, `timeout / poll_interval`, not a
    /// wall-clock deadline: a slow status endpoint can stretch the effective
    /// wait past the nominal timeout. This matches the source system and is
    /// kept intentionally.
    ///
    /// `on_progress` is invoked with `(progress, message)` for every Pending
    /// snapshot.
    pub async fn wait_for_completion(
        &self,
        code: &str,
        mut on_progress: Option<&mut (dyn FnMut(u8, &str) + Send)>,
    ) -> Result<String, RemoteTaskError> {
        let max_attempts = self.config.timeout_seconds / self.config.poll_interval_seconds.max(1);
        let interval = Duration::from_secs(self.config.poll_interval_seconds);

        for attempt in 0..max_attempts {
            // A failed query ends the wait immediately; the `?` below is the
            // documented terminal-on-transport-failure behavior.
            let snapshot = self.check_task_status(code).await?;

            match snapshot.status {
                Some(STATUS_PENDING) => {
                    debug!(code, attempt, progress = snapshot.progress, "task pending");
                    if let Some(cb) = on_progress.as_deref_mut() {
                        cb(snapshot.progress, &snapshot.msg);
                    }
                }
                Some(STATUS_DONE) => {
                    return match snapshot.result {
                        Some(path) if !path.is_empty() => {
                            let url = format!("{}{}", self.config.result_base_url, path);
                            debug!(code, url = %url, "task complete");
                            Ok(url)
                        }
                        _ => Err(RemoteTaskError::MissingResult),
                    };
                }
                Some(STATUS_FAILED) => {
                    warn!(code, msg = %snapshot.msg, "task failed");
                    return Err(RemoteTaskError::TaskFailed(snapshot.msg));
                }
                other => {
                    return Err(RemoteTaskError::Unrecognized(format!(
                        "unexpected task status {other:?}"
                    )));
                }
            }

            tokio::time::sleep(interval).await;
        }

        Err(RemoteTaskError::Timeout(max_attempts))
    }
}
