//! Poll loop that waits for a task to reach a terminal state.
//!
//! The waiter repeatedly reads the task through a [`TaskReader`], classifies
//! each snapshot and sleeps between attempts. It stops on the first terminal
//! snapshot, on a fatal error, when the attempt or time budget is spent, or
//! when the caller's [`CancellationToken`] fires.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dnac_core::{
    CoreError, FileId, PayloadError, ProgressPayload, TaskId, TaskLifecycle, TaskRecord,
    FILE_ID_KEY,
};

use crate::error::{ClientError, TransportError};
use crate::reader::TaskReader;

/// What to do when a single poll fails in transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportErrorPolicy {
    /// Count the attempt and keep polling.
    #[default]
    Retry,
    /// Abort the wait with [`WaitError::Transport`].
    Surface,
}

/// Polling budget and pacing.
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    /// Upper bound on status reads. Values below 1 are treated as 1.
    pub max_attempts: u32,

    /// Delay after the first attempt.
    pub interval: Duration,

    /// Overall deadline measured from the start of the wait.
    pub timeout: Option<Duration>,

    /// Growth factor applied to the delay after every attempt.
    pub backoff_multiplier: f64,

    /// Ceiling for a single delay.
    pub max_interval: Duration,

    /// Relative random spread applied to each delay, in `0.0..=1.0`.
    pub jitter: f64,

    pub transport_errors: TransportErrorPolicy,

    /// Progress payload field that marks completion once it holds a usable id.
    pub completion_key: String,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(2),
            timeout: Some(Duration::from_secs(120)),
            backoff_multiplier: 1.5,
            max_interval: Duration::from_secs(15),
            jitter: 0.1,
            transport_errors: TransportErrorPolicy::Retry,
            completion_key: FILE_ID_KEY.to_string(),
        }
    }
}

impl WaitPolicy {
    /// Constant pacing with no deadline. `interval = 0` polls back to back.
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            timeout: None,
            backoff_multiplier: 1.0,
            max_interval: interval,
            jitter: 0.0,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_transport_errors(mut self, policy: TransportErrorPolicy) -> Self {
        self.transport_errors = policy;
        self
    }

    pub fn with_completion_key(mut self, key: impl Into<String>) -> Self {
        self.completion_key = key.into();
        self
    }

    /// Delay to sleep after attempt number `attempt` (1-based).
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.max(1.0);
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let max = self.max_interval.as_secs_f64();

        let mut secs = (self.interval.as_secs_f64() * multiplier.powi(exponent)).min(max);

        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter > 0.0 && secs > 0.0 {
            secs *= rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
            secs = secs.min(max);
        }

        Duration::try_from_secs_f64(secs).unwrap_or(self.max_interval)
    }
}

/// A task that reached the success state.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The terminal snapshot.
    pub record: TaskRecord,
    /// Its parsed progress field.
    pub payload: ProgressPayload,
    /// Status reads performed, including the final one.
    pub attempts: u32,
    /// Payload field the wait completed on.
    pub completion_key: String,
}

impl Completion {
    /// Id of the artifact the task produced, read from `completion_key`.
    pub fn file_id(&self) -> Result<FileId, PayloadError> {
        self.payload.get_id(&self.completion_key)
    }
}

/// Why a wait ended without a [`Completion`].
#[derive(Debug, Error)]
pub enum WaitError {
    /// The task id is malformed. Nothing was sent.
    #[error("validation error: {0}")]
    Validation(#[from] CoreError),

    #[error("transport error polling task {task_id} (attempt {attempt}): {source}")]
    Transport {
        task_id: TaskId,
        attempt: u32,
        source: TransportError,
    },

    #[error("could not decode status of task {task_id}: {message}")]
    Decode { task_id: TaskId, message: String },

    /// The controller reported the operation as failed.
    #[error("task {task_id} failed: {reason}")]
    Failed {
        task_id: TaskId,
        reason: String,
        error_code: Option<String>,
        record: Box<TaskRecord>,
    },

    /// The attempt or time budget ran out while the task was still pending.
    #[error("task {task_id} did not complete after {attempts} attempts")]
    TimedOut {
        task_id: TaskId,
        attempts: u32,
        last: Option<Box<TaskRecord>>,
        last_error: Option<TransportError>,
    },

    #[error("wait for task {task_id} cancelled after {attempts} attempts")]
    Cancelled { task_id: TaskId, attempts: u32 },
}

impl WaitError {
    /// The latest snapshot the wait saw, if any.
    pub fn last_record(&self) -> Option<&TaskRecord> {
        match self {
            Self::Failed { record, .. } => Some(record.as_ref()),
            Self::TimedOut { last, .. } => last.as_deref(),
            _ => None,
        }
    }
}

/// Drives the poll loop for one task at a time. Holds no per-wait state, so
/// one waiter can serve any number of sequential or concurrent waits.
#[derive(Clone)]
pub struct CompletionWaiter {
    reader: TaskReader,
    policy: WaitPolicy,
}

impl CompletionWaiter {
    pub fn new(reader: TaskReader, policy: WaitPolicy) -> Self {
        Self { reader, policy }
    }

    pub fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Wait without external cancellation.
    pub async fn wait_for_completion(&self, task_id: &TaskId) -> Result<Completion, WaitError> {
        self.wait(task_id, &CancellationToken::new()).await
    }

    /// Poll `task_id` until it succeeds or fails, the budget is spent, or
    /// `cancel` fires.
    pub async fn wait(
        &self,
        task_id: &TaskId,
        cancel: &CancellationToken,
    ) -> Result<Completion, WaitError> {
        task_id.validate()?;

        let policy = &self.policy;
        let max_attempts = policy.max_attempts.max(1);
        let deadline = policy.timeout.map(|timeout| Instant::now() + timeout);

        let mut attempts: u32 = 0;
        let mut last: Option<TaskRecord> = None;
        let mut last_error: Option<TransportError> = None;

        info!(task_id = %task_id, max_attempts, "Waiting for task");

        loop {
            if cancel.is_cancelled() {
                info!(task_id = %task_id, attempts, "Wait cancelled");
                return Err(WaitError::Cancelled {
                    task_id: task_id.clone(),
                    attempts,
                });
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(timed_out(task_id, attempts, last, last_error));
            }

            attempts += 1;
            let result = tokio::select! {
                biased;
                result = self.reader.fetch(task_id) => result,
                _ = cancel.cancelled() => {
                    info!(task_id = %task_id, attempts, "Wait cancelled during poll");
                    return Err(WaitError::Cancelled {
                        task_id: task_id.clone(),
                        attempts,
                    });
                }
            };

            match result {
                Ok(record) => {
                    let lifecycle = record.lifecycle(&policy.completion_key);
                    debug!(
                        task_id = %task_id,
                        attempt = attempts,
                        lifecycle = %lifecycle,
                        "Polled task"
                    );

                    match lifecycle {
                        TaskLifecycle::Succeeded => {
                            info!(task_id = %task_id, attempts, "Task completed");
                            let payload = record.payload();
                            return Ok(Completion {
                                record,
                                payload,
                                attempts,
                                completion_key: policy.completion_key.clone(),
                            });
                        }
                        TaskLifecycle::Failed => {
                            let error = failed(task_id, record);
                            warn!(task_id = %task_id, attempts, error = %error, "Task failed");
                            return Err(error);
                        }
                        TaskLifecycle::Pending | TaskLifecycle::Unknown => {
                            last = Some(record);
                        }
                    }
                }
                Err(ClientError::Transport(err)) => match policy.transport_errors {
                    TransportErrorPolicy::Surface => {
                        return Err(WaitError::Transport {
                            task_id: task_id.clone(),
                            attempt: attempts,
                            source: err,
                        });
                    }
                    TransportErrorPolicy::Retry => {
                        warn!(
                            task_id = %task_id,
                            attempt = attempts,
                            error = %err,
                            "Poll failed, retrying"
                        );
                        last_error = Some(err);
                    }
                },
                Err(ClientError::Decode(message)) => {
                    return Err(WaitError::Decode {
                        task_id: task_id.clone(),
                        message,
                    });
                }
                Err(ClientError::Validation(err)) => return Err(err.into()),
            }

            if attempts >= max_attempts {
                return Err(timed_out(task_id, attempts, last, last_error));
            }

            let mut delay = policy.next_delay(attempts);
            if let Some(deadline) = deadline {
                delay = delay.min(deadline.saturating_duration_since(Instant::now()));
            }

            if delay.is_zero() {
                tokio::task::yield_now().await;
                continue;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(task_id = %task_id, attempts, "Wait cancelled");
                    return Err(WaitError::Cancelled {
                        task_id: task_id.clone(),
                        attempts,
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

fn failed(task_id: &TaskId, record: TaskRecord) -> WaitError {
    let reason = record
        .failure_reason()
        .or_else(|| record.error_code())
        .unwrap_or("task reported an error")
        .to_string();
    WaitError::Failed {
        task_id: task_id.clone(),
        reason,
        error_code: record.error_code().map(str::to_string),
        record: Box::new(record),
    }
}

fn timed_out(
    task_id: &TaskId,
    attempts: u32,
    last: Option<TaskRecord>,
    last_error: Option<TransportError>,
) -> WaitError {
    warn!(task_id = %task_id, attempts, "Gave up waiting for task");
    WaitError::TimedOut {
        task_id: task_id.clone(),
        attempts,
        last: last.map(Box::new),
        last_error,
    }
}
