//! Per-account throttled execution of remote calls.
//!
//! Every account gets its own lane: a [`RequestQueue`], an
//! [`AccountRateState`] and at most one drain task. A drain only ever sleeps
//! on behalf of its own account, so a slow or cooled-down account never
//! delays the others.

use std::future::{Future, IntoFuture};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::account_state::AccountRateState;
use super::config::LimiterConfig;
use super::errors::{AccountKey, ErrorClass, LimiterError, RemoteError};
use super::queue::{QueuedTask, RemoteJob, RequestQueue};

/// Where, how urgently and for how long a call may wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub account: AccountKey,
    /// Higher runs first.
    pub priority: i32,
    /// Longest time the call may sit in the queue before it is abandoned.
    pub timeout: Duration,
    pub id: Option<String>,
}

impl TaskSpec {
    pub fn new(account: impl Into<AccountKey>, priority: i32, timeout: Duration) -> Self {
        Self { account: account.into(), priority, timeout, id: None }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Snapshot of one account's limiter state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountStatus {
    pub queued: usize,
    pub request_count: u32,
    pub rate_limited: bool,
    pub retry_after: Option<Duration>,
}

/// Throttled executor for remote calls, shared by handle.
///
/// Cloning is cheap and every clone drives the same lanes.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<LimiterInner>,
}

struct LimiterInner {
    config: LimiterConfig,
    lanes: DashMap<AccountKey, Arc<AccountLane>>,
    runtime: Handle,
}

struct AccountLane {
    key: AccountKey,
    queue: Mutex<RequestQueue>,
    state: Mutex<AccountRateState>,
    draining: AtomicBool,
}

enum Admission {
    Ready,
    Wait(Duration),
    Reject(Duration),
}

impl AccountLane {
    fn new(key: AccountKey) -> Self {
        Self {
            key,
            queue: Mutex::new(RequestQueue::new()),
            state: Mutex::new(AccountRateState::default()),
            draining: AtomicBool::new(false),
        }
    }

    /// Decides whether the head of the queue may be dispatched now.
    ///
    /// A task returning from backoff has already waited out its delay and
    /// passes an open cooldown; fresh tasks are rejected by it.
    fn admit(&self, config: &LimiterConfig, retrying: bool) -> Admission {
        let mut state = self.state.lock();
        let now = Instant::now();
        state.refresh_window(now, config.hourly_window);

        if let Some(retry_after) = state.cooldown_remaining(now) {
            if !retrying {
                return Admission::Reject(retry_after);
            }
        } else if state.clear_expired_cooldown(now) {
            info!(account = %self.key, "rate limit cooldown elapsed");
        }
        if let Some(retry_after) =
            state.ceiling_remaining(now, config.hourly_window, config.max_requests_per_hour)
        {
            return Admission::Reject(retry_after);
        }

        match state.interval_wait(now, config.min_interval) {
            wait if wait.is_zero() => Admission::Ready,
            wait => Admission::Wait(wait),
        }
    }

    /// Read-only fail-fast check used at submission time.
    fn blocked_for(&self, config: &LimiterConfig) -> Option<Duration> {
        let state = self.state.lock();
        let now = Instant::now();
        state.cooldown_remaining(now).or_else(|| {
            state.ceiling_remaining(now, config.hourly_window, config.max_requests_per_hour)
        })
    }
}

impl RateLimiter {
    /// Builds a limiter bound to the current tokio runtime.
    pub fn new(config: LimiterConfig) -> Result<Self, LimiterError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| {
            LimiterError::Config("RateLimiter must be created inside a tokio runtime".into())
        })?;

        Ok(Self {
            inner: Arc::new(LimiterInner { config, lanes: DashMap::new(), runtime }),
        })
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.inner.config
    }

    /// Queues `action` for `spec.account`.
    ///
    /// Fails immediately when the timeout is zero or the account is cooling
    /// down or over its hourly ceiling. Otherwise the returned handle
    /// resolves exactly once with the call's value or a [`LimiterError`].
    /// `action` is invoked once per attempt.
    pub fn submit<F, Fut, T>(&self, spec: TaskSpec, action: F) -> Result<TaskHandle<T>, LimiterError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
        T: Send + 'static,
    {
        if spec.timeout.is_zero() {
            return Err(LimiterError::InvalidTimeout);
        }

        let lane = self.lane(&spec.account);
        if let Some(retry_after) = lane.blocked_for(&self.inner.config) {
            debug!(account = %spec.account, ?retry_after, "rejecting submission while throttled");
            return Err(LimiterError::RateLimited { account: spec.account, retry_after });
        }

        let (sender, receiver) = oneshot::channel();
        let id = spec.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Instant::now();
        let task = QueuedTask {
            id: id.clone(),
            account: spec.account,
            priority: spec.priority,
            retry_count: 0,
            enqueued_at: now,
            deadline: now + spec.timeout,
            job: Box::new(ReplyingJob { action, reply: Some(sender) }),
        };

        let position = lane.queue.lock().insert(task);
        debug!(account = %lane.key, task_id = %id, priority = spec.priority, position, "task queued");
        self.inner.kick(&lane);

        Ok(TaskHandle {
            id,
            lane,
            receiver,
            deadline: now + spec.timeout,
            timeout: spec.timeout,
        })
    }

    pub fn status(&self, account: &AccountKey) -> AccountStatus {
        let Some(lane) = self.inner.lanes.get(account).map(|entry| Arc::clone(entry.value()))
        else {
            return AccountStatus::default();
        };

        let queued = lane.queue.lock().len();
        let state = lane.state.lock();
        let retry_after = state.cooldown_remaining(Instant::now());
        AccountStatus {
            queued,
            request_count: state.request_count,
            rate_limited: retry_after.is_some(),
            retry_after,
        }
    }

    /// Total number of tasks waiting across all accounts.
    pub fn queued_len(&self) -> usize {
        self.inner.lanes.iter().map(|entry| entry.value().queue.lock().len()).sum()
    }

    /// Opens a cooldown for `account` from outside the limiter, e.g. when
    /// usage headers show the account is about to be throttled.
    pub fn mark_rate_limited(&self, account: &AccountKey, cooldown: Duration) {
        let lane = self.lane(account);
        lane.state.lock().mark_rate_limited(Instant::now(), cooldown);
        warn!(account = %account, ?cooldown, "account marked rate limited");
    }

    fn lane(&self, account: &AccountKey) -> Arc<AccountLane> {
        Arc::clone(
            self.inner
                .lanes
                .entry(account.clone())
                .or_insert_with(|| Arc::new(AccountLane::new(account.clone())))
                .value(),
        )
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.inner.config)
            .field("accounts", &self.inner.lanes.len())
            .finish()
    }
}

impl LimiterInner {
    /// Starts a drain for `lane` unless one is already running.
    fn kick(self: &Arc<Self>, lane: &Arc<AccountLane>) {
        if lane.draining.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err()
        {
            return;
        }
        let inner = Arc::clone(self);
        let lane = Arc::clone(lane);
        self.runtime.spawn(async move { inner.drain(lane).await });
    }

    #[instrument(skip_all, fields(account = %lane.key))]
    async fn drain(self: Arc<Self>, lane: Arc<AccountLane>) {
        loop {
            self.drain_queue(&lane).await;

            lane.draining.store(false, Ordering::Release);
            // A submission may have slipped in after the queue looked empty
            // but before the flag dropped.
            if lane.queue.lock().is_empty() || lane.draining.swap(true, Ordering::AcqRel) {
                break;
            }
        }
    }

    async fn drain_queue(self: &Arc<Self>, lane: &Arc<AccountLane>) {
        loop {
            let retrying = {
                let queue = lane.queue.lock();
                if queue.is_empty() {
                    return;
                }
                queue.front_is_retry()
            };

            match lane.admit(&self.config, retrying) {
                Admission::Wait(wait) => {
                    debug!(?wait, "waiting out minimum interval");
                    tokio::time::sleep(wait).await;
                }
                Admission::Reject(retry_after) => {
                    let Some(mut task) = lane.queue.lock().pop_front() else { return };
                    warn!(task_id = %task.id, ?retry_after, "rejecting task while throttled");
                    task.job.fail(LimiterError::RateLimited {
                        account: task.account.clone(),
                        retry_after,
                    });
                }
                Admission::Ready => {
                    let Some(task) = lane.queue.lock().pop_front() else { return };
                    if task.job.is_abandoned() {
                        debug!(task_id = %task.id, "skipping abandoned task");
                        continue;
                    }
                    lane.state.lock().record_dispatch(Instant::now());
                    self.execute(lane, task).await;
                }
            }
        }
    }

    async fn execute(self: &Arc<Self>, lane: &Arc<AccountLane>, mut task: QueuedTask) {
        debug!(
            task_id = %task.id,
            attempt = task.retry_count + 1,
            queued_for = ?task.enqueued_at.elapsed(),
            "dispatching task"
        );

        let outcome = AssertUnwindSafe(task.job.run()).catch_unwind().await;
        let error = match outcome {
            Ok(Ok(())) => {
                lane.state.lock().record_success();
                return;
            }
            Ok(Err(error)) => error,
            Err(_) => {
                warn!(task_id = %task.id, "task panicked");
                task.job.fail(LimiterError::Dropped(task.id.clone()));
                return;
            }
        };

        match self.config.classifier.classify(&error) {
            ErrorClass::RateLimited => self.handle_rate_limited(lane, task, error),
            ErrorClass::Timeout | ErrorClass::Other => {
                debug!(task_id = %task.id, error = %error, "task failed without retry");
                task.job.fail(LimiterError::Remote(error));
            }
        }
    }

    fn handle_rate_limited(
        self: &Arc<Self>,
        lane: &Arc<AccountLane>,
        mut task: QueuedTask,
        error: RemoteError,
    ) {
        lane.state.lock().mark_rate_limited(Instant::now(), self.config.cooldown);

        if task.retry_count >= self.config.max_retries {
            warn!(
                task_id = %task.id,
                attempts = task.retry_count,
                error = %error,
                "rate limited, retries exhausted"
            );
            task.job.fail(LimiterError::RetriesExhausted {
                attempts: task.retry_count,
                source: error,
            });
            return;
        }

        task.retry_count += 1;
        let delay = self.config.backoff.delay_for(task.retry_count);
        warn!(
            task_id = %task.id,
            retry = task.retry_count,
            ?delay,
            error = %error,
            "rate limited, scheduling retry"
        );

        let inner = Arc::clone(self);
        let lane = Arc::clone(lane);
        self.runtime.spawn(async move {
            let wake = Instant::now() + delay;
            if task.deadline <= wake {
                tokio::time::sleep_until(task.deadline).await;
                info!(task_id = %task.id, retry = task.retry_count, "task timed out in backoff");
                let waited = task.timeout();
                task.job.fail(LimiterError::Timeout { task_id: task.id.clone(), waited });
                return;
            }
            tokio::time::sleep_until(wake).await;
            lane.queue.lock().push_front(task);
            inner.kick(&lane);
        });
    }
}

/// Awaitable outcome of a submitted task.
///
/// Awaiting applies the queue timeout: a task still waiting in the queue, or
/// sitting out a retry backoff, at the deadline resolves to
/// [`LimiterError::Timeout`]. A task that is executing runs to completion.
/// Dropping the handle abandons the task if it has not started yet.
pub struct TaskHandle<T> {
    id: String,
    lane: Arc<AccountLane>,
    receiver: oneshot::Receiver<Result<T, LimiterError>>,
    deadline: Instant,
    timeout: Duration,
}

impl<T> TaskHandle<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn account(&self) -> &AccountKey {
        &self.lane.key
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("account", &self.lane.key)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> IntoFuture for TaskHandle<T> {
    type Output = Result<T, LimiterError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { id, lane, mut receiver, deadline, timeout } = self;

        async move {
            let early = tokio::select! {
                biased;
                outcome = &mut receiver => Some(outcome),
                () = tokio::time::sleep_until(deadline) => None,
            };
            if let Some(outcome) = early {
                return flatten(outcome, id);
            }

            if lane.queue.lock().remove(&id).is_some() {
                info!(account = %lane.key, task_id = %id, ?timeout, "task timed out in queue");
                return Err(LimiterError::Timeout { task_id: id, waited: timeout });
            }

            flatten(receiver.await, id)
        }
        .boxed()
    }
}

fn flatten<T>(
    outcome: Result<Result<T, LimiterError>, oneshot::error::RecvError>,
    task_id: String,
) -> Result<T, LimiterError> {
    outcome.unwrap_or_else(|_| Err(LimiterError::Dropped(task_id)))
}

/// Adapts a caller's closure into a [`RemoteJob`] that answers on a oneshot.
struct ReplyingJob<F, T> {
    action: F,
    reply: Option<oneshot::Sender<Result<T, LimiterError>>>,
}

#[async_trait]
impl<F, Fut, T> RemoteJob for ReplyingJob<F, T>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    T: Send + 'static,
{
    async fn run(&mut self) -> Result<(), RemoteError> {
        let value = (self.action)().await?;
        if let Some(reply) = self.reply.take() {
            // The caller may have given up; nothing to do then.
            let _ = reply.send(Ok(value));
        }
        Ok(())
    }

    fn fail(&mut self, error: LimiterError) {
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(Err(error));
        }
    }

    fn is_abandoned(&self) -> bool {
        self.reply.as_ref().map_or(true, oneshot::Sender::is_closed)
    }
}
