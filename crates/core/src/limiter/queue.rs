//! Pending remote calls for one account.

use std::fmt;

use adsync_common::collections::PriorityDeque;
use async_trait::async_trait;
use tokio::time::Instant;

use super::errors::{AccountKey, LimiterError, RemoteError};

/// Type-erased remote call plus the channel its caller is waiting on.
///
/// `run` may be invoked again after a rate-limited failure; it reports the
/// value to the caller itself on success. `fail` delivers a terminal error.
#[async_trait]
pub trait RemoteJob: Send {
    async fn run(&mut self) -> Result<(), RemoteError>;

    fn fail(&mut self, error: LimiterError);

    /// True once nobody is waiting for the outcome any more.
    fn is_abandoned(&self) -> bool;
}

/// A remote call waiting for its turn.
pub struct QueuedTask {
    pub id: String,
    pub account: AccountKey,
    pub priority: i32,
    pub retry_count: u32,
    pub enqueued_at: Instant,
    /// Past this point the task is given up, even while it sits out a
    /// retry backoff.
    pub deadline: Instant,
    pub job: Box<dyn RemoteJob>,
}

impl QueuedTask {
    pub fn is_retry(&self) -> bool {
        self.retry_count > 0
    }

    /// The queue timeout the task was submitted with.
    pub fn timeout(&self) -> std::time::Duration {
        self.deadline.saturating_duration_since(self.enqueued_at)
    }
}

impl fmt::Debug for QueuedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedTask")
            .field("id", &self.id)
            .field("account", &self.account)
            .field("priority", &self.priority)
            .field("retry_count", &self.retry_count)
            .finish_non_exhaustive()
    }
}

/// Priority-descending queue, FIFO among equal priorities.
#[derive(Debug, Default)]
pub struct RequestQueue {
    tasks: PriorityDeque<QueuedTask>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places the task before the first task with strictly lower priority.
    pub fn insert(&mut self, task: QueuedTask) -> usize {
        self.tasks.insert(task.priority, task)
    }

    /// Puts a retried task back at the head so it keeps its turn.
    pub fn push_front(&mut self, task: QueuedTask) {
        self.tasks.push_front(task.priority, task);
    }

    /// True when the head of the queue is a task coming back from backoff.
    pub fn front_is_retry(&self) -> bool {
        self.tasks.front().is_some_and(|(_, task)| task.is_retry())
    }

    pub fn pop_front(&mut self) -> Option<QueuedTask> {
        self.tasks.pop_front().map(|(_, task)| task)
    }

    /// Takes a task out of the queue by id, if it has not been started.
    pub fn remove(&mut self, task_id: &str) -> Option<QueuedTask> {
        self.tasks.remove_first(|task| task.id == task_id).map(|(_, task)| task)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|(_, task)| task.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopJob;

    #[async_trait]
    impl RemoteJob for NoopJob {
        async fn run(&mut self) -> Result<(), RemoteError> {
            Ok(())
        }

        fn fail(&mut self, _error: LimiterError) {}

        fn is_abandoned(&self) -> bool {
            false
        }
    }

    fn task(id: &str, priority: i32) -> QueuedTask {
        QueuedTask {
            id: id.to_string(),
            account: AccountKey::from("act_1"),
            priority,
            retry_count: 0,
            enqueued_at: Instant::now(),
            deadline: Instant::now() + std::time::Duration::from_secs(30),
            job: Box::new(NoopJob),
        }
    }

    #[test]
    fn orders_by_priority_then_arrival() {
        let mut queue = RequestQueue::new();
        queue.insert(task("a", 0));
        queue.insert(task("b", 5));
        queue.insert(task("c", 0));
        queue.insert(task("d", 5));
        queue.insert(task("e", 1));
        assert_eq!(queue.ids(), vec!["b", "d", "e", "a", "c"]);
    }

    #[test]
    fn retried_task_returns_to_head() {
        let mut queue = RequestQueue::new();
        queue.insert(task("high", 10));
        let mut retry = task("retry", 0);
        retry.retry_count = 1;
        queue.push_front(retry);
        assert!(queue.front_is_retry());
        assert_eq!(queue.pop_front().map(|t| t.id), Some("retry".to_string()));
        assert!(!queue.front_is_retry());
        assert_eq!(queue.pop_front().map(|t| t.id), Some("high".to_string()));
        assert!(queue.is_empty());
    }

    #[test]
    fn remove_by_id() {
        let mut queue = RequestQueue::new();
        queue.insert(task("a", 0));
        queue.insert(task("b", 0));
        assert!(queue.remove("a").is_some());
        assert!(queue.remove("a").is_none());
        assert_eq!(queue.len(), 1);
    }
}
