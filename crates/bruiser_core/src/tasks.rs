//! # Task Queues
//!
//! Fire-and-forget background jobs on a named worker pool.
//!
//! ## Architecture
//!
//! ```text
//!   Host thread 1 ──┐
//!   Host thread 2 ──┼──> [bounded channel] ──> worker-0 ┐
//!   Host thread N ──┘      (try_send)      ──> worker-1 ┼──> job()
//!                                          ──> worker-k ┘
//! ```
//!
//! `spawn` never blocks: a full queue is an error the caller decides about.
//! `spawn_timeout` waits up to a bound for a slot to free up.
//! A panicking job is logged and counted; its worker keeps draining.
//!
//! Dropping the queue closes the channel. Workers finish what is already
//! queued and exit on their own; nothing joins them, so jobs still waiting
//! on the host at process exit are abandoned.

use crate::error::TaskError;
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Configuration for a [`TaskQueue`].
#[derive(Clone, Debug)]
pub struct TaskQueueConfig {
    /// Thread name prefix. Workers are named `{name}-{index}`.
    pub name: String,
    /// Worker thread count.
    pub workers: usize,
    /// Jobs that can wait in the channel before `spawn` fails.
    pub capacity: usize,
}

impl TaskQueueConfig {
    /// Single worker, 1024 slots.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workers: 1,
            capacity: 1024,
        }
    }

    /// Sets the worker count (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the channel capacity (at least one).
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

/// Counters for a [`TaskQueue`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskStats {
    /// Jobs accepted by `spawn`.
    pub submitted: u64,
    /// Jobs that ran to the end, panicked or not.
    pub completed: u64,
    /// Jobs that panicked.
    pub panicked: u64,
    /// Jobs accepted but not yet completed.
    pub in_flight: u64,
}

#[derive(Default)]
struct QueueState {
    in_flight: Mutex<u64>,
    idle: Condvar,
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl QueueState {
    fn finish_one(&self) {
        let mut in_flight = self.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.idle.notify_all();
        }
    }
}

/// Named worker pool draining a bounded channel.
pub struct TaskQueue {
    name: String,
    sender: Sender<Job>,
    state: Arc<QueueState>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskQueue {
    /// Starts the workers.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Spawn`] if a worker thread cannot be started.
    pub fn new(config: TaskQueueConfig) -> Result<Self, TaskError> {
        let (sender, receiver) = bounded::<Job>(config.capacity.max(1));
        let state = Arc::new(QueueState::default());

        let mut workers = Vec::with_capacity(config.workers.max(1));
        for index in 0..config.workers.max(1) {
            let receiver = receiver.clone();
            let state = Arc::clone(&state);
            let queue_name = config.name.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{index}", config.name))
                .spawn(move || worker_loop(&queue_name, &receiver, &state))
                .map_err(|source| TaskError::Spawn {
                    name: config.name.clone(),
                    source,
                })?;
            workers.push(handle);
        }

        tracing::debug!(
            "Task queue {} started with {} worker(s), capacity {}",
            config.name,
            workers.len(),
            config.capacity
        );

        Ok(Self {
            name: config.name,
            sender,
            state,
            workers,
        })
    }

    /// Queues a job without blocking.
    ///
    /// # Errors
    ///
    /// [`TaskError::QueueFull`] when every slot is taken,
    /// [`TaskError::Closed`] when no worker is left.
    pub fn spawn<F>(&self, job: F) -> Result<(), TaskError>
    where
        F: FnOnce() + Send + 'static,
    {
        // Count before sending so a fast worker cannot finish first.
        *self.state.in_flight.lock() += 1;
        match self.sender.try_send(Box::new(job)) {
            Ok(()) => {
                self.state.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(err) => {
                self.state.finish_one();
                match err {
                    TrySendError::Full(_) => Err(TaskError::QueueFull(self.name.clone())),
                    TrySendError::Disconnected(_) => Err(TaskError::Closed(self.name.clone())),
                }
            }
        }
    }

    /// Queues a job, waiting up to `wait` for a free slot.
    ///
    /// # Errors
    ///
    /// [`TaskError::QueueFull`] when no slot freed up in time,
    /// [`TaskError::Closed`] when no worker is left.
    pub fn spawn_timeout<F>(&self, job: F, wait: Duration) -> Result<(), TaskError>
    where
        F: FnOnce() + Send + 'static,
    {
        *self.state.in_flight.lock() += 1;
        match self.sender.send_timeout(Box::new(job), wait) {
            Ok(()) => {
                self.state.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(err) => {
                self.state.finish_one();
                match err {
                    SendTimeoutError::Timeout(_) => Err(TaskError::QueueFull(self.name.clone())),
                    SendTimeoutError::Disconnected(_) => {
                        Err(TaskError::Closed(self.name.clone()))
                    }
                }
            }
        }
    }

    /// Queue name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Jobs accepted but not yet completed.
    #[must_use]
    pub fn in_flight(&self) -> u64 {
        *self.state.in_flight.lock()
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> TaskStats {
        TaskStats {
            submitted: self.state.submitted.load(Ordering::Relaxed),
            completed: self.state.completed.load(Ordering::Relaxed),
            panicked: self.state.panicked.load(Ordering::Relaxed),
            in_flight: self.in_flight(),
        }
    }

    /// Blocks until no job is in flight or `timeout` elapses.
    ///
    /// Returns `true` if the queue went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut in_flight = self.state.in_flight.lock();
        while *in_flight > 0 {
            if self
                .state
                .idle
                .wait_until(&mut in_flight, deadline)
                .timed_out()
            {
                return *in_flight == 0;
            }
        }
        true
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        let in_flight = self.in_flight();
        if in_flight > 0 {
            tracing::debug!(
                "Task queue {} dropped with {} job(s) in flight; detaching workers",
                self.name,
                in_flight
            );
        }
        // Workers exit once the channel drains; their handles are not joined.
        self.workers.clear();
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("name", &self.name)
            .field("workers", &self.workers.len())
            .field("stats", &self.stats())
            .finish()
    }
}

fn worker_loop(name: &str, receiver: &Receiver<Job>, state: &QueueState) {
    while let Ok(job) = receiver.recv() {
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            state.panicked.fetch_add(1, Ordering::Relaxed);
            tracing::error!("Job on task queue {name} panicked");
        }
        state.completed.fetch_add(1, Ordering::Relaxed);
        state.finish_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_jobs_run_and_queue_goes_idle() {
        let queue = TaskQueue::new(TaskQueueConfig::new("test-run").with_workers(2))
            .expect("queue start failed");
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            queue
                .spawn(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .expect("spawn failed");
        }

        assert!(queue.wait_idle(Duration::from_secs(5)));
        assert_eq!(counter.load(Ordering::SeqCst), 100);

        let stats = queue.stats();
        assert_eq!(stats.submitted, 100);
        assert_eq!(stats.completed, 100);
        assert_eq!(stats.in_flight, 0);
        assert_eq!(queue.worker_count(), 2);
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let queue = TaskQueue::new(TaskQueueConfig::new("test-panic")).expect("queue start failed");
        let ran = Arc::new(AtomicUsize::new(0));

        queue.spawn(|| panic!("boom")).expect("spawn failed");
        let after = Arc::clone(&ran);
        queue
            .spawn(move || {
                after.fetch_add(1, Ordering::SeqCst);
            })
            .expect("spawn failed");

        assert!(queue.wait_idle(Duration::from_secs(5)));
        assert_eq!(ran.load(Ordering::SeqCst), 1, "worker must survive the panic");
        assert_eq!(queue.stats().panicked, 1);
    }

    #[test]
    fn test_full_queue_rejects() {
        let queue = TaskQueue::new(TaskQueueConfig::new("test-full").with_capacity(1))
            .expect("queue start failed");
        let (release_tx, release_rx) = unbounded::<()>();
        let (started_tx, started_rx) = unbounded::<()>();

        // Occupy the only worker.
        queue
            .spawn(move || {
                let _ = started_tx.send(());
                let _ = release_rx.recv();
            })
            .expect("spawn failed");
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker never started");

        // Fill the only slot.
        queue.spawn(|| {}).expect("slot should be free");

        let rejected = queue.spawn(|| {});
        assert!(matches!(rejected, Err(TaskError::QueueFull(ref name)) if name == "test-full"));

        release_tx.send(()).expect("worker gone");
        assert!(queue.wait_idle(Duration::from_secs(5)));
        assert_eq!(queue.stats().submitted, 2);
    }

    #[test]
    fn test_spawn_timeout_waits_for_a_free_slot() {
        let queue = TaskQueue::new(TaskQueueConfig::new("test-wait").with_capacity(1))
            .expect("queue start failed");
        let (release_tx, release_rx) = unbounded::<()>();
        let (started_tx, started_rx) = unbounded::<()>();

        queue
            .spawn(move || {
                let _ = started_tx.send(());
                let _ = release_rx.recv();
            })
            .expect("spawn failed");
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker never started");
        queue.spawn(|| {}).expect("slot should be free");

        // Nobody frees a slot: the bounded wait gives up.
        let rejected = queue.spawn_timeout(|| {}, Duration::from_millis(20));
        assert!(matches!(rejected, Err(TaskError::QueueFull(_))));

        // The worker frees up shortly after the wait starts.
        let releaser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            let _ = release_tx.send(());
        });
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        queue
            .spawn_timeout(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
                Duration::from_secs(5),
            )
            .expect("slot should free up");
        releaser.join().expect("releaser panicked");

        assert!(queue.wait_idle(Duration::from_secs(5)));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(queue.stats().submitted, 3);
    }

    #[test]
    fn test_wait_idle_times_out_while_busy() {
        let queue = TaskQueue::new(TaskQueueConfig::new("test-busy")).expect("queue start failed");
        let (release_tx, release_rx) = unbounded::<()>();
        queue
            .spawn(move || {
                let _ = release_rx.recv();
            })
            .expect("spawn failed");

        assert!(!queue.wait_idle(Duration::from_millis(30)));
        assert_eq!(queue.in_flight(), 1);

        release_tx.send(()).expect("worker gone");
        assert!(queue.wait_idle(Duration::from_secs(5)));
    }

    #[test]
    fn test_drop_does_not_wait_for_blocked_jobs() {
        let queue = TaskQueue::new(TaskQueueConfig::new("test-drop")).expect("queue start failed");
        let (_hold_tx, hold_rx) = unbounded::<()>();
        queue
            .spawn(move || {
                let _ = hold_rx.recv_timeout(Duration::from_secs(1));
            })
            .expect("spawn failed");

        let start = Instant::now();
        drop(queue);
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
