//! # Completion Signal
//!
//! One-shot wait/notify for callbacks that arrive on another thread.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Set once, waited on by any number of threads.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    done: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl CompletionSignal {
    /// Creates an unsignalled instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks completion and wakes every waiter.
    pub fn signal(&self) {
        // Store under the lock: a waiter between its check and its park
        // would otherwise miss the wakeup.
        let _guard = self.mutex.lock();
        self.done.store(true, Ordering::Release);
        self.condvar.notify_all();
    }

    /// `true` once [`signal`](Self::signal) has run.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Blocks until signalled.
    pub fn wait(&self) {
        if self.is_done() {
            return;
        }
        let mut guard = self.mutex.lock();
        while !self.is_done() {
            self.condvar.wait(&mut guard);
        }
    }

    /// Blocks until signalled or `timeout` elapses.
    ///
    /// Returns `true` if signalled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_done() {
            return true;
        }
        let deadline = Instant::now() + timeout;
        let mut guard = self.mutex.lock();
        while !self.is_done() {
            if self.condvar.wait_until(&mut guard, deadline).timed_out() {
                return self.is_done();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_signal_before_wait_returns_immediately() {
        let signal = CompletionSignal::new();
        signal.signal();
        signal.wait();
        assert!(signal.is_done());
    }

    #[test]
    fn test_signal_from_other_thread_wakes_waiter() {
        let signal = Arc::new(CompletionSignal::new());
        let remote = Arc::clone(&signal);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.signal();
        });
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        handle.join().expect("signaller panicked");
    }

    #[test]
    fn test_wait_timeout_expires_without_signal() {
        let signal = CompletionSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
