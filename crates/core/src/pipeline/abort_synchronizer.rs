use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

struct Shared {
    requested: AtomicBool,
    /// Whether a loop ever took the completion signal.
    issued: AtomicBool,
    complete: Mutex<bool>,
    completed: Condvar,
}

impl Shared {
    fn signal_complete(&self) {
        let mut complete = self.complete.lock().unwrap_or_else(PoisonError::into_inner);
        *complete = true;
        self.completed.notify_all();
    }
}

/// Cooperative cancellation with a blocking join, for one run of a
/// processing loop.
///
/// The controller keeps the synchronizer. The loop holds an [`AbortToken`],
/// checked between units of work, and a [`CompletionSignal`], released when
/// the loop exits. [`AbortSynchronizer::abort`] returns only after that
/// release. If no completion signal was ever handed out there is no loop to
/// wait for, and waiting returns immediately.
#[derive(Clone)]
pub struct AbortSynchronizer {
    shared: Arc<Shared>,
}

impl AbortSynchronizer {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                requested: AtomicBool::new(false),
                issued: AtomicBool::new(false),
                complete: Mutex::new(false),
                completed: Condvar::new(),
            }),
        }
    }

    pub fn token(&self) -> AbortToken {
        AbortToken {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The signal the loop must hold for its whole run.
    pub fn completion(&self) -> CompletionSignal {
        self.shared.issued.store(true, Ordering::SeqCst);
        CompletionSignal {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Sets the flag without waiting.
    pub fn request(&self) {
        self.shared.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.shared.requested.load(Ordering::SeqCst)
    }

    /// Blocks until the loop has signalled completion.
    pub fn wait(&self) {
        if !self.has_loop() {
            return;
        }
        let complete = self
            .shared
            .complete
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _complete = self
            .shared
            .completed
            .wait_while(complete, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`Self::wait`], giving up after `timeout`. Returns whether the
    /// loop completed, or `true` when there is no loop.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if !self.has_loop() {
            return true;
        }
        let complete = self
            .shared
            .complete
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (complete, _) = self
            .shared
            .completed
            .wait_timeout_while(complete, timeout, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
        *complete
    }

    /// Requests cancellation and blocks until the loop has exited.
    pub fn abort(&self) {
        self.request();
        self.wait();
    }

    fn has_loop(&self) -> bool {
        self.shared.issued.load(Ordering::SeqCst)
    }

    pub fn is_complete(&self) -> bool {
        *self
            .shared
            .complete
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AbortSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Loop-side view of the cancellation flag.
#[derive(Clone)]
pub struct AbortToken {
    shared: Arc<Shared>,
}

impl AbortToken {
    pub fn is_requested(&self) -> bool {
        self.shared.requested.load(Ordering::SeqCst)
    }
}

/// One-shot completion held by the loop. Signals on [`Self::complete`] or
/// when dropped, so an unwinding loop still releases waiters.
pub struct CompletionSignal {
    shared: Arc<Shared>,
}

impl CompletionSignal {
    pub fn complete(self) {
        drop(self);
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        self.shared.signal_complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_abort_waits_for_loop_exit() {
        let sync = AbortSynchronizer::new();
        let token = sync.token();
        let completion = sync.completion();
        let (tx, rx) = crossbeam_channel::unbounded();

        let handle = thread::spawn(move || {
            let mut iterations = 0usize;
            while !token.is_requested() {
                iterations += 1;
                thread::sleep(Duration::from_millis(1));
            }
            tx.send(iterations).unwrap();
            completion.complete();
        });

        sync.abort();
        assert!(sync.is_complete());
        // The loop sent before signalling, so the value is already there.
        assert!(rx.try_recv().is_ok());
        handle.join().unwrap();
    }

    #[test]
    fn test_request_does_not_block() {
        let sync = AbortSynchronizer::new();
        let _completion = sync.completion();
        sync.request();
        assert!(sync.is_requested());
        assert!(sync.token().is_requested());
        assert!(!sync.is_complete());
    }

    #[test]
    fn test_dropped_signal_completes() {
        let sync = AbortSynchronizer::new();
        let completion = sync.completion();
        drop(completion);
        assert!(sync.is_complete());
        sync.wait();
    }

    #[test]
    fn test_panicking_loop_still_releases_waiter() {
        let sync = AbortSynchronizer::new();
        let completion = sync.completion();
        let handle = thread::spawn(move || {
            let _completion = completion;
            panic!("engine blew up");
        });

        sync.abort();
        assert!(sync.is_complete());
        assert!(handle.join().is_err());
    }

    #[test]
    fn test_wait_timeout_expires_while_running() {
        let sync = AbortSynchronizer::new();
        let _completion = sync.completion();
        assert!(!sync.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_abort_without_loop_returns_immediately() {
        let sync = AbortSynchronizer::new();
        sync.abort();
        assert!(sync.is_requested());
        assert!(sync.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_clone_waits_on_the_same_loop() {
        let sync = AbortSynchronizer::new();
        let completion = sync.completion();
        let controller = sync.clone();
        controller.request();
        assert!(sync.token().is_requested());
        assert!(!controller.wait_timeout(Duration::from_millis(10)));
        completion.complete();
        controller.wait();
        assert!(sync.is_complete());
    }

    #[test]
    fn test_abort_after_completion_returns_immediately() {
        let sync = AbortSynchronizer::new();
        sync.completion().complete();
        sync.abort();
        assert!(sync.is_complete());
    }
}
