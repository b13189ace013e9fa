//! Delivery contexts for listener callbacks.
//!
//! The pipeline never calls a listener from its own threads. Every callback is
//! wrapped in a [`Job`] and posted to a [`Delivery`] chosen by the caller:
//!
//! - [`ImmediateDelivery`] runs the job on the posting thread. Use it when the
//!   listener is thread-safe and re-entrancy does not matter.
//! - [`EventLoop`] queues jobs in FIFO order for the caller to run on its own
//!   thread, the way a UI toolkit posts work to its event loop. The target
//!   never observes two callbacks at once.

use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

/// A listener callback ready to run.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where listener callbacks are executed.
pub trait Delivery: Send + Sync {
    /// Hand a job over for execution. Jobs posted from one thread must run in
    /// the order they were posted.
    fn post(&self, job: Job);
}

/// Runs every job immediately on the posting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateDelivery;

impl Delivery for ImmediateDelivery {
    fn post(&self, job: Job) {
        job();
    }
}

/// Posting side of an [`EventLoop`].
#[derive(Clone)]
pub struct EventLoopHandle {
    jobs: Sender<Job>,
}

impl Delivery for EventLoopHandle {
    fn post(&self, job: Job) {
        // A dropped loop means nobody is listening anymore
        let _ = self.jobs.send(job);
    }
}

/// A FIFO job queue pumped by its owner's thread.
pub struct EventLoop {
    jobs: Receiver<Job>,
}

impl EventLoop {
    /// Create a loop and the handle the pipeline posts to.
    pub fn new() -> (Self, EventLoopHandle) {
        let (tx, rx) = unbounded();
        (Self { jobs: rx }, EventLoopHandle { jobs: tx })
    }

    /// Run every job that is already queued. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.jobs.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one job and run it.
    ///
    /// Returns `false` if no job arrived in time or every handle is gone.
    pub fn run_one(&self, timeout: Duration) -> bool {
        match self.jobs.recv_timeout(timeout) {
            Ok(job) => {
                job();
                true
            }
            Err(_) => false,
        }
    }

    /// Run jobs as they arrive until `done` returns true or `timeout` elapses.
    ///
    /// Returns the final value of `done`.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if done() {
                return true;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return done();
            }

            match self.jobs.recv_timeout(remaining) {
                Ok(job) => job(),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return done();
                }
            }
        }
    }
}
