//! Bounded worker pool with caller-runs saturation.
//!
//! Submission policy, tried in order:
//!
//! 1. fewer than `core_threads` workers alive: start a worker with the task;
//! 2. room in the backlog: enqueue the task;
//! 3. fewer than `max_threads` workers alive: start a worker with the task;
//! 4. otherwise run the task on the submitting thread.
//!
//! A task is therefore never dropped, except once the run is cancelled. Every
//! executed task sends exactly one [`Completion::Finished`] through the
//! completion channel, so results are observable in completion order.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use tracing::{debug, trace, warn};

use crate::data::analyzer::Analyzer;
use crate::data::stats::{AnalysisFailure, StatisticsResult};
use crate::error::AnalysisError;
use crate::options::PoolConfig;
use crate::source::frontier::{ScanTask, TaskSink};

use super::cancel::CancellationToken;
use super::collector::Completion;

/// Counters describing what the pool did
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Tasks analyzed (on workers or on the caller)
    pub executed: AtomicU64,

    /// Tasks run on the submitting thread because the pool was saturated
    pub caller_runs: AtomicU64,

    /// Worker threads started
    pub spawned: AtomicU64,

    /// Non-core workers that exited after their keep-alive
    pub retired: AtomicU64,

    /// Tasks dropped because the run was cancelled
    pub discarded: AtomicU64,
}

impl PoolStats {
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    pub fn caller_runs(&self) -> u64 {
        self.caller_runs.load(Ordering::Relaxed)
    }

    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    pub fn retired(&self) -> u64 {
        self.retired.load(Ordering::Relaxed)
    }

    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

/// State shared by the pool handle, its workers, and caller-run tasks
struct Shared {
    analyzer: Arc<dyn Analyzer>,
    completions: Sender<Completion>,
    token: CancellationToken,
    core_threads: usize,
    keep_alive: Duration,
    live: AtomicUsize,
    stats: Arc<PoolStats>,
}

impl Shared {
    /// Reserve a worker slot if fewer than `limit` workers are alive.
    fn reserve_worker(&self, limit: usize) -> bool {
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < limit).then_some(live + 1)
            })
            .is_ok()
    }

    /// Give up a worker slot if more than `core_threads` are alive.
    fn try_retire(&self) -> bool {
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live > self.core_threads).then(|| live - 1)
            })
            .is_ok()
    }

    /// Analyze one task and publish its outcome.
    fn execute(&self, task: ScanTask) {
        if self.token.is_cancelled() {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let ScanTask { path, code_type } = task;
        let analyzed = panic::catch_unwind(AssertUnwindSafe(|| {
            self.analyzer.analyze(&path, &code_type)
        }))
        .unwrap_or_else(|payload| {
            Err(AnalysisError::Panicked {
                path: path.clone(),
                message: panic_message(payload.as_ref()),
            })
        });

        let outcome = match analyzed {
            Ok(counts) => Ok(StatisticsResult::new(path, code_type.name.clone(), counts)),
            Err(error) => Err(AnalysisFailure::new(path, error)),
        };

        self.stats.executed.fetch_add(1, Ordering::Relaxed);
        // The collector is gone only if the run was torn down; nothing to do then
        let _ = self.completions.send(Completion::Finished(outcome));
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Worker pool for one run.
pub struct WorkerPool {
    shared: Arc<Shared>,
    max_threads: usize,
    backlog_tx: Sender<ScanTask>,
    backlog_rx: Receiver<ScanTask>,
    workers: Vec<JoinHandle<()>>,
    next_id: usize,
}

impl WorkerPool {
    /// Create a pool. No thread is started until the first submission.
    pub fn new(
        config: PoolConfig,
        analyzer: Arc<dyn Analyzer>,
        completions: Sender<Completion>,
        token: CancellationToken,
    ) -> Self {
        let config = config.normalized();
        let (backlog_tx, backlog_rx) = bounded(config.backlog_capacity);

        Self {
            shared: Arc::new(Shared {
                analyzer,
                completions,
                token,
                core_threads: config.core_threads,
                keep_alive: config.keep_alive,
                live: AtomicUsize::new(0),
                stats: Arc::new(PoolStats::default()),
            }),
            max_threads: config.max_threads,
            backlog_tx,
            backlog_rx,
            workers: Vec::new(),
            next_id: 0,
        }
    }

    /// Get pool statistics
    pub fn stats(&self) -> Arc<PoolStats> {
        Arc::clone(&self.shared.stats)
    }

    /// Number of workers currently alive
    pub fn live_workers(&self) -> usize {
        self.shared.live.load(Ordering::Acquire)
    }

    /// Submit a task following the saturation policy.
    pub fn submit(&mut self, task: ScanTask) {
        if self.shared.token.is_cancelled() {
            self.shared.stats.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let task = match self.spawn_worker(task, self.shared.core_threads) {
            Ok(()) => return,
            Err(task) => task,
        };

        let task = match self.backlog_tx.try_send(task) {
            Ok(()) => return,
            Err(TrySendError::Full(task)) | Err(TrySendError::Disconnected(task)) => task,
        };

        let task = match self.spawn_worker(task, self.max_threads) {
            Ok(()) => return,
            Err(task) => task,
        };

        trace!(path = %task.path.display(), "pool saturated, running task on caller");
        self.shared.stats.caller_runs.fetch_add(1, Ordering::Relaxed);
        self.shared.execute(task);
    }

    /// Start a worker whose first task is `task`, if fewer than `limit` are
    /// alive. Hands the task back when no worker could be started.
    fn spawn_worker(&mut self, task: ScanTask, limit: usize) -> Result<(), ScanTask> {
        if !self.shared.reserve_worker(limit) {
            return Err(task);
        }

        let id = self.next_id;
        self.next_id += 1;

        // The first task sits in a slot so it can be recovered if spawn fails
        let slot = Arc::new(Mutex::new(Some(task)));
        let worker_slot = Arc::clone(&slot);
        let shared = Arc::clone(&self.shared);
        let backlog = self.backlog_rx.clone();

        let spawned = thread::Builder::new()
            .name(format!("codestat-worker-{}", id))
            .spawn(move || {
                let first = worker_slot
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                worker_loop(id, shared, backlog, first);
            });

        match spawned {
            Ok(handle) => {
                self.shared.stats.spawned.fetch_add(1, Ordering::Relaxed);
                self.workers.push(handle);
                Ok(())
            }
            Err(e) => {
                warn!(id, error = %e, "failed to spawn worker");
                self.shared.live.fetch_sub(1, Ordering::AcqRel);
                match slot.lock().unwrap_or_else(PoisonError::into_inner).take() {
                    Some(task) => Err(task),
                    // Only a running worker empties the slot
                    None => Ok(()),
                }
            }
        }
    }

    /// Close the backlog and wait for every worker to exit.
    ///
    /// Unless the run was cancelled, tasks still in the backlog are analyzed
    /// before this returns. Otherwise they are counted as discarded.
    pub fn finish(self) -> Arc<PoolStats> {
        let Self {
            shared,
            backlog_tx,
            backlog_rx,
            workers,
            ..
        } = self;

        drop(backlog_tx);

        for handle in workers {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }

        // Left behind by workers that stopped on cancel, or never started
        for task in backlog_rx.try_iter() {
            shared.execute(task);
        }

        Arc::clone(&shared.stats)
    }
}

impl TaskSink for WorkerPool {
    fn submit(&mut self, task: ScanTask) {
        WorkerPool::submit(self, task);
    }
}

fn worker_loop(
    id: usize,
    shared: Arc<Shared>,
    backlog: Receiver<ScanTask>,
    first: Option<ScanTask>,
) {
    debug!(id, "worker started");

    if let Some(task) = first {
        shared.execute(task);
    }

    loop {
        if shared.token.is_cancelled() {
            break;
        }

        select! {
            recv(backlog) -> msg => match msg {
                Ok(task) => shared.execute(task),
                // Backlog closed and drained
                Err(_) => break,
            },
            recv(shared.token.signal()) -> _ => break,
            default(shared.keep_alive) => {
                if shared.try_retire() {
                    shared.stats.retired.fetch_add(1, Ordering::Relaxed);
                    debug!(id, "idle worker retired");
                    return;
                }
            }
        }
    }

    shared.live.fetch_sub(1, Ordering::AcqRel);
    debug!(id, "worker stopped");
}
