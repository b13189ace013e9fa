//! Run lifecycle: start, stop and observe statistics runs.
//!
//! [`CodeStatistics`] owns at most one run at a time. A run is a producer
//! thread (tree walk plus worker pool) and a collector thread tied together by
//! a [`CancellationToken`]. Starting a new run while one is active cancels the
//! active one first.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, info, warn};

use crate::data::analyzer::{Analyzer, CommentAnalyzer};
use crate::data::code_type::CodeTypes;
use crate::error::CodeStatError;
use crate::options::ScanOptions;
use crate::pipeline::{
    CancellationToken, Collector, Delivery, Producer, RunOutcome, StatisticsListener,
};
use crate::Result;

/// Whether a run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Live state of one run.
struct RunHandle {
    id: u64,
    token: CancellationToken,
    /// Disconnects once both run threads have exited
    done: Receiver<()>,
    outcome: Arc<OnceLock<RunOutcome>>,
}

impl RunHandle {
    fn is_running(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Empty))
    }
}

/// Entry point for computing code statistics over directory trees.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use codestatlib::{CodeStatistics, CodeTypes, ImmediateDelivery, StatisticsListener, StatisticsResult};
///
/// struct Print;
///
/// impl StatisticsListener for Print {
///     fn on_result(&self, result: StatisticsResult) {
///         println!("{} {}", result.path.display(), result.counts.code);
///     }
/// }
///
/// let mut stats = CodeStatistics::new(Arc::new(ImmediateDelivery));
/// stats.set_listener(Arc::new(Print));
/// stats.start_statistics(&["src"], CodeTypes::builtin()).unwrap();
/// stats.await_termination(std::time::Duration::from_secs(60));
/// ```
pub struct CodeStatistics {
    options: ScanOptions,
    analyzer: Arc<dyn Analyzer>,
    delivery: Arc<dyn Delivery>,
    listener: Option<Arc<dyn StatisticsListener>>,
    run: Option<RunHandle>,
    next_run_id: u64,
}

impl CodeStatistics {
    /// Create a controller whose listener callbacks go through `delivery`.
    pub fn new(delivery: Arc<dyn Delivery>) -> Self {
        Self {
            options: ScanOptions::default(),
            analyzer: Arc::new(CommentAnalyzer::new()),
            delivery,
            listener: None,
            run: None,
            next_run_id: 1,
        }
    }

    /// Set pool sizing and file filters for subsequent runs.
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the per-file analyzer.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Set the listener used by the next run. An active run keeps the
    /// listener it was started with.
    pub fn set_listener(&mut self, listener: Arc<dyn StatisticsListener>) {
        self.listener = Some(listener);
    }

    /// Start computing statistics for every file under `roots` whose extension
    /// is known to `types`.
    ///
    /// Returns once the run threads are started. Results are reported to the
    /// listener through the delivery context. An active run is cancelled first.
    pub fn start_statistics<P: AsRef<Path>>(
        &mut self,
        roots: &[P],
        types: impl Into<Arc<CodeTypes>>,
    ) -> Result<()> {
        if let Some(previous) = self.run.take() {
            if previous.is_running() {
                warn!(run = previous.id, "Cancelling active run before starting a new one");
            }
            previous.token.cancel();
        }

        let id = self.next_run_id;
        self.next_run_id += 1;

        let roots: Vec<PathBuf> = roots.iter().map(|r| r.as_ref().to_path_buf()).collect();
        let types = types.into();
        let listener = self.listener.clone();
        let token = CancellationToken::new();
        let (completion_tx, completion_rx) = unbounded();
        let (done_tx, done_rx) = bounded::<()>(0);
        let outcome = Arc::new(OnceLock::new());

        info!(run = id, roots = roots.len(), types = types.len(), "Starting statistics run");

        if let Some(listener) = &listener {
            let listener = Arc::clone(listener);
            self.delivery.post(Box::new(move || listener.before_run()));
        }

        let collector = Collector::new(
            completion_rx,
            token.clone(),
            Arc::clone(&self.delivery),
            listener.clone(),
        );
        let spawned = spawn_collector(id, collector, Arc::clone(&outcome), done_tx.clone());
        if let Err(err) = spawned {
            // No collector means nobody else will close the run
            if let Some(listener) = listener {
                self.delivery
                    .post(Box::new(move || listener.after_run(RunOutcome::Cancelled)));
            }
            return Err(err);
        }

        let producer = Producer {
            roots,
            types,
            filter: self.options.filter.clone(),
            pool: self.options.pool,
            analyzer: Arc::clone(&self.analyzer),
            completions: completion_tx,
            token: token.clone(),
        };
        let spawned = spawn_producer(id, producer, done_tx);

        self.run = Some(RunHandle {
            id,
            token,
            done: done_rx,
            outcome,
        });

        if spawned.is_err() {
            // The collector sees the cancellation and posts after_run
            self.stop_statistics();
        }
        spawned
    }

    /// Cancel the active run, if any.
    ///
    /// Returns immediately. Analyses already in progress finish, but their
    /// results may not be delivered, and no new files are scheduled.
    pub fn stop_statistics(&self) {
        if let Some(run) = &self.run {
            if run.is_running() {
                debug!(run = run.id, "Stopping statistics run");
            }
            run.token.cancel();
        }
    }

    /// Wait until every thread of the active run has exited.
    ///
    /// Returns `true` if the run has ended (or there is none), `false` if the
    /// timeout elapsed first.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        match &self.run {
            None => true,
            Some(run) => matches!(
                run.done.recv_timeout(timeout),
                Err(RecvTimeoutError::Disconnected)
            ),
        }
    }

    pub fn state(&self) -> RunState {
        match &self.run {
            Some(run) if run.is_running() => RunState::Running,
            _ => RunState::Idle,
        }
    }

    /// Outcome of the most recent run, once its collector has finished.
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.run
            .as_ref()
            .and_then(|run| run.outcome.get().copied())
    }
}

impl Drop for CodeStatistics {
    fn drop(&mut self) {
        self.stop_statistics();
    }
}

fn spawn_collector(
    id: u64,
    collector: Collector,
    outcome: Arc<OnceLock<RunOutcome>>,
    done: Sender<()>,
) -> Result<()> {
    let name = format!("codestat-collector-{id}");
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let result = collector.run();
            let _ = outcome.set(result);
            info!(run = id, outcome = ?result, "Statistics run finished");
            drop(done);
        })
        .map(|_| ())
        .map_err(|source| CodeStatError::ThreadSpawn { name, source })
}

fn spawn_producer(id: u64, producer: Producer, done: Sender<()>) -> Result<()> {
    let name = format!("codestat-producer-{id}");
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            producer.run();
            drop(done);
        })
        .map(|_| ())
        .map_err(|source| CodeStatError::ThreadSpawn { name, source })
}
