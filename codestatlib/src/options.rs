//! Input options for a statistics run.
//!
//! This module contains the configuration types that control how a run is
//! scheduled (worker pool sizing) and which files it considers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::source::filter::FilterConfig;

/// Maximum threads are this many times the core thread count.
pub const MAX_THREADS_FACTOR: usize = 1 + 8 / 2;

/// Default number of tasks that can wait in the backlog.
pub const DEFAULT_BACKLOG_CAPACITY: usize = 100;

/// Default idle time after which a non-core worker exits.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Worker pool sizing.
///
/// Computed once per run; nothing about pool sizing is process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Workers kept alive for the whole run
    pub core_threads: usize,
    /// Upper bound on concurrently live workers
    pub max_threads: usize,
    /// Tasks that can wait for a worker before saturation kicks in
    pub backlog_capacity: usize,
    /// Idle time after which a worker above `core_threads` exits
    pub keep_alive: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let core = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            core_threads: core,
            max_threads: core.saturating_mul(MAX_THREADS_FACTOR),
            backlog_capacity: DEFAULT_BACKLOG_CAPACITY,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }
}

impl PoolConfig {
    /// Sizing derived from the available hardware threads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the core thread count. Max threads follow at the default factor.
    pub fn core_threads(mut self, threads: usize) -> Self {
        self.core_threads = threads;
        self.max_threads = threads.saturating_mul(MAX_THREADS_FACTOR);
        self
    }

    /// Set the maximum thread count.
    pub fn max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    /// Set the backlog capacity.
    pub fn backlog_capacity(mut self, capacity: usize) -> Self {
        self.backlog_capacity = capacity;
        self
    }

    /// Set the keep-alive for non-core workers.
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Clamp to usable values: `max_threads >= core_threads >= 1`, backlog >= 1.
    pub fn normalized(self) -> Self {
        let core_threads = self.core_threads.max(1);
        Self {
            core_threads,
            max_threads: self.max_threads.max(core_threads),
            backlog_capacity: self.backlog_capacity.max(1),
            keep_alive: self.keep_alive,
        }
    }
}

/// Options for a statistics run.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Worker pool sizing
    pub pool: PoolConfig,
    /// File filter configuration
    pub filter: FilterConfig,
}

impl ScanOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pool sizing.
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Set file filter.
    pub fn filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }
}
