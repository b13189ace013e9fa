//! # codestatlib
//!
//! A concurrent line-statistics library: walk directory trees, classify every
//! line of every recognized source file as code, comment or blank, and stream
//! the per-file results to a listener as they complete.
//!
//! ## Overview
//!
//! A run has three parts:
//!
//! - **Producer**: walks the roots depth-first, resolves each file's code type
//!   from its extension and submits one task per canonical path, so overlapping
//!   roots and symlinks never count a file twice
//! - **Worker pool**: analyzes files in parallel. It grows to a bounded size,
//!   queues a bounded backlog, and runs tasks on the submitting thread once
//!   both are full
//! - **Collector**: forwards each result to the [`StatisticsListener`] in
//!   completion order, through a [`Delivery`] context chosen by the caller
//!
//! The listener sees `before_run` once, one `on_result`/`on_failure` per file,
//! then `after_run` once, whether the run completed or was cancelled.
//!
//! ## Features
//!
//! - **Comment-aware counting**: line and block comments, with string literals
//!   that hide comment markers
//! - **Configurable languages**: built-in code types or a JSON file
//! - **Glob filtering**: include or exclude files with glob patterns
//! - **Cancellation**: stop a run at any time; pending work is discarded
//!
//! ## Example
//!
//! ```rust
//! use std::fs;
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use codestatlib::{CodeStatistics, CodeTypes, ImmediateDelivery, StatisticsListener, StatisticsResult, Totals};
//! use tempfile::tempdir;
//!
//! #[derive(Default)]
//! struct Summary(Mutex<Totals>);
//!
//! impl StatisticsListener for Summary {
//!     fn on_result(&self, result: StatisticsResult) {
//!         self.0.lock().unwrap().add_result(&result);
//!     }
//! }
//!
//! let dir = tempdir().unwrap();
//! fs::write(dir.path().join("main.rs"), "// entry\nfn main() {}\n").unwrap();
//!
//! let summary = Arc::new(Summary::default());
//! let mut stats = CodeStatistics::new(Arc::new(ImmediateDelivery));
//! stats.set_listener(summary.clone());
//! stats.start_statistics(&[dir.path()], CodeTypes::builtin()).unwrap();
//! assert!(stats.await_termination(Duration::from_secs(10)));
//!
//! let totals = summary.0.lock().unwrap();
//! assert_eq!(totals.file_count, 1);
//! assert_eq!(totals.counts.code, 1);
//! assert_eq!(totals.counts.comments, 1);
//! ```

pub mod data;
pub mod error;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod statistics;

pub use data::{
    classify_str, AnalysisFailure, Analyzer, BlockComment, CodeType, CodeTypes, CommentAnalyzer,
    LineCounts, StatisticsResult, Totals, TypeTotals,
};
pub use error::{AnalysisError, CodeStatError};
pub use options::{PoolConfig, ScanOptions};
pub use output::{StatsTable, TableRow};
pub use pipeline::{
    CancellationToken, Delivery, EventLoop, EventLoopHandle, ImmediateDelivery, RunOutcome,
    StatisticsListener,
};
pub use source::{FilterConfig, FrontierReport, ScanFrontier, ScanTask};
pub use statistics::{CodeStatistics, RunState};

/// Result type for codestatlib operations
pub type Result<T> = std::result::Result<T, CodeStatError>;
