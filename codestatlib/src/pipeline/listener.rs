//! Listener interface notified about a run's progress.

use serde::Serialize;
use tracing::warn;

use crate::data::stats::{AnalysisFailure, StatisticsResult};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// Every root was walked and every task finished
    Completed,
    /// The run was stopped before it finished
    Cancelled,
}

/// Receives the callbacks of a run.
///
/// Callbacks are invoked through the run's [`Delivery`](super::Delivery), in
/// this order: `before_run` once, then `on_result`/`on_failure` once per
/// analyzed file in completion order, then `after_run` once. Callbacks have
/// no way to report errors back to the pipeline.
pub trait StatisticsListener: Send + Sync {
    fn before_run(&self) {}

    /// A file was analyzed.
    fn on_result(&self, result: StatisticsResult);

    /// A file could not be analyzed.
    fn on_failure(&self, failure: AnalysisFailure) {
        warn!(path = %failure.path.display(), error = %failure.error, "analysis failed");
    }

    fn after_run(&self, _outcome: RunOutcome) {}
}
