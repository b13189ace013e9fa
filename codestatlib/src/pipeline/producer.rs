//! Producer side of a run: walk the roots, feed the pool, mark the end.

use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, info};

use crate::data::analyzer::Analyzer;
use crate::data::code_type::CodeTypes;
use crate::options::PoolConfig;
use crate::source::filter::FilterConfig;
use crate::source::frontier::{FrontierReport, ScanFrontier};

use super::cancel::CancellationToken;
use super::collector::Completion;
use super::pool::WorkerPool;

/// Everything the producer thread owns for one run.
pub struct Producer {
    pub roots: Vec<PathBuf>,
    pub types: Arc<CodeTypes>,
    pub filter: FilterConfig,
    pub pool: PoolConfig,
    pub analyzer: Arc<dyn Analyzer>,
    pub completions: Sender<Completion>,
    pub token: CancellationToken,
}

impl Producer {
    /// Walk every root, wait for the pool to drain, then send the end marker.
    ///
    /// The marker is only sent once every worker has been joined, so it is
    /// always the last message of a completed run.
    pub fn run(self) -> FrontierReport {
        let Self {
            roots,
            types,
            filter,
            pool,
            analyzer,
            completions,
            token,
        } = self;

        let mut pool = WorkerPool::new(pool, analyzer, completions.clone(), token.clone());
        let report = ScanFrontier::new(&types, &filter, &token).run(&roots, &mut pool);

        info!(
            submitted = report.submitted,
            duplicates = report.duplicates,
            pruned = report.pruned,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Scan finished"
        );

        let stats = pool.finish();
        debug!(
            executed = stats.executed(),
            caller_runs = stats.caller_runs(),
            spawned = stats.spawned(),
            retired = stats.retired(),
            discarded = stats.discarded(),
            "Worker pool drained"
        );

        if !token.is_cancelled() {
            // The collector only disappears after a cancellation
            let _ = completions.send(Completion::End);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::analyzer::CommentAnalyzer;
    use crate::data::code_type::CodeType;
    use crossbeam_channel::unbounded;
    use std::fs;
    use tempfile::tempdir;

    fn producer(roots: Vec<PathBuf>, completions: Sender<Completion>, token: CancellationToken) -> Producer {
        Producer {
            roots,
            types: Arc::new(CodeTypes::new().with(&["py"], CodeType::new("Python").line_comment("#"))),
            filter: FilterConfig::new(),
            pool: PoolConfig::new().core_threads(2),
            analyzer: Arc::new(CommentAnalyzer::new()),
            completions,
            token,
        }
    }

    #[test]
    fn test_end_marker_is_last() {
        let temp = tempdir().unwrap();
        for i in 0..30 {
            fs::write(temp.path().join(format!("f{i}.py")), "x = 1\n# c\n").unwrap();
        }

        let (tx, rx) = unbounded();
        let report = producer(vec![temp.path().to_path_buf()], tx, CancellationToken::new()).run();
        assert_eq!(report.submitted, 30);

        let messages: Vec<Completion> = rx.try_iter().collect();
        assert_eq!(messages.len(), 31);
        assert!(matches!(messages.last(), Some(Completion::End)));
        assert!(messages[..30]
            .iter()
            .all(|m| matches!(m, Completion::Finished(Ok(_)))));
    }

    #[test]
    fn test_cancelled_run_sends_no_end_marker() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();

        let token = CancellationToken::new();
        token.cancel();

        let (tx, rx) = unbounded();
        let report = producer(vec![temp.path().to_path_buf()], tx, token).run();

        assert!(report.cancelled);
        assert_eq!(rx.try_iter().count(), 0);
    }
}
