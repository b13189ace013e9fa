//! Scan frontier: turns directory trees into analysis tasks.
//!
//! The frontier walks each root depth-first, keeps files whose extension is
//! registered in [`CodeTypes`] and that pass the [`FilterConfig`], and hands
//! one [`ScanTask`] per distinct canonical path to a [`TaskSink`]. Directories
//! are recorded by canonical path too, so a root or subtree reached a second
//! time is not walked again.
//!
//! Entries that vanish or cannot be read are skipped; the walk never fails as
//! a whole. The cancellation token is checked before each entry is descended
//! into and before each submission.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::data::code_type::{CodeType, CodeTypes};
use crate::error::CodeStatError;
use crate::pipeline::cancel::CancellationToken;

use super::filter::FilterConfig;

/// A file to analyze, paired with the code type it resolved to.
#[derive(Debug, Clone)]
pub struct ScanTask {
    /// Canonical path of the file
    pub path: PathBuf,
    /// Comment syntax to analyze it with
    pub code_type: Arc<CodeType>,
}

impl ScanTask {
    pub fn new(path: PathBuf, code_type: Arc<CodeType>) -> Self {
        Self { path, code_type }
    }
}

/// Destination of the tasks produced by the frontier.
pub trait TaskSink {
    fn submit(&mut self, task: ScanTask);
}

impl TaskSink for Vec<ScanTask> {
    fn submit(&mut self, task: ScanTask) {
        self.push(task);
    }
}

/// What a frontier run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrontierReport {
    /// Tasks handed to the sink
    pub submitted: u64,
    /// Files skipped because their canonical path was already submitted
    pub duplicates: u64,
    /// Directories not walked because their canonical path was already walked
    pub pruned: u64,
    /// Entries skipped because of traversal errors
    pub skipped: u64,
    /// Whether the walk stopped early because of cancellation
    pub cancelled: bool,
}

/// Depth-first producer of [`ScanTask`]s for one run.
pub struct ScanFrontier<'a> {
    types: &'a CodeTypes,
    filter: &'a FilterConfig,
    token: &'a CancellationToken,
    /// Canonical paths of files submitted and directories walked this run
    visited: HashSet<PathBuf>,
    report: FrontierReport,
}

impl<'a> ScanFrontier<'a> {
    pub fn new(types: &'a CodeTypes, filter: &'a FilterConfig, token: &'a CancellationToken) -> Self {
        Self {
            types,
            filter,
            token,
            visited: HashSet::new(),
            report: FrontierReport::default(),
        }
    }

    /// Walk every root and submit tasks to `sink`.
    pub fn run<P: AsRef<Path>>(mut self, roots: &[P], sink: &mut dyn TaskSink) -> FrontierReport {
        for root in roots {
            if self.token.is_cancelled() {
                break;
            }
            self.scan_root(root.as_ref(), sink);
        }

        self.report.cancelled = self.token.is_cancelled();
        self.report
    }

    fn scan_root(&mut self, root: &Path, sink: &mut dyn TaskSink) {
        if !root.exists() {
            debug!(root = %root.display(), "root does not exist, skipping");
            return;
        }

        let filter = self.filter;
        let mut walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                // Always include the root, prune excluded directories below it
                e.depth() == 0 || !e.file_type().is_dir() || !filter.excludes_dir(e.path())
            });

        while let Some(entry) = walker.next() {
            if self.token.is_cancelled() {
                return;
            }

            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    self.skip(err.io_error().map(|e| e.kind()), err.into());
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if !self.enter_dir(entry.path()) {
                    debug!(dir = %entry.path().display(), "directory already walked, skipping");
                    self.report.pruned += 1;
                    if entry.depth() == 0 {
                        return;
                    }
                    walker.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(code_type) = self.types.resolve(path) else {
                continue;
            };
            if !self.filter.matches(path) {
                continue;
            }

            let canonical = match fs::canonicalize(path) {
                Ok(p) => p,
                Err(err) => {
                    let kind = err.kind();
                    self.skip(
                        Some(kind),
                        CodeStatError::Traversal {
                            path: Some(path.to_path_buf()),
                            message: err.to_string(),
                        },
                    );
                    continue;
                }
            };

            if !self.visited.insert(canonical.clone()) {
                self.report.duplicates += 1;
                continue;
            }

            if self.token.is_cancelled() {
                return;
            }
            sink.submit(ScanTask::new(canonical, Arc::clone(code_type)));
            self.report.submitted += 1;
        }
    }

    /// Record a directory about to be walked. False if it was walked before.
    ///
    /// A directory that cannot be canonicalized is walked anyway; its files
    /// are still deduplicated one by one.
    fn enter_dir(&mut self, dir: &Path) -> bool {
        match fs::canonicalize(dir) {
            Ok(canonical) => self.visited.insert(canonical),
            Err(_) => true,
        }
    }

    fn skip(&mut self, kind: Option<ErrorKind>, err: CodeStatError) {
        self.report.skipped += 1;
        // Entries removed mid-walk are expected and not worth a warning
        if kind == Some(ErrorKind::NotFound) {
            debug!(error = %err, "entry vanished, skipping");
        } else {
            warn!(error = %err, "skipping entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::code_type::CodeType;
    use tempfile::tempdir;

    fn py_types() -> CodeTypes {
        CodeTypes::new().with(&["py"], CodeType::new("Python").line_comment("#"))
    }

    fn scan<P: AsRef<Path>>(roots: &[P], types: &CodeTypes, filter: &FilterConfig) -> (Vec<ScanTask>, FrontierReport) {
        let token = CancellationToken::new();
        let mut tasks = Vec::new();
        let report = ScanFrontier::new(types, filter, &token).run(roots, &mut tasks);
        (tasks, report)
    }

    #[test]
    fn test_collects_registered_extensions_only() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("pkg/sub")).unwrap();
        fs::write(temp.path().join("pkg/a.py"), "x = 1\n").unwrap();
        fs::write(temp.path().join("pkg/sub/b.py"), "y = 2\n").unwrap();
        fs::write(temp.path().join("pkg/README.md"), "# hi\n").unwrap();
        fs::write(temp.path().join("pkg/sub/Makefile"), "all:\n").unwrap();

        let (tasks, report) = scan(&[temp.path()], &py_types(), &FilterConfig::new());

        assert_eq!(tasks.len(), 2);
        assert_eq!(report.submitted, 2);
        assert!(tasks.iter().all(|t| t.code_type.name == "Python"));
        assert!(tasks.iter().all(|t| t.path.is_absolute()));
    }

    #[test]
    fn test_overlapping_roots_submit_once() {
        let temp = tempdir().unwrap();
        let inner = temp.path().join("inner");
        fs::create_dir_all(&inner).unwrap();
        fs::write(inner.join("a.py"), "x = 1\n").unwrap();
        fs::write(temp.path().join("b.py"), "y = 2\n").unwrap();

        let roots = vec![
            temp.path().to_path_buf(),
            inner.clone(),
            inner.join("a.py"),
            inner.join("..").join("inner"),
        ];
        let (tasks, report) = scan(&roots, &py_types(), &FilterConfig::new());

        assert_eq!(tasks.len(), 2);
        // The two spellings of `inner` are never walked again
        assert_eq!(report.pruned, 2);
        assert_eq!(report.duplicates, 1);

        let unique: HashSet<_> = tasks.iter().map(|t| t.path.clone()).collect();
        assert_eq!(unique.len(), tasks.len());
    }

    #[test]
    fn test_parent_root_skips_subtree_walked_earlier() {
        let temp = tempdir().unwrap();
        let inner = temp.path().join("inner");
        fs::create_dir_all(inner.join("deep")).unwrap();
        fs::write(inner.join("a.py"), "x = 1\n").unwrap();
        fs::write(inner.join("deep/b.py"), "y = 2\n").unwrap();
        fs::write(temp.path().join("c.py"), "z = 3\n").unwrap();

        let roots = vec![inner.clone(), temp.path().to_path_buf()];
        let (tasks, report) = scan(&roots, &py_types(), &FilterConfig::new());

        assert_eq!(tasks.len(), 3);
        assert_eq!(report.pruned, 1);
        // Files under `inner` are not even reached by the second walk
        assert_eq!(report.duplicates, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_walked_once() {
        let temp = tempdir().unwrap();
        let real = temp.path().join("real");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("a.py"), "x = 1\n").unwrap();
        std::os::unix::fs::symlink(&real, temp.path().join("link")).unwrap();

        let (tasks, report) = scan(&[temp.path()], &py_types(), &FilterConfig::new());

        assert_eq!(tasks.len(), 1);
        assert_eq!(report.pruned, 1);
        assert_eq!(report.duplicates, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_scanned_file_is_deduplicated() {
        let temp = tempdir().unwrap();
        let real = temp.path().join("real.py");
        fs::write(&real, "x = 1\n").unwrap();
        std::os::unix::fs::symlink(&real, temp.path().join("alias.py")).unwrap();

        let (tasks, report) = scan(&[temp.path()], &py_types(), &FilterConfig::new());

        assert_eq!(tasks.len(), 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(tasks[0].path, fs::canonicalize(&real).unwrap());
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();

        let roots = vec![temp.path().join("does-not-exist"), temp.path().to_path_buf()];
        let (tasks, report) = scan(&roots, &py_types(), &FilterConfig::new());

        assert_eq!(tasks.len(), 1);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_excluded_directory_is_pruned() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::create_dir_all(temp.path().join("vendor/lib")).unwrap();
        fs::write(temp.path().join("src/a.py"), "x = 1\n").unwrap();
        fs::write(temp.path().join("vendor/lib/b.py"), "y = 2\n").unwrap();

        let filter = FilterConfig::new().exclude("**/vendor").unwrap();
        let (tasks, _) = scan(&[temp.path()], &py_types(), &filter);

        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].path.ends_with("src/a.py"));
    }

    #[test]
    fn test_cancelled_token_submits_nothing() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();

        let types = py_types();
        let filter = FilterConfig::new();
        let token = CancellationToken::new();
        token.cancel();

        let mut tasks = Vec::new();
        let report = ScanFrontier::new(&types, &filter, &token).run(&[temp.path()], &mut tasks);

        assert!(tasks.is_empty());
        assert!(report.cancelled);
    }

    /// Sink that cancels the run after the first submission.
    struct CancelAfterFirst {
        token: CancellationToken,
        tasks: Vec<ScanTask>,
    }

    impl TaskSink for CancelAfterFirst {
        fn submit(&mut self, task: ScanTask) {
            self.tasks.push(task);
            self.token.cancel();
        }
    }

    #[test]
    fn test_cancellation_mid_walk_stops_submissions() {
        let temp = tempdir().unwrap();
        for i in 0..20 {
            fs::write(temp.path().join(format!("f{i}.py")), "x = 1\n").unwrap();
        }

        let types = py_types();
        let filter = FilterConfig::new();
        let token = CancellationToken::new();
        let mut sink = CancelAfterFirst {
            token: token.clone(),
            tasks: Vec::new(),
        };

        let report = ScanFrontier::new(&types, &filter, &token).run(&[temp.path()], &mut sink);

        assert_eq!(sink.tasks.len(), 1);
        assert_eq!(report.submitted, 1);
        assert!(report.cancelled);
    }
}
