//! Core data structures for line statistics.
//!
//! Every analyzed line lands in exactly one of three buckets:
//!
//! - **code**: the line carries at least one non-comment, non-whitespace character
//! - **comments**: the line only carries comment text (line or block comments)
//! - **blanks**: whitespace-only lines
//!
//! `total` is the precomputed sum of the three.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};
use std::path::PathBuf;

use crate::error::AnalysisError;

/// Line counts for a file or an aggregate of files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounts {
    /// Lines carrying code
    pub code: u64,
    /// Lines carrying only comment text
    pub comments: u64,
    /// Whitespace-only lines
    pub blanks: u64,
    /// Total line count (sum of all types)
    pub total: u64,
}

impl LineCounts {
    /// Create a new LineCounts with all zeros.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build counts from the three line types, computing `total`.
    pub fn from_parts(code: u64, comments: u64, blanks: u64) -> Self {
        Self {
            code,
            comments,
            blanks,
            total: code + comments + blanks,
        }
    }
}

impl Add for LineCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            code: self.code + other.code,
            comments: self.comments + other.comments,
            blanks: self.blanks + other.blanks,
            total: self.total + other.total,
        }
    }
}

impl AddAssign for LineCounts {
    fn add_assign(&mut self, other: Self) {
        self.code += other.code;
        self.comments += other.comments;
        self.blanks += other.blanks;
        self.total += other.total;
    }
}

/// Statistics for a single analyzed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsResult {
    /// Canonical path to the file.
    pub path: PathBuf,
    /// Name of the code type the file was analyzed as (e.g. "Rust").
    pub code_type: String,
    /// Line counts for this file.
    pub counts: LineCounts,
}

impl StatisticsResult {
    /// Create new file statistics.
    pub fn new(path: PathBuf, code_type: impl Into<String>, counts: LineCounts) -> Self {
        Self {
            path,
            code_type: code_type.into(),
            counts,
        }
    }
}

/// A file whose analysis failed.
#[derive(Debug)]
pub struct AnalysisFailure {
    /// Canonical path to the file.
    pub path: PathBuf,
    /// Why the analysis failed.
    pub error: AnalysisError,
}

impl AnalysisFailure {
    pub fn new(path: PathBuf, error: AnalysisError) -> Self {
        Self { path, error }
    }
}

/// Outcome of one analysis task, as it travels through the completion channel.
pub type TaskOutcome = std::result::Result<StatisticsResult, AnalysisFailure>;

/// Running totals over delivered results.
///
/// Listeners can feed every `on_result`/`on_failure` into a `Totals` to get
/// the per-language summary a report needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Number of files successfully analyzed
    pub file_count: u64,
    /// Number of files whose analysis failed
    pub failure_count: u64,
    /// Aggregated counts across all files
    pub counts: LineCounts,
    /// Per code type aggregates, keyed by code type name
    pub by_type: BTreeMap<String, TypeTotals>,
}

/// Aggregate for a single code type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeTotals {
    pub file_count: u64,
    pub counts: LineCounts,
}

impl Totals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a successful result into the totals.
    pub fn add_result(&mut self, result: &StatisticsResult) {
        self.file_count += 1;
        self.counts += result.counts;

        let entry = self.by_type.entry(result.code_type.clone()).or_default();
        entry.file_count += 1;
        entry.counts += result.counts;
    }

    /// Record a failed analysis.
    pub fn add_failure(&mut self) {
        self.failure_count += 1;
    }
}
