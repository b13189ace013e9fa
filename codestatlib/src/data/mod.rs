//! Data collection: classify the lines of a file and aggregate the counts.
//!
//! This module handles the per-file stage of the pipeline. It provides:
//!
//! - **Code types**: comment syntax per language, keyed by file extension
//! - **Analysis**: the [`Analyzer`] trait and the default [`CommentAnalyzer`]
//! - **Statistics**: per-file results, failures and running totals
//!
//! ## Example
//!
//! ```rust
//! use codestatlib::data::{classify_str, CodeTypes};
//!
//! let types = CodeTypes::builtin();
//! let rust = types.get("rs").unwrap();
//! let counts = classify_str("// hello\nfn main() {}\n\n", rust);
//! assert_eq!((counts.code, counts.comments, counts.blanks), (1, 1, 1));
//! ```

pub mod analyzer;
pub mod code_type;
pub mod stats;

pub use analyzer::{classify_str, Analyzer, CommentAnalyzer};
pub use code_type::{BlockComment, CodeType, CodeTypes};
pub use stats::{AnalysisFailure, LineCounts, StatisticsResult, TaskOutcome, Totals, TypeTotals};
