//! Source discovery: find the files to analyze.
//!
//! This module handles the first stage of the pipeline. It provides:
//!
//! - **File filtering**: include/exclude files with glob patterns
//! - **Scan frontier**: walk the roots and turn each eligible file into a
//!   [`ScanTask`], once per canonical path
//!
//! ## Example
//!
//! ```rust,ignore
//! use codestatlib::source::{FilterConfig, ScanFrontier};
//!
//! let filter = FilterConfig::new().exclude("**/target/**")?;
//! let mut tasks = Vec::new();
//! let report = ScanFrontier::new(&types, &filter, &token).run(&["."], &mut tasks);
//! ```

pub mod filter;
pub mod frontier;

pub use filter::FilterConfig;
pub use frontier::{FrontierReport, ScanFrontier, ScanTask, TaskSink};
