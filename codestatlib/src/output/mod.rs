//! Output formatting: present statistics as tables.
//!
//! [`StatsTable`] is a pure presentation layer. It turns [`Totals`] and
//! per-file results into headers, rows and a footer of display strings.
//! Aggregation happens while results are delivered, not here.
//!
//! ## Example
//!
//! ```rust
//! use std::path::PathBuf;
//! use codestatlib::{LineCounts, StatisticsResult, StatsTable, Totals};
//!
//! let mut totals = Totals::new();
//! totals.add_result(&StatisticsResult::new(
//!     PathBuf::from("main.rs"),
//!     "Rust",
//!     LineCounts::from_parts(10, 2, 1),
//! ));
//!
//! let table = StatsTable::by_type(&totals);
//! assert_eq!(table.headers[0], "Type");
//! assert_eq!(table.rows[0].label, "Rust");
//! ```
//!
//! [`Totals`]: crate::data::stats::Totals

pub mod table;

pub use table::{failure_note, file_footer, file_row, StatsTable, TableRow};
