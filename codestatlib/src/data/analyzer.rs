//! Per-file line classification.
//!
//! The pipeline only depends on the [`Analyzer`] trait. [`CommentAnalyzer`]
//! is the default implementation: it reads a file line by line and sorts each
//! line into code, comment, or blank using the comment syntax of the file's
//! [`CodeType`].
//!
//! Classification rules, per line:
//!
//! - any character outside a comment (including string literal content) makes
//!   the line a code line;
//! - otherwise, any comment text (line comment marker, block comment
//!   delimiter or body) makes it a comment line;
//! - otherwise the line is blank, including whitespace-only lines inside a
//!   block comment.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::AnalysisError;

use super::code_type::CodeType;
use super::stats::LineCounts;

/// Computes line statistics for one file.
///
/// Implementations must be pure with respect to the pipeline: they are called
/// concurrently from worker threads and share no state between calls.
pub trait Analyzer: Send + Sync {
    /// Analyze the file at `path` using the comment syntax of `code_type`.
    fn analyze(&self, path: &Path, code_type: &CodeType) -> Result<LineCounts, AnalysisError>;
}

/// Default analyzer driven by a [`CodeType`]'s comment syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentAnalyzer;

impl CommentAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for CommentAnalyzer {
    fn analyze(&self, path: &Path, code_type: &CodeType) -> Result<LineCounts, AnalysisError> {
        let file = File::open(path).map_err(|e| AnalysisError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);
        let mut classifier = LineClassifier::new(code_type);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| AnalysisError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            if read == 0 {
                break;
            }

            let line = std::str::from_utf8(&buf).map_err(|_| AnalysisError::Decode {
                path: path.to_path_buf(),
                line: classifier.counts.total + 1,
            })?;
            classifier.classify_line(trim_line_ending(line));
        }

        Ok(classifier.finish())
    }
}

/// Classify in-memory source text.
pub fn classify_str(text: &str, code_type: &CodeType) -> LineCounts {
    let mut classifier = LineClassifier::new(code_type);
    for line in text.lines() {
        classifier.classify_line(line);
    }
    classifier.finish()
}

fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Tracks block comment state across lines.
struct LineClassifier<'a> {
    code_type: &'a CodeType,
    /// Closing delimiter of the block comment we are inside, if any
    open_block: Option<&'a str>,
    counts: LineCounts,
}

impl<'a> LineClassifier<'a> {
    fn new(code_type: &'a CodeType) -> Self {
        Self {
            code_type,
            open_block: None,
            counts: LineCounts::default(),
        }
    }

    fn classify_line(&mut self, line: &str) {
        let mut has_code = false;
        let mut has_comment = false;
        let mut rest = line;

        loop {
            if let Some(close) = self.open_block {
                match rest.find(close) {
                    Some(idx) => {
                        has_comment = true;
                        rest = &rest[idx + close.len()..];
                        self.open_block = None;
                        continue;
                    }
                    None => {
                        if !rest.trim().is_empty() {
                            has_comment = true;
                        }
                        break;
                    }
                }
            }

            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            if self
                .code_type
                .line_comments
                .iter()
                .any(|marker| !marker.is_empty() && rest.starts_with(marker.as_str()))
            {
                has_comment = true;
                break;
            }

            if let Some(block) = self
                .code_type
                .block_comments
                .iter()
                .find(|b| !b.open.is_empty() && rest.starts_with(b.open.as_str()))
            {
                has_comment = true;
                self.open_block = Some(block.close.as_str());
                rest = &rest[block.open.len()..];
                continue;
            }

            let mut chars = rest.chars();
            let Some(first) = chars.next() else {
                break;
            };
            has_code = true;
            rest = if self.code_type.quotes.contains(&first) {
                skip_string(chars.as_str(), first)
            } else {
                chars.as_str()
            };
        }

        self.counts.total += 1;
        if has_code {
            self.counts.code += 1;
        } else if has_comment {
            self.counts.comments += 1;
        } else {
            self.counts.blanks += 1;
        }
    }

    fn finish(self) -> LineCounts {
        self.counts
    }
}

/// Skip past the closing quote of a string literal, honoring backslash
/// escapes. An unterminated string runs to the end of the line.
fn skip_string(rest: &str, quote: char) -> &str {
    let mut escaped = false;
    for (idx, c) in rest.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return &rest[idx + c.len_utf8()..];
        }
    }
    ""
}
