//! Glob include/exclude filtering for discovered files.
//!
//! Extension matching is the job of [`CodeTypes`](crate::CodeTypes); this
//! filter narrows the set further with optional glob patterns.

use std::path::Path;

use glob::Pattern;

use crate::error::CodeStatError;
use crate::Result;

/// Configuration for file filtering.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Glob patterns to include (if empty, include every file)
    pub include: Vec<Pattern>,
    /// Glob patterns to exclude
    pub exclude: Vec<Pattern>,
}

fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(|e| CodeStatError::InvalidGlob {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

impl FilterConfig {
    /// Create a new empty filter config (includes everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an include pattern.
    pub fn include(mut self, pattern: &str) -> Result<Self> {
        self.include.push(compile(pattern)?);
        Ok(self)
    }

    /// Add an exclude pattern.
    pub fn exclude(mut self, pattern: &str) -> Result<Self> {
        self.exclude.push(compile(pattern)?);
        Ok(self)
    }

    /// Add multiple include patterns.
    pub fn include_many(mut self, patterns: &[&str]) -> Result<Self> {
        for pattern in patterns {
            self = self.include(pattern)?;
        }
        Ok(self)
    }

    /// Add multiple exclude patterns.
    pub fn exclude_many(mut self, patterns: &[&str]) -> Result<Self> {
        for pattern in patterns {
            self = self.exclude(pattern)?;
        }
        Ok(self)
    }

    /// Check if a file path matches the filter criteria.
    ///
    /// A path matches if it matches at least one include pattern (or include
    /// is empty) and doesn't match any exclude pattern.
    pub fn matches(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        if self.exclude.iter().any(|p| p.matches(&path_str)) {
            return false;
        }

        self.include.is_empty() || self.include.iter().any(|p| p.matches(&path_str))
    }

    /// Whether a directory is excluded outright, so its subtree can be pruned.
    pub fn excludes_dir(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|p| p.matches(&path_str))
    }
}
