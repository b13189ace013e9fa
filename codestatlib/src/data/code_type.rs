//! Code type descriptors: which comment syntax applies to which extension.
//!
//! A [`CodeTypes`] registry maps a file extension (case-sensitive, without
//! the leading dot) to a shared [`CodeType`]. The registry is read-only for
//! the duration of a run, so it is handed to the pipeline behind an `Arc`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CodeStatError;
use crate::Result;

/// Opening and closing delimiters of a block comment, e.g. `/*` and `*/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockComment {
    pub open: String,
    pub close: String,
}

impl BlockComment {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// Comment syntax of one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeType {
    /// Display name (e.g. "Rust")
    pub name: String,
    /// Markers that start a comment running to the end of the line
    #[serde(default)]
    pub line_comments: Vec<String>,
    /// Block comment delimiter pairs
    #[serde(default)]
    pub block_comments: Vec<BlockComment>,
    /// Characters that open and close a string literal on a single line.
    /// Comment markers inside a string are treated as code.
    #[serde(default)]
    pub quotes: Vec<char>,
}

impl CodeType {
    /// Create a code type with no comment syntax.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line_comments: Vec::new(),
            block_comments: Vec::new(),
            quotes: Vec::new(),
        }
    }

    /// Builder: add a line comment marker.
    pub fn line_comment(mut self, marker: impl Into<String>) -> Self {
        self.line_comments.push(marker.into());
        self
    }

    /// Builder: add a block comment delimiter pair.
    pub fn block_comment(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.block_comments.push(BlockComment::new(open, close));
        self
    }

    /// Builder: add string quote characters.
    pub fn quotes(mut self, quotes: &[char]) -> Self {
        self.quotes.extend_from_slice(quotes);
        self
    }

    fn c_like(name: &str) -> Self {
        Self::new(name)
            .line_comment("//")
            .block_comment("/*", "*/")
            .quotes(&['"'])
    }

    fn hash_comment(name: &str) -> Self {
        Self::new(name).line_comment("#").quotes(&['"', '\''])
    }
}

/// Registry of code types keyed by file extension.
#[derive(Debug, Clone, Default)]
pub struct CodeTypes {
    by_extension: HashMap<String, Arc<CodeType>>,
}

impl CodeTypes {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a code type for one or more extensions.
    ///
    /// Extensions are stored without a leading dot; `".rs"` and `"rs"` are
    /// the same key.
    pub fn with(mut self, extensions: &[&str], code_type: CodeType) -> Self {
        self.insert(extensions, code_type);
        self
    }

    /// Register a code type for one or more extensions.
    pub fn insert(&mut self, extensions: &[&str], code_type: CodeType) {
        let shared = Arc::new(code_type);
        for ext in extensions {
            let key = ext.strip_prefix('.').unwrap_or(ext);
            self.by_extension.insert(key.to_string(), Arc::clone(&shared));
        }
    }

    /// Look up the code type registered for an extension.
    pub fn get(&self, extension: &str) -> Option<&Arc<CodeType>> {
        self.by_extension.get(extension)
    }

    /// Resolve the code type of a path from its extension.
    ///
    /// Files without an extension, or whose extension is not valid UTF-8,
    /// never match.
    pub fn resolve(&self, path: &Path) -> Option<&Arc<CodeType>> {
        let ext = path.extension()?.to_str()?;
        self.get(ext)
    }

    /// Whether an extension is registered.
    pub fn contains(&self, extension: &str) -> bool {
        self.by_extension.contains_key(extension)
    }

    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }

    /// Registered extensions in sorted order.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(|k| k.as_str()).collect();
        exts.sort_unstable();
        exts
    }

    /// Parse a registry from JSON.
    ///
    /// The document maps an extension to a code type:
    ///
    /// ```json
    /// {
    ///   "py": { "name": "Python", "line_comments": ["#"], "quotes": ["\"", "'"] },
    ///   "sql": { "name": "SQL", "line_comments": ["--"],
    ///            "block_comments": [{ "open": "/*", "close": "*/" }] }
    /// }
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, CodeType> = serde_json::from_str(json)
            .map_err(|e| CodeStatError::InvalidCodeTypes(e.to_string()))?;

        let mut types = Self::new();
        for (ext, code_type) in raw {
            types.insert(&[ext.as_str()], code_type);
        }
        Ok(types)
    }

    /// Load a JSON registry from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Built-in registry covering common languages.
    pub fn builtin() -> Self {
        Self::new()
            .with(&["rs"], CodeType::c_like("Rust"))
            .with(&["c", "h"], CodeType::c_like("C"))
            .with(
                &["cc", "cpp", "cxx", "hh", "hpp", "hxx"],
                CodeType::c_like("C++"),
            )
            .with(&["java"], CodeType::c_like("Java"))
            .with(&["kt", "kts"], CodeType::c_like("Kotlin"))
            .with(&["go"], CodeType::c_like("Go"))
            .with(&["swift"], CodeType::c_like("Swift"))
            .with(&["cs"], CodeType::c_like("C#"))
            .with(&["scala"], CodeType::c_like("Scala"))
            .with(&["groovy", "gradle"], CodeType::c_like("Groovy"))
            .with(
                &["js", "mjs", "cjs", "jsx"],
                CodeType::c_like("JavaScript").quotes(&['\'', '`']),
            )
            .with(
                &["ts", "tsx"],
                CodeType::c_like("TypeScript").quotes(&['\'', '`']),
            )
            .with(&["css"], CodeType::new("CSS").block_comment("/*", "*/"))
            .with(
                &["py"],
                CodeType::hash_comment("Python")
                    .block_comment("\"\"\"", "\"\"\"")
                    .block_comment("'''", "'''"),
            )
            .with(&["rb"], CodeType::hash_comment("Ruby"))
            .with(&["sh", "bash", "zsh"], CodeType::hash_comment("Shell"))
            .with(&["toml"], CodeType::hash_comment("TOML"))
            .with(&["yml", "yaml"], CodeType::hash_comment("YAML"))
            .with(
                &["sql"],
                CodeType::new("SQL")
                    .line_comment("--")
                    .block_comment("/*", "*/")
                    .quotes(&['\'']),
            )
            .with(
                &["html", "htm", "xml"],
                CodeType::new("Markup").block_comment("<!--", "-->"),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let types = CodeTypes::builtin();

        assert_eq!(types.get("rs").unwrap().name, "Rust");
        assert_eq!(types.get("py").unwrap().name, "Python");
        assert_eq!(types.get("hpp").unwrap().name, "C++");
        assert!(types.get("md").is_none());
    }

    #[test]
    fn test_extensions_are_case_sensitive() {
        let types = CodeTypes::new().with(&["py"], CodeType::new("Python"));

        assert!(types.contains("py"));
        assert!(!types.contains("PY"));
        assert!(types.resolve(Path::new("/tmp/A.PY")).is_none());
    }

    #[test]
    fn test_leading_dot_is_stripped() {
        let types = CodeTypes::new().with(&[".rs"], CodeType::new("Rust"));
        assert!(types.contains("rs"));
        assert_eq!(types.extensions(), vec!["rs"]);
    }

    #[test]
    fn test_resolve_requires_extension() {
        let types = CodeTypes::builtin();

        assert_eq!(
            types.resolve(Path::new("src/main.rs")).unwrap().name,
            "Rust"
        );
        assert!(types.resolve(Path::new("Makefile")).is_none());
    }

    #[test]
    fn test_shared_descriptor_across_extensions() {
        let types = CodeTypes::builtin();
        let c = types.get("c").unwrap();
        let h = types.get("h").unwrap();
        assert!(Arc::ptr_eq(c, h));
    }

    #[test]
    fn test_from_json() {
        let json = r##"{
            "py": { "name": "Python", "line_comments": ["#"], "quotes": ["\"", "'"] },
            "sql": {
                "name": "SQL",
                "line_comments": ["--"],
                "block_comments": [{ "open": "/*", "close": "*/" }]
            }
        }"##;

        let types = CodeTypes::from_json(json).unwrap();
        assert_eq!(types.len(), 2);

        let sql = types.get("sql").unwrap();
        assert_eq!(sql.line_comments, vec!["--".to_string()]);
        assert_eq!(sql.block_comments, vec![BlockComment::new("/*", "*/")]);
        assert!(sql.quotes.is_empty());
    }

    #[test]
    fn test_from_json_invalid() {
        let result = CodeTypes::from_json("{ not json");
        assert!(matches!(result, Err(CodeStatError::InvalidCodeTypes(_))));
    }
}
