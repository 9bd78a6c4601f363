// ImpLog - core/sourcemap.rs
//
// Pre-processor source maps: translate a line of the deployed (preprocessed)
// code back to the original file and line it came from.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A source map attached to one deployed code unit.
pub trait SourceMap {
    /// Path of the preprocessed source this map belongs to. Relative paths
    /// returned by `original_location` are resolved against its directory.
    fn file(&self) -> &Path;

    /// Map a 0-based preprocessed line to `(relative original path, original line)`.
    fn original_location(&self, line: u32) -> Option<(PathBuf, u32)>;
}

/// A line-indexed table produced by the pre-processor.
///
/// JSON shape:
/// ```json
/// { "file": "/proj/src/main.agent.nut",
///   "lines": [["main.tut", 1], ["main.tut", 2], ["lib/util.nut", 1]] }
/// ```
/// Entry `i` describes preprocessed line `i` (0-based).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineTable {
    pub file: PathBuf,
    #[serde(default)]
    pub lines: Vec<(PathBuf, u32)>,
}

impl LineTable {
    pub fn new(file: impl Into<PathBuf>, lines: Vec<(PathBuf, u32)>) -> Self {
        Self {
            file: file.into(),
            lines,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl SourceMap for LineTable {
    fn file(&self) -> &Path {
        &self.file
    }

    fn original_location(&self, line: u32) -> Option<(PathBuf, u32)> {
        self.lines.get(line as usize).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_table_from_json() {
        let json = r#"{"file":"/proj/src/main.agent.nut","lines":[["main.tut",1],["lib/a.nut",7]]}"#;
        let table: LineTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.file(), Path::new("/proj/src/main.agent.nut"));
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.original_location(1),
            Some((PathBuf::from("lib/a.nut"), 7))
        );
        assert_eq!(table.original_location(2), None);
    }

    #[test]
    fn test_line_table_lines_default_to_empty() {
        let table: LineTable = serde_json::from_str(r#"{"file":"a.nut"}"#).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.original_location(0), None);
    }
}
