// ImpLog - platform/fs.rs
//
// Filesystem helpers: loading pre-processor line tables, reading captured
// log streams and writing diagnostic exports.

use crate::core::sourcemap::LineTable;
use crate::util::constants;
use crate::util::error::{ImpLogError, SourceMapError};
use serde::Serialize;
use std::borrow::Cow;
use std::io::{self, BufRead};
use std::path::Path;

/// Load a pre-processor line table from a JSON file.
///
/// Files larger than `MAX_SOURCE_MAP_FILE_SIZE` are rejected before reading.
/// A `file` entry that is relative is resolved against the table's own
/// directory.
pub fn load_line_table(path: &Path) -> Result<LineTable, SourceMapError> {
    let size = std::fs::metadata(path)
        .map_err(|source| SourceMapError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if size > constants::MAX_SOURCE_MAP_FILE_SIZE {
        return Err(SourceMapError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max_size: constants::MAX_SOURCE_MAP_FILE_SIZE,
        });
    }

    let bytes = std::fs::read(path).map_err(|source| SourceMapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut table: LineTable =
        serde_json::from_slice(&bytes).map_err(|source| SourceMapError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if table.file.is_relative() {
        if let Some(dir) = path.parent() {
            table.file = dir.join(&table.file);
        }
    }

    tracing::debug!(
        path = %path.display(),
        lines = table.len(),
        "Loaded source map"
    );
    Ok(table)
}

/// Read one line of a captured log stream.
///
/// Invalid UTF-8 is replaced rather than rejected so a corrupt byte never
/// ends the replay. The `\n` or `\r\n` terminator is stripped. Returns
/// `None` at end of input. `buf` is scratch space reused across calls.
pub fn read_line_lossy<R: BufRead + ?Sized>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    let line = match String::from_utf8_lossy(buf) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            tracing::debug!(bytes = buf.len(), "Input line contained invalid UTF-8");
            text
        }
    };
    Ok(Some(line))
}

/// Write `value` as pretty-printed JSON to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ImpLogError> {
    let io_err = |source: io::Error| ImpLogError::Io {
        path: path.to_path_buf(),
        operation: "write diagnostics",
        source,
    };
    let json = serde_json::to_string_pretty(value).map_err(|e| io_err(io::Error::from(e)))?;
    std::fs::write(path, json).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sourcemap::SourceMap;
    use std::path::PathBuf;

    #[test]
    fn test_load_line_table_resolves_relative_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.map.json");
        std::fs::write(&path, r#"{"file":"main.agent.nut","lines":[["main.tut",4]]}"#).unwrap();

        let table = load_line_table(&path).unwrap();
        assert_eq!(table.file(), dir.path().join("main.agent.nut"));
        assert_eq!(table.original_location(0), Some((PathBuf::from("main.tut"), 4)));
    }

    #[test]
    fn test_load_line_table_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_line_table(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(SourceMapError::Io { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(load_line_table(&bad), Err(SourceMapError::Json { .. })));
    }

    #[test]
    fn test_read_line_lossy_survives_invalid_utf8() {
        let input: &[u8] = b"first\r\nbad \xff byte\nlast";
        let mut reader = io::Cursor::new(input);
        let mut buf = Vec::new();
        let mut lines = Vec::new();
        while let Some(line) = read_line_lossy(&mut reader, &mut buf).unwrap() {
            lines.push(line);
        }
        assert_eq!(lines, vec!["first", "bad \u{FFFD} byte", "last"]);
    }

    #[test]
    fn test_read_line_lossy_keeps_blank_lines() {
        let mut reader = io::Cursor::new(&b"\n\nx\n"[..]);
        let mut buf = Vec::new();
        assert_eq!(read_line_lossy(&mut reader, &mut buf).unwrap().as_deref(), Some(""));
        assert_eq!(read_line_lossy(&mut reader, &mut buf).unwrap().as_deref(), Some(""));
        assert_eq!(read_line_lossy(&mut reader, &mut buf).unwrap().as_deref(), Some("x"));
        assert_eq!(read_line_lossy(&mut reader, &mut buf).unwrap(), None);
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(serde_json::from_str::<Vec<i32>>(&text).unwrap(), vec![1, 2, 3]);
    }
}
