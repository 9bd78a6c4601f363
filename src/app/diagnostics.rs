// ImpLog - app/diagnostics.rs
//
// In-memory diagnostics collector. Holds the source maps registered for the
// session and accumulates error reports until the next code reload.

use crate::app::collaborators::Diagnostics;
use crate::core::model::{ErrorReport, SourceKind};
use crate::core::resolve::SourceMaps;
use crate::core::sourcemap::{LineTable, SourceMap};
use crate::util::error::CollateralError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default `Diagnostics` implementation.
#[derive(Debug, Default)]
pub struct DiagnosticStore {
    maps: BTreeMap<SourceKind, LineTable>,
    errors: Vec<ErrorReport>,
    resets: usize,
}

/// Serialisable snapshot of the store, written by `--diagnostics-out`.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticSnapshot {
    pub errors: Vec<ErrorReport>,
    pub resets: usize,
}

impl DiagnosticStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the pre-processor map for one source. Registering any map
    /// switches the session into mapped resolution.
    pub fn register_map(&mut self, kind: SourceKind, table: LineTable) {
        tracing::debug!(
            source = %kind,
            file = %table.file.display(),
            lines = table.len(),
            "Source map registered"
        );
        self.maps.insert(kind, table);
    }

    pub fn errors(&self) -> &[ErrorReport] {
        &self.errors
    }

    /// Number of times the store has been reset by a code reload.
    pub fn resets(&self) -> usize {
        self.resets
    }

    pub fn snapshot(&self) -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            errors: self.errors.clone(),
            resets: self.resets,
        }
    }
}

impl SourceMaps for DiagnosticStore {
    fn source_map_for(&self, kind: SourceKind) -> Option<&dyn SourceMap> {
        self.maps.get(&kind).map(|t| t as &dyn SourceMap)
    }

    fn has_preprocessor(&self) -> bool {
        !self.maps.is_empty()
    }
}

impl Diagnostics for DiagnosticStore {
    fn add_error(&mut self, report: ErrorReport) -> Result<(), CollateralError> {
        // The same location reported twice in one deployment is one problem.
        if !self.errors.contains(&report) {
            self.errors.push(report);
        }
        Ok(())
    }

    fn clear_all(&mut self) -> Result<(), CollateralError> {
        self.errors.clear();
        self.resets += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn report(line: u32) -> ErrorReport {
        ErrorReport {
            source: SourceKind::Agent,
            file: PathBuf::from("/proj/agent.nut"),
            line,
        }
    }

    #[test]
    fn test_preprocessor_follows_registered_maps() {
        let mut store = DiagnosticStore::new();
        assert!(!store.has_preprocessor());
        store.register_map(SourceKind::Device, LineTable::new("/proj/device.nut", vec![]));
        assert!(store.has_preprocessor());
        assert!(store.source_map_for(SourceKind::Device).is_some());
        assert!(store.source_map_for(SourceKind::Agent).is_none());
    }

    #[test]
    fn test_duplicate_reports_collapse_and_clear_resets() {
        let mut store = DiagnosticStore::new();
        store.add_error(report(3)).unwrap();
        store.add_error(report(3)).unwrap();
        store.add_error(report(4)).unwrap();
        assert_eq!(store.errors().len(), 2);

        store.clear_all().unwrap();
        assert!(store.errors().is_empty());
        assert_eq!(store.snapshot().resets, 1);
    }
}
