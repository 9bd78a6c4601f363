// ImpLog - app/session.rs
//
// Session setup: turns validated configuration into the collaborators a
// stream gate is built from.
//
// Design principles:
// - A source map that fails to load is a warning, not a startup failure. The
//   session falls back to flat resolution for that source and keeps going.
// - Only successfully loaded maps switch the session into mapped resolution.

use crate::app::diagnostics::DiagnosticStore;
use crate::app::gate::StreamPolicy;
use crate::core::model::SourceKind;
use crate::core::parser::RenderOptions;
use crate::core::resolve::FlatPaths;
use crate::platform::config::AppConfig;
use crate::platform::fs;

/// Everything needed to construct a gate, plus non-fatal setup warnings.
#[derive(Debug)]
pub struct SessionSetup {
    pub diagnostics: DiagnosticStore,
    pub policy: StreamPolicy,
    pub warnings: Vec<String>,
}

/// Build the diagnostics store and stream policy for `config`.
///
/// `colour` is the already-resolved tag colouring decision.
pub fn prepare(config: &AppConfig, colour: bool) -> SessionSetup {
    let mut diagnostics = DiagnosticStore::new();
    let mut warnings = Vec::new();

    let maps = [
        (SourceKind::Agent, config.agent_map.as_deref()),
        (SourceKind::Device, config.device_map.as_deref()),
    ];
    for (kind, path) in maps {
        let Some(path) = path else { continue };
        match fs::load_line_table(path) {
            Ok(table) => diagnostics.register_map(kind, table),
            Err(e) => {
                tracing::warn!(source = %kind, error = %e, "Source map not loaded");
                warnings.push(format!("{kind} source map not loaded: {e}"));
            }
        }
    }

    let policy = StreamPolicy {
        show_state_messages: config.show_state_messages,
        render: RenderOptions { colour },
        flat_paths: FlatPaths {
            agent_path: config.agent_path.clone(),
            device_path: config.device_path.clone(),
        },
    };

    SessionSetup {
        diagnostics,
        policy,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolve::SourceMaps;
    use std::path::PathBuf;

    #[test]
    fn test_prepare_flat_session() {
        let config = AppConfig {
            agent_path: Some(PathBuf::from("/ws/agent.nut")),
            show_state_messages: true,
            ..AppConfig::default()
        };
        let setup = prepare(&config, false);
        assert!(setup.warnings.is_empty());
        assert!(!setup.diagnostics.has_preprocessor());
        assert!(setup.policy.show_state_messages);
        assert_eq!(
            setup.policy.flat_paths.agent_path,
            Some(PathBuf::from("/ws/agent.nut"))
        );
    }

    #[test]
    fn test_prepare_loads_maps_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let agent_map = dir.path().join("agent.json");
        std::fs::write(&agent_map, r#"{"file":"agent.nut","lines":[]}"#).unwrap();

        let config = AppConfig {
            agent_map: Some(agent_map),
            device_map: Some(dir.path().join("missing.json")),
            ..AppConfig::default()
        };
        let setup = prepare(&config, true);
        assert!(setup.diagnostics.has_preprocessor());
        assert!(setup.diagnostics.source_map_for(SourceKind::Agent).is_some());
        assert!(setup.diagnostics.source_map_for(SourceKind::Device).is_none());
        assert_eq!(setup.warnings.len(), 1);
        assert!(setup.warnings[0].starts_with("device_code"));
        assert!(setup.policy.render.colour);
    }
}
