// ImpLog - core/resolve.rs
//
// Rewrites symbolic `agent_code:N` / `device_code:N` references in message
// bodies into `file:line:0` references an editor can open.
//
// Resolution is best-effort: any missing map, failed match, or out-of-range
// line leaves the body exactly as it was.

use crate::core::grammar;
use crate::core::model::{ResolvedLocation, SourceKind, SourceReference};
use crate::core::sourcemap::SourceMap;
use crate::util::constants::{AGENT_CODE_TOKEN, COLUMN_SUFFIX, DEVICE_CODE_TOKEN};
use std::path::{Component, Path, PathBuf};

/// Read access to the source maps attached to the current session.
pub trait SourceMaps {
    /// Map registered for `kind`, if any.
    fn source_map_for(&self, kind: SourceKind) -> Option<&dyn SourceMap>;

    /// True when the deployed code went through the pre-processor and
    /// source maps are the authority for locations.
    fn has_preprocessor(&self) -> bool;
}

/// Flat per-role source paths used when no pre-processor is involved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatPaths {
    pub agent_path: Option<PathBuf>,
    pub device_path: Option<PathBuf>,
}

impl FlatPaths {
    pub fn path_for(&self, kind: SourceKind) -> Option<&Path> {
        match kind {
            SourceKind::Agent => self.agent_path.as_deref(),
            SourceKind::Device => self.device_path.as_deref(),
        }
    }
}

/// Resolution strategy for one session.
#[derive(Clone, Copy)]
pub enum Resolver<'a> {
    /// Locations come from pre-processor source maps.
    Mapped(&'a dyn SourceMaps),
    /// The symbolic token is replaced by a flat workspace path.
    Flat(&'a FlatPaths),
}

impl<'a> Resolver<'a> {
    /// Pick the strategy: mapped when a pre-processor is present, flat otherwise.
    pub fn for_session(maps: &'a dyn SourceMaps, flat: &'a FlatPaths) -> Self {
        if maps.has_preprocessor() {
            Resolver::Mapped(maps)
        } else {
            Resolver::Flat(flat)
        }
    }

    /// Replace the embedded source reference in `body`.
    ///
    /// Bodies without `agent_code`/`device_code` are returned unchanged, as
    /// are bodies whose reference cannot be resolved.
    pub fn resolve(&self, body: &str) -> String {
        if !has_reference(body) {
            return body.to_string();
        }
        let resolved = match self {
            Resolver::Mapped(maps) => resolve_mapped(body, *maps),
            Resolver::Flat(paths) => resolve_flat(body, paths),
        };
        resolved.unwrap_or_else(|| {
            tracing::trace!(body_len = body.len(), "Source reference left unresolved");
            body.to_string()
        })
    }
}

/// True when `body` mentions either symbolic source token.
pub fn has_reference(body: &str) -> bool {
    body.contains(AGENT_CODE_TOKEN) || body.contains(DEVICE_CODE_TOKEN)
}

/// Extract the last `kind:N` reference from `body`.
pub fn extract_reference(body: &str) -> Option<SourceReference> {
    let caps = grammar::SOURCE_REFERENCE.captures(body)?;
    Some(SourceReference {
        kind: SourceKind::from_token(caps.name("kind")?.as_str())?,
        line_number: caps.name("line")?.as_str().parse().ok()?,
    })
}

/// Map a reference through a source map.
///
/// The message line is 1-based, the map is 0-based. The relative path the map
/// returns is joined against the directory of the map's file.
pub fn resolve_location(reference: SourceReference, map: &dyn SourceMap) -> Option<ResolvedLocation> {
    let preprocessed = reference.line_number.checked_sub(1)?;
    let (relative, line) = map.original_location(preprocessed)?;
    let base = map.file().parent().unwrap_or_else(|| Path::new(""));
    Some(ResolvedLocation {
        file_path: normalize(&base.join(relative)),
        line,
        column: 0,
    })
}

fn resolve_mapped(body: &str, maps: &dyn SourceMaps) -> Option<String> {
    let caps = grammar::SOURCE_REFERENCE.captures(body)?;
    let kind = caps.name("kind")?;
    let line = caps.name("line")?;
    // Keep the literal digits: the replacement targets the text as written.
    let needle = &body[kind.start()..line.end()];

    let reference = extract_reference(body)?;
    let map = maps.source_map_for(reference.kind)?;
    let location = resolve_location(reference, map)?;

    let replacement = format!("{}:{}", location.file_path.display(), location.line);
    Some(format!(
        "{}{COLUMN_SUFFIX}",
        body.replacen(needle, &replacement, 1)
    ))
}

fn resolve_flat(body: &str, paths: &FlatPaths) -> Option<String> {
    let kind = if body.contains(AGENT_CODE_TOKEN) {
        SourceKind::Agent
    } else {
        SourceKind::Device
    };
    let path = paths.path_for(kind)?;
    Some(format!(
        "{}{COLUMN_SUFFIX}",
        body.replacen(kind.token(), &path.display().to_string(), 1)
    ))
}

/// Collapse `.` and `..` segments without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sourcemap::LineTable;
    use std::collections::HashMap;

    struct Maps(HashMap<SourceKind, LineTable>);

    impl SourceMaps for Maps {
        fn source_map_for(&self, kind: SourceKind) -> Option<&dyn SourceMap> {
            self.0.get(&kind).map(|t| t as &dyn SourceMap)
        }

        fn has_preprocessor(&self) -> bool {
            !self.0.is_empty()
        }
    }

    fn agent_maps(relative: &str, line: u32) -> Maps {
        let mut lines = vec![(PathBuf::from("unused.tut"), 1); 41];
        lines.push((PathBuf::from(relative), line));
        let mut maps = HashMap::new();
        maps.insert(
            SourceKind::Agent,
            LineTable::new("/proj/src/main.agent.nut", lines),
        );
        Maps(maps)
    }

    #[test]
    fn test_body_without_reference_is_unchanged() {
        let maps = agent_maps("main.tut", 10);
        let flat = FlatPaths::default();
        let resolver = Resolver::for_session(&maps, &flat);
        assert_eq!(resolver.resolve("plain message 42"), "plain message 42");
    }

    #[test]
    fn test_mapped_round_trip_with_parent_segment() {
        let maps = agent_maps("../main.tut", 10);
        let flat = FlatPaths::default();
        let resolver = Resolver::for_session(&maps, &flat);
        assert!(matches!(resolver, Resolver::Mapped(_)));
        assert_eq!(
            resolver.resolve("ERROR: the index 'x' does not exist at agent_code:42"),
            "ERROR: the index 'x' does not exist at /proj/main.tut:10:0"
        );
    }

    #[test]
    fn test_mapped_joins_against_map_directory() {
        let maps = agent_maps("main.tut", 10);
        let resolved = Resolver::Mapped(&maps).resolve("from agent_code:42 done");
        assert_eq!(resolved, "from /proj/src/main.tut:10 done:0");
    }

    #[test]
    fn test_mapped_missing_map_entry_is_unchanged() {
        let maps = agent_maps("main.tut", 10);
        let body = "called from device_code:3";
        assert_eq!(Resolver::Mapped(&maps).resolve(body), body);
    }

    #[test]
    fn test_mapped_line_out_of_range_is_unchanged() {
        let maps = agent_maps("main.tut", 10);
        for body in ["at agent_code:900", "at agent_code:0"] {
            assert_eq!(Resolver::Mapped(&maps).resolve(body), body);
        }
    }

    #[test]
    fn test_mapped_token_without_line_is_unchanged() {
        let maps = agent_maps("main.tut", 10);
        let body = "agent_code reloaded";
        assert_eq!(Resolver::Mapped(&maps).resolve(body), body);
    }

    #[test]
    fn test_flat_mode_replaces_token_only() {
        let maps = Maps(HashMap::new());
        let flat = FlatPaths {
            agent_path: Some(PathBuf::from("/ws/agent.nut")),
            device_path: Some(PathBuf::from("/ws/device.nut")),
        };
        let resolver = Resolver::for_session(&maps, &flat);
        assert!(matches!(resolver, Resolver::Flat(_)));
        assert_eq!(
            resolver.resolve("ERROR: bad at device_code:7"),
            "ERROR: bad at /ws/device.nut:7:0"
        );
    }

    #[test]
    fn test_flat_mode_prefers_agent_token() {
        let flat = FlatPaths {
            agent_path: Some(PathBuf::from("/ws/agent.nut")),
            device_path: Some(PathBuf::from("/ws/device.nut")),
        };
        assert_eq!(
            Resolver::Flat(&flat).resolve("device_code:1 then agent_code:2"),
            "device_code:1 then /ws/agent.nut:2:0"
        );
    }

    #[test]
    fn test_flat_mode_without_configured_path_is_unchanged() {
        let flat = FlatPaths {
            agent_path: Some(PathBuf::from("/ws/agent.nut")),
            device_path: None,
        };
        let body = "at device_code:7";
        assert_eq!(Resolver::Flat(&flat).resolve(body), body);
    }

    #[test]
    fn test_extract_reference() {
        assert_eq!(
            extract_reference("x agent_code:5 y device_code:9"),
            Some(SourceReference {
                kind: SourceKind::Device,
                line_number: 9
            })
        );
        assert_eq!(extract_reference("agent_code"), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }
}
