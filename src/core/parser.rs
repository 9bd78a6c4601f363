// ImpLog - core/parser.rs
//
// Log stream line parsing and record rendering.
// Core layer: pure functions over strings, never touches I/O.
//
// Lines that do not fit the log-line grammar are never dropped: the render
// path hands them back byte-for-byte.

use crate::core::classify;
use crate::core::grammar;
use crate::core::model::{DeploymentEnv, ErrorReport, ParsedLine, SourceKind};
use crate::core::resolve::{Resolver, SourceMaps};
use crate::util::constants;
use chrono::{DateTime, Local, TimeZone};

/// Parse one raw log stream line.
///
/// Returns `None` when the line does not have the
/// `<device> <label> <env> <category> <body>` shape.
pub fn parse_line(raw: &str) -> Option<ParsedLine<'_>> {
    let caps = grammar::LOG_LINE.captures(raw)?;
    parsed_from(&caps)
}

/// Parse a line whose body starts with `ERROR:`.
///
/// The returned body is the text after `ERROR:`. Callers only try this
/// grammar when a pre-processor is present; see `error_report`.
pub fn parse_error_line(raw: &str) -> Option<ParsedLine<'_>> {
    let caps = grammar::ERROR_LINE.captures(raw)?;
    parsed_from(&caps)
}

fn parsed_from<'a>(caps: &regex::Captures<'a>) -> Option<ParsedLine<'a>> {
    Some(ParsedLine {
        device_token: caps.name("device")?.as_str(),
        label: caps.name("label")?.as_str(),
        deployment_env: DeploymentEnv::from_token(caps.name("env")?.as_str())?,
        category: caps.name("category")?.as_str(),
        body: caps.name("body")?.as_str(),
    })
}

/// Extract a structured error report from a raw line.
///
/// Only produced when the session has a pre-processor, the line matches the
/// error grammar, the error text ends in `:<line>`, and a source map is
/// registered for the mentioned source. `agent_code` wins when both appear.
pub fn error_report(raw: &str, maps: &dyn SourceMaps) -> Option<ErrorReport> {
    if !maps.has_preprocessor() {
        return None;
    }
    let parsed = parse_error_line(raw)?;
    let message = parsed.body;

    let source = if message.contains(constants::AGENT_CODE_TOKEN) {
        SourceKind::Agent
    } else if message.contains(constants::DEVICE_CODE_TOKEN) {
        SourceKind::Device
    } else {
        return None;
    };

    let caps = grammar::ERROR_LOCATION.captures(message)?;
    let line = caps.name("line")?.as_str().parse().ok()?;
    let file = maps.source_map_for(source)?.file().to_path_buf();

    Some(ErrorReport { source, file, line })
}

/// True when the line announces a fresh code deployment.
pub fn is_code_reload(raw: &str) -> bool {
    grammar::CODE_RELOAD.is_match(raw)
}

/// Format a timestamp the way rendered records are prefixed.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(constants::TIMESTAMP_FORMAT).to_string()
}

/// Render-time timestamp in the local time zone.
pub fn timestamp_now() -> String {
    format_timestamp(&Local::now())
}

/// Render options for one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit ANSI colour codes around the category tag.
    pub colour: bool,
}

/// Render one raw line as a display record.
///
/// Matching lines become `"{timestamp} {tag} {body}"` with source references
/// resolved; lines with an unrecognised category omit the tag. Non-matching
/// lines are returned unchanged.
pub fn render_line(
    raw: &str,
    resolver: &Resolver<'_>,
    timestamp: &str,
    options: RenderOptions,
) -> String {
    let Some(parsed) = parse_line(raw) else {
        return raw.to_string();
    };

    let body = resolver.resolve(parsed.body);
    match classify::classify_category(parsed.log_category()) {
        Some(info) => {
            let tag = if options.colour {
                classify::render_tag_coloured(&info)
            } else {
                classify::render_tag(&info)
            };
            format!("{timestamp} {tag} {body}")
        }
        None => {
            tracing::trace!(category = parsed.category, "Unrecognised log category");
            format!("{timestamp} {body}")
        }
    }
}

/// Truncate a raw line for debug logging.
pub fn preview(raw: &str) -> &str {
    match raw.char_indices().nth(constants::DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
