// ImpLog - core/classify.rs
//
// Category classification and tag rendering.
//
// One immutable table keyed by category carries everything derived from it:
// display name, style class, and tag colour. The plain and coloured tag
// renderers both read from that table so the two can never disagree.

use crate::core::model::{LogCategory, StyleClass, TypeInfo};
use owo_colors::{AnsiColors, OwoColorize};

/// Foreground/background pair used when rendering a coloured tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagColour {
    pub fg: AnsiColors,
    pub bg: Option<AnsiColors>,
}

struct CategoryEntry {
    category: LogCategory,
    display_name: &'static str,
    style_class: StyleClass,
    colour: TagColour,
}

const fn fg(colour: AnsiColors) -> TagColour {
    TagColour {
        fg: colour,
        bg: None,
    }
}

const fn fg_on(colour: AnsiColors, background: AnsiColors) -> TagColour {
    TagColour {
        fg: colour,
        bg: Some(background),
    }
}

static CATEGORY_TABLE: &[CategoryEntry] = &[
    CategoryEntry {
        category: LogCategory::ServerLog,
        display_name: "Device",
        style_class: StyleClass::DeviceLog,
        colour: fg(AnsiColors::Blue),
    },
    CategoryEntry {
        category: LogCategory::ServerError,
        display_name: "Device",
        style_class: StyleClass::DeviceError,
        colour: fg_on(AnsiColors::Black, AnsiColors::White),
    },
    CategoryEntry {
        category: LogCategory::ServerSleep,
        display_name: "Device",
        style_class: StyleClass::DeviceSleep,
        colour: fg(AnsiColors::Blue),
    },
    CategoryEntry {
        category: LogCategory::AgentLog,
        display_name: "Agent",
        style_class: StyleClass::AgentLog,
        colour: fg(AnsiColors::Cyan),
    },
    CategoryEntry {
        category: LogCategory::AgentError,
        display_name: "Agent",
        style_class: StyleClass::AgentError,
        colour: fg_on(AnsiColors::Black, AnsiColors::Cyan),
    },
    CategoryEntry {
        category: LogCategory::Status,
        display_name: "Status",
        style_class: StyleClass::Status,
        colour: fg(AnsiColors::Yellow),
    },
    CategoryEntry {
        category: LogCategory::PowerState,
        display_name: "Power State",
        style_class: StyleClass::PowerState,
        colour: fg(AnsiColors::Green),
    },
    CategoryEntry {
        category: LogCategory::LastExitCode,
        display_name: "Exit Code",
        style_class: StyleClass::LastExitCode,
        colour: fg(AnsiColors::Red),
    },
    CategoryEntry {
        category: LogCategory::Firmware,
        display_name: "Firmware",
        style_class: StyleClass::Firmware,
        colour: fg(AnsiColors::Magenta),
    },
    CategoryEntry {
        category: LogCategory::IdeLog,
        display_name: "IDE",
        style_class: StyleClass::IdeLog,
        colour: fg(AnsiColors::Yellow),
    },
];

fn entry_for(category: LogCategory) -> Option<&'static CategoryEntry> {
    CATEGORY_TABLE.iter().find(|e| e.category == category)
}

fn entry_for_class(class: StyleClass) -> Option<&'static CategoryEntry> {
    CATEGORY_TABLE.iter().find(|e| e.style_class == class)
}

/// Classify a raw category token.
///
/// Exact string equality against the known tokens; `None` for anything else.
pub fn classify(token: &str) -> Option<TypeInfo> {
    classify_category(LogCategory::from_token(token))
}

/// Classify an already-mapped category. `None` for `LogCategory::Unknown`.
pub fn classify_category(category: LogCategory) -> Option<TypeInfo> {
    entry_for(category).map(|e| TypeInfo {
        display_name: e.display_name,
        style_class: e.style_class,
    })
}

/// Colour assigned to a style class.
pub fn tag_colour(class: StyleClass) -> Option<TagColour> {
    entry_for_class(class).map(|e| e.colour)
}

/// Render `[name]`, with a trailing space for the agent family only.
///
/// The trailing space is part of the rendered record layout: agent lines end
/// up with two spaces between tag and body.
pub fn render_tag(info: &TypeInfo) -> String {
    if info.style_class.is_agent_family() {
        format!("[{}] ", info.display_name)
    } else {
        format!("[{}]", info.display_name)
    }
}

/// Render the tag with ANSI colour codes.
///
/// Only the bracketed name is coloured; the agent trailing space stays outside
/// the coloured span so the uncoloured text equals `render_tag` exactly.
pub fn render_tag_coloured(info: &TypeInfo) -> String {
    let bracketed = format!("[{}]", info.display_name);
    let coloured = match tag_colour(info.style_class) {
        Some(TagColour { fg, bg: Some(bg) }) => bracketed.color(fg).on_color(bg).to_string(),
        Some(TagColour { fg, bg: None }) => bracketed.color(fg).to_string(),
        None => bracketed,
    };
    if info.style_class.is_agent_family() {
        format!("{coloured} ")
    } else {
        coloured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ansi(s: &str) -> String {
        let re = regex::Regex::new(r"\x1b\[[0-9;]*m").unwrap();
        re.replace_all(s, "").into_owned()
    }

    #[test]
    fn test_classify_full_table() {
        let expected = [
            ("server.log", "Device", StyleClass::DeviceLog),
            ("server.error", "Device", StyleClass::DeviceError),
            ("server.sleep", "Device", StyleClass::DeviceSleep),
            ("agent.log", "Agent", StyleClass::AgentLog),
            ("agent.error", "Agent", StyleClass::AgentError),
            ("status", "Status", StyleClass::Status),
            ("powerstate", "Power State", StyleClass::PowerState),
            ("lastexitcode", "Exit Code", StyleClass::LastExitCode),
            ("firmware", "Firmware", StyleClass::Firmware),
            ("IDE.log", "IDE", StyleClass::IdeLog),
        ];
        for (token, name, class) in expected {
            let info = classify(token).unwrap_or_else(|| panic!("{token} should classify"));
            assert_eq!(info.display_name, name, "display name for {token}");
            assert_eq!(info.style_class, class, "style class for {token}");
        }
    }

    #[test]
    fn test_classify_unknown_tokens() {
        for token in ["", "server", "server.log ", "agent.warn", "ide.log", "STATUS"] {
            assert!(classify(token).is_none(), "{token:?} should not classify");
        }
    }

    #[test]
    fn test_render_tag_trailing_space_only_for_agent_family() {
        for category in LogCategory::all() {
            let info = classify_category(*category).unwrap();
            let tag = render_tag(&info);
            assert_eq!(
                tag.ends_with(' '),
                info.style_class.is_agent_family(),
                "unexpected trailing space state for {tag:?}"
            );
            assert!(tag.starts_with('['));
        }
        let agent = classify("agent.error").unwrap();
        assert_eq!(render_tag(&agent), "[Agent] ");
        let power = classify("powerstate").unwrap();
        assert_eq!(render_tag(&power), "[Power State]");
    }

    #[test]
    fn test_coloured_tag_matches_plain_tag_without_codes() {
        for category in LogCategory::all() {
            let info = classify_category(*category).unwrap();
            let coloured = render_tag_coloured(&info);
            assert!(coloured.contains("\x1b["), "expected ANSI codes in {coloured:?}");
            assert_eq!(strip_ansi(&coloured), render_tag(&info));
        }
    }

    #[test]
    fn test_colour_table() {
        assert_eq!(
            tag_colour(StyleClass::DeviceError),
            Some(TagColour {
                fg: AnsiColors::Black,
                bg: Some(AnsiColors::White)
            })
        );
        assert_eq!(
            tag_colour(StyleClass::AgentError),
            Some(TagColour {
                fg: AnsiColors::Black,
                bg: Some(AnsiColors::Cyan)
            })
        );
        assert_eq!(tag_colour(StyleClass::Firmware).unwrap().fg, AnsiColors::Magenta);
        assert_eq!(tag_colour(StyleClass::IdeLog).unwrap().fg, AnsiColors::Yellow);
        assert_eq!(tag_colour(StyleClass::DeviceSleep).unwrap().fg, AnsiColors::Blue);
    }
}
