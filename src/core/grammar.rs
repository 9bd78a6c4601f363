// ImpLog - core/grammar.rs
//
// Named, independently testable line grammars.
//
// Each grammar is compiled once on first use and shared. Control flow in the
// parser, resolver and gate refers to these by name only, so a grammar change
// never touches the code that acts on the match.

use regex::Regex;
use std::sync::OnceLock;

/// A named regular expression compiled lazily on first use.
pub struct Grammar {
    name: &'static str,
    pattern: &'static str,
    compiled: OnceLock<Regex>,
}

impl Grammar {
    const fn new(name: &'static str, pattern: &'static str) -> Self {
        Self {
            name,
            pattern,
            compiled: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// The compiled regex.
    ///
    /// Patterns are compile-time literals covered by the tests below, so a
    /// compile failure is a programming error.
    pub fn regex(&self) -> &Regex {
        self.compiled.get_or_init(|| {
            Regex::new(self.pattern)
                .unwrap_or_else(|e| panic!("built-in grammar '{}' is invalid: {e}", self.name))
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex().is_match(text)
    }

    pub fn captures<'t>(&self, text: &'t str) -> Option<regex::Captures<'t>> {
        self.regex().captures(text)
    }
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// A log stream record:
/// `<16 hex device id> <label> <development|production> <category> <body>`.
///
/// The label group is greedy, so the environment keyword binds to its last
/// occurrence in the line.
pub static LOG_LINE: Grammar = Grammar::new(
    "log-line",
    r"\b(?P<device>[0-9a-f]{16})\s(?P<label>.*)\s(?P<env>development|production)\s(?P<category>[a-z.]+)\s(?P<body>.*)",
);

/// A log stream record whose body starts with `ERROR:`.
pub static ERROR_LINE: Grammar = Grammar::new(
    "error-line",
    r"\b(?P<device>[0-9a-f]{16})\s(?P<label>.*)\s(?P<env>development|production)\s(?P<category>[a-z.]+)\sERROR:(?P<body>.*)",
);

/// Last `agent_code:N` / `device_code:N` reference in a message body.
pub static SOURCE_REFERENCE: Grammar = Grammar::new(
    "source-reference",
    r".*(?P<kind>(?:device_code|agent_code)):(?P<line>\d+)",
);

/// Trailing `:N` line number of an error message.
pub static ERROR_LOCATION: Grammar = Grammar::new("error-location", r"(?P<head>.*):(?P<line>\d+)");

/// Fresh deployment announcement. Previously reported diagnostics are stale
/// once this appears.
pub static CODE_RELOAD: Grammar = Grammar::new(
    "code-reload",
    r".*(Downloading new code).*(program storage used)",
);

/// Every built-in grammar, for startup validation and tests.
pub fn all() -> [&'static Grammar; 5] {
    [
        &LOG_LINE,
        &ERROR_LINE,
        &SOURCE_REFERENCE,
        &ERROR_LOCATION,
        &CODE_RELOAD,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE: &str = "0c2a6921f6e04aee";

    #[test]
    fn test_all_grammars_compile() {
        for grammar in all() {
            assert!(
                Regex::new(grammar.pattern()).is_ok(),
                "grammar {} failed to compile",
                grammar.name()
            );
            let _ = grammar.regex();
        }
    }

    #[test]
    fn test_log_line_captures() {
        let line = format!("{DEVICE} 2024-01-15T14:30:22.000Z development server.log hello world");
        let caps = LOG_LINE.captures(&line).expect("should match");
        assert_eq!(&caps["device"], DEVICE);
        assert_eq!(&caps["label"], "2024-01-15T14:30:22.000Z");
        assert_eq!(&caps["env"], "development");
        assert_eq!(&caps["category"], "server.log");
        assert_eq!(&caps["body"], "hello world");
    }

    #[test]
    fn test_log_line_rejects_short_device_token() {
        assert!(!LOG_LINE.is_match("0c2a6921 label production agent.log text"));
        assert!(!LOG_LINE.is_match("just some text"));
    }

    #[test]
    fn test_error_line_requires_error_prefix() {
        let ok = format!("{DEVICE} x production agent.error ERROR: boom at agent_code:3");
        let not = format!("{DEVICE} x production agent.error boom at agent_code:3");
        assert_eq!(&ERROR_LINE.captures(&ok).unwrap()["body"], " boom at agent_code:3");
        assert!(!ERROR_LINE.is_match(&not));
    }

    #[test]
    fn test_source_reference_takes_last_occurrence() {
        let caps = SOURCE_REFERENCE
            .captures("from agent_code:4 called device_code:17")
            .unwrap();
        assert_eq!(&caps["kind"], "device_code");
        assert_eq!(&caps["line"], "17");
    }

    #[test]
    fn test_code_reload_requires_both_phrases_in_order() {
        assert!(CODE_RELOAD.is_match(
            "Downloading new code; 12.34% program storage used"
        ));
        assert!(!CODE_RELOAD.is_match("program storage used after Downloading new code"));
        assert!(!CODE_RELOAD.is_match("Downloading new code"));
    }
}
