//! Tag-based severity resolution.
//!
//! Log events carry a free-form tag list. Tags naming a level select the
//! record severity (the last one wins); everything else is kept as boolean
//! context next to the message.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Canonical severity levels of the ingestion schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Info,
    Debug,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Parse a tag, ignoring ASCII case. Returns `None` for non-severity tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        const LEVELS: [(&str, Severity); 5] = [
            ("info", Severity::Info),
            ("debug", Severity::Debug),
            ("warning", Severity::Warning),
            ("error", Severity::Error),
            ("critical", Severity::Critical),
        ];

        LEVELS
            .iter()
            .find(|(name, _)| tag.eq_ignore_ascii_case(name))
            .map(|(_, level)| *level)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Severities that carry a `serviceContext` block for error reporting.
    pub const fn is_reportable(&self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-severity tags, each mapped to `true`.
pub type ResidualTags = BTreeMap<String, bool>;

/// Resolve a tag sequence into a severity and the residual tag map.
pub fn resolve<I, T>(tags: I) -> (Severity, ResidualTags)
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut severity = Severity::default();
    let mut residual = ResidualTags::new();

    for tag in tags {
        let tag = tag.as_ref();
        match Severity::from_tag(tag) {
            Some(level) => severity = level,
            None => {
                residual.insert(tag.to_string(), true);
            }
        }
    }

    (severity, residual)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_severity_tag_wins() {
        let (severity, residual) = resolve(["error", "foo", "warning"]);
        assert_eq!(severity, Severity::Warning);
        assert_eq!(residual.len(), 1);
        assert_eq!(residual.get("foo"), Some(&true));
    }

    #[test]
    fn defaults_to_info() {
        let (severity, residual) = resolve(["db", "cache"]);
        assert_eq!(severity, Severity::Info);
        assert_eq!(residual.keys().collect::<Vec<_>>(), vec!["cache", "db"]);

        let (severity, residual) = resolve(Vec::<String>::new());
        assert_eq!(severity, Severity::Info);
        assert!(residual.is_empty());
    }

    #[test]
    fn matching_ignores_case() {
        let (severity, residual) = resolve(["CRITICAL", "Debug"]);
        assert_eq!(severity, Severity::Debug);
        assert!(residual.is_empty());
    }

    #[test]
    fn unknown_level_names_are_context() {
        // "warn" is not one of the canonical names
        let (severity, residual) = resolve(["warn", "error"]);
        assert_eq!(severity, Severity::Error);
        assert_eq!(residual.get("warn"), Some(&true));
    }

    #[test]
    fn serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"WARNING\"");
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn reportable_levels() {
        assert!(Severity::Error.is_reportable());
        assert!(Severity::Critical.is_reportable());
        assert!(!Severity::Warning.is_reportable());
        assert!(!Severity::Info.is_reportable());
        assert!(!Severity::Debug.is_reportable());
    }
}
