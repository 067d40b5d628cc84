use std::fmt;

use serde::Serialize;

use crate::rewrite::Edit;
use crate::tree::SourceRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Convention,
    Warning,
    Error,
}

impl Severity {
    pub fn letter(&self) -> char {
        match self {
            Severity::Convention => 'C',
            Severity::Warning => 'W',
            Severity::Error => 'E',
        }
    }

    pub fn from_str(s: &str) -> Option<Severity> {
        match s.to_lowercase().as_str() {
            "convention" => Some(Severity::Convention),
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// 1-indexed line number
    pub line: usize,
    /// 0-indexed column (character offset within the line)
    pub column: usize,
}

/// One detected issue: a flagged source range, a message, and zero or more
/// proposed edits (none = detectable but not auto-correctable). Produced
/// during a runner pass and handed to the host's reporting sink; never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub rule_name: String,
    pub severity: Severity,
    /// The flagged range; may be a sub-range of the matched node.
    pub range: SourceRange,
    pub location: Location,
    pub message: String,
    pub edits: Vec<Edit>,
}

impl Finding {
    pub fn sort_key(&self) -> (usize, usize) {
        (self.location.line, self.location.column)
    }

    pub fn is_correctable(&self) -> bool {
        !self.edits.is_empty()
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}: {}",
            self.location.line, self.location.column, self.severity, self.rule_name, self.message,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::SourceRange;

    fn finding(line: usize, column: usize) -> Finding {
        Finding {
            rule_name: "Test/Rule".to_string(),
            severity: Severity::Convention,
            range: SourceRange::new(0, 1),
            location: Location { line, column },
            message: "msg".to_string(),
            edits: Vec::new(),
        }
    }

    #[test]
    fn severity_letters() {
        assert_eq!(Severity::Convention.letter(), 'C');
        assert_eq!(Severity::Warning.letter(), 'W');
        assert_eq!(Severity::Error.letter(), 'E');
    }

    #[test]
    fn severity_from_str() {
        assert_eq!(Severity::from_str("convention"), Some(Severity::Convention));
        assert_eq!(Severity::from_str("Warning"), Some(Severity::Warning));
        assert_eq!(Severity::from_str("ERROR"), Some(Severity::Error));
        assert_eq!(Severity::from_str("unknown"), None);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Convention < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn finding_display() {
        let mut f = finding(3, 5);
        f.message = "bad style".to_string();
        assert_eq!(format!("{f}"), "3:5: C: Test/Rule: bad style");
    }

    #[test]
    fn finding_sort_key() {
        assert!(finding(1, 0).sort_key() < finding(1, 4).sort_key());
        assert!(finding(1, 4).sort_key() < finding(2, 0).sort_key());
    }

    #[test]
    fn correctability() {
        let mut f = finding(1, 0);
        assert!(!f.is_correctable());
        f.edits.push(Edit::insert(0, "x"));
        assert!(f.is_correctable());
    }

    #[test]
    fn serializes_for_reporting_sink() {
        let f = finding(2, 7);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["rule_name"], "Test/Rule");
        assert_eq!(json["location"]["line"], 2);
        assert_eq!(json["severity"], "Convention");
    }
}
