use std::fmt;

use crate::span::SourceLoc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        };
        write!(f, "{s}")
    }
}

/// A single located diagnostic: the unit of fallible-operation reporting
/// across parsing, verification, and (for trap messages) execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub location: SourceLoc,
    pub message: String,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, location: SourceLoc) -> Self {
        Self { severity: Severity::Error, code: None, location, message: message.into(), notes: Vec::new() }
    }

    pub fn warning(message: impl Into<String>, location: SourceLoc) -> Self {
        Self { severity: Severity::Warning, code: None, location, message: message.into(), notes: Vec::new() }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    /// Matches the user-visible format mandated for stderr output:
    /// `file:line:column: severity[code]: message`. Since this type has no
    /// path (only a `file_id`), callers that need the full form should
    /// render the path themselves via a `SourceManager` and prefix it; this
    /// impl renders the `line:column: severity[code]: message` remainder.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(code) = &self.code {
            write!(f, " [{code}]")?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

/// An accumulating batch of diagnostics, collected during a single parse or
/// verify pass and reported together rather than aborting on the first
/// failure.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.messages.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>, location: SourceLoc) {
        self.push(Diagnostic::error(message, location));
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    /// Sorts diagnostics by `(file_id, line, column)` for stable, reviewable
    /// batch reporting.
    pub fn sort_by_location(&mut self) {
        self.messages.sort_by_key(|d| (d.location.file_id, d.location.line, d.location.column));
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.messages
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self { messages: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_errors_ignores_warnings() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("careful", SourceLoc::UNKNOWN));
        assert!(!diags.has_errors());
        diags.push(Diagnostic::error("boom", SourceLoc::UNKNOWN));
        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn sort_orders_by_location() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::error("b", SourceLoc::new(1, 5, 1)));
        diags.push(Diagnostic::error("a", SourceLoc::new(1, 2, 1)));
        diags.sort_by_location();
        let v = diags.into_vec();
        assert_eq!(v[0].message, "a");
        assert_eq!(v[1].message, "b");
    }

    #[test]
    fn display_includes_code_and_notes() {
        let d = Diagnostic::error("bad thing", SourceLoc::UNKNOWN)
            .with_code("sig.operand-count")
            .with_note("expected 2 operands");
        let s = d.to_string();
        assert!(s.contains("[sig.operand-count]"));
        assert!(s.contains("expected 2 operands"));
    }
}
