//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! Phases never print; they report into a [`Handler`] passed in by the
//! driver, which renders everything once the pipeline stops. This keeps
//! compilations independent of each other and keeps ordering
//! deterministic.
//!
//! # Examples
//!
//! ```
//! use subc_util::diagnostic::{DiagnosticBuilder, Handler};
//! use subc_util::Span;
//!
//! let handler = Handler::new();
//! DiagnosticBuilder::error("unexpected token")
//!     .span(Span::DUMMY)
//!     .emit(&handler);
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_count(), 1);
//! ```

mod builder;

pub use builder::DiagnosticBuilder;

use crate::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level
///
/// `Error` and `Fatal` fail the build; `Info` and `Warning` do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Informational message
    Info,
    /// A warning that doesn't prevent compilation
    Warning,
    /// An error that prevents compilation
    Error,
    /// An internal or unrecoverable error; the phase stops immediately
    Fatal,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
            Level::Fatal => write!(f, "fatal"),
        }
    }
}

/// A diagnostic message with severity and location
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Diagnostic severity level
    pub level: Level,
    /// Main diagnostic message
    pub message: String,
    /// Source location
    pub span: Span,
    /// Additional notes for context
    pub notes: Vec<String>,
    /// Help suggestions for fixing the issue
    pub helps: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            message: message.into(),
            span,
            notes: Vec::new(),
            helps: Vec::new(),
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, message, span)
    }

    /// Add a note to the diagnostic
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.helps.push(help.into());
        self
    }

    /// Render as the driver's one-line format: `file:line:col: level: message`
    pub fn render(&self, file_name: &str) -> String {
        format!(
            "{}:{}:{}: {}: {}",
            file_name, self.span.line, self.span.column, self.level, self.message
        )
    }
}

/// Handler for collecting and reporting diagnostics
///
/// The `Handler` accumulates diagnostics in emission order and answers
/// count queries. Interior mutability lets phases that only hold `&self`
/// report through it.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Create a new handler
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Emit a pre-built diagnostic
    pub fn emit_diagnostic(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Check if any errors (or fatals) have been reported
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level >= Level::Error)
    }

    /// Get the number of errors
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level >= Level::Error)
            .count()
    }

    /// Get the number of warnings
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// Get all diagnostics in emission order
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Clear all diagnostics
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display() {
        assert_eq!(format!("{}", Level::Info), "info");
        assert_eq!(format!("{}", Level::Warning), "warning");
        assert_eq!(format!("{}", Level::Error), "error");
        assert_eq!(format!("{}", Level::Fatal), "fatal");
    }

    #[test]
    fn test_diagnostic_render() {
        let diag = Diagnostic::error("type mismatch", Span::new(4, 9, 2, 5));
        assert_eq!(diag.render("demo.sb"), "demo.sb:2:5: error: type mismatch");
    }

    #[test]
    fn test_handler_counts() {
        let handler = Handler::new();
        handler.emit_diagnostic(Diagnostic::error("e1", Span::DUMMY));
        handler.emit_diagnostic(Diagnostic::warning("w1", Span::DUMMY));
        handler.emit_diagnostic(Diagnostic::new(Level::Fatal, "f1", Span::DUMMY));

        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 2);
        assert_eq!(handler.warning_count(), 1);
        assert_eq!(handler.diagnostics().len(), 3);
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let handler = Handler::new();
        handler.emit_diagnostic(Diagnostic::warning("w", Span::DUMMY));
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_handler_clear() {
        let handler = Handler::new();
        handler.emit_diagnostic(Diagnostic::error("e", Span::DUMMY));
        handler.clear();
        assert!(!handler.has_errors());
        assert_eq!(handler.diagnostics().len(), 0);
    }

    #[test]
    fn test_notes_and_helps() {
        let diag = Diagnostic::error("bad", Span::DUMMY)
            .with_note("expected `int`")
            .with_help("add a type annotation");
        assert_eq!(diag.notes, vec!["expected `int`"]);
        assert_eq!(diag.helps, vec!["add a type annotation"]);
    }
}
