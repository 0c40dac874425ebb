//! Diagnostic builder for fluent diagnostic construction.
//!
//! [`DiagnosticBuilder`] is how phases construct diagnostics: pick a
//! level, attach a span, optionally notes and helps, then `emit` into
//! the handler.

use super::{Diagnostic, Handler, Level};
use crate::Span;

/// Fluent builder for [`Diagnostic`]s
///
/// # Examples
///
/// ```
/// use subc_util::diagnostic::{DiagnosticBuilder, Handler};
/// use subc_util::Span;
///
/// let handler = Handler::new();
/// DiagnosticBuilder::error("cannot assign to constant `x`")
///     .span(Span::DUMMY)
///     .note("`x` was declared `const` here")
///     .emit(&handler);
/// ```
#[derive(Debug)]
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    /// Start a diagnostic at the given level
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::new(level, message, Span::DUMMY),
        }
    }

    /// Start an info diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    /// Start a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    /// Start an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    /// Start a fatal diagnostic
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(Level::Fatal, message)
    }

    /// Set the source location
    pub fn span(mut self, span: Span) -> Self {
        self.diagnostic.span = span;
        self
    }

    /// Attach a note
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    /// Attach a help suggestion
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic.helps.push(help.into());
        self
    }

    /// Finish without emitting
    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }

    /// Emit into the handler
    pub fn emit(self, handler: &Handler) {
        handler.emit_diagnostic(self.diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_levels() {
        assert_eq!(DiagnosticBuilder::info("m").build().level, Level::Info);
        assert_eq!(DiagnosticBuilder::warning("m").build().level, Level::Warning);
        assert_eq!(DiagnosticBuilder::error("m").build().level, Level::Error);
        assert_eq!(DiagnosticBuilder::fatal("m").build().level, Level::Fatal);
    }

    #[test]
    fn test_builder_emit() {
        let handler = Handler::new();
        DiagnosticBuilder::error("broken")
            .span(Span::new(1, 2, 3, 4))
            .note("a note")
            .help("a help")
            .emit(&handler);

        let diags = handler.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "broken");
        assert_eq!(diags[0].span.line, 3);
        assert_eq!(diags[0].notes, vec!["a note"]);
        assert_eq!(diags[0].helps, vec!["a help"]);
    }
}
