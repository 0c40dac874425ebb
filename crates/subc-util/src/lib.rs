//! subc-util - Core Utilities and Foundation Types
//!
//! This crate provides the foundation types shared by every phase of the
//! subc compiler:
//!
//! - [`span`] - Source locations (byte offsets plus 1-based line/column),
//!   file identifiers, and the [`SourceMap`] that owns loaded files.
//! - [`symbol`] - Interned strings. Identifiers, keywords, and string
//!   literal payloads are 4-byte [`Symbol`]s; comparison is an integer
//!   compare and the text lives in a global table for the lifetime of the
//!   process.
//! - [`diagnostic`] - The diagnostics sink. Phases receive a [`Handler`]
//!   and report through the fluent [`DiagnosticBuilder`]; the driver
//!   renders everything at the end of the run. No phase prints directly.
//!
//! Nothing here knows anything about the SB language itself; that starts
//! in `subc-lex`.

pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::{kw, Symbol};
