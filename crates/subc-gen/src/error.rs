//! Error types for assembly emission.
//!
//! The emitter fails fast: by the time IR reaches it the program is
//! well typed, so any of these indicates a bug in an earlier phase,
//! not in user code. The driver surfaces them as fatal diagnostics.

use thiserror::Error;

/// Error type for assembly emission
#[derive(Debug, Error)]
pub enum EmitError {
    /// An instruction the emitter cannot lower
    #[error("cannot emit {opcode} at {line}:{column}: {reason}")]
    Unsupported {
        opcode: &'static str,
        reason: String,
        line: u32,
        column: u32,
    },

    /// The per-function state machine was violated
    /// (e.g. FUNC_START while a function is open, PARAM after the
    /// prologue)
    #[error("malformed instruction stream at {line}:{column}: {reason}")]
    StateMachine {
        reason: String,
        line: u32,
        column: u32,
    },

    /// A string pool id with no entry
    #[error("string constant str{0} is not in the pool")]
    UnknownString(u32),

    /// Assembling/linking through the system toolchain failed
    #[error("{tool} failed: {message}")]
    Toolchain { tool: String, message: String },

    /// Writing the output file failed
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for emission operations
pub type Result<T> = std::result::Result<T, EmitError>;
