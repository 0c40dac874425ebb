//! subc-ir - Three-Address Intermediate Representation
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The IR sits between the typed HIR and the x86-64 emitter: a linear
//! sequence of three-address instructions with explicit control-flow
//! labels, one stream per function. It is deliberately low on
//! abstraction:
//!
//! - Values live in typed virtual registers (`r0, r1, ...`) numbered
//!   by a single monotonic counter per module, so ids are unique
//!   within every function.
//! - Named variables live in numbered local slots; reads and writes go
//!   through explicit LOAD/STORE.
//! - Control flow is LABEL/JUMP/JUMP_IF/JUMP_IF_NOT; structured
//!   constructs are already lowered (short-circuit `&&`/`||` included).
//! - Every function stream is bracketed by FUNC_START/FUNC_END, and
//!   every path from start to end passes a RETURN; `main` gets an
//!   implicit `return 0` when the source omits one.
//!
//! The module-wide string pool maps each distinct literal to a stable
//! id. It is created here and handed to the emitter; no other phase
//! sees it.
//!
//! ============================================================================
//! OPTIMIZATION
//! ============================================================================
//!
//! One pass exists: [`opt::fold_constants`], a linear constant folder
//! the driver runs at `-O1` and above. Every level produces the same
//! observable behavior; folding only shortens the instruction stream.

pub mod builder;
mod display;
pub mod ir;
pub mod opt;

pub use builder::{lower, runtime};
pub use ir::{
    BinaryOp, Function, Inst, InstKind, LabelId, Module, Reg, RegId, StrId, StringPool, Value,
};
