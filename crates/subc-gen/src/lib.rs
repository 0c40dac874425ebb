//! subc-gen - x86-64 Assembly Emission
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The final phase: an IR module in, one AT&T-syntax assembly text
//! blob out. The output assembles with the stock system assembler and
//! links against libc, so `cc file.s -lm` yields a working executable.
//!
//! Layout of the emitted file:
//!
//! 1. Read-only data - the string pool (`.LS<id>` labels), the printf
//!    format strings, and the static texts the runtime shim needs.
//! 2. `.text` - one routine per IR function: System V prologue,
//!    straight-line instruction selection, a single epilogue label
//!    every RETURN jumps to.
//! 3. The runtime shim - `sb_concat` and friends, emitted only when
//!    some instruction references them.
//!
//! ============================================================================
//! REGISTER DISCIPLINE
//! ============================================================================
//!
//! No allocator. Every virtual register owns an 8-byte spill slot
//! after the locals; each instruction loads its operands (RAX and R10,
//! or XMM0/XMM1 for floats), computes, and spills the result. Slow and
//! entirely predictable, which is the point at this stage.
//!
//! All values are 8 bytes: ints and bools as themselves, strings and
//! arrays as pointers, floats as IEEE-754 bit patterns (moved between
//! GPRs and XMM registers at use sites). Function results travel in
//! RAX as bit patterns under the same convention.

pub mod abi;
mod asm;
pub mod error;
mod frame;
pub mod linker;
pub mod runtime;

pub use abi::{SystemVAbi, Target};
pub use asm::{emit, emit_for_target, AsmEmitter};
pub use error::{EmitError, Result};
pub use linker::{assemble_and_link, have_cc};
