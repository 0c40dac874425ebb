//! System V AMD64 calling convention and target naming.

/// Host targets the emitter can generate text for
///
/// The difference is symbol decoration (`_main` vs `main`), the
/// read-only data section directive, and whether libc calls go through
/// an explicit PLT suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// ELF (Linux, BSD)
    Linux,
    /// Mach-O
    MacOs,
}

impl Target {
    /// The target of the machine we are generating on
    pub fn host() -> Target {
        if cfg!(target_os = "macos") {
            Target::MacOs
        } else {
            Target::Linux
        }
    }

    /// Decorate a symbol for this target
    pub fn sym(&self, name: &str) -> String {
        match self {
            Target::Linux => name.to_string(),
            Target::MacOs => format!("_{}", name),
        }
    }

    /// Reference to an external libc function in call position
    ///
    /// Position-independent ELF output needs the explicit `@PLT`
    /// suffix; Mach-O resolves through stubs without one.
    pub fn libc(&self, name: &str) -> String {
        match self {
            Target::Linux => format!("{}@PLT", name),
            Target::MacOs => format!("_{}", name),
        }
    }

    /// Directive opening the read-only data section
    pub fn rodata_directive(&self) -> &'static str {
        match self {
            Target::Linux => ".section .rodata",
            Target::MacOs => ".section __TEXT,__cstring,cstring_literals",
        }
    }

    /// Directive opening the code section
    pub fn text_directive(&self) -> &'static str {
        ".text"
    }
}

/// System V AMD64 ABI register assignments
pub struct SystemVAbi;

impl SystemVAbi {
    /// Integer/pointer argument registers in order
    pub const ARG_REGS: [&'static str; 6] = ["%rdi", "%rsi", "%rdx", "%rcx", "%r8", "%r9"];

    /// Return register for integer/pointer values
    pub const RET_REG: &'static str = "%rax";

    /// Scratch registers for the second and third operands
    ///
    /// Caller-saved and never used across calls, so nothing needs
    /// preserving.
    pub const SCRATCH: &'static str = "%r10";
    pub const SCRATCH2: &'static str = "%r11";

    /// The register an argument index maps to, when in registers
    pub fn arg_register(index: usize) -> Option<&'static str> {
        Self::ARG_REGS.get(index).copied()
    }

    /// True when an argument travels on the stack
    pub fn is_stack_arg(index: usize) -> bool {
        index >= Self::ARG_REGS.len()
    }

    /// Offset from RBP of a stack argument in the caller's frame
    /// (return address and saved RBP sit below it)
    pub fn stack_arg_offset(index: usize) -> i32 {
        16 + 8 * (index - Self::ARG_REGS.len()) as i32
    }
}
