//! The emitted runtime shim.
//!
//! A handful of assembly helpers backing string operations. Each is
//! emitted at most once per module, and only when some instruction
//! actually calls it. They follow the System V convention and lean on
//! libc (`malloc`, `strlen`, `strcpy`, `strcat`, `sprintf`) for the
//! heavy lifting.

use std::fmt::Write;

use crate::abi::Target;

/// Which helpers the module references
#[derive(Debug, Default, Clone, Copy)]
pub struct UsedHelpers {
    pub concat: bool,
    pub itoa: bool,
    pub ftoa: bool,
    pub btoa: bool,
    pub strindex: bool,
}

impl UsedHelpers {
    pub fn any(&self) -> bool {
        self.concat || self.itoa || self.ftoa || self.btoa || self.strindex
    }

    /// Conversion format strings the helper bodies need
    pub fn needs_cvt_int(&self) -> bool {
        self.itoa
    }

    pub fn needs_cvt_float(&self) -> bool {
        self.ftoa
    }

    pub fn needs_bool_strings(&self) -> bool {
        self.btoa
    }

    /// Mark a helper by name; returns false for unknown names
    pub fn mark(&mut self, name: &str) -> bool {
        match name {
            subc_ir::runtime::CONCAT => self.concat = true,
            subc_ir::runtime::ITOA => self.itoa = true,
            subc_ir::runtime::FTOA => self.ftoa = true,
            subc_ir::runtime::BTOA => self.btoa = true,
            subc_ir::runtime::STRINDEX => self.strindex = true,
            _ => return false,
        }
        true
    }
}

/// Append the bodies of every referenced helper
pub fn emit_helpers(out: &mut String, used: &UsedHelpers, target: Target) {
    if used.concat {
        emit_concat(out, target);
    }
    if used.itoa {
        emit_itoa(out, target);
    }
    if used.ftoa {
        emit_ftoa(out, target);
    }
    if used.btoa {
        emit_btoa(out, target);
    }
    if used.strindex {
        emit_strindex(out, target);
    }
}

/// `sb_concat(a, b)`: malloc(strlen(a) + strlen(b) + 1), copy a, cat b
fn emit_concat(out: &mut String, target: Target) {
    let name = target.sym(subc_ir::runtime::CONCAT);
    let _ = write!(
        out,
        "\n{name}:\n\
         \tpushq %rbp\n\
         \tmovq %rsp, %rbp\n\
         \tpushq %rbx\n\
         \tpushq %r12\n\
         \tpushq %r13\n\
         \tsubq $8, %rsp\n\
         \tmovq %rdi, %rbx\n\
         \tmovq %rsi, %r12\n\
         \tcall {strlen}\n\
         \tmovq %rax, %r13\n\
         \tmovq %r12, %rdi\n\
         \tcall {strlen}\n\
         \tleaq 1(%r13,%rax), %rdi\n\
         \tcall {malloc}\n\
         \tmovq %rax, %r13\n\
         \tmovq %rax, %rdi\n\
         \tmovq %rbx, %rsi\n\
         \tcall {strcpy}\n\
         \tmovq %r13, %rdi\n\
         \tmovq %r12, %rsi\n\
         \tcall {strcat}\n\
         \tmovq %r13, %rax\n\
         \taddq $8, %rsp\n\
         \tpopq %r13\n\
         \tpopq %r12\n\
         \tpopq %rbx\n\
         \tpopq %rbp\n\
         \tret\n",
        name = name,
        strlen = target.libc("strlen"),
        malloc = target.libc("malloc"),
        strcpy = target.libc("strcpy"),
        strcat = target.libc("strcat"),
    );
}

/// `sb_itoa(n)`: sprintf the integer into a fresh 32-byte buffer
fn emit_itoa(out: &mut String, target: Target) {
    let name = target.sym(subc_ir::runtime::ITOA);
    let _ = write!(
        out,
        "\n{name}:\n\
         \tpushq %rbp\n\
         \tmovq %rsp, %rbp\n\
         \tpushq %rbx\n\
         \tsubq $8, %rsp\n\
         \tmovq %rdi, %rbx\n\
         \tmovl $32, %edi\n\
         \tcall {malloc}\n\
         \tmovq %rbx, %rdx\n\
         \tmovq %rax, %rbx\n\
         \tmovq %rax, %rdi\n\
         \tleaq .LSfmt_cvt_int(%rip), %rsi\n\
         \txorl %eax, %eax\n\
         \tcall {sprintf}\n\
         \tmovq %rbx, %rax\n\
         \taddq $8, %rsp\n\
         \tpopq %rbx\n\
         \tpopq %rbp\n\
         \tret\n",
        name = name,
        malloc = target.libc("malloc"),
        sprintf = target.libc("sprintf"),
    );
}

/// `sb_ftoa(bits)`: the float arrives as its bit pattern in RDI
fn emit_ftoa(out: &mut String, target: Target) {
    let name = target.sym(subc_ir::runtime::FTOA);
    let _ = write!(
        out,
        "\n{name}:\n\
         \tpushq %rbp\n\
         \tmovq %rsp, %rbp\n\
         \tpushq %rbx\n\
         \tsubq $8, %rsp\n\
         \tmovq %rdi, %rbx\n\
         \tmovl $40, %edi\n\
         \tcall {malloc}\n\
         \tmovq %rbx, %xmm0\n\
         \tmovq %rax, %rbx\n\
         \tmovq %rax, %rdi\n\
         \tleaq .LSfmt_cvt_float(%rip), %rsi\n\
         \tmovl $1, %eax\n\
         \tcall {sprintf}\n\
         \tmovq %rbx, %rax\n\
         \taddq $8, %rsp\n\
         \tpopq %rbx\n\
         \tpopq %rbp\n\
         \tret\n",
        name = name,
        malloc = target.libc("malloc"),
        sprintf = target.libc("sprintf"),
    );
}

/// `sb_btoa(b)`: pointer to the static "true"/"false" text
fn emit_btoa(out: &mut String, target: Target) {
    let name = target.sym(subc_ir::runtime::BTOA);
    let _ = write!(
        out,
        "\n{name}:\n\
         \ttestq %rdi, %rdi\n\
         \tleaq .LStrue(%rip), %rax\n\
         \tleaq .LSfalse(%rip), %rcx\n\
         \tcmoveq %rcx, %rax\n\
         \tret\n",
        name = name,
    );
}

/// `sb_strindex(s, i)`: malloc(2) one-character string
fn emit_strindex(out: &mut String, target: Target) {
    let name = target.sym(subc_ir::runtime::STRINDEX);
    let _ = write!(
        out,
        "\n{name}:\n\
         \tpushq %rbp\n\
         \tmovq %rsp, %rbp\n\
         \tpushq %rbx\n\
         \tsubq $8, %rsp\n\
         \tmovzbq (%rdi,%rsi), %rbx\n\
         \tmovl $2, %edi\n\
         \tcall {malloc}\n\
         \tmovb %bl, (%rax)\n\
         \tmovb $0, 1(%rax)\n\
         \taddq $8, %rsp\n\
         \tpopq %rbx\n\
         \tpopq %rbp\n\
         \tret\n",
        name = name,
        malloc = target.libc("malloc"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_known_helpers() {
        let mut used = UsedHelpers::default();
        assert!(used.mark("sb_concat"));
        assert!(used.mark("sb_itoa"));
        assert!(!used.mark("printf"));
        assert!(used.concat);
        assert!(used.itoa);
        assert!(!used.ftoa);
        assert!(used.any());
    }

    #[test]
    fn test_only_referenced_helpers_emitted() {
        let mut out = String::new();
        let used = UsedHelpers {
            concat: true,
            ..Default::default()
        };
        emit_helpers(&mut out, &used, Target::Linux);
        assert!(out.contains("sb_concat:"));
        assert!(!out.contains("sb_itoa:"));
        assert!(!out.contains("sb_strindex:"));
    }

    #[test]
    fn test_helper_uses_plt_on_linux() {
        let mut out = String::new();
        let used = UsedHelpers {
            itoa: true,
            ..Default::default()
        };
        emit_helpers(&mut out, &used, Target::Linux);
        assert!(out.contains("call malloc@PLT"));
        assert!(out.contains("call sprintf@PLT"));
    }
}
