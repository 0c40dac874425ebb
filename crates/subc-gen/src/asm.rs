//! Assembly Code Generator.
//!
//! Converts an IR module into one AT&T-syntax text blob a system
//! assembler accepts as-is. The register discipline is deliberately
//! simple: every virtual register owns a spill slot in the frame, RAX
//! carries the current value, R10/R11 the second and third operands,
//! and XMM0/XMM1 float operands. Correctness over cleverness; there is
//! no global allocator.
//!
//! Emission per function is a four-state machine with strictly forward
//! transitions:
//!
//! ```text
//! FUNC_START -> Prologue --first non-PARAM--> Body --FUNC_END--> Done
//!                                              |
//!                              RETURN jumps to the epilogue label;
//!                              FUNC_END places it (Epilogue) and
//!                              closes the frame.
//! ```

use std::fmt::Write as _;

use subc_ir::{BinaryOp, Function, InstKind, LabelId, Module, Reg, Value};
use subc_sem::DataType;
use subc_util::Span;

use crate::abi::{SystemVAbi, Target};
use crate::error::{EmitError, Result};
use crate::frame::Frame;
use crate::runtime::{emit_helpers, UsedHelpers};

/// Per-function emission state (§ state machine above)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmitState {
    /// Between functions
    Done,
    /// FUNC_START seen; PARAM moves are legal
    Prologue,
    /// Ordinary instructions
    Body,
}

/// Emit a module for the host operating system
pub fn emit(module: &Module) -> Result<String> {
    AsmEmitter::new(module, Target::host()).emit()
}

/// Emit a module for an explicit target (tests use this)
pub fn emit_for_target(module: &Module, target: Target) -> Result<String> {
    AsmEmitter::new(module, target).emit()
}

/// The assembly emitter
pub struct AsmEmitter<'a> {
    module: &'a Module,
    target: Target,
    out: String,
    state: EmitState,
    /// Frame of the function being emitted
    frame: Frame,
    /// Undecorated name of the function being emitted
    current_fn: String,
    /// Counter for emitter-internal labels (bool print branches)
    aux_labels: u32,
    /// Which print format strings the module needs
    fmt_int: bool,
    fmt_float: bool,
    fmt_str: bool,
    fmt_bool: bool,
    helpers: UsedHelpers,
}

impl<'a> AsmEmitter<'a> {
    pub fn new(module: &'a Module, target: Target) -> Self {
        Self {
            module,
            target,
            out: String::new(),
            state: EmitState::Done,
            frame: Frame::default(),
            current_fn: String::new(),
            aux_labels: 0,
            fmt_int: false,
            fmt_float: false,
            fmt_str: false,
            fmt_bool: false,
            helpers: UsedHelpers::default(),
        }
    }

    /// Produce the complete assembly text
    pub fn emit(mut self) -> Result<String> {
        let module = self.module;
        self.scan_module();
        self.emit_rodata()?;

        self.line(self.target.text_directive());
        for function in &module.functions {
            self.emit_function(function)?;
        }

        let mut helper_text = String::new();
        emit_helpers(&mut helper_text, &self.helpers, self.target);
        self.out.push_str(&helper_text);

        Ok(self.out)
    }

    /// Pre-scan: which format strings and runtime helpers are
    /// referenced anywhere
    fn scan_module(&mut self) {
        let module = self.module;
        for function in &module.functions {
            for inst in &function.insts {
                match &inst.kind {
                    InstKind::Print { ty, .. } => match ty {
                        DataType::Int => self.fmt_int = true,
                        DataType::Float => self.fmt_float = true,
                        DataType::String => self.fmt_str = true,
                        DataType::Bool => self.fmt_bool = true,
                        _ => {}
                    },
                    InstKind::Call { callee, .. } => {
                        self.helpers.mark(callee.as_str());
                    }
                    _ => {}
                }
            }
        }
    }

    /// Read-only data: the string pool, then the format strings
    fn emit_rodata(&mut self) -> Result<()> {
        let any_fmt = self.fmt_int
            || self.fmt_float
            || self.fmt_str
            || self.fmt_bool
            || self.helpers.needs_cvt_int()
            || self.helpers.needs_cvt_float()
            || self.helpers.needs_bool_strings();
        if self.module.strings.is_empty() && !any_fmt {
            return Ok(());
        }

        self.line(self.target.rodata_directive());
        let entries: Vec<(String, String)> = self
            .module
            .strings
            .iter()
            .map(|(id, text)| (format!(".LS{}", id.0), escape_asm_string(text)))
            .collect();
        for (label, escaped) in entries {
            self.line(&format!("{}:", label));
            self.line(&format!("\t.string \"{}\"", escaped));
        }

        if self.fmt_int {
            self.string_entry(".LSfmt_int", "%ld\\n");
        }
        if self.fmt_float {
            self.string_entry(".LSfmt_float", "%.17g\\n");
        }
        if self.fmt_str {
            self.string_entry(".LSfmt_str", "%s\\n");
        }
        if self.fmt_bool {
            self.string_entry(".LSfmt_true", "true\\n");
            self.string_entry(".LSfmt_false", "false\\n");
        }
        if self.helpers.needs_cvt_int() {
            self.string_entry(".LSfmt_cvt_int", "%ld");
        }
        if self.helpers.needs_cvt_float() {
            self.string_entry(".LSfmt_cvt_float", "%g");
        }
        if self.helpers.needs_bool_strings() {
            self.string_entry(".LStrue", "true");
            self.string_entry(".LSfalse", "false");
        }
        Ok(())
    }

    fn string_entry(&mut self, label: &str, payload: &str) {
        self.line(&format!("{}:", label));
        self.line(&format!("\t.string \"{}\"", payload));
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn emit_function(&mut self, function: &Function) -> Result<()> {
        self.frame = Frame::layout(function);
        self.current_fn = function.name.as_str().to_string();

        for inst in &function.insts {
            self.emit_inst(&inst.kind, inst.span)?;
        }

        if self.state != EmitState::Done {
            return Err(EmitError::StateMachine {
                reason: format!("function `{}` has no FUNC_END", self.current_fn),
                line: 0,
                column: 0,
            });
        }
        Ok(())
    }

    fn emit_inst(&mut self, kind: &InstKind, span: Span) -> Result<()> {
        // State transitions first: FUNC_START opens, the first
        // non-PARAM instruction leaves the prologue
        match kind {
            InstKind::FuncStart { .. } => {
                if self.state != EmitState::Done {
                    return Err(self.state_error("FUNC_START inside an open function", span));
                }
            }
            InstKind::Param { .. } => {
                if self.state != EmitState::Prologue {
                    return Err(self.state_error("PARAM outside the prologue", span));
                }
            }
            InstKind::FuncEnd => {
                if self.state == EmitState::Done {
                    return Err(self.state_error("FUNC_END with no open function", span));
                }
            }
            _ => {
                if self.state == EmitState::Done {
                    return Err(self.state_error("instruction outside a function", span));
                }
                if self.state == EmitState::Prologue {
                    self.state = EmitState::Body;
                }
            }
        }

        match kind {
            InstKind::FuncStart { name } => {
                let sym = self.target.sym(name.as_str());
                self.line("");
                self.line(&format!(".globl {}", sym));
                self.line(&format!("{}:", sym));
                self.line("\tpushq %rbp");
                self.line("\tmovq %rsp, %rbp");
                let size = self.frame.size();
                if size > 0 {
                    self.line(&format!("\tsubq ${}, %rsp", size));
                }
                self.state = EmitState::Prologue;
            }
            InstKind::Param { index, local } => {
                let offset = self.frame.local_offset(*local);
                match SystemVAbi::arg_register(*index) {
                    Some(reg) => {
                        self.line(&format!("\tmovq {}, {}(%rbp)", reg, offset));
                    }
                    None => {
                        let caller_offset = SystemVAbi::stack_arg_offset(*index);
                        self.line(&format!("\tmovq {}(%rbp), %rax", caller_offset));
                        self.line(&format!("\tmovq %rax, {}(%rbp)", offset));
                    }
                }
            }
            InstKind::FuncEnd => {
                self.line(&format!("{}:", self.epilogue_label()));
                self.line("\tmovq %rbp, %rsp");
                self.line("\tpopq %rbp");
                self.line("\tret");
                self.state = EmitState::Done;
            }
            InstKind::Binary { op, dst, lhs, rhs } => self.emit_binary(*op, dst, lhs, rhs, span)?,
            InstKind::Not { dst, src } => {
                self.load_value(src, "%rax");
                self.line("\txorq $1, %rax");
                self.store_reg(dst);
            }
            InstKind::Load { dst, local } => {
                let offset = self.frame.local_offset(*local);
                self.line(&format!("\tmovq {}(%rbp), %rax", offset));
                self.store_reg(dst);
            }
            InstKind::Store { src, local } => {
                self.load_value(src, "%rax");
                let offset = self.frame.local_offset(*local);
                self.line(&format!("\tmovq %rax, {}(%rbp)", offset));
            }
            InstKind::Move { dst, src } => {
                self.load_value(src, "%rax");
                if dst.ty == DataType::Float && src.ty() == DataType::Int {
                    // Implicit widening lives in MOVE
                    self.line("\tcvtsi2sdq %rax, %xmm0");
                    self.line("\tmovq %xmm0, %rax");
                }
                self.store_reg(dst);
            }
            InstKind::ConstInt { dst, value } => {
                self.load_int(*value, "%rax");
                self.store_reg(dst);
            }
            InstKind::ConstFloat { dst, value } => {
                self.line(&format!(
                    "\tmovabsq ${}, %rax",
                    value.to_bits() as i64
                ));
                self.store_reg(dst);
            }
            InstKind::ConstString { dst, id } => {
                if self.module.strings.get(*id).is_none() {
                    return Err(EmitError::UnknownString(id.0));
                }
                self.line(&format!("\tleaq .LS{}(%rip), %rax", id.0));
                self.store_reg(dst);
            }
            InstKind::Alloc { dst, count } => {
                self.load_value(count, "%rdi");
                self.line("\tshlq $3, %rdi");
                self.line(&format!("\tcall {}", self.target.libc("malloc")));
                self.store_reg(dst);
            }
            InstKind::Label(label) => {
                self.line(&format!("{}:", self.label_name(*label)));
            }
            InstKind::Jump(label) => {
                self.line(&format!("\tjmp {}", self.label_name(*label)));
            }
            InstKind::JumpIf { cond, target } => {
                self.load_value(cond, "%rax");
                self.line("\ttestq %rax, %rax");
                self.line(&format!("\tjne {}", self.label_name(*target)));
            }
            InstKind::JumpIfNot { cond, target } => {
                self.load_value(cond, "%rax");
                self.line("\ttestq %rax, %rax");
                self.line(&format!("\tje {}", self.label_name(*target)));
            }
            InstKind::Call { dst, callee, args } => {
                self.emit_call(dst.as_ref(), callee.as_str(), args)?;
            }
            InstKind::Return { value } => {
                if let Some(value) = value {
                    self.load_value(value, "%rax");
                }
                self.line(&format!("\tjmp {}", self.epilogue_label()));
            }
            InstKind::Print { value, ty } => self.emit_print(value, ty, span)?,
            InstKind::LoadElem { dst, base, index } => {
                self.load_value(base, "%rax");
                self.load_value(index, SystemVAbi::SCRATCH);
                self.line("\tmovq (%rax,%r10,8), %rax");
                self.store_reg(dst);
            }
            InstKind::StoreElem { base, index, value } => {
                self.load_value(base, "%rax");
                self.load_value(index, SystemVAbi::SCRATCH);
                self.load_value(value, SystemVAbi::SCRATCH2);
                self.line("\tmovq %r11, (%rax,%r10,8)");
            }
        }
        Ok(())
    }

    // =========================================================================
    // Instruction groups
    // =========================================================================

    fn emit_binary(
        &mut self,
        op: BinaryOp,
        dst: &Reg,
        lhs: &Value,
        rhs: &Value,
        span: Span,
    ) -> Result<()> {
        let operand_ty = lhs.ty();

        // String comparison routes through strcmp
        if op.is_comparison() && operand_ty == DataType::String {
            self.load_value(lhs, "%rdi");
            self.load_value(rhs, "%rsi");
            self.line(&format!("\tcall {}", self.target.libc("strcmp")));
            self.line("\tcmpl $0, %eax");
            self.line(&format!("\t{} %al", signed_setcc(op)));
            self.line("\tmovzbq %al, %rax");
            self.store_reg(dst);
            return Ok(());
        }

        let float_op = if op.is_comparison() {
            operand_ty == DataType::Float
        } else {
            dst.ty == DataType::Float
        };

        if float_op {
            self.load_value(lhs, "%rax");
            self.load_value(rhs, SystemVAbi::SCRATCH);
            self.line("\tmovq %rax, %xmm0");
            self.line("\tmovq %r10, %xmm1");
            match op {
                BinaryOp::Add => self.line("\taddsd %xmm1, %xmm0"),
                BinaryOp::Sub => self.line("\tsubsd %xmm1, %xmm0"),
                BinaryOp::Mul => self.line("\tmulsd %xmm1, %xmm0"),
                BinaryOp::Div => self.line("\tdivsd %xmm1, %xmm0"),
                BinaryOp::Mod => {
                    // x87-free float modulo: fmod(xmm0, xmm1)
                    self.line(&format!("\tcall {}", self.target.libc("fmod")));
                }
                BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge => {
                    self.line("\tucomisd %xmm1, %xmm0");
                    self.line(&format!("\t{} %al", unsigned_setcc(op)));
                    self.line("\tmovzbq %al, %rax");
                    self.store_reg(dst);
                    return Ok(());
                }
                BinaryOp::And | BinaryOp::Or => {
                    return Err(EmitError::Unsupported {
                        opcode: op.mnemonic(),
                        reason: "logical opcode with float operands".into(),
                        line: span.line,
                        column: span.column,
                    });
                }
            }
            self.line("\tmovq %xmm0, %rax");
            self.store_reg(dst);
            return Ok(());
        }

        // Integer (and bool) path
        self.load_value(lhs, "%rax");
        self.load_value(rhs, SystemVAbi::SCRATCH);
        match op {
            BinaryOp::Add => self.line("\taddq %r10, %rax"),
            BinaryOp::Sub => self.line("\tsubq %r10, %rax"),
            BinaryOp::Mul => self.line("\timulq %r10, %rax"),
            BinaryOp::Div => {
                self.line("\tcqto");
                self.line("\tidivq %r10");
            }
            BinaryOp::Mod => {
                self.line("\tcqto");
                self.line("\tidivq %r10");
                self.line("\tmovq %rdx, %rax");
            }
            BinaryOp::And => self.line("\tandq %r10, %rax"),
            BinaryOp::Or => self.line("\torq %r10, %rax"),
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => {
                self.line("\tcmpq %r10, %rax");
                self.line(&format!("\t{} %al", signed_setcc(op)));
                self.line("\tmovzbq %al, %rax");
            }
        }
        self.store_reg(dst);
        Ok(())
    }

    fn emit_call(&mut self, dst: Option<&Reg>, callee: &str, args: &[Value]) -> Result<()> {
        let register_args = args.len().min(SystemVAbi::ARG_REGS.len());
        let stack_args = args.len() - register_args;

        // Stack arguments go first (pushed in reverse), padded to keep
        // 16-byte alignment at the call
        let padding = if stack_args % 2 == 1 { 8 } else { 0 };
        if padding > 0 {
            self.line(&format!("\tsubq ${}, %rsp", padding));
        }
        for value in args[register_args..].iter().rev() {
            self.load_value(value, "%rax");
            self.line("\tpushq %rax");
        }

        for (index, value) in args[..register_args].iter().enumerate() {
            let reg = SystemVAbi::ARG_REGS[index];
            self.load_value(value, reg);
        }

        // Runtime helpers and user functions are local symbols
        self.line(&format!("\tcall {}", self.target.sym(callee)));

        let cleanup = 8 * stack_args as u32 + padding;
        if cleanup > 0 {
            self.line(&format!("\taddq ${}, %rsp", cleanup));
        }
        if let Some(dst) = dst {
            self.store_reg(dst);
        }
        Ok(())
    }

    fn emit_print(&mut self, value: &Value, ty: &DataType, span: Span) -> Result<()> {
        match ty {
            DataType::Int => {
                self.load_value(value, "%rsi");
                self.line("\tleaq .LSfmt_int(%rip), %rdi");
                self.line("\txorl %eax, %eax");
                self.line(&format!("\tcall {}", self.target.libc("printf")));
            }
            DataType::Float => {
                self.load_value(value, "%rax");
                self.line("\tmovq %rax, %xmm0");
                self.line("\tleaq .LSfmt_float(%rip), %rdi");
                self.line("\tmovl $1, %eax");
                self.line(&format!("\tcall {}", self.target.libc("printf")));
            }
            DataType::String => {
                self.load_value(value, "%rsi");
                self.line("\tleaq .LSfmt_str(%rip), %rdi");
                self.line("\txorl %eax, %eax");
                self.line(&format!("\tcall {}", self.target.libc("printf")));
            }
            DataType::Bool => {
                let false_label = self.aux_label("bf");
                let join_label = self.aux_label("bj");
                self.load_value(value, "%rax");
                self.line("\ttestq %rax, %rax");
                self.line(&format!("\tje {}", false_label));
                self.line("\tleaq .LSfmt_true(%rip), %rdi");
                self.line(&format!("\tjmp {}", join_label));
                self.line(&format!("{}:", false_label));
                self.line("\tleaq .LSfmt_false(%rip), %rdi");
                self.line(&format!("{}:", join_label));
                self.line("\txorl %eax, %eax");
                self.line(&format!("\tcall {}", self.target.libc("printf")));
            }
            other => {
                return Err(EmitError::Unsupported {
                    opcode: "PRINT",
                    reason: format!("no format string for type {}", other),
                    line: span.line,
                    column: span.column,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Value plumbing
    // =========================================================================

    /// Materialize an operand into a physical register
    fn load_value(&mut self, value: &Value, reg: &str) {
        match value {
            Value::Int(v) => self.load_int(*v, reg),
            Value::Float(v) => {
                self.line(&format!("\tmovabsq ${}, {}", v.to_bits() as i64, reg));
            }
            Value::Str(id) => {
                self.line(&format!("\tleaq .LS{}(%rip), {}", id.0, reg));
            }
            Value::Reg(src) => {
                let offset = self.frame.reg_offset(src.id.0);
                self.line(&format!("\tmovq {}(%rbp), {}", offset, reg));
            }
        }
    }

    fn load_int(&mut self, value: i64, reg: &str) {
        if i32::try_from(value).is_ok() {
            self.line(&format!("\tmovq ${}, {}", value, reg));
        } else {
            self.line(&format!("\tmovabsq ${}, {}", value, reg));
        }
    }

    /// Spill RAX into a virtual register's slot
    fn store_reg(&mut self, dst: &Reg) {
        let offset = self.frame.reg_offset(dst.id.0);
        self.line(&format!("\tmovq %rax, {}(%rbp)", offset));
    }

    fn label_name(&self, label: LabelId) -> String {
        format!(".L{}_{}", self.current_fn, label)
    }

    fn epilogue_label(&self) -> String {
        format!(".L{}_ret", self.current_fn)
    }

    fn aux_label(&mut self, stem: &str) -> String {
        let label = format!(".L{}{}", stem, self.aux_labels);
        self.aux_labels += 1;
        label
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", text);
    }

    fn state_error(&self, reason: &str, span: Span) -> EmitError {
        EmitError::StateMachine {
            reason: reason.to_string(),
            line: span.line,
            column: span.column,
        }
    }
}

/// setcc mnemonic for signed integer comparisons
fn signed_setcc(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "sete",
        BinaryOp::Ne => "setne",
        BinaryOp::Lt => "setl",
        BinaryOp::Le => "setle",
        BinaryOp::Gt => "setg",
        BinaryOp::Ge => "setge",
        _ => unreachable!("not a comparison"),
    }
}

/// setcc mnemonic after `ucomisd` (unsigned flags)
fn unsigned_setcc(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "sete",
        BinaryOp::Ne => "setne",
        BinaryOp::Lt => "setb",
        BinaryOp::Le => "setbe",
        BinaryOp::Gt => "seta",
        BinaryOp::Ge => "setae",
        _ => unreachable!("not a comparison"),
    }
}

/// Escape a string literal for a `.string` directive
fn escape_asm_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'\\' => escaped.push_str("\\\\"),
            b'"' => escaped.push_str("\\\""),
            b'\n' => escaped.push_str("\\n"),
            b'\t' => escaped.push_str("\\t"),
            b'\r' => escaped.push_str("\\r"),
            0x20..=0x7e => escaped.push(byte as char),
            other => {
                let _ = write!(escaped, "\\{:03o}", other);
            }
        }
    }
    escaped
}
