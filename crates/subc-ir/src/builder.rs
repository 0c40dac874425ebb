//! HIR to IR lowering.
//!
//! The builder walks the typed HIR and emits a linear instruction
//! stream per function. It owns the module-wide register and label
//! counters and the string pool. By the time lowering runs the tree is
//! well typed; any construct the builder cannot lower indicates a bug
//! in an earlier phase and is reported as a fatal diagnostic, stopping
//! immediately (unlike the front-end phases, which accumulate).

use subc_par::ast::{BinOp, UnOp};
use subc_sem::hir;
use subc_sem::DataType;
use subc_util::{DiagnosticBuilder, Handler, Span, Symbol};

use crate::ir::{
    BinaryOp, Function, Inst, InstKind, LabelId, Module, Reg, RegId, StringPool, Value,
};

/// Runtime helper names the builder emits calls to
pub mod runtime {
    /// `sb_concat(a, b)` - concatenate two strings into fresh heap
    pub const CONCAT: &str = "sb_concat";
    /// `sb_itoa(n)` - int to freshly allocated decimal string
    pub const ITOA: &str = "sb_itoa";
    /// `sb_ftoa(bits)` - float (as bit pattern) to string
    pub const FTOA: &str = "sb_ftoa";
    /// `sb_btoa(b)` - bool to the static "true"/"false" strings
    pub const BTOA: &str = "sb_btoa";
    /// `sb_strindex(s, i)` - one-character string at byte i
    pub const STRINDEX: &str = "sb_strindex";
}

/// Lower a typed program into an IR module
///
/// Returns `None` when an internal inconsistency was found (a fatal
/// diagnostic has been emitted in that case).
pub fn lower(program: &hir::Program, handler: &Handler) -> Option<Module> {
    let mut builder = IrBuilder::new(handler);
    for function in &program.functions {
        builder.lower_function(function);
        if builder.failed {
            return None;
        }
    }
    Some(Module {
        functions: builder.functions,
        strings: builder.strings,
        entry: subc_util::kw::MAIN,
    })
}

/// The lowering pass
struct IrBuilder<'a> {
    handler: &'a Handler,
    functions: Vec<Function>,
    strings: StringPool,
    /// Module-wide monotonic counters
    next_reg: u32,
    next_label: u32,
    /// Instruction stream of the function in progress
    insts: Vec<Inst>,
    /// (continue target, break target) per open loop
    loop_stack: Vec<(LabelId, LabelId)>,
    /// Return type of the function in progress
    current_ret: DataType,
    /// True while lowering the entry function
    in_main: bool,
    failed: bool,
}

impl<'a> IrBuilder<'a> {
    fn new(handler: &'a Handler) -> Self {
        Self {
            handler,
            functions: Vec::new(),
            strings: StringPool::new(),
            next_reg: 0,
            next_label: 0,
            insts: Vec::new(),
            loop_stack: Vec::new(),
            current_ret: DataType::Void,
            in_main: false,
            failed: false,
        }
    }

    fn lower_function(&mut self, function: &hir::Function) {
        self.insts = Vec::new();
        self.loop_stack.clear();
        self.current_ret = function.ret_ty.clone();
        self.in_main = function.name == subc_util::kw::MAIN;
        let first_reg = self.next_reg;

        self.emit(
            InstKind::FuncStart {
                name: function.name,
            },
            function.span,
        );
        for (index, param) in function.params.iter().enumerate() {
            self.emit(
                InstKind::Param {
                    index,
                    local: param.local.0,
                },
                param.span,
            );
        }

        for stmt in &function.body {
            self.lower_stmt(stmt);
        }
        self.ensure_return(function);
        self.emit(InstKind::FuncEnd, function.span);

        self.functions.push(Function {
            name: function.name,
            ret_ty: function.ret_ty.clone(),
            params: function
                .params
                .iter()
                .map(|p| (p.name, p.ty.clone()))
                .collect(),
            insts: std::mem::take(&mut self.insts),
            reg_count: self.next_reg - first_reg,
            local_count: function.local_count,
        });
    }

    /// Append an implicit return when control can fall off the end:
    /// `return 0` in `main`, a default value elsewhere
    fn ensure_return(&mut self, function: &hir::Function) {
        if matches!(
            self.insts.last().map(|inst| &inst.kind),
            Some(InstKind::Return { .. })
        ) {
            return;
        }
        let value = match function.ret_ty {
            // main always hands the C runtime an exit code
            DataType::Void if self.in_main => Some(Value::Int(0)),
            DataType::Void => None,
            DataType::Float => Some(Value::Float(0.0)),
            // Int, bool, and the pointer-shaped types default to zero
            _ => Some(Value::Int(0)),
        };
        self.emit(InstKind::Return { value }, function.span);
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn lower_stmt(&mut self, stmt: &hir::Stmt) {
        match stmt {
            hir::Stmt::Local {
                local, ty, init, span,
            } => {
                let value = match init {
                    Some(init) => self.lower_expr(init),
                    None => self.default_value(ty, *span),
                };
                self.emit(
                    InstKind::Store {
                        src: value,
                        local: local.0,
                    },
                    *span,
                );
            }
            hir::Stmt::If {
                cond,
                then_body,
                else_body,
                span,
            } => {
                let else_label = self.fresh_label();
                let end_label = self.fresh_label();

                let cond = self.lower_expr(cond);
                self.emit(
                    InstKind::JumpIfNot {
                        cond,
                        target: else_label,
                    },
                    *span,
                );
                for stmt in then_body {
                    self.lower_stmt(stmt);
                }
                self.emit(InstKind::Jump(end_label), *span);
                self.emit(InstKind::Label(else_label), *span);
                for stmt in else_body {
                    self.lower_stmt(stmt);
                }
                self.emit(InstKind::Label(end_label), *span);
            }
            hir::Stmt::While { cond, body, span } => {
                let head_label = self.fresh_label();
                let end_label = self.fresh_label();

                self.emit_commented(InstKind::Label(head_label), *span, "while head");
                let cond = self.lower_expr(cond);
                self.emit(
                    InstKind::JumpIfNot {
                        cond,
                        target: end_label,
                    },
                    *span,
                );
                self.loop_stack.push((head_label, end_label));
                for stmt in body {
                    self.lower_stmt(stmt);
                }
                self.loop_stack.pop();
                self.emit(InstKind::Jump(head_label), *span);
                self.emit(InstKind::Label(end_label), *span);
            }
            hir::Stmt::DoWhile { body, cond, span } => {
                let head_label = self.fresh_label();
                let cond_label = self.fresh_label();
                let end_label = self.fresh_label();

                self.emit_commented(InstKind::Label(head_label), *span, "do-while body");
                self.loop_stack.push((cond_label, end_label));
                for stmt in body {
                    self.lower_stmt(stmt);
                }
                self.loop_stack.pop();
                self.emit(InstKind::Label(cond_label), *span);
                let cond = self.lower_expr(cond);
                self.emit(
                    InstKind::JumpIf {
                        cond,
                        target: head_label,
                    },
                    *span,
                );
                self.emit(InstKind::Label(end_label), *span);
            }
            hir::Stmt::ForRange {
                var,
                start,
                end,
                body,
                span,
            } => {
                let head_label = self.fresh_label();
                let step_label = self.fresh_label();
                let end_label = self.fresh_label();

                let start = self.lower_expr(start);
                self.emit(
                    InstKind::Store {
                        src: start,
                        local: var.0,
                    },
                    *span,
                );
                let bound = self.lower_expr(end);

                self.emit_commented(InstKind::Label(head_label), *span, "for-range head");
                let current = self.fresh_reg(DataType::Int);
                self.emit(
                    InstKind::Load {
                        dst: current.clone(),
                        local: var.0,
                    },
                    *span,
                );
                let flag = self.fresh_reg(DataType::Bool);
                self.emit(
                    InstKind::Binary {
                        op: BinaryOp::Lt,
                        dst: flag.clone(),
                        lhs: Value::Reg(current),
                        rhs: bound,
                    },
                    *span,
                );
                self.emit(
                    InstKind::JumpIfNot {
                        cond: Value::Reg(flag),
                        target: end_label,
                    },
                    *span,
                );

                self.loop_stack.push((step_label, end_label));
                for stmt in body {
                    self.lower_stmt(stmt);
                }
                self.loop_stack.pop();

                self.emit_commented(InstKind::Label(step_label), *span, "for-range step");
                let current = self.fresh_reg(DataType::Int);
                self.emit(
                    InstKind::Load {
                        dst: current.clone(),
                        local: var.0,
                    },
                    *span,
                );
                let next = self.fresh_reg(DataType::Int);
                self.emit(
                    InstKind::Binary {
                        op: BinaryOp::Add,
                        dst: next.clone(),
                        lhs: Value::Reg(current),
                        rhs: Value::Int(1),
                    },
                    *span,
                );
                self.emit(
                    InstKind::Store {
                        src: Value::Reg(next),
                        local: var.0,
                    },
                    *span,
                );
                self.emit(InstKind::Jump(head_label), *span);
                self.emit(InstKind::Label(end_label), *span);
            }
            hir::Stmt::ForArray {
                var,
                elem_ty,
                array,
                len,
                body,
                span,
            } => {
                let head_label = self.fresh_label();
                let step_label = self.fresh_label();
                let end_label = self.fresh_label();

                let base = self.lower_expr(array);
                let index = self.fresh_reg(DataType::Int);
                self.emit(
                    InstKind::ConstInt {
                        dst: index.clone(),
                        value: 0,
                    },
                    *span,
                );

                self.emit_commented(InstKind::Label(head_label), *span, "for-array head");
                let flag = self.fresh_reg(DataType::Bool);
                self.emit(
                    InstKind::Binary {
                        op: BinaryOp::Lt,
                        dst: flag.clone(),
                        lhs: Value::Reg(index.clone()),
                        rhs: Value::Int(*len as i64),
                    },
                    *span,
                );
                self.emit(
                    InstKind::JumpIfNot {
                        cond: Value::Reg(flag),
                        target: end_label,
                    },
                    *span,
                );

                let element = self.fresh_reg(elem_ty.clone());
                self.emit(
                    InstKind::LoadElem {
                        dst: element.clone(),
                        base: base.clone(),
                        index: Value::Reg(index.clone()),
                    },
                    *span,
                );
                self.emit(
                    InstKind::Store {
                        src: Value::Reg(element),
                        local: var.0,
                    },
                    *span,
                );

                self.loop_stack.push((step_label, end_label));
                for stmt in body {
                    self.lower_stmt(stmt);
                }
                self.loop_stack.pop();

                self.emit_commented(InstKind::Label(step_label), *span, "for-array step");
                self.emit(
                    InstKind::Binary {
                        op: BinaryOp::Add,
                        dst: index.clone(),
                        lhs: Value::Reg(index.clone()),
                        rhs: Value::Int(1),
                    },
                    *span,
                );
                self.emit(InstKind::Jump(head_label), *span);
                self.emit(InstKind::Label(end_label), *span);
            }
            hir::Stmt::Return { value, span } => {
                let value = value.as_ref().map(|value| self.lower_expr(value));
                // A bare `return` in main still produces exit code 0
                let value = match value {
                    None if self.in_main || self.current_ret == DataType::Int => {
                        Some(Value::Int(0))
                    }
                    other => other,
                };
                self.emit(InstKind::Return { value }, *span);
            }
            hir::Stmt::Break(span) => match self.loop_stack.last() {
                Some((_, break_label)) => {
                    let target = *break_label;
                    self.emit(InstKind::Jump(target), *span);
                }
                None => self.internal_error("`break` escaped semantic analysis", *span),
            },
            hir::Stmt::Continue(span) => match self.loop_stack.last() {
                Some((continue_label, _)) => {
                    let target = *continue_label;
                    self.emit(InstKind::Jump(target), *span);
                }
                None => self.internal_error("`continue` escaped semantic analysis", *span),
            },
            hir::Stmt::Block(body) => {
                for stmt in body {
                    self.lower_stmt(stmt);
                }
            }
            hir::Stmt::Expr(expr) => {
                self.lower_expr(expr);
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Lower an expression, returning the value holding its result
    fn lower_expr(&mut self, expr: &hir::Expr) -> Value {
        let span = expr.span;
        match &expr.kind {
            hir::ExprKind::Int(value) => {
                let dst = self.fresh_reg(DataType::Int);
                self.emit(
                    InstKind::ConstInt {
                        dst: dst.clone(),
                        value: *value,
                    },
                    span,
                );
                Value::Reg(dst)
            }
            hir::ExprKind::Float(value) => {
                let dst = self.fresh_reg(DataType::Float);
                self.emit(
                    InstKind::ConstFloat {
                        dst: dst.clone(),
                        value: *value,
                    },
                    span,
                );
                Value::Reg(dst)
            }
            hir::ExprKind::Str(text) => {
                let id = self.strings.intern(text.as_str());
                let dst = self.fresh_reg(DataType::String);
                self.emit(InstKind::ConstString { dst: dst.clone(), id }, span);
                Value::Reg(dst)
            }
            hir::ExprKind::Bool(value) => {
                let dst = self.fresh_reg(DataType::Bool);
                self.emit(
                    InstKind::ConstInt {
                        dst: dst.clone(),
                        value: *value as i64,
                    },
                    span,
                );
                Value::Reg(dst)
            }
            hir::ExprKind::Null => {
                // Null pointer of the coerced type
                let dst = self.fresh_reg(expr.ty.clone());
                self.emit(InstKind::ConstInt { dst: dst.clone(), value: 0 }, span);
                Value::Reg(dst)
            }
            hir::ExprKind::Local(local) => {
                let dst = self.fresh_reg(expr.ty.clone());
                self.emit(
                    InstKind::Load {
                        dst: dst.clone(),
                        local: local.0,
                    },
                    span,
                );
                Value::Reg(dst)
            }
            hir::ExprKind::Array(elements) => self.lower_array_literal(elements, span),
            hir::ExprKind::Binary { op, lhs, rhs } => {
                self.lower_binary(*op, lhs, rhs, &expr.ty, span)
            }
            hir::ExprKind::Unary { op, operand } => match op {
                UnOp::Neg => {
                    // No NEG opcode: negate as `0 - x`
                    let zero = match expr.ty {
                        DataType::Float => {
                            let reg = self.fresh_reg(DataType::Float);
                            self.emit(
                                InstKind::ConstFloat {
                                    dst: reg.clone(),
                                    value: 0.0,
                                },
                                span,
                            );
                            Value::Reg(reg)
                        }
                        _ => {
                            let reg = self.fresh_reg(DataType::Int);
                            self.emit(
                                InstKind::ConstInt {
                                    dst: reg.clone(),
                                    value: 0,
                                },
                                span,
                            );
                            Value::Reg(reg)
                        }
                    };
                    let operand = self.lower_expr(operand);
                    let dst = self.fresh_reg(expr.ty.clone());
                    self.emit(
                        InstKind::Binary {
                            op: BinaryOp::Sub,
                            dst: dst.clone(),
                            lhs: zero,
                            rhs: operand,
                        },
                        span,
                    );
                    Value::Reg(dst)
                }
                UnOp::Not => {
                    let operand = self.lower_expr(operand);
                    let dst = self.fresh_reg(DataType::Bool);
                    self.emit(
                        InstKind::Not {
                            dst: dst.clone(),
                            src: operand,
                        },
                        span,
                    );
                    Value::Reg(dst)
                }
            },
            hir::ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let else_label = self.fresh_label();
                let end_label = self.fresh_label();
                let result = self.fresh_reg(expr.ty.clone());

                let cond = self.lower_expr(cond);
                self.emit(
                    InstKind::JumpIfNot {
                        cond,
                        target: else_label,
                    },
                    span,
                );
                let then_value = self.lower_expr(then_expr);
                self.emit(
                    InstKind::Move {
                        dst: result.clone(),
                        src: then_value,
                    },
                    span,
                );
                self.emit(InstKind::Jump(end_label), span);
                self.emit(InstKind::Label(else_label), span);
                let else_value = self.lower_expr(else_expr);
                self.emit(
                    InstKind::Move {
                        dst: result.clone(),
                        src: else_value,
                    },
                    span,
                );
                self.emit(InstKind::Label(end_label), span);
                Value::Reg(result)
            }
            hir::ExprKind::Assign { place, value } => {
                let value = self.lower_expr(value);
                match place {
                    hir::Place::Local(local, _) => {
                        self.emit(
                            InstKind::Store {
                                src: value.clone(),
                                local: local.0,
                            },
                            span,
                        );
                    }
                    hir::Place::Elem { base, index, .. } => {
                        let base = self.lower_expr(base);
                        let index = self.lower_expr(index);
                        self.emit(
                            InstKind::StoreElem {
                                base,
                                index,
                                value: value.clone(),
                            },
                            span,
                        );
                    }
                }
                value
            }
            hir::ExprKind::Call { callee, args } => {
                if *callee == subc_util::kw::PRINT {
                    let arg = &args[0];
                    let ty = arg.ty.clone();
                    let value = self.lower_expr(arg);
                    self.emit(InstKind::Print { value, ty }, span);
                    return Value::Int(0);
                }

                let args: Vec<Value> = args.iter().map(|arg| self.lower_expr(arg)).collect();
                let dst = match expr.ty {
                    DataType::Void => None,
                    _ => Some(self.fresh_reg(expr.ty.clone())),
                };
                self.emit(
                    InstKind::Call {
                        dst: dst.clone(),
                        callee: *callee,
                        args,
                    },
                    span,
                );
                match dst {
                    Some(reg) => Value::Reg(reg),
                    None => Value::Int(0),
                }
            }
            hir::ExprKind::Index { base, index } => {
                let base_value = self.lower_expr(base);
                let index_value = self.lower_expr(index);
                if base.ty == DataType::String {
                    // One-character string via the runtime helper
                    return self.call_runtime(
                        runtime::STRINDEX,
                        vec![base_value, index_value],
                        DataType::String,
                        span,
                    );
                }
                let dst = self.fresh_reg(expr.ty.clone());
                self.emit(
                    InstKind::LoadElem {
                        dst: dst.clone(),
                        base: base_value,
                        index: index_value,
                    },
                    span,
                );
                Value::Reg(dst)
            }
            hir::ExprKind::IntToFloat(inner) => {
                let src = self.lower_expr(inner);
                let dst = self.fresh_reg(DataType::Float);
                self.emit(InstKind::Move { dst: dst.clone(), src }, span);
                Value::Reg(dst)
            }
        }
    }

    fn lower_binary(
        &mut self,
        op: BinOp,
        lhs: &hir::Expr,
        rhs: &hir::Expr,
        result_ty: &DataType,
        span: Span,
    ) -> Value {
        // Short-circuit forms first
        if matches!(op, BinOp::And | BinOp::Or) {
            return self.lower_short_circuit(op, lhs, rhs, span);
        }

        // String concatenation
        if op == BinOp::Add && *result_ty == DataType::String {
            let lhs = self.lower_to_string(lhs, span);
            let rhs = self.lower_to_string(rhs, span);
            return self.call_runtime(runtime::CONCAT, vec![lhs, rhs], DataType::String, span);
        }

        let lhs = self.lower_expr(lhs);
        let rhs = self.lower_expr(rhs);
        let ir_op = match op {
            BinOp::Add => BinaryOp::Add,
            BinOp::Sub => BinaryOp::Sub,
            BinOp::Mul => BinaryOp::Mul,
            BinOp::Div => BinaryOp::Div,
            BinOp::Mod => BinaryOp::Mod,
            BinOp::Eq => BinaryOp::Eq,
            BinOp::Ne => BinaryOp::Ne,
            BinOp::Lt => BinaryOp::Lt,
            BinOp::Le => BinaryOp::Le,
            BinOp::Gt => BinaryOp::Gt,
            BinOp::Ge => BinaryOp::Ge,
            BinOp::And | BinOp::Or => unreachable!("short-circuit handled above"),
        };
        let dst = self.fresh_reg(result_ty.clone());
        self.emit(
            InstKind::Binary {
                op: ir_op,
                dst: dst.clone(),
                lhs,
                rhs,
            },
            span,
        );
        Value::Reg(dst)
    }

    /// `&&`/`||` with conditional jumps and a merge register
    fn lower_short_circuit(
        &mut self,
        op: BinOp,
        lhs: &hir::Expr,
        rhs: &hir::Expr,
        span: Span,
    ) -> Value {
        let end_label = self.fresh_label();
        let result = self.fresh_reg(DataType::Bool);

        let lhs = self.lower_expr(lhs);
        self.emit(
            InstKind::Move {
                dst: result.clone(),
                src: lhs.clone(),
            },
            span,
        );
        let jump = match op {
            // a && b: a false decides the result
            BinOp::And => InstKind::JumpIfNot {
                cond: lhs,
                target: end_label,
            },
            // a || b: a true decides the result
            BinOp::Or => InstKind::JumpIf {
                cond: lhs,
                target: end_label,
            },
            _ => unreachable!(),
        };
        self.emit_commented(jump, span, "short-circuit");

        let rhs = self.lower_expr(rhs);
        self.emit(
            InstKind::Move {
                dst: result.clone(),
                src: rhs,
            },
            span,
        );
        self.emit(InstKind::Label(end_label), span);
        Value::Reg(result)
    }

    /// Lower an operand of string concatenation, converting non-string
    /// operands to their textual representation
    fn lower_to_string(&mut self, operand: &hir::Expr, span: Span) -> Value {
        let value = self.lower_expr(operand);
        let helper = match operand.ty {
            DataType::String => return value,
            DataType::Int => runtime::ITOA,
            DataType::Float => runtime::FTOA,
            DataType::Bool => runtime::BTOA,
            ref ty => {
                self.internal_error(
                    format!("unprintable type {} reached string concatenation", ty),
                    span,
                );
                return value;
            }
        };
        self.call_runtime(helper, vec![value], DataType::String, span)
    }

    /// `[a, b, c]`: allocate, then store each element
    fn lower_array_literal(&mut self, elements: &[hir::Expr], span: Span) -> Value {
        let count = self.fresh_reg(DataType::Int);
        self.emit(
            InstKind::ConstInt {
                dst: count.clone(),
                value: elements.len() as i64,
            },
            span,
        );
        let array = self.fresh_reg(DataType::Array(Box::new(
            elements
                .first()
                .map(|e| e.ty.clone())
                .unwrap_or(DataType::Int),
        )));
        self.emit(
            InstKind::Alloc {
                dst: array.clone(),
                count: Value::Reg(count),
            },
            span,
        );

        for (index, element) in elements.iter().enumerate() {
            let value = self.lower_expr(element);
            let slot = self.fresh_reg(DataType::Int);
            self.emit(
                InstKind::ConstInt {
                    dst: slot.clone(),
                    value: index as i64,
                },
                element.span,
            );
            self.emit(
                InstKind::StoreElem {
                    base: Value::Reg(array.clone()),
                    index: Value::Reg(slot),
                    value,
                },
                element.span,
            );
        }
        Value::Reg(array)
    }

    fn call_runtime(
        &mut self,
        helper: &str,
        args: Vec<Value>,
        ret_ty: DataType,
        span: Span,
    ) -> Value {
        let dst = self.fresh_reg(ret_ty);
        self.emit(
            InstKind::Call {
                dst: Some(dst.clone()),
                callee: Symbol::intern(helper),
                args,
            },
            span,
        );
        Value::Reg(dst)
    }

    fn default_value(&mut self, ty: &DataType, span: Span) -> Value {
        match ty {
            DataType::Float => {
                let dst = self.fresh_reg(DataType::Float);
                self.emit(InstKind::ConstFloat { dst: dst.clone(), value: 0.0 }, span);
                Value::Reg(dst)
            }
            DataType::String => {
                let id = self.strings.intern("");
                let dst = self.fresh_reg(DataType::String);
                self.emit(InstKind::ConstString { dst: dst.clone(), id }, span);
                Value::Reg(dst)
            }
            _ => {
                let dst = self.fresh_reg(ty.clone());
                self.emit(InstKind::ConstInt { dst: dst.clone(), value: 0 }, span);
                Value::Reg(dst)
            }
        }
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn fresh_reg(&mut self, ty: DataType) -> Reg {
        let reg = Reg::new(RegId(self.next_reg), ty);
        self.next_reg += 1;
        reg
    }

    fn fresh_label(&mut self) -> LabelId {
        let label = LabelId(self.next_label);
        self.next_label += 1;
        label
    }

    fn emit(&mut self, kind: InstKind, span: Span) {
        self.insts.push(Inst::new(kind, span));
    }

    fn emit_commented(&mut self, kind: InstKind, span: Span, comment: &str) {
        self.insts.push(Inst::new(kind, span).with_comment(comment));
    }

    fn internal_error(&mut self, message: impl Into<String>, span: Span) {
        DiagnosticBuilder::fatal(message).span(span).emit(self.handler);
        self.failed = true;
    }
}
