//! Constant folding.
//!
//! A single forward pass per function: registers holding known int or
//! float constants are tracked, and ALU instructions whose operands
//! are all known are rewritten into the equivalent CONST. Knowledge is
//! discarded at every label (a jump may land there with different
//! register contents) and whenever an instruction redefines a
//! register. Division and modulo by a known zero are left alone so the
//! runtime behavior is unchanged.

use rustc_hash::FxHashMap;

use crate::ir::{BinaryOp, InstKind, Module, Value};

/// A known constant value
#[derive(Debug, Clone, Copy, PartialEq)]
enum Known {
    Int(i64),
    Float(f64),
}

/// Fold constants in every function of the module
pub fn fold_constants(module: &mut Module) {
    for function in &mut module.functions {
        fold_function(function);
    }
}

fn fold_function(function: &mut crate::ir::Function) {
    let mut known: FxHashMap<u32, Known> = FxHashMap::default();

    for inst in &mut function.insts {
        if let Some(kind) = fold_step(&mut known, &inst.kind) {
            inst.kind = kind;
        }
    }
}

/// Update constant knowledge for one instruction; returns the folded
/// replacement when the instruction reduces to a CONST
fn fold_step(known: &mut FxHashMap<u32, Known>, kind: &InstKind) -> Option<InstKind> {
    match kind {
        InstKind::ConstInt { dst, value } => {
            known.insert(dst.id.0, Known::Int(*value));
            None
        }
        InstKind::ConstFloat { dst, value } => {
            known.insert(dst.id.0, Known::Float(*value));
            None
        }
        InstKind::Move { dst, src } => {
            // A move into a float register converts; model that
            match resolve(known, src) {
                Some(Known::Int(v)) if dst.ty == subc_sem::DataType::Float => {
                    known.insert(dst.id.0, Known::Float(v as f64));
                }
                Some(constant) => {
                    known.insert(dst.id.0, constant);
                }
                None => {
                    known.remove(&dst.id.0);
                }
            }
            None
        }
        InstKind::Binary { op, dst, lhs, rhs } => {
            let folded = match (resolve(known, lhs), resolve(known, rhs)) {
                (Some(lhs), Some(rhs)) => eval(*op, lhs, rhs),
                _ => None,
            };
            match folded {
                Some(Known::Int(value)) => {
                    known.insert(dst.id.0, Known::Int(value));
                    Some(InstKind::ConstInt {
                        dst: dst.clone(),
                        value,
                    })
                }
                Some(Known::Float(value)) => {
                    known.insert(dst.id.0, Known::Float(value));
                    Some(InstKind::ConstFloat {
                        dst: dst.clone(),
                        value,
                    })
                }
                None => {
                    known.remove(&dst.id.0);
                    None
                }
            }
        }
        InstKind::Not { dst, src } => match resolve(known, src) {
            Some(Known::Int(value)) => {
                let value = (value == 0) as i64;
                known.insert(dst.id.0, Known::Int(value));
                Some(InstKind::ConstInt {
                    dst: dst.clone(),
                    value,
                })
            }
            _ => {
                known.remove(&dst.id.0);
                None
            }
        },
        // Any jump target invalidates straight-line knowledge
        InstKind::Label(_) => {
            known.clear();
            None
        }
        // Other register definitions become unknown
        InstKind::Load { dst, .. }
        | InstKind::ConstString { dst, .. }
        | InstKind::Alloc { dst, .. }
        | InstKind::LoadElem { dst, .. } => {
            known.remove(&dst.id.0);
            None
        }
        InstKind::Call { dst, .. } => {
            if let Some(dst) = dst {
                known.remove(&dst.id.0);
            }
            None
        }
        InstKind::Store { .. }
        | InstKind::StoreElem { .. }
        | InstKind::Jump(_)
        | InstKind::JumpIf { .. }
        | InstKind::JumpIfNot { .. }
        | InstKind::Return { .. }
        | InstKind::FuncStart { .. }
        | InstKind::FuncEnd
        | InstKind::Param { .. }
        | InstKind::Print { .. } => None,
    }
}

fn resolve(known: &FxHashMap<u32, Known>, value: &Value) -> Option<Known> {
    match value {
        Value::Int(v) => Some(Known::Int(*v)),
        Value::Float(v) => Some(Known::Float(*v)),
        Value::Str(_) => None,
        Value::Reg(reg) => known.get(&reg.id.0).copied(),
    }
}

fn eval(op: BinaryOp, lhs: Known, rhs: Known) -> Option<Known> {
    use Known::{Float, Int};
    match (lhs, rhs) {
        (Int(a), Int(b)) => {
            let value = match op {
                BinaryOp::Add => a.checked_add(b)?,
                BinaryOp::Sub => a.checked_sub(b)?,
                BinaryOp::Mul => a.checked_mul(b)?,
                // Keep the runtime trap for division by zero
                BinaryOp::Div => a.checked_div(b)?,
                BinaryOp::Mod => a.checked_rem(b)?,
                BinaryOp::Eq => (a == b) as i64,
                BinaryOp::Ne => (a != b) as i64,
                BinaryOp::Lt => (a < b) as i64,
                BinaryOp::Le => (a <= b) as i64,
                BinaryOp::Gt => (a > b) as i64,
                BinaryOp::Ge => (a >= b) as i64,
                BinaryOp::And => ((a != 0) && (b != 0)) as i64,
                BinaryOp::Or => ((a != 0) || (b != 0)) as i64,
            };
            Some(Int(value))
        }
        (a, b) => {
            let a = match a {
                Int(v) => v as f64,
                Float(v) => v,
            };
            let b = match b {
                Int(v) => v as f64,
                Float(v) => v,
            };
            let folded = match op {
                BinaryOp::Add => Float(a + b),
                BinaryOp::Sub => Float(a - b),
                BinaryOp::Mul => Float(a * b),
                BinaryOp::Div => Float(a / b),
                BinaryOp::Mod => Float(a % b),
                BinaryOp::Eq => Int((a == b) as i64),
                BinaryOp::Ne => Int((a != b) as i64),
                BinaryOp::Lt => Int((a < b) as i64),
                BinaryOp::Le => Int((a <= b) as i64),
                BinaryOp::Gt => Int((a > b) as i64),
                BinaryOp::Ge => Int((a >= b) as i64),
                BinaryOp::And | BinaryOp::Or => return None,
            };
            Some(folded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Inst, Reg, RegId, StringPool};
    use subc_sem::DataType;
    use subc_util::{kw, Span};

    fn int_reg(id: u32) -> Reg {
        Reg::new(RegId(id), DataType::Int)
    }

    fn module_with(insts: Vec<InstKind>) -> Module {
        Module {
            functions: vec![crate::ir::Function {
                name: kw::MAIN,
                ret_ty: DataType::Int,
                params: Vec::new(),
                insts: insts
                    .into_iter()
                    .map(|kind| Inst::new(kind, Span::DUMMY))
                    .collect(),
                reg_count: 8,
                local_count: 0,
            }],
            strings: StringPool::new(),
            entry: kw::MAIN,
        }
    }

    #[test]
    fn test_folds_constant_arithmetic() {
        let mut module = module_with(vec![
            InstKind::ConstInt { dst: int_reg(0), value: 20 },
            InstKind::ConstInt { dst: int_reg(1), value: 2 },
            InstKind::Binary {
                op: BinaryOp::Mul,
                dst: int_reg(2),
                lhs: Value::Reg(int_reg(0)),
                rhs: Value::Reg(int_reg(1)),
            },
            InstKind::Binary {
                op: BinaryOp::Add,
                dst: int_reg(3),
                lhs: Value::Reg(int_reg(2)),
                rhs: Value::Int(10),
            },
        ]);
        fold_constants(&mut module);

        let insts = &module.functions[0].insts;
        assert!(matches!(insts[2].kind, InstKind::ConstInt { value: 40, .. }));
        assert!(matches!(insts[3].kind, InstKind::ConstInt { value: 50, .. }));
    }

    #[test]
    fn test_division_by_zero_not_folded() {
        let mut module = module_with(vec![
            InstKind::ConstInt { dst: int_reg(0), value: 1 },
            InstKind::Binary {
                op: BinaryOp::Div,
                dst: int_reg(1),
                lhs: Value::Reg(int_reg(0)),
                rhs: Value::Int(0),
            },
        ]);
        fold_constants(&mut module);
        assert!(matches!(
            module.functions[0].insts[1].kind,
            InstKind::Binary { op: BinaryOp::Div, .. }
        ));
    }

    #[test]
    fn test_knowledge_cleared_at_labels() {
        // The add after the label must not fold: a back edge may have
        // changed r0
        let mut module = module_with(vec![
            InstKind::ConstInt { dst: int_reg(0), value: 1 },
            InstKind::Label(crate::ir::LabelId(0)),
            InstKind::Binary {
                op: BinaryOp::Add,
                dst: int_reg(1),
                lhs: Value::Reg(int_reg(0)),
                rhs: Value::Int(1),
            },
        ]);
        fold_constants(&mut module);
        assert!(matches!(
            module.functions[0].insts[2].kind,
            InstKind::Binary { .. }
        ));
    }

    #[test]
    fn test_int_to_float_move_folds() {
        let mut module = module_with(vec![
            InstKind::ConstInt { dst: int_reg(0), value: 3 },
            InstKind::Move {
                dst: Reg::new(RegId(1), DataType::Float),
                src: Value::Reg(int_reg(0)),
            },
            InstKind::Binary {
                op: BinaryOp::Mul,
                dst: Reg::new(RegId(2), DataType::Float),
                lhs: Value::Reg(Reg::new(RegId(1), DataType::Float)),
                rhs: Value::Float(1.5),
            },
        ]);
        fold_constants(&mut module);
        assert!(matches!(
            module.functions[0].insts[2].kind,
            InstKind::ConstFloat { value, .. } if value == 4.5
        ));
    }

    #[test]
    fn test_comparison_folds_to_bool_int() {
        let mut module = module_with(vec![InstKind::Binary {
            op: BinaryOp::Lt,
            dst: int_reg(0),
            lhs: Value::Int(1),
            rhs: Value::Int(2),
        }]);
        fold_constants(&mut module);
        assert!(matches!(
            module.functions[0].insts[0].kind,
            InstKind::ConstInt { value: 1, .. }
        ));
    }
}
