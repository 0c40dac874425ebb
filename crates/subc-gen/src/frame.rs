//! Stack frame layout.
//!
//! Each function's frame holds one 8-byte slot per local variable
//! followed by one 8-byte spill slot per virtual register that appears
//! in the function. Locals sit at `-8*(i+1)(%rbp)`; register slots
//! follow below them. All values are 8 bytes: ints and bools directly,
//! strings and arrays as pointers, floats as their bit pattern.

use rustc_hash::FxHashMap;
use subc_ir::{Function, InstKind, Value};

/// Frame layout for one function
#[derive(Debug, Default)]
pub struct Frame {
    local_count: usize,
    /// Virtual register id to spill-slot index, in first-appearance
    /// order of the instruction stream (deterministic)
    reg_slots: FxHashMap<u32, usize>,
}

impl Frame {
    /// Lay out the frame for a function by scanning its instructions
    pub fn layout(function: &Function) -> Self {
        let mut frame = Frame {
            local_count: function.local_count,
            reg_slots: FxHashMap::default(),
        };
        for inst in &function.insts {
            for reg in regs_in(&inst.kind) {
                frame.slot_for(reg);
            }
        }
        frame
    }

    fn slot_for(&mut self, reg: u32) -> usize {
        let next = self.reg_slots.len();
        *self.reg_slots.entry(reg).or_insert(next)
    }

    /// RBP-relative offset of a local slot
    pub fn local_offset(&self, local: u32) -> i32 {
        -8 * (local as i32 + 1)
    }

    /// RBP-relative offset of a virtual register's spill slot
    ///
    /// Every register was seen during layout; unknown ids are a bug in
    /// the caller.
    pub fn reg_offset(&self, reg: u32) -> i32 {
        let slot = self.reg_slots.get(&reg).copied().unwrap_or(0);
        -8 * ((self.local_count + slot) as i32 + 1)
    }

    /// Total frame size, 16-byte aligned
    pub fn size(&self) -> u32 {
        let bytes = 8 * (self.local_count + self.reg_slots.len()) as u32;
        (bytes + 15) & !15
    }
}

/// Every virtual register an instruction mentions
fn regs_in(kind: &InstKind) -> Vec<u32> {
    fn value_reg(value: &Value) -> Option<u32> {
        match value {
            Value::Reg(reg) => Some(reg.id.0),
            _ => None,
        }
    }

    let mut regs = Vec::new();
    match kind {
        InstKind::Binary { dst, lhs, rhs, .. } => {
            regs.push(dst.id.0);
            regs.extend(value_reg(lhs));
            regs.extend(value_reg(rhs));
        }
        InstKind::Not { dst, src } | InstKind::Move { dst, src } => {
            regs.push(dst.id.0);
            regs.extend(value_reg(src));
        }
        InstKind::Load { dst, .. }
        | InstKind::ConstInt { dst, .. }
        | InstKind::ConstFloat { dst, .. }
        | InstKind::ConstString { dst, .. } => regs.push(dst.id.0),
        InstKind::Store { src, .. } => regs.extend(value_reg(src)),
        InstKind::Alloc { dst, count } => {
            regs.push(dst.id.0);
            regs.extend(value_reg(count));
        }
        InstKind::JumpIf { cond, .. } | InstKind::JumpIfNot { cond, .. } => {
            regs.extend(value_reg(cond));
        }
        InstKind::Call { dst, args, .. } => {
            regs.extend(dst.as_ref().map(|reg| reg.id.0));
            regs.extend(args.iter().filter_map(value_reg));
        }
        InstKind::Return { value } => regs.extend(value.as_ref().and_then(value_reg)),
        InstKind::Print { value, .. } => regs.extend(value_reg(value)),
        InstKind::LoadElem { dst, base, index } => {
            regs.push(dst.id.0);
            regs.extend(value_reg(base));
            regs.extend(value_reg(index));
        }
        InstKind::StoreElem { base, index, value } => {
            regs.extend(value_reg(base));
            regs.extend(value_reg(index));
            regs.extend(value_reg(value));
        }
        InstKind::Label(_)
        | InstKind::Jump(_)
        | InstKind::FuncStart { .. }
        | InstKind::FuncEnd
        | InstKind::Param { .. } => {}
    }
    regs
}

#[cfg(test)]
mod tests {
    use super::*;
    use subc_ir::{Inst, Reg, RegId};
    use subc_sem::DataType;
    use subc_util::{kw, Span};

    fn function_with(insts: Vec<InstKind>, local_count: usize) -> Function {
        Function {
            name: kw::MAIN,
            ret_ty: DataType::Int,
            params: Vec::new(),
            insts: insts
                .into_iter()
                .map(|kind| Inst::new(kind, Span::DUMMY))
                .collect(),
            reg_count: 0,
            local_count,
        }
    }

    #[test]
    fn test_local_offsets() {
        let frame = Frame::layout(&function_with(vec![], 3));
        assert_eq!(frame.local_offset(0), -8);
        assert_eq!(frame.local_offset(1), -16);
        assert_eq!(frame.local_offset(2), -24);
    }

    #[test]
    fn test_reg_slots_follow_locals() {
        let reg = |id| Reg::new(RegId(id), DataType::Int);
        let frame = Frame::layout(&function_with(
            vec![
                InstKind::ConstInt { dst: reg(7), value: 1 },
                InstKind::Store {
                    src: Value::Reg(reg(7)),
                    local: 0,
                },
                InstKind::ConstInt { dst: reg(9), value: 2 },
            ],
            2,
        ));
        // First-seen order: r7 then r9, placed after the two locals
        assert_eq!(frame.reg_offset(7), -24);
        assert_eq!(frame.reg_offset(9), -32);
    }

    #[test]
    fn test_frame_size_aligned() {
        let frame = Frame::layout(&function_with(vec![], 1));
        assert_eq!(frame.size(), 16);
        let frame = Frame::layout(&function_with(vec![], 2));
        assert_eq!(frame.size(), 16);
        let frame = Frame::layout(&function_with(vec![], 3));
        assert_eq!(frame.size(), 32);
        let frame = Frame::layout(&function_with(vec![], 0));
        assert_eq!(frame.size(), 0);
    }
}
