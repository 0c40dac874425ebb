//! Stable, human-readable IR rendering (`-emit-ir`).
//!
//! The format is deterministic: string pool entries in insertion
//! order, functions in module order, one instruction per line with the
//! opcode mnemonics of the instruction set.

use std::fmt;

use crate::ir::{Function, Inst, InstKind, Module};

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.strings.is_empty() {
            writeln!(f, "strings:")?;
            for (id, text) in self.strings.iter() {
                writeln!(f, "  str{} = {:?}", id.0, text)?;
            }
            writeln!(f)?;
        }
        for (index, function) in self.functions.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(name, ty)| format!("{}: {}", name, ty))
            .collect();
        writeln!(
            f,
            "func {}({}) -> {} locals={} regs={} {{",
            self.name,
            params.join(", "),
            self.ret_ty,
            self.local_count,
            self.reg_count
        )?;
        for inst in &self.insts {
            writeln!(f, "{}", inst)?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = render_kind(&self.kind);
        // Labels and function brackets sit flush left of the body
        // indent so control flow is scannable
        let indented = match self.kind {
            InstKind::Label(_) | InstKind::FuncStart { .. } | InstKind::FuncEnd => {
                format!("  {}", body)
            }
            _ => format!("    {}", body),
        };
        match &self.comment {
            Some(comment) => write!(f, "{}  ; {}", indented, comment),
            None => write!(f, "{}", indented),
        }
    }
}

fn render_kind(kind: &InstKind) -> String {
    match kind {
        InstKind::Binary { op, dst, lhs, rhs } => {
            format!(
                "{} r{}, {}, {}",
                op.mnemonic(),
                dst.id.0,
                lhs,
                rhs
            )
        }
        InstKind::Not { dst, src } => format!("NOT r{}, {}", dst.id.0, src),
        InstKind::Load { dst, local } => format!("LOAD r{}, local{}", dst.id.0, local),
        InstKind::Store { src, local } => format!("STORE {}, local{}", src, local),
        InstKind::Move { dst, src } => format!("MOVE r{}, {}", dst.id.0, src),
        InstKind::ConstInt { dst, value } => format!("CONST_INT r{}, {}", dst.id.0, value),
        InstKind::ConstFloat { dst, value } => {
            format!("CONST_FLOAT r{}, {:?}", dst.id.0, value)
        }
        InstKind::ConstString { dst, id } => {
            format!("CONST_STRING r{}, str{}", dst.id.0, id.0)
        }
        InstKind::Alloc { dst, count } => format!("ALLOC r{}, {}", dst.id.0, count),
        InstKind::Label(label) => format!("LABEL {}", label),
        InstKind::Jump(label) => format!("JUMP {}", label),
        InstKind::JumpIf { cond, target } => format!("JUMP_IF {}, {}", cond, target),
        InstKind::JumpIfNot { cond, target } => {
            format!("JUMP_IF_NOT {}, {}", cond, target)
        }
        InstKind::Call { dst, callee, args } => {
            let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            match dst {
                Some(dst) => format!("CALL r{}, {}({})", dst.id.0, callee, args.join(", ")),
                None => format!("CALL {}({})", callee, args.join(", ")),
            }
        }
        InstKind::Return { value } => match value {
            Some(value) => format!("RETURN {}", value),
            None => "RETURN".to_string(),
        },
        InstKind::FuncStart { name } => format!("FUNC_START {}", name),
        InstKind::FuncEnd => "FUNC_END".to_string(),
        InstKind::Param { index, local } => format!("PARAM {}, local{}", index, local),
        InstKind::Print { value, ty } => format!("PRINT {}, {}", value, ty),
        InstKind::LoadElem { dst, base, index } => {
            format!("LOAD_ELEM r{}, {}, {}", dst.id.0, base, index)
        }
        InstKind::StoreElem { base, index, value } => {
            format!("STORE_ELEM {}, {}, {}", base, index, value)
        }
    }
}
