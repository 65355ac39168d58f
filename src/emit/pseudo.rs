//! Indented mnemonic listing for human inspection. Grounded in
//! `original_source/src/emitter_pseudo.c`.

use std::io::{self, Write};

use super::{mnemonic, Emitter};
use crate::inst::{Instruction, Opcode, Operand};
use crate::label::LabelId;

pub struct PseudoEmitter<W: Write> {
    out: W,
    indent: usize,
}

impl<W: Write> PseudoEmitter<W> {
    pub fn new(out: W, indent: usize) -> PseudoEmitter<W> {
        PseudoEmitter { out, indent }
    }
}

impl<W: Write> Emitter for PseudoEmitter<W> {
    fn emit(&mut self, inst: &Instruction, resolve: &dyn Fn(LabelId) -> u32) -> io::Result<()> {
        if inst.opcode == Opcode::Label {
            let id = match inst.operand {
                Operand::Label(l) => resolve(l),
                _ => unreachable!(),
            };
            return writeln!(self.out, "L{}:", id);
        }

        write!(self.out, "{:indent$}{}", "", mnemonic(inst.opcode), indent = self.indent)?;

        match (inst.opcode, inst.operand) {
            (Opcode::Push, Operand::Int(n)) | (Opcode::Copy, Operand::Int(n)) | (Opcode::Slide, Operand::Int(n)) => {
                write!(self.out, " {}", n)?;
            }
            (Opcode::Call, Operand::Label(l))
            | (Opcode::Jmp, Operand::Label(l))
            | (Opcode::Jz, Operand::Label(l))
            | (Opcode::Jneg, Operand::Label(l)) => {
                write!(self.out, " L{}", resolve(l))?;
            }
            _ => {}
        }

        writeln!(self.out)
    }

    fn end(&mut self) -> io::Result<()> {
        Ok(())
    }
}
