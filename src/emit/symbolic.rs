//! Human-readable `S`/`T`/`L` listing — the same serialization as
//! `WhitespaceEmitter` with printable substitution characters.

use std::io::{self, Write};

use super::{write_inst, CharSet, Emitter};
use crate::inst::Instruction;
use crate::label::LabelId;

pub struct SymbolicEmitter<W: Write> {
    out: W,
}

const CHARS: CharSet = CharSet {
    s: 'S',
    t: 'T',
    l: 'L',
};

impl<W: Write> SymbolicEmitter<W> {
    pub fn new(out: W) -> SymbolicEmitter<W> {
        SymbolicEmitter { out }
    }
}

impl<W: Write> Emitter for SymbolicEmitter<W> {
    fn emit(&mut self, inst: &Instruction, resolve: &dyn Fn(LabelId) -> u32) -> io::Result<()> {
        write_inst(&mut self.out, CHARS, inst, resolve)
    }

    fn end(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }
}
