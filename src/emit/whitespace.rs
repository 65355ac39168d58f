//! Canonical Whitespace output: literal space, tab and newline. Grounded
//! in `original_source/src/emitter_ws.c`.

use std::io::{self, Write};

use super::{write_inst, CharSet, Emitter};
use crate::inst::Instruction;
use crate::label::LabelId;

pub struct WhitespaceEmitter<W: Write> {
    out: W,
    chars: CharSet,
    /// When set, no trailing newline is appended after the final opcode.
    strict: bool,
}

impl<W: Write> WhitespaceEmitter<W> {
    pub fn new(out: W) -> WhitespaceEmitter<W> {
        WhitespaceEmitter::with_chars(out, ' ', '\t', '\n', false)
    }

    pub fn with_chars(out: W, space: char, tab: char, newline: char, strict: bool) -> WhitespaceEmitter<W> {
        WhitespaceEmitter {
            out,
            chars: CharSet {
                s: space,
                t: tab,
                l: newline,
            },
            strict,
        }
    }
}

impl<W: Write> Emitter for WhitespaceEmitter<W> {
    fn emit(&mut self, inst: &Instruction, resolve: &dyn Fn(LabelId) -> u32) -> io::Result<()> {
        write_inst(&mut self.out, self.chars, inst, resolve)
    }

    fn end(&mut self) -> io::Result<()> {
        if !self.strict {
            write!(self.out, "\n")?;
        }
        Ok(())
    }
}
