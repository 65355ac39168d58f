//! The emitter abstraction and its three serializations. See spec.md §3 /
//! §4.4, grounded in `original_source/src/emitter.h` (a vtable of function
//! pointers, here a single trait) and `src/opcode.c` (the opcode↔mnemonic
//! table).

pub mod intcodec;
pub mod pseudo;
pub mod symbolic;
pub mod whitespace;

pub use pseudo::PseudoEmitter;
pub use symbolic::SymbolicEmitter;
pub use whitespace::WhitespaceEmitter;

use std::io::{self, Write};

use crate::inst::{Instruction, Opcode, Operand};
use crate::label::LabelId;
use intcodec::{encode_signed, encode_unsigned};

/// A sink that serializes a lowered instruction stream. `emit` is called
/// once per instruction in program order; `end` runs once afterward.
pub trait Emitter {
    fn emit(&mut self, inst: &Instruction, resolve: &dyn Fn(LabelId) -> u32) -> io::Result<()>;
    fn end(&mut self) -> io::Result<()>;
}

/// Three substitution characters standing in for `S`, `T`, `L`. The
/// Whitespace emitter uses literal space/tab/newline; the symbolic
/// emitter uses the printable letters themselves.
#[derive(Clone, Copy)]
pub struct CharSet {
    pub s: char,
    pub t: char,
    pub l: char,
}

impl CharSet {
    fn of(&self, c: char) -> char {
        match c {
            'S' => self.s,
            'T' => self.t,
            'L' => self.l,
            other => other,
        }
    }
}

/// Writes an instruction's `S`/`T`/`L` prefix plus operand encoding,
/// substituting through `chars`. Shared by the Whitespace and symbolic
/// emitters, matching `emitter_ws.c`'s `ws_emit` structure.
pub(crate) fn write_inst(
    out: &mut impl Write,
    chars: CharSet,
    inst: &Instruction,
    resolve: &dyn Fn(LabelId) -> u32,
) -> io::Result<()> {
    for c in ws_prefix(inst.opcode).chars() {
        write!(out, "{}", chars.of(c))?;
    }

    match (inst.opcode, inst.operand) {
        (Opcode::Push, Operand::Int(n)) | (Opcode::Copy, Operand::Int(n)) | (Opcode::Slide, Operand::Int(n)) => {
            write_signed(out, chars, n)?;
        }
        (Opcode::Label, Operand::Label(l))
        | (Opcode::Call, Operand::Label(l))
        | (Opcode::Jmp, Operand::Label(l))
        | (Opcode::Jz, Operand::Label(l))
        | (Opcode::Jneg, Operand::Label(l)) => {
            write_unsigned(out, chars, resolve(l))?;
        }
        _ => {}
    }

    Ok(())
}

fn write_signed(out: &mut impl Write, chars: CharSet, n: i32) -> io::Result<()> {
    let mut err = None;
    encode_signed(n, |bit| {
        if err.is_none() {
            err = write!(out, "{}", chars.of(if bit { 'T' } else { 'S' })).err();
        }
    });
    if let Some(e) = err {
        return Err(e);
    }
    write!(out, "{}", chars.l)
}

fn write_unsigned(out: &mut impl Write, chars: CharSet, n: u32) -> io::Result<()> {
    let mut err = None;
    encode_unsigned(n, |bit| {
        if err.is_none() {
            err = write!(out, "{}", chars.of(if bit { 'T' } else { 'S' })).err();
        }
    });
    if let Some(e) = err {
        return Err(e);
    }
    write!(out, "{}", chars.l)
}

/// The `S`/`T`/`L` prefix for every opcode, in table order
/// (`original_source/src/opcode.c`'s `g_data`). `Opcode::Nop` has no
/// Whitespace encoding and is never emitted.
pub fn ws_prefix(opcode: crate::inst::Opcode) -> &'static str {
    use crate::inst::Opcode::*;
    match opcode {
        Nop => "",
        Push => "SS",
        Copy => "STS",
        Slide => "STL",
        Dup => "SLS",
        Pop => "SLL",
        Swap => "SLT",
        Add => "TSSS",
        Sub => "TSST",
        Mul => "TSSL",
        Div => "TSTS",
        Mod => "TSTT",
        Store => "TTS",
        Load => "TTT",
        Putc => "TLSS",
        Puti => "TLST",
        Getc => "TLTS",
        Geti => "TLTT",
        Label => "LSS",
        Call => "LST",
        Jmp => "LSL",
        Jz => "LTS",
        Jneg => "LTT",
        Ret => "LTL",
        Halt => "LLL",
    }
}

/// The uppercase mnemonic for each opcode, shared by the pseudo emitter.
pub fn mnemonic(opcode: crate::inst::Opcode) -> &'static str {
    use crate::inst::Opcode::*;
    match opcode {
        Nop => "NOP",
        Push => "PUSH",
        Copy => "COPY",
        Slide => "SLIDE",
        Dup => "DUP",
        Pop => "POP",
        Swap => "SWAP",
        Add => "ADD",
        Sub => "SUB",
        Mul => "MUL",
        Div => "DIV",
        Mod => "MOD",
        Store => "STORE",
        Load => "LOAD",
        Putc => "PUTC",
        Puti => "PUTI",
        Getc => "GETC",
        Geti => "GETI",
        Label => "LABEL",
        Call => "CALL",
        Jmp => "JMP",
        Jz => "JZ",
        Jneg => "JNEG",
        Ret => "RET",
        Halt => "HALT",
    }
}
