//! Pipeline orchestration: source text in, either a pretty-printed AST or
//! a serialized instruction stream out. See SPEC_FULL.md §2.

pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod emit;
pub mod inst;
pub mod label;
pub mod lexer;
pub mod parser;
pub mod symbol;
pub mod token;
pub mod treeprint;

#[cfg(test)]
mod test;

use std::io::{self, Write};

use emit::{Emitter, PseudoEmitter, SymbolicEmitter, WhitespaceEmitter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitMode {
    Whitespace,
    Symbolic,
    Pseudo,
}

pub struct Options {
    pub emit_mode: EmitMode,
    pub dump_ast: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            emit_mode: EmitMode::Whitespace,
            dump_ast: false,
        }
    }
}

/// Runs the full pipeline against `source`, writing generated output (or
/// the AST dump) to `out`. Returns the process exit code: `0` on success,
/// `1` if any lexical, syntactic or semantic error was reported.
pub fn run(source: &str, options: &Options, out: &mut impl Write) -> io::Result<i32> {
    let parsed = parser::parse(source);

    if options.dump_ast {
        treeprint::dump(out, &parsed.ast)?;
        let errors = parsed.lexer_errors + parsed.parser_errors;
        return Ok(if errors == 0 { 0 } else { 1 });
    }

    let output = codegen::Codegen::new().generate(&parsed.ast);

    let total_errors = parsed.lexer_errors + parsed.parser_errors + output.errors;
    if total_errors != 0 {
        return Ok(1);
    }

    let resolve = |id: label::LabelId| output.labels.resolved_id(id);
    let mut emitter: Box<dyn Emitter + '_> = match options.emit_mode {
        EmitMode::Whitespace => Box::new(WhitespaceEmitter::new(&mut *out)),
        EmitMode::Symbolic => Box::new(SymbolicEmitter::new(&mut *out)),
        EmitMode::Pseudo => Box::new(PseudoEmitter::new(&mut *out, 8)),
    };

    for inst in &output.instructions {
        emitter.emit(inst, &resolve)?;
    }
    emitter.end()?;

    Ok(0)
}
