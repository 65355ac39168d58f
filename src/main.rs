#[macro_use]
extern crate clap;

use clap::Arg;
use std::fs::File;
use std::io::{self, Read};
use std::process;

use akarin::{run, EmitMode, Options};

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Reads from standard input if no input file was given")
                .index(1),
        )
        .arg(
            Arg::with_name("symbolic")
                .short("s")
                .help("Transpile into symbolic (S, T, L) code instead of whitespace"),
        )
        .arg(
            Arg::with_name("pseudo")
                .short("p")
                .help("Transpile into pseudo mnemonic code instead of whitespace"),
        )
        .arg(
            Arg::with_name("dump_ast")
                .short("d")
                .help("Pretty-print the syntax tree instead of generating code"),
        )
        .get_matches();

    let source = match read_source(matches.value_of("INPUT")) {
        Ok(source) => source,
        Err(path) => {
            eprintln!("error: could not open file - {}", path);
            process::exit(1);
        }
    };

    let emit_mode = if matches.is_present("symbolic") {
        EmitMode::Symbolic
    } else if matches.is_present("pseudo") {
        EmitMode::Pseudo
    } else {
        EmitMode::Whitespace
    };

    let options = Options {
        emit_mode,
        dump_ast: matches.is_present("dump_ast"),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let exit_code = run(&source, &options, &mut out).unwrap_or_else(|err| {
        eprintln!("error: failed to write output - {}", err);
        1
    });

    process::exit(exit_code);
}

fn read_source(path: Option<&str>) -> Result<String, String> {
    let mut source = String::new();
    match path {
        Some(path) => {
            let mut file = File::open(path).map_err(|_| path.to_string())?;
            file.read_to_string(&mut source)
                .map_err(|_| path.to_string())?;
        }
        None => {
            io::stdin()
                .read_to_string(&mut source)
                .map_err(|_| "<stdin>".to_string())?;
        }
    }
    Ok(source)
}
