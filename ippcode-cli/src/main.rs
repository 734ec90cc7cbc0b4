//! `interpret`: load an IPPcode23 XML program and execute it.
//!
//! Exit codes:
//! - 0: Success
//! - 0-49: Operand of the EXIT instruction that stopped the program
//! - 10: Bad command line
//! - 11: Source or input file cannot be read
//! - 12: Statistics file cannot be written
//! - 31: Source is not well-formed XML
//! - 32: Unexpected document structure or invalid operand
//! - 52-58: Semantic or runtime error
//! - 99: Internal error

mod args;

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read};
use std::path::Path;
use std::process;

use ippcode_loader::LoadError;
use ippcode_vm::Outcome;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use crate::args::{Invocation, Request};

const READ_ERROR: i32 = 11;
const STATS_ERROR: i32 = 12;

fn main() {
    init_logging();

    let code = match args::parse(std::env::args_os()) {
        Ok(Request::Help) => {
            args::print_help();
            0
        }
        Ok(Request::Run(invocation)) => interpret(&invocation).unwrap_or_else(|code| code),
        Err(code) => code,
    };

    process::exit(code);
}

/// Diagnostics go to stderr so program output on stdout stays exact.
/// `RUST_LOG` overrides the default filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn interpret(invocation: &Invocation) -> Result<i32, i32> {
    // Both files are opened before anything is loaded.
    let source_file = invocation.source.as_deref().map(open).transpose()?;
    let input_file = invocation.input.as_deref().map(open).transpose()?;

    let source = match source_file {
        Some(file) => read_source(file)?,
        None => read_source(io::stdin().lock())?,
    };

    let program = ippcode_loader::load(&source).map_err(|e| {
        eprintln!("error: {e}");
        e.exit_code()
    })?;

    let input: Box<dyn BufRead> = match input_file {
        Some(file) => Box::new(BufReader::new(file)),
        None => Box::new(io::stdin().lock()),
    };
    let output = BufWriter::new(io::stdout().lock());

    let Outcome { exit_code, stats } =
        ippcode_vm::run(&program, input, output, io::stderr()).map_err(|e| {
            eprintln!("runtime error: {e}");
            e.exit_code()
        })?;
    debug!(exit_code, executed = stats.executed(), "run finished");

    if let Some((path, fields)) = &invocation.stats {
        fs::write(path, stats.render(fields)).map_err(|e| {
            eprintln!("error: cannot write '{}': {e}", path.display());
            STATS_ERROR
        })?;
    }

    Ok(exit_code)
}

fn open(path: &Path) -> Result<File, i32> {
    File::open(path).map_err(|e| {
        eprintln!("error: cannot open '{}': {e}", path.display());
        READ_ERROR
    })
}

/// Read the whole document. Bytes that are not UTF-8 make it malformed.
fn read_source(mut reader: impl Read) -> Result<String, i32> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| {
        eprintln!("error: cannot read source: {e}");
        READ_ERROR
    })?;

    String::from_utf8(bytes).map_err(|e| {
        let e = LoadError::MalformedXml(e.to_string());
        eprintln!("error: {e}");
        e.exit_code()
    })
}
