//! Command-line parsing.
//!
//! clap validates the flags. The statistics layout is then read from the
//! raw arguments, because the report follows the order the flags were given
//! in and each flag may repeat.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};
use ippcode_vm::StatField;

/// Exit code for every command-line problem.
pub const USAGE_ERROR: i32 = 10;

#[derive(Debug, Parser)]
#[command(name = "interpret")]
#[command(about = "Interpret an IPPcode23 program stored as XML", long_about = None)]
#[command(disable_help_flag = true)]
#[command(after_help = "At least one of --source and --input must be given; \
    the other one is read from standard input.")]
pub struct Cli {
    /// Print this help and exit
    #[arg(long)]
    pub help: bool,

    /// XML representation of the program
    #[arg(long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Input read by READ instructions
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Write the statistics report to FILE
    #[arg(long, value_name = "FILE")]
    pub stats: Option<PathBuf>,

    /// Report the number of executed instructions
    #[arg(long, action = ArgAction::Count)]
    pub insts: u8,

    /// Report the order of the most executed instruction
    #[arg(long, action = ArgAction::Count)]
    pub hot: u8,

    /// Report the peak number of initialized variables
    #[arg(long, action = ArgAction::Count)]
    pub vars: u8,

    /// Report the most executed opcodes
    #[arg(long, action = ArgAction::Count)]
    pub frequent: u8,

    /// Write STRING into the report
    #[arg(long, value_name = "STRING", action = ArgAction::Append)]
    pub print: Vec<String>,

    /// Write a line break into the report
    #[arg(long, action = ArgAction::Count)]
    pub eol: u8,
}

impl Cli {
    /// Whether any report field was requested.
    fn requests_stats(&self) -> bool {
        let flags = [self.insts, self.hot, self.vars, self.frequent, self.eol];
        flags.iter().any(|&n| n > 0) || !self.print.is_empty()
    }
}

/// What the user asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum Request {
    Help,
    Run(Invocation),
}

/// A validated interpreter run.
#[derive(Debug, PartialEq, Eq)]
pub struct Invocation {
    pub source: Option<PathBuf>,
    pub input: Option<PathBuf>,
    /// Report destination and its fields, in command-line order.
    pub stats: Option<(PathBuf, Vec<StatField>)>,
}

/// Parse the process arguments. `args` includes the program name.
///
/// On failure the message has already been printed and the usage exit
/// code is returned.
pub fn parse<I, T>(args: I) -> Result<Request, i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let raw: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let cli = Cli::try_parse_from(&raw).map_err(|e| {
        let _ = e.print();
        USAGE_ERROR
    })?;

    if cli.help {
        if raw.len() > 2 {
            eprintln!("error: --help cannot be combined with other arguments");
            return Err(USAGE_ERROR);
        }
        return Ok(Request::Help);
    }

    if cli.source.is_none() && cli.input.is_none() {
        eprintln!("error: at least one of --source and --input is required");
        return Err(USAGE_ERROR);
    }

    if cli.stats.is_none() && cli.requests_stats() {
        eprintln!("error: statistics flags require --stats");
        return Err(USAGE_ERROR);
    }
    let stats = cli.stats.map(|path| (path, stat_layout(&raw)));

    Ok(Request::Run(Invocation {
        source: cli.source,
        input: cli.input,
        stats,
    }))
}

/// Statistics fields in the order they appear on the command line.
///
/// Runs after clap accepted the arguments, so every `--print` has a value
/// either attached with `=` or in the next argument.
fn stat_layout(raw: &[OsString]) -> Vec<StatField> {
    let mut fields = Vec::new();
    let mut args = raw.iter().skip(1).map(|arg| arg.to_string_lossy());

    while let Some(arg) = args.next() {
        let (flag, attached) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg.to_string(), None),
        };
        match flag.as_str() {
            "--insts" => fields.push(StatField::Insts),
            "--hot" => fields.push(StatField::Hot),
            "--vars" => fields.push(StatField::Vars),
            "--frequent" => fields.push(StatField::Frequent),
            "--eol" => fields.push(StatField::Eol),
            "--print" => {
                let text = attached.or_else(|| args.next().map(|next| next.to_string()));
                fields.push(StatField::Print(text.unwrap_or_default()));
            }
            "--source" | "--input" | "--stats" if attached.is_none() => {
                args.next();
            }
            _ => {}
        }
    }

    fields
}

/// Print the help text to stdout.
pub fn print_help() {
    let _ = Cli::command().print_help();
}
