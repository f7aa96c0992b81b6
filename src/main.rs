//! Command-line driver for the language.
//!
//! Prints a short coloured banner, then reads a source file, runs it
//! through the full pipeline (`masala::run`), and prints whatever the
//! program's `print` statements produced. `-v`/`-vv`/`-vvv` raise the log
//! verbosity; `--dump-tokens` and `--dump-ast` short-circuit after the
//! lexer/parser for debugging a program that won't parse or won't analyse.
//!
//! Exit codes: `0` on success, `1` if the source file couldn't be read,
//! `2` if the lexer, parser, analyser or evaluator reported an error.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use colored::Colorize;

use masala::{LangError, RunConfig};

/// An interpreter for the language.
#[derive(ClapParser, Debug)]
#[command(name = "masala", version, about)]
struct Cli {
    /// Path to the source file to run.
    file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the token stream and exit without parsing.
    #[arg(long)]
    dump_tokens: bool,

    /// Print the parsed AST and exit without analysing or running.
    #[arg(long)]
    dump_ast: bool,

    /// Override the default `while`-loop iteration cap.
    #[arg(long)]
    loop_limit: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    print_banner();

    log::info!("masala starting on {}", cli.file.display());

    let source = match fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(err) => {
            log::error!("{}", LangError::from(err));
            return ExitCode::from(1);
        }
    };

    match run(&cli, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli, source: &str) -> Result<(), LangError> {
    if cli.dump_tokens {
        for token in masala::tokenize(source)? {
            println!("{:?}", token);
        }
        return Ok(());
    }

    if cli.dump_ast {
        let program = masala::parse(source)?;
        println!("{:#?}", program);
        return Ok(());
    }

    let config = match cli.loop_limit {
        Some(loop_limit) => RunConfig::new(loop_limit),
        None => RunConfig::default(),
    };

    for line in masala::run(source, config)? {
        println!("{}", line);
    }
    Ok(())
}

fn print_banner() {
    println!("{} {}", "masala".bold().cyan(), env!("CARGO_PKG_VERSION").dimmed());
}

fn init_logging(verbose: u8) {
    let level = masala::verbosity_to_level(verbose);
    simple_logger::SimpleLogger::new().with_level(level).init().expect("logger already initialized");
}
