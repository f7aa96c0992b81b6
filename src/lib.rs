//! Library crate for the language's lexer, parser, analyser and evaluator.
//!
//! [`run`] wires the four pipeline stages together and is the one entry
//! point embedders (and the CLI binary) need: source text and a
//! [`RunConfig`] in, the lines produced by `print` statements out.
//!
//! ```text
//! source --[Lexer]--> tokens --[Parser]--> AST --[Analyser]--> AST --[Interpreter]--> output
//! ```
//!
//! The first error from any stage halts the pipeline; later stages never
//! run on a program that failed an earlier one.

pub mod analyser;
pub mod ast;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;

pub use config::RunConfig;
pub use error::{LangError, Position, Result};

use analyser::Analyser;
use interpreter::Interpreter;
use lexer::Lexer;
use parser::Parser;

/// Runs a complete program through the lexer, parser, analyser and
/// evaluator, returning the lines produced by `print` statements.
pub fn run(source: &str, config: RunConfig) -> Result<Vec<String>> {
    let tokens = Lexer::new(source).tokenize()?;
    let program = Parser::new(tokens).parse()?;
    Analyser::new().analyse(&program)?;
    Interpreter::new(config).run(&program)
}

/// Runs only the lexer, for driver `--dump-tokens` support.
pub fn tokenize(source: &str) -> Result<Vec<lexer::Token>> {
    Lexer::new(source).tokenize()
}

/// Runs the lexer and parser, for driver `--dump-ast` support.
pub fn parse(source: &str) -> Result<ast::Program> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}

/// Maps a `-v` repeat count to the log level the driver initializes its
/// logger with: none → `Warn`, `-v` → `Info`, `-vv` → `Debug`, `-vvv` or
/// higher → `Trace`. Shared with the CLI so the mapping is tested here
/// rather than by spawning the binary.
pub fn verbosity_to_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fibonacci_by_recursion() {
        let source = r#"
action!
climax fib(n) {
    agar kismat rahi (n < 2) { dialogue wapas do n }
    dialogue wapas do fib(n - 1) + fib(n - 2)
}
ek baat bataun: fib(10)
paisa vasool
"#;
        let out = run(source, RunConfig::default()).unwrap();
        assert_eq!(out, vec!["55"]);
    }

    #[test]
    fn factorial_via_recursion_and_closures() {
        let source = r#"
action!
climax make_multiplier(factor) {
    climax scale(n) { dialogue wapas do n * factor }
    dialogue wapas do scale
}
climax factorial(n) {
    agar kismat rahi (n <= 1) { dialogue wapas do 1 }
    dialogue wapas do n * factorial(n - 1)
}
maan lo doubler = make_multiplier(2)
ek baat bataun: factorial(5)
ek baat bataun: doubler(21)
paisa vasool
"#;
        let out = run(source, RunConfig::default()).unwrap();
        assert_eq!(out, vec!["120", "42"]);
    }

    #[test]
    fn if_else_if_else_band_classification() {
        let source = r#"
action!
climax band(score) {
    agar kismat rahi (score >= 90) { dialogue wapas do "A" }
    nahi to (score >= 75) { dialogue wapas do "B" }
    nahi to (score >= 50) { dialogue wapas do "C" }
    warna { dialogue wapas do "F" }
}
ek baat bataun: band(95)
ek baat bataun: band(80)
ek baat bataun: band(60)
ek baat bataun: band(10)
paisa vasool
"#;
        let out = run(source, RunConfig::default()).unwrap();
        assert_eq!(out, vec!["A", "B", "C", "F"]);
    }

    #[test]
    fn semantic_errors_prevent_execution() {
        let err = run("action!\nek baat bataun: undeclared\npaisa vasool", RunConfig::default())
            .unwrap_err();
        assert!(matches!(err, LangError::Semantic { .. }));
    }

    #[test]
    fn dump_tokens_and_dump_ast_helpers_work_independently_of_run() {
        let source = "action!\nek baat bataun: 1\npaisa vasool";
        assert!(!tokenize(source).unwrap().is_empty());
        assert!(!parse(source).unwrap().statements.is_empty());
    }
}
