//! MiniC++ interpreter CLI
//!
//! Usage: mcc [OPTIONS] <input>

use anyhow::Context;
use clap::Parser as ClapParser;
use minic::common::DiagnosticReporter;
use minic::driver::{CompileContext, Outcome, Pipeline, RunConfig};
use minic::interp::Value;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser, Debug)]
#[command(name = "mcc")]
#[command(version = "0.1.0")]
#[command(about = "MiniC++ interpreter", long_about = None)]
struct Args {
    /// Input source file
    #[arg(required = true)]
    input: PathBuf,

    /// Analyze only, without running the program
    #[arg(short, long)]
    check: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,
}

fn main() {
    let args = Args::parse();

    match run(&args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> anyhow::Result<i32> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(&filename, &source);
    let ctx = CompileContext::new(filename, file_id, &reporter);

    let config = RunConfig {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        check_only: args.check,
        verbose: args.verbose,
    };

    let mut stdout = std::io::stdout().lock();
    match Pipeline::new().run(&source, &ctx, &config, &mut stdout) {
        Ok(Outcome::Ran(value)) => {
            drop(stdout);
            if !matches!(value, Value::Null) {
                println!("Program exited with value: {value}");
            }
            Ok(0)
        }
        Ok(Outcome::Checked) => Ok(0),
        Ok(Outcome::Rejected(count)) => {
            eprintln!("error: {count} semantic error(s) found");
            Ok(1)
        }
        // Already rendered through the reporter
        Err(_) => Ok(1),
    }
}
