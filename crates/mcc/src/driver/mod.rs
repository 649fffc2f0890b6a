//! Interpretation driver and pipeline orchestration

use crate::common::{CompileResult, DiagnosticReporter};
use crate::interp::{Interpreter, Value};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::sema::SemanticAnalyzer;
use std::io::Write;

/// What the pipeline should do beyond the mandatory parse and analyze
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub dump_tokens: bool,
    pub dump_ast: bool,
    /// Analyze without running
    pub check_only: bool,
    pub verbose: bool,
}

/// Per-file state shared across pipeline phases
pub struct CompileContext<'a> {
    pub filename: String,
    pub file_id: usize,
    pub reporter: &'a DiagnosticReporter,
}

impl<'a> CompileContext<'a> {
    pub fn new(filename: String, file_id: usize, reporter: &'a DiagnosticReporter) -> Self {
        Self {
            filename,
            file_id,
            reporter,
        }
    }
}

/// Result of one pipeline run
pub enum Outcome {
    /// Program ran to completion; carries the entry point's value
    Ran(Value),
    /// `check_only` was set and analysis found nothing
    Checked,
    /// Semantic diagnostics were reported; execution withheld
    Rejected(usize),
}

/// Runs source through lex, parse, analyze, and interpret phases
pub struct Pipeline;

impl Pipeline {
    pub fn new() -> Self {
        Self
    }

    pub fn run(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &RunConfig,
        out: &mut dyn Write,
    ) -> CompileResult<Outcome> {
        // Phase 1: Lexing (optional token dump; tokens are otherwise
        // pulled on demand by the parser)
        if config.dump_tokens {
            let lexer = Lexer::new(source);
            match lexer.tokenize_all() {
                Ok(tokens) => {
                    eprintln!("=== Tokens ===");
                    for token in &tokens {
                        eprintln!("{token:?}");
                    }
                    eprintln!("=== End Tokens ===\n");
                }
                Err(e) => {
                    ctx.reporter.report_error(ctx.file_id, &e);
                    return Err(e);
                }
            }
        }

        // Phase 2: Parsing
        if config.verbose {
            eprintln!("Parsing {}...", ctx.filename);
        }
        let mut parser = match Parser::new(source) {
            Ok(p) => p,
            Err(e) => {
                ctx.reporter.report_error(ctx.file_id, &e);
                return Err(e);
            }
        };
        let program = match parser.parse() {
            Ok(program) => program,
            Err(e) => {
                ctx.reporter.report_error(ctx.file_id, &e);
                return Err(e);
            }
        };

        if config.dump_ast {
            eprintln!("=== AST ===");
            eprintln!("{program:#?}");
            eprintln!("=== End AST ===\n");
        }

        // Phase 3: Semantic analysis. All diagnostics are reported in
        // one batch and any of them withholds execution.
        if config.verbose {
            eprintln!("Analyzing...");
        }
        let diags = SemanticAnalyzer::new().analyze(&program);
        if !diags.is_empty() {
            for diag in &diags {
                ctx.reporter.report_diag(ctx.file_id, diag);
            }
            return Ok(Outcome::Rejected(diags.len()));
        }
        if config.check_only {
            return Ok(Outcome::Checked);
        }

        // Phase 4: Interpretation
        if config.verbose {
            eprintln!("Running...");
        }
        let mut interpreter = Interpreter::new(out);
        match interpreter.run(&program) {
            Ok(value) => Ok(Outcome::Ran(value)),
            Err(e) => {
                ctx.reporter.report_error(ctx.file_id, &e);
                Err(e)
            }
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CompileError;
    use pretty_assertions::assert_eq;

    fn run_with(source: &str, config: &RunConfig) -> (CompileResult<Outcome>, String) {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("test.mc", source);
        let ctx = CompileContext::new("test.mc".to_string(), file_id, &reporter);
        let mut out = Vec::new();
        let outcome = Pipeline::new().run(source, &ctx, config, &mut out);
        (outcome, String::from_utf8(out).expect("utf8 output"))
    }

    fn run(source: &str) -> (CompileResult<Outcome>, String) {
        run_with(source, &RunConfig::default())
    }

    #[test]
    fn test_well_typed_program_runs() {
        let (outcome, out) = run(
            r#"
            int square(int n) { return n * n; }
            int main() {
                printf("%d\n", square(6));
                return 0;
            }
            "#,
        );
        assert!(matches!(outcome, Ok(Outcome::Ran(Value::Int(0)))));
        assert_eq!(out, "36\n");
    }

    #[test]
    fn test_semantic_errors_withhold_execution() {
        let (outcome, out) = run(
            r#"
            int main() {
                printf("%d", undeclared);
                return 0;
            }
            "#,
        );
        assert!(matches!(outcome, Ok(Outcome::Rejected(1))));
        assert_eq!(out, "");
    }

    #[test]
    fn test_all_diagnostics_reported_in_one_run() {
        let (outcome, _) = run(
            r#"
            int main() {
                x = 1;
                y = 2;
                break;
                return 0;
            }
            "#,
        );
        assert!(matches!(outcome, Ok(Outcome::Rejected(3))));
    }

    #[test]
    fn test_check_only_skips_execution() {
        let config = RunConfig {
            check_only: true,
            ..Default::default()
        };
        let (outcome, out) = run_with(
            r#"int main() { printf("side effect"); return 0; }"#,
            &config,
        );
        assert!(matches!(outcome, Ok(Outcome::Checked)));
        assert_eq!(out, "");
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let (outcome, _) = run("int main() { return 0");
        assert!(matches!(outcome, Err(CompileError::Parser { .. })));
    }

    #[test]
    fn test_runtime_error_surfaces_after_clean_analysis() {
        let (outcome, _) = run(
            r#"
            int main() {
                int a[2];
                return a[5];
            }
            "#,
        );
        assert!(matches!(outcome, Err(CompileError::Runtime { .. })));
    }

    // Anything the analyzer accepts must resolve every name at runtime.
    #[test]
    fn test_accepted_program_resolves_all_names() {
        let (outcome, out) = run(
            r#"
            class Counter {
                int count;
                Counter(int start) { count = start; }
                int next() {
                    count = count + 1;
                    return count;
                }
            };
            class Stepper : public Counter {
                Stepper(int start) { super(start); }
                int jump() { return next() + next(); }
            };
            int main() {
                Stepper s = new Stepper(10);
                for (int i = 0; i < 3; i = i + 1) {
                    if (i == 1) { continue; }
                    printf("%d ", s.jump());
                }
                int total = 0;
                int values[4];
                while (total < 4) {
                    values[total] = total * 2;
                    total += 1;
                }
                printf("%d %d", values[3], values.size);
                return 0;
            }
            "#,
        );
        assert!(matches!(outcome, Ok(Outcome::Ran(Value::Int(0)))));
        assert_eq!(out, "23 27 6 4");
    }
}
