//! The compiler driver: orchestrates lexer -> parser -> analyzer -> emitter
//! for one source file per [`compile_file`] call, suppressing assembly
//! emission when the analyzer reported any errors.

pub mod config;
pub mod error;

use config::Config;
use error::Result;
use microc_lex::Lexer;
use microc_par::Parser;
use microc_sem::analyze;
use microc_types::SymbolTable;
use microc_util::{FileId, Handler};
use std::fs;
use std::path::Path;

/// One file's compilation result: diagnostic text (already rendered to the
/// stable `error(<line>:<col>): <message>` format), counts, and the emitted
/// assembly text when the analysis found no errors.
pub struct CompileOutcome {
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: Vec<String>,
    pub asm: Option<String>,
}

pub fn compile_file(path: &Path, _config: &Config) -> Result<CompileOutcome> {
    let source =
        fs::read_to_string(path).map_err(|e| error::DrvError::ReadSource(path.to_path_buf(), e))?;
    compile_source(&source)
}

fn compile_source(source: &str) -> Result<CompileOutcome> {
    let handler = Handler::new();
    let tokens = Lexer::new(source, FileId(0)).tokenize(&handler);
    let (mut table, builtins) = SymbolTable::with_builtins();
    let ast = {
        let parser = Parser::new(tokens, &mut table, &builtins, &handler);
        parser.parse()
    };
    let result = analyze(&ast.items, &ast, &mut table, &builtins, &handler);
    let diagnostics = render_diagnostics(&handler);

    let asm = if result.errors == 0 {
        Some(microc_gen::emit(&ast, &mut table, &builtins, &result))
    } else {
        None
    };

    Ok(CompileOutcome {
        errors: result.errors,
        warnings: result.warnings,
        diagnostics,
        asm,
    })
}

fn render_diagnostics(handler: &Handler) -> Vec<String> {
    handler
        .diagnostics()
        .iter()
        .map(|d| format!("{}({}:{}): {}", d.level, d.span.line, d.span.column, d.message))
        .collect()
}
