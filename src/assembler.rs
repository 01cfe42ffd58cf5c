use std::path::PathBuf;

use anyhow::Context;
use thiserror::Error;

use crate::{config::MatchConfig, warrior::Warrior};

/// Comment stripping, `;name`/`;assert` metadata, `EQU` constants,
/// `FOR`/`ROF` expansion and label collection.
pub mod preprocess;

/// Evaluates the integer expressions used for operands and loop counts.
pub mod expr;

/// Decodes preprocessed lines into instructions.
pub mod codegen;

/// Shared namespace for labels and constants.
pub mod symbols;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("`{0}` is recognized but unsupported: there is no P-space")]
    UnsupportedOpcode(String),
    #[error("`ROF` without an open `FOR` loop")]
    UnmatchedRof,
    #[error("`FOR` loop without a matching `ROF`")]
    UnclosedFor,
    #[error("cannot resolve loop count `{0}`")]
    InvalidLoopCount(String),
    #[error("cannot evaluate expression `{0}`")]
    BadExpression(String),
    #[error("missing operand")]
    MissingOperand,
    #[error("too many operands")]
    TooManyOperands,
    #[error("program exceeds the maximum length of {0} instructions")]
    ProgramTooLong(usize),
    #[error(transparent)]
    Symbol(#[from] symbols::SymbolError),
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct CompileError {
    /// 1-based line in the original source.
    pub line: usize,
    pub kind: CompileErrorKind,
}

/// Compiles one Redcode source into a warrior. All decode and evaluation
/// errors are reported together; structural errors halt at once.
#[tracing::instrument(skip(source))]
pub fn compile_code(source: &str, config: &MatchConfig) -> Result<Warrior, Vec<CompileError>> {
    let builtins = [
        ("CORESIZE".to_string(), config.core_size.to_string()),
        ("MAXCYCLES".to_string(), config.max_cycles.to_string()),
        ("MAXLENGTH".to_string(), config.max_program_length.to_string()),
    ];

    let pre = preprocess::preprocess(source, &builtins)?;
    let program = codegen::generate(&pre)?;

    if program.len() > config.max_program_length {
        let line = pre.lines[config.max_program_length].number;
        return Err(vec![CompileError {
            line,
            kind: CompileErrorKind::ProgramTooLong(config.max_program_length),
        }]);
    }

    tracing::debug!(
        instructions = program.len(),
        name = pre.name.as_deref().unwrap_or("Nameless"),
        "compiled warrior"
    );
    Ok(Warrior::new(pre.name, program, source, pre.asserts))
}

#[derive(clap::Args)]
pub struct AssemblyArgs {
    #[clap(help = "Redcode source file")]
    file: PathBuf,
    #[clap(short, long)]
    #[clap(help = "Write the load file here instead of stdout")]
    output: Option<PathBuf>,
}

/// `assemble` subcommand: compile one warrior and emit its load file.
pub fn assemble(args: &AssemblyArgs) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Unable to read {}", args.file.display()))?;

    let warrior = match compile_code(&source, &MatchConfig::default()) {
        Ok(warrior) => warrior,
        Err(errors) => {
            for error in &errors {
                eprintln!("{}: {error}", args.file.display());
            }
            anyhow::bail!("compilation failed with {} error(s)", errors.len());
        }
    };

    let load_file = warrior.load_file();
    match &args.output {
        Some(path) => std::fs::write(path, load_file + "\n")
            .with_context(|| format!("Unable to write {}", path.display()))?,
        None => println!("{load_file}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compile_imp() {
        let warrior = compile_code(";name Imp\nMOV 0, 1", &MatchConfig::default()).unwrap();
        assert_eq!(warrior.display_name(), "Imp");
        assert_eq!(warrior.program.len(), 1);
        assert_eq!(warrior.program[0].to_string(), "MOV.I $0, $1");
    }

    #[test]
    fn test_builtin_coresize() {
        let config = MatchConfig::default();
        let warrior = compile_code("DAT CORESIZE-1, 0", &config).unwrap();
        assert_eq!(warrior.program[0].a.value, 7999);
    }

    #[test]
    fn test_program_too_long() {
        let config = MatchConfig {
            max_program_length: 2,
            ..MatchConfig::default()
        };
        let errors = compile_code("FOR 3\nNOP\nROF", &config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, CompileErrorKind::ProgramTooLong(2));
    }
}
