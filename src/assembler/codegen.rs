use std::str::FromStr;

use crate::assembler::{
    expr,
    preprocess::{Preprocessed, SourceLine},
    symbols::SymbolValue,
    CompileError, CompileErrorKind,
};
use crate::redcode::{AddressingMode, Instruction, Modifier, Opcode, Operand};

/// Decodes every preprocessed line into an instruction. Errors are
/// collected per line so a warrior with several mistakes reports them all
/// in one compile.
#[tracing::instrument(skip(pre))]
pub fn generate(pre: &Preprocessed) -> Result<Vec<Instruction>, Vec<CompileError>> {
    let mut program = Vec::new();
    let mut errors = Vec::new();

    for (index, line) in pre.lines.iter().enumerate() {
        match decode_line(line, index, pre) {
            Ok(instruction) => program.push(instruction),
            Err(kind) => errors.push(CompileError {
                line: line.number,
                kind,
            }),
        }
    }

    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

fn decode_line(
    line: &SourceLine,
    index: usize,
    pre: &Preprocessed,
) -> Result<Instruction, CompileErrorKind> {
    let (opcode, written_modifier) = decode_opcode(&line.tokens[0])?;

    let operand_source = line.tokens[1..].join(" ");
    let mut parts: Vec<&str> = operand_source.split(',').map(str::trim).collect();
    while parts.last() == Some(&"") {
        parts.pop();
    }
    if parts.iter().any(|part| part.is_empty()) {
        return Err(CompileErrorKind::MissingOperand);
    }
    if parts.len() > 2 {
        return Err(CompileErrorKind::TooManyOperands);
    }

    let mut operands = Vec::new();
    for part in &parts {
        operands.push(decode_operand(part, opcode, index, pre)?);
    }

    let zero = Operand::direct(0);
    let (a, b) = match operands[..] {
        [a, b] => (a, b),
        // a lone DAT operand lands in the B field per ICWS'94
        [operand] if opcode == Opcode::DAT => (zero, operand),
        [operand] => (operand, zero),
        // only data and no-ops may leave both operands implicit
        [] if matches!(opcode, Opcode::DAT | Opcode::NOP) => (zero, zero),
        _ => return Err(CompileErrorKind::MissingOperand),
    };

    let modifier = written_modifier.unwrap_or_else(|| opcode.default_modifier(a.mode, b.mode));
    Ok(Instruction::new(opcode, modifier, a, b))
}

fn decode_opcode(token: &str) -> Result<(Opcode, Option<Modifier>), CompileErrorKind> {
    let mut pieces = token.splitn(2, '.');
    let mnemonic = pieces.next().unwrap_or(token);
    let opcode = Opcode::from_str(mnemonic)
        .map_err(|_| CompileErrorKind::UnknownOpcode(mnemonic.to_string()))?;
    if !opcode.is_supported() {
        return Err(CompileErrorKind::UnsupportedOpcode(
            mnemonic.to_ascii_uppercase(),
        ));
    }

    let modifier = match pieces.next() {
        Some(written) => Some(
            Modifier::from_str(written)
                .map_err(|_| CompileErrorKind::UnknownModifier(written.to_string()))?,
        ),
        None => None,
    };
    Ok((opcode, modifier))
}

fn decode_operand(
    part: &str,
    opcode: Opcode,
    index: usize,
    pre: &Preprocessed,
) -> Result<Operand, CompileErrorKind> {
    let mut chars = part.chars();
    let first = chars.next().ok_or(CompileErrorKind::MissingOperand)?;

    // DAT is data, so a bare operand defaults to immediate; everywhere
    // else a bare operand is a direct address.
    let (mode, expression) = match AddressingMode::from_sigil(first) {
        Some(mode) => (mode, chars.as_str().trim_start()),
        None if opcode == Opcode::DAT => (AddressingMode::Immediate, part),
        None => (AddressingMode::Direct, part),
    };
    if expression.is_empty() {
        return Err(CompileErrorKind::MissingOperand);
    }

    // A label used in an expression stands for its distance from the
    // line being assembled.
    let resolve = |name: &str| match &pre.symbols.find(name)?.value {
        SymbolValue::Label(target) => Some(*target as i64 - index as i64),
        SymbolValue::Constant(_) => None,
    };
    let value = expr::evaluate(expression, &resolve)
        .map_err(|_| CompileErrorKind::BadExpression(part.to_string()))?;
    let value =
        i32::try_from(value).map_err(|_| CompileErrorKind::BadExpression(part.to_string()))?;

    Ok(Operand::new(mode, value))
}
