use crate::assembler::{
    expr,
    symbols::{SymbolTable, SymbolValue},
    CompileError, CompileErrorKind,
};
use crate::redcode::Opcode;

/// One instruction-bearing line, tokenized, with its original line number
/// for error attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub tokens: Vec<String>,
}

/// Output of the preprocessing stages: metadata, the expanded instruction
/// stream with labels stripped and constants substituted, and the symbol
/// table for expression evaluation.
#[derive(Debug)]
pub struct Preprocessed {
    pub name: Option<String>,
    pub asserts: Vec<String>,
    pub lines: Vec<SourceLine>,
    pub symbols: SymbolTable,
}

#[tracing::instrument(skip(source, builtins))]
pub fn preprocess(
    source: &str,
    builtins: &[(String, String)],
) -> Result<Preprocessed, Vec<CompileError>> {
    let mut errors = Vec::new();
    let mut symbols = SymbolTable::new();
    for (name, value) in builtins {
        symbols
            .define(name, SymbolValue::Constant(value.clone()))
            .expect("built-in constants are valid and unique");
    }

    let (name, asserts, stripped) = strip(source);
    let expanded = expand(stripped, &mut symbols, &mut errors)?;
    let mut lines = collect_labels(expanded, &mut symbols, &mut errors);

    for line in &mut lines {
        for token in line.tokens.iter_mut().skip(1) {
            *token = substitute_constants(token, &symbols);
        }
    }

    if errors.is_empty() {
        Ok(Preprocessed {
            name,
            asserts,
            lines,
            symbols,
        })
    } else {
        Err(errors)
    }
}

/// Splits lines into whitespace tokens, dropping everything from the first
/// token that starts with `;`. `;name` and `;assert` lines are metadata,
/// not comments.
fn strip(source: &str) -> (Option<String>, Vec<String>, Vec<SourceLine>) {
    let mut name = None;
    let mut asserts = Vec::new();
    let mut lines = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix(";name") {
            name = Some(rest.trim().to_string());
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix(";assert") {
            asserts.push(rest.trim().to_string());
            continue;
        }

        let mut tokens = Vec::new();
        for token in trimmed.split_whitespace() {
            if token.starts_with(';') {
                break;
            }
            tokens.push(token.to_string());
        }
        if !tokens.is_empty() {
            lines.push(SourceLine {
                number: index + 1,
                tokens,
            });
        }
    }
    (name, asserts, lines)
}

/// Handles the `EQU` and `FOR`/`ROF` pseudo-opcodes. Loop bodies are
/// duplicated `n` times; a malformed loop structure halts compilation
/// since the instruction stream past it is meaningless.
fn expand(
    stripped: Vec<SourceLine>,
    symbols: &mut SymbolTable,
    errors: &mut Vec<CompileError>,
) -> Result<Vec<SourceLine>, Vec<CompileError>> {
    let mut expanded: Vec<SourceLine> = Vec::new();
    // (index into `expanded` where the body starts, repeat count, FOR's line)
    let mut open_loops: Vec<(usize, usize, usize)> = Vec::new();

    for line in stripped {
        if line.tokens.len() >= 2 && line.tokens[1].eq_ignore_ascii_case("EQU") {
            if line.tokens.len() < 3 {
                errors.push(CompileError {
                    line: line.number,
                    kind: CompileErrorKind::MissingOperand,
                });
            } else if let Err(error) = symbols.define(
                &line.tokens[0],
                SymbolValue::Constant(line.tokens[2..].join(" ")),
            ) {
                errors.push(CompileError {
                    line: line.number,
                    kind: error.into(),
                });
            }
            continue;
        }

        let first = line.tokens[0].to_ascii_uppercase();
        if first == "FOR" {
            let count_source = line.tokens[1..].join(" ");
            let substituted = substitute_constants(&count_source, symbols);
            match expr::evaluate(&substituted, &|_: &str| -> Option<i64> { None }) {
                Ok(count) if count >= 0 => {
                    open_loops.push((expanded.len(), count as usize, line.number));
                }
                _ => {
                    errors.push(CompileError {
                        line: line.number,
                        kind: CompileErrorKind::InvalidLoopCount(count_source),
                    });
                    return Err(std::mem::take(errors));
                }
            }
            continue;
        }
        if first == "ROF" {
            let Some((start, count, _)) = open_loops.pop() else {
                errors.push(CompileError {
                    line: line.number,
                    kind: CompileErrorKind::UnmatchedRof,
                });
                return Err(std::mem::take(errors));
            };
            let body: Vec<SourceLine> = expanded[start..].to_vec();
            if count == 0 {
                expanded.truncate(start);
            } else {
                for _ in 1..count {
                    expanded.extend(body.iter().cloned());
                }
            }
            continue;
        }

        expanded.push(line);
    }

    if let Some((_, _, line)) = open_loops.pop() {
        errors.push(CompileError {
            line,
            kind: CompileErrorKind::UnclosedFor,
        });
        return Err(std::mem::take(errors));
    }
    Ok(expanded)
}

/// Strips leading label tokens off each line, recording them against the
/// index of the instruction they precede. A line holding only labels
/// contributes no instruction; its labels point at the next one.
fn collect_labels(
    expanded: Vec<SourceLine>,
    symbols: &mut SymbolTable,
    errors: &mut Vec<CompileError>,
) -> Vec<SourceLine> {
    let mut lines: Vec<SourceLine> = Vec::new();

    for mut line in expanded {
        while let Some(head) = line.tokens.first() {
            if is_opcode_token(head) {
                break;
            }
            let name = head.strip_suffix(':').unwrap_or(head).to_string();
            if !super::symbols::is_valid_name(&name) {
                // not a label; leave it for decode to report
                break;
            }
            if let Err(error) = symbols.define(&name, SymbolValue::Label(lines.len())) {
                errors.push(CompileError {
                    line: line.number,
                    kind: error.into(),
                });
            }
            line.tokens.remove(0);
        }
        if !line.tokens.is_empty() {
            lines.push(line);
        }
    }
    lines
}

fn is_opcode_token(token: &str) -> bool {
    let mnemonic = token.split('.').next().unwrap_or(token);
    mnemonic.parse::<Opcode>().is_ok()
}

fn is_word_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Replaces exact occurrences of every defined constant. An occurrence
/// inside a larger identifier is left alone. Constants may reference each
/// other, so passes repeat until a fixpoint, bounded by the table size.
pub fn substitute_constants(text: &str, symbols: &SymbolTable) -> String {
    let mut current = text.to_string();
    for _ in 0..=symbols.len() {
        let mut changed = false;
        for (name, value) in symbols.constants() {
            let (next, replaced) = substitute_one(&current, name, value);
            current = next;
            changed |= replaced;
        }
        if !changed {
            break;
        }
    }
    current
}

fn substitute_one(text: &str, name: &str, value: &str) -> (String, bool) {
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    let mut position = 0;

    while let Some(found) = text[position..].find(name) {
        let start = position + found;
        let end = start + name.len();
        let boundary_before = start == 0 || !is_word_char(text.as_bytes()[start - 1]);
        let boundary_after = end == text.len() || !is_word_char(text.as_bytes()[end]);

        out.push_str(&text[position..start]);
        if boundary_before && boundary_after {
            out.push_str(value);
            changed = true;
        } else {
            out.push_str(&text[start..end]);
        }
        position = end;
    }
    out.push_str(&text[position..]);
    (out, changed)
}
