/// Compiles Redcode source into fully resolved instructions.
///
/// The steps are:
/// 1. **Preprocessing** - stripping comments, reading `;name`/`;assert`
///    metadata, expanding `FOR`/`ROF` loops, collecting `EQU` constants
///    and labels, substituting constants
/// 2. **Code generation** - decoding each line's opcode, modifier and
///    operands, evaluating operand expressions against the symbol table
///    and inferring missing modifiers
pub mod assembler;

/// Match parameters and their validation.
pub mod config;

/// The circular memory warriors fight in, including random placement.
pub mod core;

/// The round-robin process scheduler and instruction semantics.
pub mod engine;

/// Shared instruction data model and load-file formatting.
pub mod redcode;

/// A compiled program and its metadata.
pub mod warrior;
