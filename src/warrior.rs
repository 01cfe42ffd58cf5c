use crate::redcode::Instruction;

/// Index of a warrior in the match roster, doubling as its cell-ownership
/// marker.
pub type WarriorId = usize;

/// A compiled program, ready to be placed in core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warrior {
    pub name: Option<String>,
    pub program: Vec<Instruction>,
    /// The source it was compiled from, kept for re-editing.
    pub source: Vec<String>,
    /// `;assert` expressions, stored unevaluated.
    pub asserts: Vec<String>,
}

impl Warrior {
    pub fn new(
        name: Option<String>,
        program: Vec<Instruction>,
        source: &str,
        asserts: Vec<String>,
    ) -> Self {
        Self {
            name,
            program,
            source: source.lines().map(str::to_string).collect(),
            asserts,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Nameless")
    }

    pub fn len(&self) -> usize {
        self.program.len()
    }

    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }

    /// Renders the warrior as a load file: an optional `;name` header and
    /// one fully resolved instruction per line. Compiling the output
    /// again yields the same program.
    pub fn load_file(&self) -> String {
        let mut lines = Vec::with_capacity(self.program.len() + 1);
        if let Some(name) = &self.name {
            lines.push(format!(";name {name}"));
        }
        lines.extend(self.program.iter().map(ToString::to_string));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redcode::{Modifier, Opcode, Operand};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_file_format() {
        let warrior = Warrior::new(
            Some("Imp".to_string()),
            vec![Instruction::new(
                Opcode::MOV,
                Modifier::I,
                Operand::direct(0),
                Operand::direct(1),
            )],
            "MOV 0, 1",
            vec![],
        );
        assert_eq!(warrior.load_file(), ";name Imp\nMOV.I $0, $1");
    }

    #[test]
    fn test_nameless() {
        let warrior = Warrior::new(None, vec![Instruction::default()], "DAT 0, 0", vec![]);
        assert_eq!(warrior.display_name(), "Nameless");
        assert_eq!(warrior.load_file(), "DAT.F $0, $0");
    }
}
