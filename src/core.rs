use rand::Rng;

use crate::redcode::Instruction;
use crate::warrior::{Warrior, WarriorId};

/// Absolute position in core, always in `[0, core_size)`.
pub type Address = usize;

/// One core location plus its display bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub instruction: Instruction,
    /// Who last wrote this cell; `None` for untouched core.
    pub owner: Option<WarriorId>,
    /// The cell has been executed or dereferenced at least once.
    pub read_marked: bool,
    /// A live process will execute this cell next.
    pub highlight: bool,
    /// The owner has been eliminated.
    pub defeated: bool,
}

/// The circular memory all warriors share. Addresses and stored operand
/// values stay in `[0, core_size)`; offsets wrap around.
#[derive(Debug)]
pub struct Core {
    cells: Vec<Cell>,
}

impl Core {
    pub fn new(size: usize) -> Core {
        Core {
            cells: vec![Cell::default(); size],
        }
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, address: Address) -> &Cell {
        &self.cells[address]
    }

    pub fn get_mut(&mut self, address: Address) -> &mut Cell {
        &mut self.cells[address]
    }

    /// Folds a signed value into the canonical `[0, core_size)` range.
    pub fn wrap(&self, value: i64) -> i32 {
        value.rem_euclid(self.size() as i64) as i32
    }

    /// The address `offset` cells past `origin`, wrapping around core.
    pub fn offset(&self, origin: Address, offset: i32) -> Address {
        (origin + self.wrap(offset as i64) as usize) % self.size()
    }

    /// Marks every cell owned by an eliminated warrior.
    pub fn mark_defeated(&mut self, warrior: WarriorId) {
        for cell in &mut self.cells {
            if cell.owner == Some(warrior) {
                cell.defeated = true;
            }
        }
    }

    /// Picks random start addresses by rejection sampling: a candidate is
    /// retried while any cell within a maximum-length footprint of it is
    /// already taken. Terminates because the configured core size leaves
    /// room for every warrior's footprint.
    #[tracing::instrument(skip_all)]
    pub fn place(
        &mut self,
        warriors: &[Warrior],
        max_program_length: usize,
        rng: &mut impl Rng,
    ) -> Vec<Address> {
        let size = self.size();
        let mut starts = Vec::with_capacity(warriors.len());

        for (id, warrior) in warriors.iter().enumerate() {
            let start = loop {
                let candidate = rng.gen_range(0..size);
                let taken = (0..max_program_length)
                    .any(|i| self.cells[(candidate + i) % size].owner.is_some());
                if !taken {
                    break candidate;
                }
            };

            for (i, instruction) in warrior.program.iter().enumerate() {
                let mut normalized = *instruction;
                normalized.a.value = self.wrap(normalized.a.value as i64);
                normalized.b.value = self.wrap(normalized.b.value as i64);

                let cell = &mut self.cells[(start + i) % size];
                cell.instruction = normalized;
                cell.owner = Some(id);
            }
            tracing::debug!(warrior = id, start, "placed warrior");
            starts.push(start);
        }
        starts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redcode::{Modifier, Opcode, Operand};
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_new_core_is_untouched_dat() {
        let core = Core::new(16);
        assert_eq!(core.size(), 16);
        for cell in core.cells() {
            assert_eq!(cell.instruction, Instruction::default());
            assert_eq!(cell.owner, None);
        }
    }

    #[test]
    fn test_wrap_and_offset() {
        let core = Core::new(8000);
        assert_eq!(core.wrap(-1), 7999);
        assert_eq!(core.wrap(8000), 0);
        assert_eq!(core.wrap(16005), 5);
        assert_eq!(core.offset(7999, 1), 0);
        assert_eq!(core.offset(0, -1), 7999);
        assert_eq!(core.offset(10, 25), 35);
    }

    #[test]
    fn test_placement_never_overlaps() {
        // full-footprint warriors, so any footprint overlap would show up
        // as a cell with the wrong owner
        let block = Warrior::new(
            None,
            vec![Instruction::default(); 100],
            "FOR 100\nDAT 0, 0\nROF",
            vec![],
        );

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut core = Core::new(1000);
            let warriors = vec![block.clone(), block.clone(), block.clone()];
            let starts = core.place(&warriors, 100, &mut rng);

            assert_eq!(starts.len(), 3);
            for (id, &start) in starts.iter().enumerate() {
                for i in 0..100 {
                    assert_eq!(core.get((start + i) % 1000).owner, Some(id));
                }
            }
        }
    }

    #[test]
    fn test_placement_normalizes_operands() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut core = Core::new(100);
        let warrior = Warrior::new(
            None,
            vec![Instruction::new(
                Opcode::JMP,
                Modifier::B,
                Operand::direct(-2),
                Operand::direct(105),
            )],
            "JMP -2, 105",
            vec![],
        );
        let starts = core.place(&[warrior], 10, &mut rng);

        let placed = core.get(starts[0]).instruction;
        assert_eq!(placed.a.value, 98);
        assert_eq!(placed.b.value, 5);
    }
}
