use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Context;
use rand::Rng;

use crate::{
    assembler,
    config::{ConfigError, MatchConfig},
    core::{Address, Cell, Core},
    redcode::{AddressingMode, Instruction, Modifier, Opcode, Operand},
    warrior::{Warrior, WarriorId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Running,
    Won(WarriorId),
    Draw,
}

/// How far to advance the simulation in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOption {
    /// Execute a single cycle.
    Step,
    /// Run up to `n` cycles, then yield back to the caller.
    Batch(usize),
    /// Run every remaining cycle. Per-cycle highlight bookkeeping is
    /// skipped since no intermediate state will be observed.
    ToCompletion,
}

/// A single thread of execution. Warriors start with one and gain more
/// through `SPL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Process {
    pub location: Address,
    pub warrior: WarriorId,
}

/// A running match: the core, the warriors' process queues and the cycle
/// counter. One cycle gives every living warrior one process execution,
/// round-robin across warriors and FIFO within each warrior.
#[derive(Debug)]
pub struct Match {
    config: MatchConfig,
    core: Core,
    warriors: Vec<Warrior>,
    queues: Vec<VecDeque<Process>>,
    starts: Vec<Address>,
    /// Living warriors in their round-robin order.
    alive: Vec<WarriorId>,
    cycle: usize,
    status: MatchStatus,
}

impl Match {
    pub fn new(config: MatchConfig, warriors: Vec<Warrior>) -> Result<Match, ConfigError> {
        Self::with_rng(config, warriors, &mut rand::thread_rng())
    }

    /// Like [`Match::new`] with caller-provided placement randomness.
    pub fn with_rng(
        config: MatchConfig,
        warriors: Vec<Warrior>,
        rng: &mut impl Rng,
    ) -> Result<Match, ConfigError> {
        config.validate(warriors.len())?;
        for warrior in &warriors {
            if warrior.len() > config.max_program_length {
                return Err(ConfigError::WarriorTooLong {
                    name: warrior.display_name().to_string(),
                    max: config.max_program_length,
                });
            }
        }

        let mut core = Core::new(config.core_size);
        let starts = core.place(&warriors, config.max_program_length, rng);
        let queues = starts
            .iter()
            .enumerate()
            .map(|(warrior, &location)| VecDeque::from([Process { location, warrior }]))
            .collect();

        Ok(Match {
            config,
            alive: (0..warriors.len()).collect(),
            core,
            warriors,
            queues,
            starts,
            cycle: 0,
            status: MatchStatus::Running,
        })
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn cycle(&self) -> usize {
        self.cycle
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn cells(&self) -> &[Cell] {
        self.core.cells()
    }

    pub fn warrior(&self, id: WarriorId) -> &Warrior {
        &self.warriors[id]
    }

    pub fn warriors_remaining(&self) -> usize {
        self.alive.len()
    }

    pub fn is_alive(&self, id: WarriorId) -> bool {
        self.alive.contains(&id)
    }

    pub fn queue(&self, id: WarriorId) -> &VecDeque<Process> {
        &self.queues[id]
    }

    pub fn start(&self, id: WarriorId) -> Address {
        self.starts[id]
    }

    /// Advances one cycle.
    pub fn step(&mut self) -> MatchStatus {
        self.run_cycle(false);
        self.status
    }

    #[tracing::instrument(skip(self))]
    pub fn run(&mut self, option: RunOption) -> MatchStatus {
        match option {
            RunOption::Step => {
                self.run_cycle(false);
            }
            RunOption::Batch(cycles) => {
                for _ in 0..cycles {
                    if self.status != MatchStatus::Running {
                        break;
                    }
                    self.run_cycle(false);
                }
            }
            RunOption::ToCompletion => {
                while self.status == MatchStatus::Running {
                    self.run_cycle(true);
                }
            }
        }
        self.status
    }

    fn run_cycle(&mut self, quiet: bool) {
        if self.status != MatchStatus::Running {
            return;
        }

        for warrior in self.alive.clone() {
            self.execute_one(warrior, quiet);
        }
        self.cycle += 1;

        self.eliminate_starved();
        self.update_status();
    }

    /// A warrior whose queue ran dry this cycle is out of the match; its
    /// cells stay in core but are flagged for display.
    fn eliminate_starved(&mut self) {
        let starved: Vec<WarriorId> = self
            .alive
            .iter()
            .copied()
            .filter(|&warrior| self.queues[warrior].is_empty())
            .collect();

        for warrior in starved {
            self.alive.retain(|&survivor| survivor != warrior);
            self.core.mark_defeated(warrior);
            tracing::info!(
                warrior,
                name = self.warriors[warrior].display_name(),
                cycle = self.cycle,
                "warrior eliminated"
            );
        }
    }

    fn update_status(&mut self) {
        self.status = match self.alive[..] {
            [winner] => MatchStatus::Won(winner),
            // every remaining warrior died in the same cycle
            [] => MatchStatus::Draw,
            _ if self.cycle >= self.config.max_cycles => MatchStatus::Draw,
            _ => MatchStatus::Running,
        };
    }

    fn execute_one(&mut self, warrior: WarriorId, quiet: bool) {
        let Some(process) = self.queues[warrior].pop_front() else {
            return;
        };
        let origin = process.location;
        let cell = self.core.get_mut(origin);
        cell.read_marked = true;
        cell.highlight = false;
        // executing a cell claims it, just like writing to it
        cell.owner = Some(warrior);

        let instruction = self.core.get(origin).instruction;
        let a_address = self.resolve(instruction.a, origin);
        let b_address = self.resolve(instruction.b, origin);

        for location in self.execute(instruction, origin, a_address, b_address, warrior) {
            if !quiet {
                self.core.get_mut(location).highlight = true;
            }
            self.queues[warrior].push_back(Process { location, warrior });
        }
    }

    /// Resolves one operand to an absolute address. Dereferencing is
    /// exactly one hop; the pre-decrement happens before the pointer is
    /// read, the post-increment after, using the pre-increment value.
    fn resolve(&mut self, operand: Operand, origin: Address) -> Address {
        use AddressingMode::*;

        match operand.mode {
            Immediate => origin,
            Direct => self.core.offset(origin, operand.value),
            IndirectA => {
                let pointer = self.core.offset(origin, operand.value);
                self.core
                    .offset(pointer, self.core.get(pointer).instruction.a.value)
            }
            IndirectB => {
                let pointer = self.core.offset(origin, operand.value);
                self.core
                    .offset(pointer, self.core.get(pointer).instruction.b.value)
            }
            PredecrementA => {
                let pointer = self.core.offset(origin, operand.value);
                let value = self
                    .core
                    .wrap(self.core.get(pointer).instruction.a.value as i64 - 1);
                self.core.get_mut(pointer).instruction.a.value = value;
                self.core.offset(pointer, value)
            }
            PredecrementB => {
                let pointer = self.core.offset(origin, operand.value);
                let value = self
                    .core
                    .wrap(self.core.get(pointer).instruction.b.value as i64 - 1);
                self.core.get_mut(pointer).instruction.b.value = value;
                self.core.offset(pointer, value)
            }
            PostincrementA => {
                let pointer = self.core.offset(origin, operand.value);
                let value = self.core.get(pointer).instruction.a.value;
                self.core.get_mut(pointer).instruction.a.value = self.core.wrap(value as i64 + 1);
                self.core.offset(pointer, value)
            }
            PostincrementB => {
                let pointer = self.core.offset(origin, operand.value);
                let value = self.core.get(pointer).instruction.b.value;
                self.core.get_mut(pointer).instruction.b.value = self.core.wrap(value as i64 + 1);
                self.core.offset(pointer, value)
            }
        }
    }

    /// Executes one instruction and returns the locations to re-enqueue.
    /// An empty list means the process died.
    fn execute(
        &mut self,
        instruction: Instruction,
        origin: Address,
        a_address: Address,
        b_address: Address,
        warrior: WarriorId,
    ) -> Vec<Address> {
        let next = self.core.offset(origin, 1);
        let skip = self.core.offset(origin, 2);
        let src = self.core.get(a_address).instruction;
        let dst = self.core.get(b_address).instruction;
        let modifier = instruction.modifier;

        match instruction.opcode {
            Opcode::DAT => Vec::new(),
            Opcode::MOV => {
                self.mov(modifier, src, b_address, warrior);
                vec![next]
            }
            Opcode::ADD => {
                self.arith(modifier, src, dst, b_address, |l, r| l + r);
                vec![next]
            }
            Opcode::SUB => {
                self.arith(modifier, src, dst, b_address, |l, r| l - r);
                vec![next]
            }
            Opcode::MUL => {
                self.arith(modifier, src, dst, b_address, |l, r| l * r);
                vec![next]
            }
            Opcode::DIV => self.div_arith(modifier, src, dst, b_address, next, |l, r| l / r),
            Opcode::MOD => self.div_arith(modifier, src, dst, b_address, next, |l, r| l % r),
            Opcode::JMP => vec![a_address],
            Opcode::JMZ => {
                let zero = match modifier {
                    Modifier::A | Modifier::AB => dst.a.value == 0,
                    Modifier::B | Modifier::BA => dst.b.value == 0,
                    Modifier::F | Modifier::X | Modifier::I => {
                        dst.a.value == 0 && dst.b.value == 0
                    }
                };
                vec![if zero { a_address } else { next }]
            }
            Opcode::JMN => {
                let nonzero = match modifier {
                    Modifier::A | Modifier::AB => dst.a.value != 0,
                    Modifier::B | Modifier::BA => dst.b.value != 0,
                    Modifier::F | Modifier::X | Modifier::I => {
                        dst.a.value != 0 || dst.b.value != 0
                    }
                };
                vec![if nonzero { a_address } else { next }]
            }
            Opcode::DJN => {
                let nonzero = self.decrement_and_test(modifier, b_address);
                vec![if nonzero { a_address } else { next }]
            }
            // the current process continues first, the fork goes last
            Opcode::SPL => vec![next, a_address],
            Opcode::CMP | Opcode::SEQ => {
                vec![if fields_equal(modifier, src, dst) { skip } else { next }]
            }
            Opcode::SNE => {
                vec![if fields_equal(modifier, src, dst) { next } else { skip }]
            }
            Opcode::SLT => {
                vec![if fields_less_than(modifier, src, dst) { skip } else { next }]
            }
            Opcode::NOP => vec![next],
            // never placed in core; the assembler rejects these
            Opcode::LDP | Opcode::STP => Vec::new(),
        }
    }

    fn mov(&mut self, modifier: Modifier, src: Instruction, b_address: Address, warrior: WarriorId) {
        let cell = self.core.get_mut(b_address);
        let dst = &mut cell.instruction;
        match modifier {
            Modifier::A => dst.a.value = src.a.value,
            Modifier::B => dst.b.value = src.b.value,
            Modifier::AB => dst.b.value = src.a.value,
            Modifier::BA => dst.a.value = src.b.value,
            Modifier::F => {
                dst.a.value = src.a.value;
                dst.b.value = src.b.value;
            }
            Modifier::X => {
                dst.b.value = src.a.value;
                dst.a.value = src.b.value;
            }
            Modifier::I => *dst = src,
        }
        cell.owner = Some(warrior);
    }

    fn arith(
        &mut self,
        modifier: Modifier,
        src: Instruction,
        dst: Instruction,
        b_address: Address,
        op: impl Fn(i64, i64) -> i64,
    ) {
        let size = self.core.size() as i64;
        let apply = |l: i32, r: i32| op(l as i64, r as i64).rem_euclid(size) as i32;

        let cell = &mut self.core.get_mut(b_address).instruction;
        match modifier {
            Modifier::A => cell.a.value = apply(dst.a.value, src.a.value),
            Modifier::B => cell.b.value = apply(dst.b.value, src.b.value),
            Modifier::AB => cell.b.value = apply(dst.b.value, src.a.value),
            Modifier::BA => cell.a.value = apply(dst.a.value, src.b.value),
            Modifier::F | Modifier::I => {
                cell.a.value = apply(dst.a.value, src.a.value);
                cell.b.value = apply(dst.b.value, src.b.value);
            }
            Modifier::X => {
                cell.b.value = apply(dst.b.value, src.a.value);
                cell.a.value = apply(dst.a.value, src.b.value);
            }
        }
    }

    /// DIV and MOD: a zero divisor kills the process, but a second field
    /// with a nonzero divisor is still applied before it dies.
    fn div_arith(
        &mut self,
        modifier: Modifier,
        src: Instruction,
        dst: Instruction,
        b_address: Address,
        next: Address,
        op: impl Fn(i64, i64) -> i64,
    ) -> Vec<Address> {
        let size = self.core.size() as i64;
        let apply = |l: i32, r: i32| op(l as i64, r as i64).rem_euclid(size) as i32;
        let mut killed = false;

        let cell = &mut self.core.get_mut(b_address).instruction;
        match modifier {
            Modifier::A => {
                if src.a.value != 0 {
                    cell.a.value = apply(dst.a.value, src.a.value);
                } else {
                    killed = true;
                }
            }
            Modifier::B => {
                if src.b.value != 0 {
                    cell.b.value = apply(dst.b.value, src.b.value);
                } else {
                    killed = true;
                }
            }
            Modifier::AB => {
                if src.a.value != 0 {
                    cell.b.value = apply(dst.b.value, src.a.value);
                } else {
                    killed = true;
                }
            }
            Modifier::BA => {
                if src.b.value != 0 {
                    cell.a.value = apply(dst.a.value, src.b.value);
                } else {
                    killed = true;
                }
            }
            Modifier::F | Modifier::I => {
                if src.a.value != 0 {
                    cell.a.value = apply(dst.a.value, src.a.value);
                } else {
                    killed = true;
                }
                if src.b.value != 0 {
                    cell.b.value = apply(dst.b.value, src.b.value);
                } else {
                    killed = true;
                }
            }
            Modifier::X => {
                if src.a.value != 0 {
                    cell.b.value = apply(dst.b.value, src.a.value);
                } else {
                    killed = true;
                }
                if src.b.value != 0 {
                    cell.a.value = apply(dst.a.value, src.b.value);
                } else {
                    killed = true;
                }
            }
        }

        if killed {
            Vec::new()
        } else {
            vec![next]
        }
    }

    /// DJN: decrement the tested field(s) of the destination, then jump
    /// if anything is left nonzero.
    fn decrement_and_test(&mut self, modifier: Modifier, b_address: Address) -> bool {
        let size = self.core.size() as i64;
        let decrement = |value: i32| (value as i64 - 1).rem_euclid(size) as i32;

        let cell = &mut self.core.get_mut(b_address).instruction;
        match modifier {
            Modifier::A | Modifier::AB => {
                cell.a.value = decrement(cell.a.value);
                cell.a.value != 0
            }
            Modifier::B | Modifier::BA => {
                cell.b.value = decrement(cell.b.value);
                cell.b.value != 0
            }
            Modifier::F | Modifier::X | Modifier::I => {
                cell.a.value = decrement(cell.a.value);
                cell.b.value = decrement(cell.b.value);
                cell.a.value != 0 || cell.b.value != 0
            }
        }
    }
}

fn fields_equal(modifier: Modifier, src: Instruction, dst: Instruction) -> bool {
    match modifier {
        Modifier::A => src.a.value == dst.a.value,
        Modifier::B => src.b.value == dst.b.value,
        Modifier::AB => src.a.value == dst.b.value,
        Modifier::BA => src.b.value == dst.a.value,
        Modifier::F => src.a.value == dst.a.value && src.b.value == dst.b.value,
        Modifier::X => src.a.value == dst.b.value && src.b.value == dst.a.value,
        // whole-instruction comparison, opcode and modes included
        Modifier::I => src == dst,
    }
}

fn fields_less_than(modifier: Modifier, src: Instruction, dst: Instruction) -> bool {
    match modifier {
        Modifier::A => src.a.value < dst.a.value,
        Modifier::B => src.b.value < dst.b.value,
        Modifier::AB => src.a.value < dst.b.value,
        Modifier::BA => src.b.value < dst.a.value,
        Modifier::F | Modifier::I => src.a.value < dst.a.value && src.b.value < dst.b.value,
        Modifier::X => src.a.value < dst.b.value && src.b.value < dst.a.value,
    }
}

#[derive(clap::Args)]
pub struct MatchArgs {
    #[clap(help = "Redcode source files, one warrior each", required = true)]
    warriors: Vec<PathBuf>,
    #[clap(long, default_value_t = 8000)]
    #[clap(help = "Number of cells in core")]
    core_size: usize,
    #[clap(long, default_value_t = 80_000)]
    #[clap(help = "Cycle count at which an undecided match is a draw")]
    max_cycles: usize,
    #[clap(long, default_value_t = 100)]
    #[clap(help = "Maximum warrior length and placement footprint")]
    max_length: usize,
    #[clap(long)]
    #[clap(help = "Report progress every N cycles instead of running silently")]
    batch: Option<usize>,
}

/// `run` subcommand: assemble the given warriors and fight them to a
/// decision.
pub fn compete(args: &MatchArgs) -> anyhow::Result<()> {
    let config = MatchConfig {
        core_size: args.core_size,
        max_cycles: args.max_cycles,
        max_program_length: args.max_length,
    };

    let mut warriors = Vec::with_capacity(args.warriors.len());
    for path in &args.warriors {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read {}", path.display()))?;
        match assembler::compile_code(&source, &config) {
            Ok(warrior) => warriors.push(warrior),
            Err(errors) => {
                for error in &errors {
                    eprintln!("{}: {error}", path.display());
                }
                anyhow::bail!(
                    "{}: compilation failed with {} error(s)",
                    path.display(),
                    errors.len()
                );
            }
        }
    }

    let mut game = Match::new(config, warriors)?;
    let status = match args.batch {
        Some(cycles) => loop {
            let status = game.run(RunOption::Batch(cycles));
            println!(
                "cycle {}/{}: {} warrior(s) remaining",
                game.cycle(),
                config.max_cycles,
                game.warriors_remaining()
            );
            if status != MatchStatus::Running {
                break status;
            }
        },
        None => game.run(RunOption::ToCompletion),
    };

    match status {
        MatchStatus::Won(id) => println!(
            "{} wins after {} cycles",
            game.warrior(id).display_name(),
            game.cycle()
        ),
        MatchStatus::Draw => println!("draw after {} cycles", game.cycle()),
        MatchStatus::Running => unreachable!("the match loop only exits on a decision"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::compile_code;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn small_config() -> MatchConfig {
        MatchConfig {
            core_size: 800,
            max_cycles: 1000,
            max_program_length: 20,
        }
    }

    fn make_match(sources: &[&str]) -> Match {
        let config = small_config();
        let warriors = sources
            .iter()
            .map(|source| compile_code(source, &config).unwrap())
            .collect();
        Match::with_rng(config, warriors, &mut StdRng::seed_from_u64(42)).unwrap()
    }

    fn relative(game: &Match, id: WarriorId, offset: usize) -> &Cell {
        let address = (game.start(id) + offset) % game.config().core_size;
        &game.cells()[address]
    }

    #[test]
    fn test_imp_marches_forward() {
        let mut game = make_match(&["MOV 0, 1", "MOV 0, 1"]);
        game.step();

        for id in 0..2 {
            let copied = relative(&game, id, 1).instruction;
            assert_eq!(copied.to_string(), "MOV.I $0, $1");
            assert_eq!(
                game.queue(id).front().map(|p| p.location),
                Some((game.start(id) + 1) % 800)
            );
        }
        assert_eq!(game.status(), MatchStatus::Running);
    }

    #[test]
    fn test_add_ab_immediate() {
        let mut game = make_match(&["ADD.AB #5, $1\nDAT #0, #0", "MOV 0, 1"]);
        game.step();

        let target = relative(&game, 0, 1).instruction;
        assert_eq!(target.b.value, 5);
        assert_eq!(target.a.value, 0);
    }

    #[test]
    fn test_dat_kills_and_all_dat_warrior_loses() {
        let mut game = make_match(&["MOV 0, 1", "DAT 0, 0\nDAT 0, 0"]);
        game.step();

        assert_eq!(game.status(), MatchStatus::Won(0));
        assert!(!game.is_alive(1));
        assert!(game.queue(1).is_empty());
        assert!(relative(&game, 1, 0).defeated);
        assert!(relative(&game, 1, 1).defeated);
        assert!(!relative(&game, 0, 0).defeated);
    }

    #[test]
    fn test_spl_forks_fifo() {
        let mut game = make_match(&["SPL 2\nJMP 0\nJMP 0", "MOV 0, 1"]);
        game.step();

        let locations: Vec<Address> = game.queue(0).iter().map(|p| p.location).collect();
        let start = game.start(0);
        // continue first, fork last
        assert_eq!(locations, vec![(start + 1) % 800, (start + 2) % 800]);

        // both processes persist on their JMP 0 loops
        game.step();
        assert_eq!(game.queue(0).len(), 2);
    }

    #[test]
    fn test_div_by_zero_kills_without_mutating() {
        let mut game = make_match(&["DIV.A #0, $1\nDAT 3, 4", "MOV 0, 1"]);
        game.step();

        assert!(game.queue(0).is_empty());
        let target = relative(&game, 0, 1).instruction;
        assert_eq!((target.a.value, target.b.value), (3, 4));
        assert_eq!(game.status(), MatchStatus::Won(1));
    }

    #[test]
    fn test_div_f_applies_nonzero_field_before_dying() {
        let mut game = make_match(&["DIV.F $1, $2\nDAT #4, #0\nDAT #12, #5", "MOV 0, 1"]);
        game.step();

        assert!(game.queue(0).is_empty());
        let target = relative(&game, 0, 2).instruction;
        // 12 / 4 went through, 5 / 0 killed the process
        assert_eq!((target.a.value, target.b.value), (3, 5));
    }

    #[test]
    fn test_mutual_elimination_is_a_draw() {
        let mut game = make_match(&["DAT 0, 0", "DAT 0, 0"]);
        game.step();
        assert_eq!(game.status(), MatchStatus::Draw);
        assert_eq!(game.warriors_remaining(), 0);
    }

    #[test]
    fn test_cycle_cap_is_a_draw() {
        let mut game = make_match(&["MOV 0, 1", "MOV 0, 1"]);
        let status = game.run(RunOption::ToCompletion);
        assert_eq!(status, MatchStatus::Draw);
        assert_eq!(game.cycle(), 1000);
    }

    #[test]
    fn test_batch_yields_midway() {
        let mut game = make_match(&["MOV 0, 1", "MOV 0, 1"]);
        let status = game.run(RunOption::Batch(10));
        assert_eq!(status, MatchStatus::Running);
        assert_eq!(game.cycle(), 10);
    }

    /// Steps once and returns how far warrior 0's surviving process is
    /// from its start.
    fn next_offset_after_step(source: &str) -> usize {
        let mut game = make_match(&[source, "MOV 0, 1"]);
        game.step();
        let location = game
            .queue(0)
            .front()
            .map(|p| p.location)
            .expect("the process should survive a jump test");
        (location + 800 - game.start(0)) % 800
    }

    #[test]
    fn test_jmz_requires_every_tested_field_to_be_zero() {
        // (source, expected offset: 2 = jump taken, 1 = fall through)
        let cases = vec![
            ("JMZ.B $2, $1\nDAT #5, #0\nJMP 0", 2),
            ("JMZ.B $2, $1\nDAT #0, #5\nJMP 0", 1),
            ("JMZ.A $2, $1\nDAT #0, #5\nJMP 0", 2),
            ("JMZ.A $2, $1\nDAT #5, #0\nJMP 0", 1),
            ("JMZ.F $2, $1\nDAT #0, #0\nJMP 0", 2),
            // one nonzero field is enough to fall through
            ("JMZ.F $2, $1\nDAT #0, #5\nJMP 0", 1),
            ("JMZ.F $2, $1\nDAT #5, #0\nJMP 0", 1),
        ];
        for (source, expected) in cases {
            assert_eq!(next_offset_after_step(source), expected, "{source}");
        }
    }

    #[test]
    fn test_jmn_jumps_when_any_tested_field_is_nonzero() {
        let cases = vec![
            ("JMN.B $2, $1\nDAT #0, #5\nJMP 0", 2),
            ("JMN.B $2, $1\nDAT #5, #0\nJMP 0", 1),
            ("JMN.A $2, $1\nDAT #5, #0\nJMP 0", 2),
            ("JMN.A $2, $1\nDAT #0, #5\nJMP 0", 1),
            // either nonzero field takes the jump
            ("JMN.F $2, $1\nDAT #0, #5\nJMP 0", 2),
            ("JMN.F $2, $1\nDAT #5, #0\nJMP 0", 2),
            ("JMN.F $2, $1\nDAT #0, #0\nJMP 0", 1),
        ];
        for (source, expected) in cases {
            assert_eq!(next_offset_after_step(source), expected, "{source}");
        }
    }

    #[test]
    fn test_executing_a_cell_claims_it() {
        let mut game = make_match(&["JMP 10", "MOV 0, 1"]);
        // force the jump target back to untouched, unowned core
        let address = (game.start(0) + 10) % 800;
        *game.core.get_mut(address) = Cell::default();

        game.step();
        game.step();

        let target = &game.cells()[address];
        assert_eq!(target.owner, Some(0));
        assert!(target.read_marked);
    }

    #[test]
    fn test_jmp_and_djn() {
        // DJN with a positive counter loops back to the JMP target until
        // the counter hits zero
        let mut game = make_match(&["DJN $2, $1\nDAT #0, #3\nJMP 0", "MOV 0, 1"]);
        game.step();

        assert_eq!(relative(&game, 0, 1).instruction.b.value, 2);
        let jumped = game.queue(0).front().map(|p| p.location);
        assert_eq!(jumped, Some((game.start(0) + 2) % 800));
    }

    #[test]
    fn test_resolve_direct_and_immediate() {
        let mut game = make_match(&["NOP", "NOP"]);
        let origin = 100;
        assert_eq!(
            game.resolve(Operand::new(AddressingMode::Immediate, 55), origin),
            origin
        );
        assert_eq!(
            game.resolve(Operand::direct(25), origin),
            125
        );
        assert_eq!(game.resolve(Operand::direct(-101), 100), 799);
    }

    #[test]
    fn test_resolve_indirect_one_hop() {
        let mut game = make_match(&["NOP", "NOP"]);
        // cell 10 points 5 ahead through its B-field
        game.core.get_mut(10).instruction.b.value = 5;
        game.core.get_mut(15).instruction.b.value = 100;

        let address = game.resolve(Operand::new(AddressingMode::IndirectB, 10), 0);
        // one hop only: 0 + 10 -> +5, never on to 115
        assert_eq!(address, 15);
    }

    #[test]
    fn test_postincrement_advances_pointer_each_read() {
        let mut game = make_match(&["NOP", "NOP"]);
        let pointer = game.core.offset(0, 10);

        for expected in 0..3 {
            let stored = game.core.get(pointer).instruction.b.value;
            assert_eq!(stored, expected);
            let address = game.resolve(Operand::new(AddressingMode::PostincrementB, 10), 0);
            // resolved with the value before the increment
            assert_eq!(address, game.core.offset(pointer, expected));
        }
        assert_eq!(game.core.get(pointer).instruction.b.value, 3);
    }

    #[test]
    fn test_predecrement_happens_before_dereference() {
        let mut game = make_match(&["NOP", "NOP"]);
        game.core.get_mut(10).instruction.a.value = 7;

        let address = game.resolve(Operand::new(AddressingMode::PredecrementA, 10), 0);
        assert_eq!(game.core.get(10).instruction.a.value, 6);
        assert_eq!(address, 16);
    }

    #[test]
    fn test_seq_skips_and_sne_inverts() {
        let mut game = make_match(&["SEQ $1, $2\nDAT #7, #7\nDAT #7, #7\nJMP 0", "MOV 0, 1"]);
        game.step();
        // identical cells: skip over the instruction after SEQ
        assert_eq!(
            game.queue(0).front().map(|p| p.location),
            Some((game.start(0) + 2) % 800)
        );

        let mut game = make_match(&["SNE $1, $2\nDAT #7, #7\nDAT #7, #7\nJMP 0", "MOV 0, 1"]);
        game.step();
        assert_eq!(
            game.queue(0).front().map(|p| p.location),
            Some((game.start(0) + 1) % 800)
        );
    }

    #[test]
    fn test_slt_strict() {
        let mut game = make_match(&["SLT #3, $1\nDAT #0, #3\nJMP 0", "MOV 0, 1"]);
        game.step();
        // 3 < 3 is false, no skip
        assert_eq!(
            game.queue(0).front().map(|p| p.location),
            Some((game.start(0) + 1) % 800)
        );
    }
}
