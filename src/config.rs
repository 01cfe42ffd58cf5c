use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("core size must be a positive integer")]
    InvalidCoreSize,
    #[error("maximum cycle count must be a positive integer")]
    InvalidMaxCycles,
    #[error("maximum program length must be a positive integer")]
    InvalidMaxProgramLength,
    #[error("cannot begin a match without warriors")]
    NoWarriors,
    #[error("core size {core_size} is smaller than max. program length {max_program_length} * warrior count {warriors}")]
    CoreTooSmall {
        core_size: usize,
        max_program_length: usize,
        warriors: usize,
    },
    #[error("warrior `{name}` is longer than the maximum program length {max}")]
    WarriorTooLong { name: String, max: usize },
}

/// Parameters of one match. Also feeds the assembler its built-in
/// constants (CORESIZE, MAXCYCLES, MAXLENGTH).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    pub core_size: usize,
    pub max_cycles: usize,
    pub max_program_length: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            core_size: 8000,
            max_cycles: 80_000,
            max_program_length: 100,
        }
    }
}

impl MatchConfig {
    /// Rejects unusable parameters before any match state is built. The
    /// core size bound is what lets random placement terminate.
    pub fn validate(&self, warrior_count: usize) -> Result<(), ConfigError> {
        if self.core_size == 0 {
            return Err(ConfigError::InvalidCoreSize);
        }
        if self.max_cycles == 0 {
            return Err(ConfigError::InvalidMaxCycles);
        }
        if self.max_program_length == 0 {
            return Err(ConfigError::InvalidMaxProgramLength);
        }
        if warrior_count == 0 {
            return Err(ConfigError::NoWarriors);
        }
        if self.core_size < self.max_program_length * warrior_count {
            return Err(ConfigError::CoreTooSmall {
                core_size: self.core_size,
                max_program_length: self.max_program_length,
                warriors: warrior_count,
            });
        }
        Ok(())
    }
}
