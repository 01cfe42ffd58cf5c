use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol `{0}` is already defined")]
    AlreadyDefined(String),
    #[error("invalid symbol name `{0}`")]
    InvalidName(String),
}

/// Labels and `EQU` constants share one namespace, so redeclaring a name
/// in either category is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolValue {
    /// Index of the instruction the label precedes, counted in the
    /// expanded instruction stream.
    Label(usize),
    /// Verbatim substitution text declared with `EQU`.
    Constant(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub value: SymbolValue,
}

/// The symbol table is used to resolve labels and substitute constants.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }

    pub fn define(&mut self, name: &str, value: SymbolValue) -> Result<(), SymbolError> {
        if !is_valid_name(name) {
            return Err(SymbolError::InvalidName(name.to_string()));
        }
        if self.find(name).is_some() {
            return Err(SymbolError::AlreadyDefined(name.to_string()));
        }
        self.symbols.push(Symbol {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    pub fn constants(&self) -> impl Iterator<Item = (&str, &str)> {
        self.symbols.iter().filter_map(|symbol| match &symbol.value {
            SymbolValue::Constant(text) => Some((symbol.name.as_str(), text.as_str())),
            SymbolValue::Label(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A symbol name is alphanumeric (underscores allowed) and not purely
/// numeric, so it can never be mistaken for a literal.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_define_and_find() {
        let mut table = SymbolTable::new();
        table
            .define("step", SymbolValue::Constant("4".to_string()))
            .unwrap();
        table.define("start", SymbolValue::Label(2)).unwrap();

        assert_eq!(
            table.find("start").map(|symbol| &symbol.value),
            Some(&SymbolValue::Label(2))
        );
        assert_eq!(table.find("missing"), None);
        assert_eq!(table.constants().collect::<Vec<_>>(), vec![("step", "4")]);
    }

    #[test]
    fn test_shared_namespace() {
        let mut table = SymbolTable::new();
        table.define("imp", SymbolValue::Label(0)).unwrap();
        assert_eq!(
            table.define("imp", SymbolValue::Constant("1".to_string())),
            Err(SymbolError::AlreadyDefined("imp".to_string()))
        );
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("loop2"));
        assert!(is_valid_name("has_underscore"));
        assert!(!is_valid_name("123"));
        assert!(!is_valid_name("bad-name"));
        assert!(!is_valid_name(""));
    }
}
