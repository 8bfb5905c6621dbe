//! Tabla de símbolos.
//!
//! El lenguaje tiene un único ámbito global. El parser registra cada
//! pin, variable y función la primera vez que encuentra su declaración,
//! y el generador consulta la tabla para decidir cómo representar
//! valores. La tabla vive exactamente lo que dura una compilación y
//! nunca se comparte entre compilaciones.

use crate::parse::{PinMode, Type, Value};
use std::collections::{hash_map::Entry, HashMap};

/// Descriptor de un nombre declarado.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// Pin configurado por medio de `пин`.
    Pin { mode: PinMode },

    /// Variable con su tipo y su valor inicial, si existe.
    Variable { typ: Type, value: Option<Value> },

    /// Función de usuario.
    Function { parameters: Vec<Type>, returns: Type },
}

/// Tabla plana y de solo inserción.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registra un símbolo si el nombre no existe todavía.
    ///
    /// Retorna `false` si el nombre ya estaba declarado, en cuyo caso
    /// la primera declaración se conserva intacta.
    pub fn declare<S: Into<String>>(&mut self, name: S, symbol: Symbol) -> bool {
        match self.symbols.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(symbol);
                true
            }
        }
    }

    /// Busca un símbolo por nombre.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Determina si un nombre corresponde a un pin declarado.
    pub fn is_pin(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some(Symbol::Pin { .. }))
    }

    /// Tipo de una variable declarada.
    pub fn variable_type(&self, name: &str) -> Option<Type> {
        match self.lookup(name) {
            Some(Symbol::Variable { typ, .. }) => Some(*typ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_declaration_wins() {
        let mut symbols = SymbolTable::new();
        assert!(symbols.declare("x", Symbol::Variable { typ: Type::Int, value: None }));
        assert!(!symbols.declare("x", Symbol::Pin { mode: PinMode::Output }));

        assert_eq!(symbols.variable_type("x"), Some(Type::Int));
        assert!(!symbols.is_pin("x"));
    }

    #[test]
    fn kinds_are_distinguished() {
        let mut symbols = SymbolTable::new();
        symbols.declare("13", Symbol::Pin { mode: PinMode::Output });
        symbols.declare("b", Symbol::Variable { typ: Type::Bool, value: None });

        assert!(symbols.is_pin("13"));
        assert!(!symbols.is_pin("b"));
        assert_eq!(symbols.variable_type("13"), None);
        assert_eq!(symbols.variable_type("b"), Some(Type::Bool));
        assert_eq!(symbols.lookup("c"), None);
    }
}
