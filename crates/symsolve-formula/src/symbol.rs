//! Symbol cells and the shared table that holds them

use crate::value::Value;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A named, mutable value cell
#[derive(Debug, Clone)]
pub struct Symbol {
    key: String,
    value: Value,
}

impl Symbol {
    /// Create an empty cell awaiting its first value
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self::with_value(key, Value::UNKNOWN)
    }

    /// Create a cell pre-seeded with a value or callable
    pub fn with_value<S: Into<String>, V: Into<Value>>(key: S, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value<V: Into<Value>>(&mut self, value: V) {
        self.value = value.into();
    }
}

/// Shared registry of symbols keyed by name
///
/// Cloning the table yields another handle to the same cells. Compiled
/// macros hold a weak handle so they always read the live values at
/// call time.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    cells: Rc<RefCell<AHashMap<String, Symbol>>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cells.borrow().contains_key(key)
    }

    /// Current value of a symbol
    pub fn value(&self, key: &str) -> Option<Value> {
        self.cells.borrow().get(key).map(|s| s.value.clone())
    }

    /// Create the symbol if missing, keeping any existing value
    pub fn ensure(&self, key: &str) {
        self.cells
            .borrow_mut()
            .entry(key.to_string())
            .or_insert_with(|| Symbol::new(key));
    }

    /// Create or update a symbol's value
    pub fn set_value<V: Into<Value>>(&self, key: &str, value: V) {
        let value = value.into();
        let mut cells = self.cells.borrow_mut();
        match cells.get_mut(key) {
            Some(symbol) => symbol.set_value(value),
            None => {
                cells.insert(key.to_string(), Symbol::with_value(key, value));
            }
        }
    }

    /// Insert a pre-built symbol, replacing any cell with the same key
    pub fn insert(&self, symbol: Symbol) {
        self.cells
            .borrow_mut()
            .insert(symbol.key.clone(), symbol);
    }

    /// All symbol names, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.cells.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.cells.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.borrow().is_empty()
    }

    pub(crate) fn downgrade(&self) -> WeakSymbolTable {
        WeakSymbolTable(Rc::downgrade(&self.cells))
    }
}

impl FromIterator<Symbol> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let table = SymbolTable::new();
        for symbol in iter {
            table.insert(symbol);
        }
        table
    }
}

/// Non-owning handle captured by compiled macros
#[derive(Debug, Clone)]
pub(crate) struct WeakSymbolTable(Weak<RefCell<AHashMap<String, Symbol>>>);

impl WeakSymbolTable {
    pub(crate) fn upgrade(&self) -> Option<SymbolTable> {
        self.0.upgrade().map(|cells| SymbolTable { cells })
    }
}
