//! # symsolve-formula
//!
//! Symbols and the formula compiler for symsolve.
//!
//! This crate provides:
//! - Symbol cells and the shared symbol table
//! - Formula parsing (text → target, dependencies, parameters, body AST)
//! - Body evaluation against live symbol values
//! - Macro formulas that compile to callables
//!
//! ## Example
//!
//! ```rust
//! use symsolve_formula::{Expression, Symbol, SymbolTable, Value};
//!
//! let table: SymbolTable = [Symbol::with_value("a", 1.0), Symbol::with_value("b", 2.0)]
//!     .into_iter()
//!     .collect();
//!
//! let exp = Expression::parse("c = a + b * 2").unwrap();
//! exp.evaluate(&table).unwrap();
//! assert_eq!(table.value("c"), Some(Value::Number(5.0)));
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod parser;
pub mod symbol;
pub mod value;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, Scope};
pub use expression::Expression;
pub use parser::{parse_body, scan_identifiers};
pub use symbol::{Symbol, SymbolTable};
pub use value::{Callable, CallableFn, Value};
