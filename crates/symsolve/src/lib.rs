//! # symsolve
//!
//! A small incremental reactive-evaluation engine.
//!
//! Symbols are named cells holding either a number or a callable. A symbol
//! is defined by a literal value or by a formula over other symbols, and is
//! recomputed lazily, only when one of its inputs changed since it was last
//! solved.
//!
//! ## Features
//!
//! - Scalar formulas: `total = price * (1 + tax)`
//! - Macro formulas that produce callables: `add(a, b) = a + b`
//! - Native host functions registered as symbol values
//! - Transitive dependency and effect queries
//! - Per-solver event listeners reporting recomputation order
//! - Circular reference detection
//!
//! ## Example
//!
//! ```rust
//! use symsolve::prelude::*;
//!
//! let mut solver = Solver::new();
//! solver.define("add(x, y) = x + y").unwrap();
//! solver.define("c = add(a, b) * 2").unwrap();
//! solver.define_value("a", 1.0).unwrap();
//! solver.define_value("b", 2.0).unwrap();
//!
//! assert_eq!(solver.solve("c").unwrap(), Value::Number(6.0));
//! assert!(solver.solve("add").unwrap().is_callable());
//! ```

pub mod error;
pub mod event;
pub mod prelude;
pub mod solver;

pub use error::{Error, Result};
pub use event::{Listener, SolverEvent};
pub use solver::{CycleCheck, Solver, SolverOptions};

// Re-export formula types
pub use symsolve_formula::{
    Callable, Expression, FormulaError, FormulaResult, Symbol, SymbolTable, Value,
};
