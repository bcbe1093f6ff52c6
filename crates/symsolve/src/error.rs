//! Error types for symsolve

use symsolve_formula::FormulaError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while defining or solving symbols
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Formula failed to compile or execute
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Query for a name that was never referenced
    #[error("Symbol not defined: {0}")]
    UnknownSymbol(String),

    /// Direct value assigned to a formula-defined symbol
    #[error("Symbol '{0}' is defined by a formula and cannot be assigned a value")]
    ConflictingDefinition(String),

    /// Circular dependency between formulas
    #[error("Circular reference detected involving symbol {symbol}: {}", .path.join(" -> "))]
    CircularReference { symbol: String, path: Vec<String> },
}
