//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while compiling or executing a formula
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Malformed formula text
    #[error("Parse error: {0}")]
    Parse(String),

    /// Identifier not visible in the evaluation scope
    #[error("Unresolved symbol: {0}")]
    UnresolvedSymbol(String),

    /// Call syntax applied to a value that is not a callable
    #[error("Symbol is not callable: {0}")]
    NotCallable(String),

    /// Arithmetic applied to a non-numeric value
    #[error("Operator '{operator}' expects numbers, got {found}")]
    TypeMismatch {
        operator: &'static str,
        found: &'static str,
    },

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// Macro invoked after its symbol table was dropped
    #[error("Callable '{0}' outlived its symbol table")]
    Detached(String),
}

impl FormulaError {
    /// Create a parse error with a message
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        FormulaError::Parse(msg.into())
    }
}
