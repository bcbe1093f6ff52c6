//! Symbol values
//!
//! A symbol holds either a number or a callable. Numbers follow IEEE-754
//! semantics, so NaN stands for "not yet known" and poisons any arithmetic
//! it reaches. Callables are produced by macro formulas or supplied by the
//! host as native functions.

use crate::error::{FormulaError, FormulaResult};
use std::fmt;
use std::rc::Rc;

/// Signature shared by native functions and compiled macros
pub type CallableFn = dyn Fn(&[Value]) -> FormulaResult<Value>;

/// A value stored in a symbol
#[derive(Clone)]
pub enum Value {
    Number(f64),
    Callable(Callable),
}

impl Value {
    /// The value of a symbol that has never been computed
    pub const UNKNOWN: Value = Value::Number(f64::NAN);

    /// Wrap a host function as a callable value
    ///
    /// `arity` of `None` accepts any number of arguments.
    pub fn native<S, F>(name: S, arity: Option<usize>, func: F) -> Self
    where
        S: Into<String>,
        F: Fn(&[Value]) -> FormulaResult<Value> + 'static,
    {
        Value::Callable(Callable::new(name, arity, func))
    }

    /// Get the number, if this is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Callable(_) => None,
        }
    }

    /// Force conversion to number for arithmetic
    pub fn to_number(&self, operator: &'static str) -> FormulaResult<f64> {
        self.as_number().ok_or(FormulaError::TypeMismatch {
            operator,
            found: self.type_name(),
        })
    }

    /// Get the callable, if this is one
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Callable(c) => Some(c),
            Value::Number(_) => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Callable(_))
    }

    /// True for the NaN placeholder
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Callable(_) => "callable",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::UNKNOWN
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Value::Callable(c)
    }
}

/// Numbers compare by value (so NaN != NaN); callables by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::Callable(l), Value::Callable(r)) => l.ptr_eq(r),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Callable(c) => write!(f, "Callable({})", c.name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Callable(c) => match c.arity() {
                Some(arity) => write!(f, "<{}/{}>", c.name(), arity),
                None => write!(f, "<{}>", c.name()),
            },
        }
    }
}

/// A function value that formula bodies can invoke with call syntax
#[derive(Clone)]
pub struct Callable {
    name: Rc<str>,
    arity: Option<usize>,
    func: Rc<CallableFn>,
}

impl Callable {
    pub fn new<S, F>(name: S, arity: Option<usize>, func: F) -> Self
    where
        S: Into<String>,
        F: Fn(&[Value]) -> FormulaResult<Value> + 'static,
    {
        Self {
            name: Rc::from(name.into()),
            arity,
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of positional arguments, `None` if variadic
    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Invoke with positional arguments
    pub fn call(&self, args: &[Value]) -> FormulaResult<Value> {
        if let Some(expected) = self.arity {
            if args.len() != expected {
                return Err(FormulaError::ArgumentCount {
                    function: self.name.to_string(),
                    expected,
                    actual: args.len(),
                });
            }
        }
        (self.func)(args)
    }

    /// Whether both handles refer to the same underlying function
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}
