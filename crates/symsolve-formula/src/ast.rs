//! Formula body Abstract Syntax Tree types

/// Formula body expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),

    /// Reference to a symbol or macro parameter
    Name(String),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },

    /// Call of a callable-valued symbol
    Call { callee: String, args: Vec<Expr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Negate,
}

impl Expr {
    /// Whether `name` appears anywhere in the expression, as a value or a callee
    pub fn references(&self, name: &str) -> bool {
        match self {
            Expr::Number(_) => false,
            Expr::Name(n) => n == name,
            Expr::BinaryOp { left, right, .. } => left.references(name) || right.references(name),
            Expr::UnaryOp { operand, .. } => operand.references(name),
            Expr::Call { callee, args } => {
                callee == name || args.iter().any(|arg| arg.references(name))
            }
        }
    }
}
