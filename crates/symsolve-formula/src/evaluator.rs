//! Formula evaluator
//!
//! Walks a body AST against a [`Scope`] to produce a [`Value`].

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::symbol::SymbolTable;
use crate::value::Value;
use ahash::AHashMap;

/// Names visible to a formula body during one evaluation
///
/// Local bindings (macro parameters) shadow the symbol table.
pub struct Scope<'a> {
    table: &'a SymbolTable,
    locals: Option<&'a AHashMap<&'a str, Value>>,
}

impl<'a> Scope<'a> {
    /// Scope that sees every symbol in the table
    pub fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            locals: None,
        }
    }

    /// Scope with local bindings layered over the table
    pub fn with_locals(table: &'a SymbolTable, locals: &'a AHashMap<&'a str, Value>) -> Self {
        Self {
            table,
            locals: Some(locals),
        }
    }

    /// Resolve a name, locals first
    pub fn lookup(&self, name: &str) -> FormulaResult<Value> {
        if let Some(value) = self.locals.and_then(|locals| locals.get(name)) {
            return Ok(value.clone());
        }
        self.table
            .value(name)
            .ok_or_else(|| FormulaError::UnresolvedSymbol(name.to_string()))
    }
}

/// Evaluate a body expression
pub fn evaluate(expr: &Expr, scope: &Scope) -> FormulaResult<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),

        Expr::Name(name) => scope.lookup(name),

        Expr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, scope),

        Expr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, scope),

        Expr::Call { callee, args } => evaluate_call(callee, args, scope),
    }
}

/// Evaluate a binary operation
///
/// Plain IEEE arithmetic: NaN propagates and division by zero yields an
/// infinity.
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &Expr,
    right: &Expr,
    scope: &Scope,
) -> FormulaResult<Value> {
    let l = evaluate(left, scope)?.to_number(op.symbol())?;
    let r = evaluate(right, scope)?.to_number(op.symbol())?;

    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => l / r,
    };
    Ok(Value::Number(result))
}

/// Evaluate a unary operation
fn evaluate_unary_op(op: UnaryOperator, operand: &Expr, scope: &Scope) -> FormulaResult<Value> {
    let n = match op {
        UnaryOperator::Plus => evaluate(operand, scope)?.to_number("+")?,
        UnaryOperator::Negate => -evaluate(operand, scope)?.to_number("-")?,
    };
    Ok(Value::Number(n))
}

/// Evaluate a call of a callable-valued name
fn evaluate_call(callee: &str, args: &[Expr], scope: &Scope) -> FormulaResult<Value> {
    let target = scope.lookup(callee)?;
    let func = target
        .as_callable()
        .ok_or_else(|| FormulaError::NotCallable(callee.to_string()))?;

    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, scope)?);
    }

    func.call(&evaluated_args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_body;
    use crate::symbol::Symbol;
    use pretty_assertions::assert_eq;

    fn eval_in(body: &str, table: &SymbolTable) -> FormulaResult<Value> {
        let ast = parse_body(body)?;
        evaluate(&ast, &Scope::new(table))
    }

    fn eval(body: &str) -> FormulaResult<Value> {
        eval_in(body, &SymbolTable::new())
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("1+2").unwrap(), Value::Number(3.0));
        assert_eq!(eval("10-4").unwrap(), Value::Number(6.0));
        assert_eq!(eval("3*4").unwrap(), Value::Number(12.0));
        assert_eq!(eval("10/4").unwrap(), Value::Number(2.5));
        assert_eq!(eval("1+2*3").unwrap(), Value::Number(7.0));
        assert_eq!(eval("(1+2)*3").unwrap(), Value::Number(9.0));
        assert_eq!(eval("-(2+3)").unwrap(), Value::Number(-5.0));
    }

    #[test]
    fn test_evaluate_division_by_zero() {
        assert_eq!(eval("1/0").unwrap(), Value::Number(f64::INFINITY));
        assert!(eval("0/0").unwrap().is_nan());
    }

    #[test]
    fn test_evaluate_names() {
        let table: SymbolTable = [
            Symbol::with_value("a", 1.0),
            Symbol::with_value("b", 2.0),
            Symbol::with_value("c", 3.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            eval_in("a + (b * c) + 1", &table).unwrap(),
            Value::Number(8.0)
        );
    }

    #[test]
    fn test_nan_poisons_arithmetic() {
        let table = SymbolTable::new();
        table.ensure("b");
        assert!(eval_in("b + 1", &table).unwrap().is_nan());
    }

    #[test]
    fn test_unresolved_symbol() {
        assert_eq!(
            eval("missing * 2").unwrap_err(),
            FormulaError::UnresolvedSymbol("missing".into())
        );
    }

    #[test]
    fn test_locals_shadow_table() {
        let table: SymbolTable = [Symbol::with_value("x", 100.0)].into_iter().collect();
        let mut locals = AHashMap::new();
        locals.insert("x", Value::Number(1.0));

        let ast = parse_body("x + 1").unwrap();
        let result = evaluate(&ast, &Scope::with_locals(&table, &locals)).unwrap();
        assert_eq!(result, Value::Number(2.0));
    }

    #[test]
    fn test_call_native() {
        let table = SymbolTable::new();
        table.set_value(
            "mul",
            Value::native("mul", Some(2), |args| {
                Ok(Value::Number(args[0].to_number("mul")? * args[1].to_number("mul")?))
            }),
        );
        assert_eq!(eval_in("mul(3, 4) + 1", &table).unwrap(), Value::Number(13.0));
    }

    #[test]
    fn test_call_non_callable() {
        let table: SymbolTable = [Symbol::with_value("n", 1.0)].into_iter().collect();
        assert_eq!(
            eval_in("n(1)", &table).unwrap_err(),
            FormulaError::NotCallable("n".into())
        );
    }

    #[test]
    fn test_arithmetic_on_callable() {
        let table = SymbolTable::new();
        table.set_value("f", Value::native("f", None, |_| Ok(Value::Number(0.0))));
        assert!(matches!(
            eval_in("f + 1", &table),
            Err(FormulaError::TypeMismatch { operator: "+", .. })
        ));
    }
}
