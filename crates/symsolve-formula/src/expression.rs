//! Formula compiler
//!
//! Turns `target = body` or `target(p, q) = body` into an [`Expression`]:
//! the target name, the names it depends on, the macro parameters, and the
//! parsed body ready to run against a [`SymbolTable`].

use crate::ast::Expr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, Scope};
use crate::parser::{is_identifier, parse_body, scan_identifiers};
use crate::symbol::SymbolTable;
use crate::value::{Callable, Value};
use ahash::AHashMap;
use std::rc::Rc;

/// A compiled formula
#[derive(Debug, Clone)]
pub struct Expression {
    raw: String,
    target: String,
    deps: Vec<String>,
    private_symbols: Vec<String>,
    is_macro: bool,
    body: Rc<Expr>,
}

impl Expression {
    /// Compile formula text
    ///
    /// # Example
    /// ```rust
    /// use symsolve_formula::Expression;
    ///
    /// let exp = Expression::parse("ret = a + (b * c) + 1").unwrap();
    /// assert_eq!(exp.target(), "ret");
    /// assert_eq!(exp.deps(), ["a", "b", "c"]);
    ///
    /// let exp = Expression::parse("add(a, b) = a + b + PI").unwrap();
    /// assert_eq!(exp.private_symbols(), ["a", "b"]);
    /// assert_eq!(exp.deps(), ["PI"]);
    /// ```
    pub fn parse(raw: &str) -> FormulaResult<Self> {
        let text = raw.trim();

        let eq = text
            .find('=')
            .ok_or_else(|| FormulaError::parse(format!("No equal sign found in formula: {text}")))?;
        if eq == 0 {
            return Err(FormulaError::parse(format!(
                "Formula has no target before '=': {text}"
            )));
        }

        let identifiers = scan_identifiers(text);
        if identifiers.is_empty() {
            return Err(FormulaError::parse(format!(
                "No symbol found in formula: {text}"
            )));
        }

        let (lhs, rhs) = (text[..eq].trim(), &text[eq + 1..]);

        let is_macro = lhs.contains('(');
        let (target, private_symbols) = match lhs.find('(') {
            Some(open) => parse_macro_head(lhs, open)?,
            None => {
                // Scalar formula: the first identifier is the target and it
                // must be the whole left-hand side.
                let target = identifiers[0].clone();
                if lhs != target {
                    return Err(FormulaError::parse(format!(
                        "Invalid assignment target '{lhs}' in formula: {text}"
                    )));
                }
                (target, Vec::new())
            }
        };

        let deps = identifiers
            .into_iter()
            .filter(|name| *name != target && !private_symbols.contains(name))
            .collect();

        let body = parse_body(rhs)?;

        Ok(Self {
            raw: raw.to_string(),
            target,
            deps,
            private_symbols,
            is_macro,
            body: Rc::new(body),
        })
    }

    /// Original formula text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Name of the symbol this formula defines
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Names referenced by the body, excluding the target and parameters
    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    /// Macro parameter names, in declaration order
    pub fn private_symbols(&self) -> &[String] {
        &self.private_symbols
    }

    /// True for `name(params) = body` formulas
    pub fn is_macro(&self) -> bool {
        self.is_macro
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }

    /// True for a macro whose body refers to its own name
    ///
    /// Bodies have no conditionals, so such a macro can never return.
    pub fn calls_itself(&self) -> bool {
        self.is_macro && self.body.references(&self.target)
    }

    /// Run the formula against `table`, storing the result in the target
    ///
    /// A scalar formula stores a number (or whatever value its body yields).
    /// A macro formula stores a freshly built callable that evaluates the
    /// body with its parameters bound, reading every other name from the
    /// live table at call time.
    pub fn evaluate(&self, table: &SymbolTable) -> FormulaResult<()> {
        let value = if self.is_macro {
            Value::Callable(self.compile_macro(table))
        } else {
            evaluate(&self.body, &Scope::new(table))?
        };
        table.set_value(&self.target, value);
        Ok(())
    }

    fn compile_macro(&self, table: &SymbolTable) -> Callable {
        let weak = table.downgrade();
        let name = self.target.clone();
        let params = self.private_symbols.clone();
        let body = Rc::clone(&self.body);

        Callable::new(
            self.target.clone(),
            Some(self.private_symbols.len()),
            move |args| {
                let table = weak
                    .upgrade()
                    .ok_or_else(|| FormulaError::Detached(name.clone()))?;
                let locals: AHashMap<&str, Value> = params
                    .iter()
                    .map(String::as_str)
                    .zip(args.iter().cloned())
                    .collect();
                evaluate(&body, &Scope::with_locals(&table, &locals))
            },
        )
    }
}

/// Split `name(p, q)` into the target and its parameter list
fn parse_macro_head(lhs: &str, open: usize) -> FormulaResult<(String, Vec<String>)> {
    let target = lhs[..open].trim();
    if !is_identifier(target) {
        return Err(FormulaError::parse(format!(
            "Invalid macro name '{target}' in '{lhs}'"
        )));
    }

    let params = lhs[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| FormulaError::parse(format!("Unclosed parameter list in '{lhs}'")))?;

    let mut private_symbols: Vec<String> = Vec::new();
    for param in params.split(',').map(str::trim) {
        if param.is_empty() && params.trim().is_empty() {
            break;
        }
        if !is_identifier(param) {
            return Err(FormulaError::parse(format!(
                "Invalid parameter '{param}' in '{lhs}'"
            )));
        }
        if private_symbols.iter().any(|p| p == param) || param == target {
            return Err(FormulaError::parse(format!(
                "Duplicate parameter '{param}' in '{lhs}'"
            )));
        }
        private_symbols.push(param.to_string());
    }

    Ok((target.to_string(), private_symbols))
}
