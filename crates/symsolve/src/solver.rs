//! Dependency tracking and lazy recomputation
//!
//! The [`Solver`] owns the symbol table and every compiled formula. Defining
//! a formula or assigning a value marks the symbol and everything downstream
//! of it stale; nothing is recomputed until a symbol is solved. Solving walks
//! the dependency graph depth first and re-runs only the stale formulas,
//! dependencies before dependents.
//!
//! # Example
//!
//! ```rust
//! use symsolve::{Solver, Value};
//!
//! let mut solver = Solver::new();
//! solver.define("a = 1").unwrap();
//! solver.define("b = a + 1").unwrap();
//! assert_eq!(solver.solve("b").unwrap(), Value::Number(2.0));
//!
//! solver.define("a = 10").unwrap();
//! assert_eq!(solver.solve("b").unwrap(), Value::Number(11.0));
//! ```

use crate::event::{Listener, SolverEvent};
use crate::{Error, Result};
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;
use std::fmt;
use symsolve_formula::{Expression, SymbolTable, Value};

/// When circular formulas are reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleCheck {
    /// Reject a formula whose target is reachable from its own dependencies
    #[default]
    OnDefine,
    /// Accept any formula; fail the solve that walks into a cycle
    OnSolve,
}

/// Options for a solver
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// How circular formulas are detected (default: on define)
    pub cycle_check: CycleCheck,
    /// Deliver events to registered listeners (default: true)
    pub emit_events: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            cycle_check: CycleCheck::OnDefine,
            emit_events: true,
        }
    }
}

/// Registry of symbols and formulas with lazy recomputation
pub struct Solver {
    options: SolverOptions,
    /// Every referenced symbol, formula-defined or not
    symbols: SymbolTable,
    /// Compiled formulas keyed by target
    expressions: AHashMap<String, Expression>,
    /// Symbols whose stored value may be outdated
    stale: AHashSet<String>,
    listeners: Vec<Listener>,
}

/// Bookkeeping for one solve walk
#[derive(Default)]
struct Walk {
    /// Formulas currently being resolved, outermost first
    path: Vec<String>,
    /// Symbols already settled during this walk
    settled: AHashSet<String>,
}

impl Solver {
    /// Create an empty solver with default options
    pub fn new() -> Self {
        Self::with_options(SolverOptions::default())
    }

    /// Create an empty solver with custom options
    pub fn with_options(options: SolverOptions) -> Self {
        Self {
            options,
            symbols: SymbolTable::new(),
            expressions: AHashMap::new(),
            stale: AHashSet::new(),
            listeners: Vec::new(),
        }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Register a listener for solver events
    pub fn on_event<F>(&mut self, listener: F)
    where
        F: FnMut(&SolverEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Register a formula such as `c = a + b` or `add(x, y) = x + y`
    ///
    /// Replaces any previous formula for the same target. The target and
    /// everything depending on it become stale.
    pub fn define(&mut self, formula: &str) -> Result<()> {
        let exp = Expression::parse(formula)?;
        let target = exp.target().to_string();

        if self.options.cycle_check == CycleCheck::OnDefine {
            let path = if exp.calls_itself() {
                Some(vec![target.clone(), target.clone()])
            } else {
                self.dependency_path(&target, exp.deps())
            };
            if let Some(path) = path {
                tracing::warn!(symbol = %target, formula = exp.raw(), "rejected circular formula");
                return Err(Error::CircularReference {
                    symbol: target,
                    path,
                });
            }
        }

        self.symbols.ensure(&target);
        for dep in exp.deps() {
            self.symbols.ensure(dep);
        }
        let dep_count = exp.deps().len();
        self.expressions.insert(target.clone(), exp);

        let invalidated = self.invalidate(&target);
        tracing::debug!(symbol = %target, deps = dep_count, invalidated, "formula defined");
        Ok(())
    }

    /// Assign a number or callable to a symbol that has no formula
    ///
    /// The symbol and everything depending on it become stale.
    pub fn define_value<V: Into<Value>>(&mut self, name: &str, value: V) -> Result<()> {
        if self.expressions.contains_key(name) {
            tracing::warn!(symbol = name, "rejected value for formula-defined symbol");
            return Err(Error::ConflictingDefinition(name.to_string()));
        }

        self.symbols.set_value(name, value);

        let invalidated = self.invalidate(name);
        tracing::debug!(symbol = name, invalidated, "value defined");
        Ok(())
    }

    /// Current value of a symbol, recomputing stale formulas first
    pub fn solve(&mut self, name: &str) -> Result<Value> {
        if !self.symbols.contains(name) {
            return Err(Error::UnknownSymbol(name.to_string()));
        }

        if self.stale.contains(name) {
            self.resolve(name, &mut Walk::default())?;
        }

        self.symbols
            .value(name)
            .ok_or_else(|| Error::UnknownSymbol(name.to_string()))
    }

    /// Every symbol `name` depends on, directly or transitively
    pub fn deps(&self, name: &str) -> BTreeSet<String> {
        let mut deps = BTreeSet::new();
        self.collect_deps(name, &mut deps);
        deps.remove(name);
        deps
    }

    /// Every formula symbol that depends on `name`, directly or transitively
    pub fn effects(&self, name: &str) -> BTreeSet<String> {
        self.expressions
            .keys()
            .filter(|target| self.deps(target).contains(name))
            .cloned()
            .collect()
    }

    /// Whether `name` has been referenced by a formula or assignment
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains(name)
    }

    /// Whether `name` will be recomputed on its next solve
    pub fn is_stale(&self, name: &str) -> bool {
        self.stale.contains(name)
    }

    /// The formula defining `name`, if any
    pub fn expression(&self, name: &str) -> Option<&Expression> {
        self.expressions.get(name)
    }

    /// All known symbol names, sorted
    pub fn symbols(&self) -> Vec<String> {
        self.symbols.keys()
    }

    // === Internals ===

    /// Mark `name` and its effects stale, returning how many were marked
    fn invalidate(&mut self, name: &str) -> usize {
        let effects = self.effects(name);
        let count = effects.len() + 1;
        self.stale.insert(name.to_string());
        self.stale.extend(effects);
        count
    }

    fn collect_deps(&self, current: &str, deps: &mut BTreeSet<String>) {
        let Some(exp) = self.expressions.get(current) else {
            return;
        };
        for dep in exp.deps() {
            if deps.insert(dep.clone()) {
                self.collect_deps(dep, deps);
            }
        }
    }

    /// Path `target -> ... -> target` if `target` is reachable from `deps`
    fn dependency_path(&self, target: &str, deps: &[String]) -> Option<Vec<String>> {
        let mut visited = AHashSet::new();
        let mut path = vec![target.to_string()];
        self.search_path(target, deps, &mut visited, &mut path)
            .then_some(path)
    }

    fn search_path(
        &self,
        goal: &str,
        deps: &[String],
        visited: &mut AHashSet<String>,
        path: &mut Vec<String>,
    ) -> bool {
        for dep in deps {
            path.push(dep.clone());
            if dep == goal {
                return true;
            }
            if visited.insert(dep.clone()) {
                if let Some(exp) = self.expressions.get(dep) {
                    if self.search_path(goal, exp.deps(), visited, path) {
                        return true;
                    }
                }
            }
            path.pop();
        }
        false
    }

    /// Settle `name` after all of its dependencies (post-order DFS)
    fn resolve(&mut self, name: &str, walk: &mut Walk) -> Result<()> {
        if walk.settled.contains(name) {
            return Ok(());
        }

        let (deps, calls_itself) = match self.expressions.get(name) {
            Some(exp) => (exp.deps().to_vec(), exp.calls_itself()),
            None => {
                // Plain values are never recomputed
                self.stale.remove(name);
                walk.settled.insert(name.to_string());
                return Ok(());
            }
        };

        // A macro that calls itself is a cycle the dependency edges never show
        let cycle = if calls_itself {
            Some(vec![name.to_string(), name.to_string()])
        } else {
            walk.path.iter().position(|n| n == name).map(|start| {
                let mut path = walk.path[start..].to_vec();
                path.push(name.to_string());
                path
            })
        };
        if let Some(path) = cycle {
            tracing::warn!(symbol = name, "circular reference while solving");
            return Err(Error::CircularReference {
                symbol: name.to_string(),
                path,
            });
        }

        walk.path.push(name.to_string());
        for dep in &deps {
            self.resolve(dep, walk)?;
        }
        walk.path.pop();

        if self.stale.contains(name) {
            if let Some(exp) = self.expressions.get(name) {
                exp.evaluate(&self.symbols)?;
            }
            self.stale.remove(name);
            tracing::trace!(symbol = name, "resolved");
            self.emit(SolverEvent::Resolved {
                symbol: name.to_string(),
            });
        }

        walk.settled.insert(name.to_string());
        Ok(())
    }

    fn emit(&mut self, event: SolverEvent) {
        if !self.options.emit_events {
            return;
        }
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("options", &self.options)
            .field("symbols", &self.symbols.len())
            .field("expressions", &self.expressions.len())
            .field("stale", &self.stale.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn record(solver: &mut Solver) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        solver.on_event(move |ev| sink.borrow_mut().push(ev.symbol().to_string()));
        log
    }

    #[test]
    fn test_define_creates_symbols() {
        let mut solver = Solver::new();
        solver.define("c = a + b").unwrap();

        assert_eq!(solver.symbols(), vec!["a", "b", "c"]);
        assert!(solver.is_stale("c"));
        assert!(!solver.is_stale("a"));
        assert_eq!(solver.expression("c").unwrap().deps(), ["a", "b"]);
        assert!(solver.expression("a").is_none());
    }

    #[test]
    fn test_define_preserves_existing_values() {
        let mut solver = Solver::new();
        solver.define_value("a", 4.0).unwrap();
        solver.define("b = a * 2").unwrap();
        assert_eq!(solver.solve("a").unwrap(), Value::Number(4.0));
        assert_eq!(solver.solve("b").unwrap(), Value::Number(8.0));
    }

    #[test]
    fn test_malformed_formula_has_no_effect() {
        let mut solver = Solver::new();
        assert!(matches!(solver.define("x + 1"), Err(Error::Formula(_))));
        assert!(matches!(solver.define("= 1"), Err(Error::Formula(_))));
        assert!(matches!(solver.define("1 = 2"), Err(Error::Formula(_))));
        assert!(solver.symbols().is_empty());
    }

    #[test]
    fn test_value_invalidates_effects() {
        let mut solver = Solver::new();
        solver.define_value("x", 1.0).unwrap();
        solver.define("y = x + 1").unwrap();
        solver.define("z = y * 2").unwrap();
        assert_eq!(solver.solve("z").unwrap(), Value::Number(4.0));
        assert!(!solver.is_stale("y"));

        solver.define_value("x", 2.0).unwrap();
        assert!(solver.is_stale("x"));
        assert!(solver.is_stale("y"));
        assert!(solver.is_stale("z"));
        assert_eq!(solver.solve("z").unwrap(), Value::Number(6.0));
    }

    #[test]
    fn test_leaf_solve_emits_nothing() {
        let mut solver = Solver::new();
        let log = record(&mut solver);
        solver.define_value("x", 1.0).unwrap();
        assert_eq!(solver.solve("x").unwrap(), Value::Number(1.0));
        assert!(!solver.is_stale("x"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unknown_symbol() {
        let mut solver = Solver::new();
        assert_eq!(
            solver.solve("nope").unwrap_err(),
            Error::UnknownSymbol("nope".into())
        );
    }

    #[test]
    fn test_conflicting_definition() {
        let mut solver = Solver::new();
        solver.define("a = 1").unwrap();
        assert_eq!(solver.solve("a").unwrap(), Value::Number(1.0));

        assert_eq!(
            solver.define_value("a", 5.0).unwrap_err(),
            Error::ConflictingDefinition("a".into())
        );
        assert!(!solver.is_stale("a"));
        assert_eq!(solver.solve("a").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_cycle_rejected_on_define() {
        let mut solver = Solver::new();
        solver.define("a = b + 1").unwrap();
        solver.define("b = c + 1").unwrap();

        let err = solver.define("c = a + 1").unwrap_err();
        assert_eq!(
            err,
            Error::CircularReference {
                symbol: "c".into(),
                path: vec!["c".into(), "a".into(), "b".into(), "c".into()],
            }
        );
        assert!(solver.expression("c").is_none());
    }

    #[test]
    fn test_self_calling_macro_rejected_on_define() {
        let mut solver = Solver::new();
        assert_eq!(solver.options().cycle_check, CycleCheck::OnDefine);

        let err = solver.define("f(x) = f(x) + 1").unwrap_err();
        assert_eq!(
            err,
            Error::CircularReference {
                symbol: "f".into(),
                path: vec!["f".into(), "f".into()],
            }
        );
        assert!(solver.expression("f").is_none());
        assert!(!solver.contains("f"));
    }

    #[test]
    fn test_self_calling_macro_fails_solve() {
        let mut solver = Solver::with_options(SolverOptions {
            cycle_check: CycleCheck::OnSolve,
            ..Default::default()
        });
        assert_eq!(solver.options().cycle_check, CycleCheck::OnSolve);
        solver.define("f(x) = f(x) + 1").unwrap();
        solver.define("y = f(1)").unwrap();

        let err = solver.solve("y").unwrap_err();
        assert_eq!(
            err,
            Error::CircularReference {
                symbol: "f".into(),
                path: vec!["f".into(), "f".into()],
            }
        );
        assert!(solver.is_stale("f"));
        assert!(solver.is_stale("y"));
    }

    #[test]
    fn test_cycle_reported_on_solve() {
        let mut solver = Solver::with_options(SolverOptions {
            cycle_check: CycleCheck::OnSolve,
            ..Default::default()
        });
        solver.define("a = b + 1").unwrap();
        solver.define("b = a + 1").unwrap();

        // Both traversals terminate on the cycle
        assert_eq!(solver.deps("a"), set(&["b"]));
        assert_eq!(solver.effects("a"), set(&["b"]));
        assert_eq!(solver.effects("b"), set(&["a"]));

        let err = solver.solve("a").unwrap_err();
        assert_eq!(
            err,
            Error::CircularReference {
                symbol: "a".into(),
                path: vec!["a".into(), "b".into(), "a".into()],
            }
        );
        assert!(solver.is_stale("a"));
    }

    #[test]
    fn test_self_reference_reads_previous_value() {
        let mut solver = Solver::new();
        solver.define_value("step", 1.0).unwrap();
        solver.define("n = 0").unwrap();
        assert_eq!(solver.solve("n").unwrap(), Value::Number(0.0));

        solver.define("n = n + step").unwrap();
        assert_eq!(solver.solve("n").unwrap(), Value::Number(1.0));
        assert_eq!(solver.solve("n").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_failed_evaluation_stays_stale() {
        let mut solver = Solver::new();
        solver.define_value("n", 3.0).unwrap();
        solver.define("m = n(1)").unwrap();

        assert!(matches!(
            solver.solve("m"),
            Err(Error::Formula(symsolve_formula::FormulaError::NotCallable(_)))
        ));
        assert!(solver.is_stale("m"));
    }

    #[test]
    fn test_events_can_be_disabled() {
        let mut solver = Solver::with_options(SolverOptions {
            emit_events: false,
            ..Default::default()
        });
        assert!(!solver.options().emit_events);
        let log = record(&mut solver);
        solver.define("a = 1").unwrap();
        assert_eq!(solver.solve("a").unwrap(), Value::Number(1.0));
        assert!(log.borrow().is_empty());
        assert!(!solver.is_stale("a"));
    }

    #[test]
    fn test_diamond_resolves_shared_node_once() {
        let mut solver = Solver::new();
        let log = record(&mut solver);
        solver.define("a = 1").unwrap();
        solver.define("b = a + 1").unwrap();
        solver.define("c = a + 2").unwrap();
        solver.define("e = b + c").unwrap();

        assert_eq!(solver.solve("e").unwrap(), Value::Number(5.0));
        assert_eq!(*log.borrow(), vec!["a", "b", "c", "e"]);
    }
}
