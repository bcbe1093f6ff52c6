//! Prelude module - common imports for symsolve users
//!
//! ```rust
//! use symsolve::prelude::*;
//! ```

pub use crate::{
    // Formula types
    Callable,
    CycleCheck,
    // Error types
    Error,
    Expression,
    Result,
    // Main types
    Solver,
    SolverEvent,
    SolverOptions,
    Value,
};
