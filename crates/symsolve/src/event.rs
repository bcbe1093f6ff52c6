//! Notifications emitted by a [`Solver`](crate::Solver)

/// Something observable happened inside a solver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverEvent {
    /// A formula symbol was recomputed during a solve
    Resolved { symbol: String },
}

impl SolverEvent {
    /// Name of the symbol the event is about
    pub fn symbol(&self) -> &str {
        match self {
            SolverEvent::Resolved { symbol } => symbol,
        }
    }
}

/// Callback registered with [`Solver::on_event`](crate::Solver::on_event)
pub type Listener = Box<dyn FnMut(&SolverEvent)>;
