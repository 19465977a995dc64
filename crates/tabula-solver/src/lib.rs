//! Incremental linear constraint solver.
//!
//! [`SimplexSolver`] maintains a set of linear equalities and inequalities
//! over real variables, each tagged with a strength. Required constraints
//! must hold; the weighted error of the others is minimized, and any amount
//! of a stronger constraint's error outweighs any amount of a weaker one's.
//!
//! Constraints can be added and removed at any time. Interactive updates go
//! through edit sessions:
//!
//! ```ignore
//! let mut solver = SimplexSolver::new();
//! let x = solver.new_variable();
//! solver.add_stay(x, Strength::Weak, 1.0)?;
//! solver.add_edit_var(x, Strength::Strong)?;
//! solver.begin_edit()?;
//! solver.suggest_value(x, 42.0)?;
//! solver.resolve()?;
//! solver.end_edit()?;
//! ```

mod config;
mod diagnostics;
mod edit;
mod solver;
mod tableau;

pub use config::SolverConfig;
pub use diagnostics::{DiagnosticSink, LogSink, MemorySink};
pub use edit::EditInfo;
pub use solver::SimplexSolver;
pub use tabula_core::*;
