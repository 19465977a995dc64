//! Error types for the Tabula solver.

use thiserror::Error;

use crate::variable::Variable;

/// Errors raised by solver operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// A required constraint cannot hold together with the required set
    /// already installed. The solver is left as it was before the call.
    #[error("Required constraint cannot be satisfied")]
    RequiredFailure,

    #[error("The constraint is not in the solver")]
    ConstraintNotFound,

    #[error("The constraint has already been added to the solver")]
    DuplicateConstraint,

    #[error("Suggested a value for {0}, but it is not an edit variable")]
    NotAnEditVariable(Variable),

    #[error("{0} is already an edit variable")]
    DuplicateEditVariable(Variable),

    #[error("Edit constraints on {0} cannot be required")]
    RequiredEditVariable(Variable),

    #[error("No edit variables have been added")]
    NoEditVariables,

    #[error("No edit session is in progress")]
    NoEditSession,

    /// A violated solver invariant. The solver state is unspecified after
    /// this error.
    #[error("Internal solver error: {0}")]
    Internal(&'static str),
}

impl SolverError {
    /// True for errors that indicate a solver bug rather than misuse.
    pub fn is_internal(&self) -> bool {
        matches!(self, SolverError::Internal(_))
    }
}
