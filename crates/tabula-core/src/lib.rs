//! Core types for the Tabula incremental constraint solver.
//!
//! This crate provides the data model shared by the solver:
//! - Variables and the internal tableau symbols
//! - Sparse linear expressions
//! - Strengths and symbolic weights
//! - Constraints
//! - Error types

pub mod constraint;
pub mod errors;
pub mod expression;
pub mod strength;
pub mod variable;

pub use constraint::*;
pub use errors::*;
pub use expression::*;
pub use strength::*;
pub use variable::*;
