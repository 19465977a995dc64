//! Solver configuration.

use tabula_core::Strength;

/// Tunables of a [`SimplexSolver`](crate::SimplexSolver).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverConfig {
    /// Re-optimize and update variable values after every add or remove.
    /// When false, callers batch mutations and call `solve` themselves.
    pub auto_solve: bool,
    /// Strength used when an edit variable is added without one
    pub default_edit_strength: Strength,
    /// Weight growth from one point to the next in `add_point_stays`
    pub point_stay_weight_multiplier: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            auto_solve: true,
            default_edit_strength: Strength::Strong,
            point_stay_weight_multiplier: 2.0,
        }
    }
}

impl SolverConfig {
    /// Defaults with auto-solve switched off, for bulk loading.
    pub fn batched() -> Self {
        Self {
            auto_solve: false,
            ..Self::default()
        }
    }
}
