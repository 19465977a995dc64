//! Property tests over randomly generated solver inputs.

use proptest::prelude::*;
use tabula_solver::{Constraint, SimplexSolver, Strength};

const TOLERANCE: f64 = 1e-6;

proptest! {
    #[test]
    fn bounds_clamp_stayed_value(
        lower in -1000.0f64..1000.0,
        span in 0.0f64..500.0,
        start in -2000.0f64..2000.0,
    ) {
        let upper = lower + span;
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable_with_value(start);
        solver.add_stay(x, Strength::Weak, 1.0).unwrap();
        solver.add_bounds(x, lower, upper).unwrap();

        let value = solver.value(x);
        prop_assert!(value >= lower - TOLERANCE && value <= upper + TOLERANCE);
        prop_assert!((value - start.clamp(lower, upper)).abs() < TOLERANCE);
    }

    #[test]
    fn required_chain_always_holds(
        starts in prop::collection::vec(-500.0f64..500.0, 2..8),
        gap in 0.0f64..50.0,
    ) {
        let mut solver = SimplexSolver::new();
        let vars: Vec<_> = starts
            .iter()
            .map(|&start| solver.new_variable_with_value(start))
            .collect();
        for &var in &vars {
            solver.add_stay(var, Strength::Weak, 1.0).unwrap();
        }
        let mut required = Vec::new();
        for pair in vars.windows(2) {
            let cn = Constraint::greater_or_equal(pair[1], pair[0] + gap, Strength::Required);
            solver.add_constraint(&cn).unwrap();
            required.push(cn);
        }

        for cn in &required {
            prop_assert!(cn.is_satisfied(|var| solver.value(var), TOLERANCE));
        }
    }

    #[test]
    fn edit_round_trip_reaches_target(
        start in -1000.0f64..1000.0,
        target in -1000.0f64..1000.0,
    ) {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable_with_value(start);
        let y = solver.new_variable_with_value(start + 1.0);
        solver.add_stay(x, Strength::Weak, 1.0).unwrap();
        solver.add_stay(y, Strength::Weak, 1.0).unwrap();
        solver
            .add_constraint(&Constraint::equal(y, x + 1.0, Strength::Required))
            .unwrap();

        solver.add_edit_var(x, Strength::Strong).unwrap();
        solver.begin_edit().unwrap();
        solver.suggest_value(x, target).unwrap();
        solver.resolve().unwrap();
        solver.end_edit().unwrap();

        prop_assert!((solver.value(x) - target).abs() < TOLERANCE);
        prop_assert!((solver.value(y) - (target + 1.0)).abs() < TOLERANCE);
        prop_assert_eq!(solver.edit_variable_count(), 0);
        prop_assert_eq!(solver.constraint_count(), 3);
    }

    #[test]
    fn repeated_resolve_changes_nothing(
        suggestions in prop::collection::vec(-200.0f64..200.0, 1..6),
    ) {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();
        let y = solver.new_variable();
        solver.add_stay(x, Strength::Weak, 1.0).unwrap();
        solver.add_stay(y, Strength::Weak, 2.0).unwrap();
        solver.add_bounds(y, -100.0, 100.0).unwrap();
        solver
            .add_constraint(&Constraint::greater_or_equal(y, x, Strength::Required))
            .unwrap();

        solver.add_edit_var(x, Strength::Strong).unwrap();
        solver.begin_edit().unwrap();
        for value in suggestions {
            solver.suggest_value(x, value).unwrap();
            solver.resolve().unwrap();
            let before = (solver.value(x), solver.value(y));
            solver.resolve().unwrap();
            prop_assert!((solver.value(x) - before.0).abs() < TOLERANCE);
            prop_assert!((solver.value(y) - before.1).abs() < TOLERANCE);
            prop_assert!(solver.value(y) >= solver.value(x) - TOLERANCE);
        }
        solver.end_edit().unwrap();
    }
}
