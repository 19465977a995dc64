//! Edit sessions and stay constraints.
//!
//! An edit variable is pinned by a non-required edit constraint whose
//! constant is shifted by each suggested value. The shift may leave
//! restricted rows negative; those rows are queued as infeasible and
//! repaired by `resolve` with the dual simplex method.

use tabula_core::{approx, Constraint, Point, SolverError, Strength, Symbol, Variable};

use crate::solver::SimplexSolver;

/// Bookkeeping for one edit variable.
#[derive(Debug, Clone)]
pub struct EditInfo {
    constraint: Constraint,
    pub(crate) plus: Symbol,
    pub(crate) minus: Symbol,
    prev_edit_constant: f64,
    index: usize,
}

impl EditInfo {
    pub(crate) fn new(
        constraint: Constraint,
        plus: Symbol,
        minus: Symbol,
        prev_edit_constant: f64,
        index: usize,
    ) -> Self {
        Self {
            constraint,
            plus,
            minus,
            prev_edit_constant,
            index,
        }
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// The last value suggested for the variable.
    pub fn prev_edit_constant(&self) -> f64 {
        self.prev_edit_constant
    }

    /// Position of the variable in registration order.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl SimplexSolver {
    /// Register `var` as an edit variable at its current value.
    pub fn add_edit_var(&mut self, var: Variable, strength: Strength) -> Result<(), SolverError> {
        let cn = Constraint::edit(var, self.value(var), strength);
        match self.add_constraint(&cn) {
            Err(SolverError::RequiredFailure) => Err(SolverError::Internal(
                "required failure while adding an edit variable",
            )),
            result => result,
        }
    }

    /// Register `var` with the configured default edit strength.
    pub fn add_edit_var_default(&mut self, var: Variable) -> Result<(), SolverError> {
        self.add_edit_var(var, self.config.default_edit_strength)
    }

    pub fn remove_edit_var(&mut self, var: Variable) -> Result<(), SolverError> {
        let cn = self
            .edit_var_map
            .get(&var)
            .map(|info| info.constraint.clone())
            .ok_or(SolverError::ConstraintNotFound)?;
        self.remove_constraint(&cn)
    }

    pub fn edit_info(&self, var: Variable) -> Option<&EditInfo> {
        self.edit_var_map.get(&var)
    }

    pub fn edit_variable_count(&self) -> usize {
        self.edit_var_map.len()
    }

    /// Whether a `begin_edit` is waiting for its `end_edit`.
    pub fn is_editing(&self) -> bool {
        self.edit_depths.len() > 1
    }

    /// Open an edit session over the registered edit variables. Sessions
    /// nest; `end_edit` removes the variables added since the matching
    /// `begin_edit`.
    pub fn begin_edit(&mut self) -> Result<(), SolverError> {
        if self.edit_var_map.is_empty() {
            return Err(SolverError::NoEditVariables);
        }
        log::debug!("begin edit with {} edit variables", self.edit_var_map.len());

        self.tableau.clear_infeasible_rows();
        self.reset_stay_constants();
        self.edit_depths.push(self.edit_var_map.len());
        Ok(())
    }

    pub fn end_edit(&mut self) -> Result<(), SolverError> {
        if self.edit_var_map.is_empty() {
            return Err(SolverError::NoEditVariables);
        }
        if self.edit_depths.len() < 2 {
            return Err(SolverError::NoEditSession);
        }

        self.resolve()?;
        self.edit_depths.pop();
        let n = self.edit_depths.last().copied().unwrap_or(0);
        log::debug!("end edit, keeping {} edit variables", n);
        self.remove_edit_vars_to(n)
    }

    /// Remove edit variables until only the first `n` remain.
    pub fn remove_edit_vars_to(&mut self, n: usize) -> Result<(), SolverError> {
        let doomed: Vec<Variable> = self
            .edit_var_map
            .iter()
            .filter(|(_, info)| info.index >= n)
            .map(|(&var, _)| var)
            .collect();

        for var in doomed {
            self.remove_edit_var(var).map_err(|err| match err {
                SolverError::ConstraintNotFound => {
                    SolverError::Internal("constraint not found in remove_edit_vars_to")
                }
                other => other,
            })?;
        }

        let remaining = self.edit_var_map.len();
        if remaining != n {
            self.sink.write_line(&format!(
                "remove_edit_vars_to: expected {} edit variables, found {}",
                n, remaining
            ));
        }
        Ok(())
    }

    pub fn remove_all_edit_vars(&mut self) -> Result<(), SolverError> {
        self.remove_edit_vars_to(0)
    }

    /// Suggest a new value for an edit variable. Takes effect on `resolve`.
    pub fn suggest_value(&mut self, var: Variable, value: f64) -> Result<(), SolverError> {
        let Some(info) = self.edit_var_map.get_mut(&var) else {
            self.sink.write_line(&format!(
                "suggest_value for variable {}, but it is not an edit variable",
                var
            ));
            return Err(SolverError::NotAnEditVariable(var));
        };

        let delta = value - info.prev_edit_constant;
        info.prev_edit_constant = value;
        let (plus, minus) = (info.plus, info.minus);
        self.delta_edit_constant(delta, plus, minus);
        Ok(())
    }

    /// Re-optimize after suggestions and publish the new values.
    pub fn resolve(&mut self) -> Result<(), SolverError> {
        self.dual_optimize()?;
        self.set_external_variables();
        self.tableau.clear_infeasible_rows();
        self.reset_stay_constants();
        Ok(())
    }

    /// Suggest values for the edit variables in registration order, then
    /// resolve.
    #[deprecated(note = "use `suggest_value` and `resolve`")]
    pub fn resolve_with(&mut self, values: &[f64]) -> Result<(), SolverError> {
        let targets: Vec<(Variable, f64)> = self
            .edit_var_map
            .iter()
            .filter_map(|(&var, info)| values.get(info.index).map(|&value| (var, value)))
            .collect();
        for (var, value) in targets {
            self.suggest_value(var, value)?;
        }
        self.resolve()
    }

    #[deprecated(note = "use `suggest_value` and `resolve`")]
    #[allow(deprecated)]
    pub fn resolve_pair(&mut self, x: f64, y: f64) -> Result<(), SolverError> {
        self.resolve_with(&[x, y])
    }

    /// Move `var` to `value` through a one-shot edit session. A variable
    /// unknown to the tableau just takes the value.
    pub fn set_edited_value(&mut self, var: Variable, value: f64) -> Result<(), SolverError> {
        if !self.contains_variable(var) {
            self.change_value(var, value);
            return Ok(());
        }
        if approx(value, self.value(var)) {
            return Ok(());
        }

        self.add_edit_var_default(var)?;
        self.begin_edit()?;
        self.suggest_value(var, value)
            .map_err(|_| SolverError::Internal("suggest_value failed in set_edited_value"))?;
        self.end_edit()
    }

    /// Prefer `var` to keep its current value.
    pub fn add_stay(
        &mut self,
        var: Variable,
        strength: Strength,
        weight: f64,
    ) -> Result<Constraint, SolverError> {
        let cn = Constraint::stay(var, self.value(var), strength, weight);
        self.add_constraint(&cn)?;
        Ok(cn)
    }

    pub fn add_point_stay(
        &mut self,
        point: Point,
        weight: f64,
    ) -> Result<(Constraint, Constraint), SolverError> {
        self.add_point_stay_xy(point.x, point.y, weight)
    }

    /// Weak stays on both coordinates of a point.
    pub fn add_point_stay_xy(
        &mut self,
        x: Variable,
        y: Variable,
        weight: f64,
    ) -> Result<(Constraint, Constraint), SolverError> {
        let x = self.add_stay(x, Strength::Weak, weight)?;
        let y = self.add_stay(y, Strength::Weak, weight)?;
        Ok((x, y))
    }

    /// Weak stays on a list of points. Later points get heavier weights, so
    /// earlier points are the ones that move.
    pub fn add_point_stays(&mut self, points: &[Point]) -> Result<Vec<Constraint>, SolverError> {
        let mut stays = Vec::with_capacity(points.len() * 2);
        let mut weight = 1.0;
        for &point in points {
            let (x, y) = self.add_point_stay(point, weight)?;
            stays.push(x);
            stays.push(y);
            weight *= self.config.point_stay_weight_multiplier;
        }
        Ok(stays)
    }

    /// Zero the error row of every stay so that each stayed variable now
    /// prefers its current value.
    pub(crate) fn reset_stay_constants(&mut self) {
        for &(plus, minus) in &self.stay_error_vars {
            let basic = if self.tableau.is_basic(plus) { plus } else { minus };
            if let Some(constant) = self.tableau.row_constant_mut(basic) {
                *constant = 0.0;
            }
        }
    }

    fn delta_edit_constant(&mut self, delta: f64, plus: Symbol, minus: Symbol) {
        if let Some(constant) = self.tableau.row_constant_mut(plus) {
            *constant += delta;
            if *constant < 0.0 {
                self.tableau.mark_infeasible(plus);
            }
            return;
        }

        if let Some(constant) = self.tableau.row_constant_mut(minus) {
            *constant -= delta;
            if *constant < 0.0 {
                self.tableau.mark_infeasible(minus);
            }
            return;
        }

        let Some(column) = self.tableau.column(minus).cloned() else {
            return;
        };
        for basic in column {
            let coeff = self
                .tableau
                .row(basic)
                .map(|row| row.coefficient(minus))
                .unwrap_or(0.0);
            if let Some(constant) = self.tableau.row_constant_mut(basic) {
                *constant += coeff * delta;
                if basic.is_restricted() && *constant < 0.0 {
                    self.tableau.mark_infeasible(basic);
                }
            }
        }
    }

    /// Restore feasibility of the queued rows with the dual simplex method,
    /// keeping the objective optimal.
    fn dual_optimize(&mut self) -> Result<(), SolverError> {
        while let Some(exit) = self.tableau.take_infeasible_row() {
            let Some(row) = self.tableau.row(exit) else {
                continue;
            };
            if row.constant >= 0.0 {
                continue;
            }
            let objective = self
                .tableau
                .row(self.objective)
                .ok_or(SolverError::Internal("objective row is missing"))?;

            let mut ratio = f64::MAX;
            let mut entry = None;
            for (&symbol, &coeff) in row.terms() {
                if coeff > 0.0 && symbol.is_pivotable() {
                    let r = objective.coefficient(symbol) / coeff;
                    if r < ratio {
                        ratio = r;
                        entry = Some(symbol);
                    }
                }
            }

            let entry = entry.ok_or(SolverError::Internal("dual optimize failed"))?;
            self.tableau.pivot(entry, exit)?;
        }
        Ok(())
    }
}
