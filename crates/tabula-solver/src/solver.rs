//! The incremental simplex solver.
//!
//! This is an implementation of the Cassowary linear constraint solving
//! algorithm, as described in "The Cassowary Linear Arithmetic Constraint
//! Solving Algorithm" by Greg J. Badros and Alan Borning.
//!
//! Constraints are translated into rows of a tableau with slack, error
//! and dummy symbols, then the weighted error of the non-required ones is
//! minimized with the primal simplex method. Edits perturb row constants
//! and are repaired with the dual simplex method (see the `edit` module).

use std::fmt;

use indexmap::IndexMap;
use smallvec::{smallvec, SmallVec};
use tabula_core::{
    approx, Constraint, ConstraintKind, Expression, SolverError, Strength, Symbol, SymbolKind,
    Variable, VariableData, EPSILON,
};

use crate::config::SolverConfig;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::edit::EditInfo;
use crate::tableau::Tableau;

/// Error symbols introduced for one non-required constraint.
#[derive(Debug, Clone)]
pub(crate) struct ErrorVars {
    pub(crate) symbols: SmallVec<[Symbol; 2]>,
    /// Objective coefficient each symbol received on insertion
    pub(crate) coefficient: f64,
}

/// A constraint rewritten over the current parametric symbols.
#[derive(Debug)]
struct Translation {
    expr: Expression,
    marker: Symbol,
    errors: Option<ErrorVars>,
    /// (plus, minus) error pair of an edit or stay constraint
    pair: Option<(Symbol, Symbol)>,
}

/// The Cassowary constraint solver.
#[derive(Debug)]
pub struct SimplexSolver {
    pub(crate) config: SolverConfig,
    pub(crate) tableau: Tableau,
    /// Row key of the main objective
    pub(crate) objective: Symbol,
    /// External variables and their values
    variables: IndexMap<Variable, VariableData>,
    /// Mapping from constraints to their marker symbols
    marker_vars: IndexMap<Constraint, Symbol>,
    /// Error symbols of every non-required constraint
    error_vars: IndexMap<Constraint, ErrorVars>,
    /// (plus, minus) error pairs of the stay constraints
    pub(crate) stay_error_vars: Vec<(Symbol, Symbol)>,
    pub(crate) edit_var_map: IndexMap<Variable, EditInfo>,
    /// Edit variable counts at each nested `begin_edit`
    pub(crate) edit_depths: Vec<usize>,
    /// Counter for variable and symbol IDs
    next_id: usize,
    needs_solving: bool,
    pub(crate) sink: Box<dyn DiagnosticSink>,
}

impl Default for SimplexSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimplexSolver {
    /// Create a new solver.
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        let objective = Symbol::new(0, SymbolKind::Objective);
        let mut tableau = Tableau::new();
        tableau.add_row(objective, Expression::default());

        Self {
            config,
            tableau,
            objective,
            variables: IndexMap::new(),
            marker_vars: IndexMap::new(),
            error_vars: IndexMap::new(),
            stay_error_vars: Vec::new(),
            edit_var_map: IndexMap::new(),
            edit_depths: vec![0],
            next_id: 1,
            needs_solving: false,
            sink: Box::new(LogSink),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Whether adds and removes re-optimize immediately.
    pub fn auto_solve(&self) -> bool {
        self.config.auto_solve
    }

    pub fn set_auto_solve(&mut self, auto_solve: bool) {
        self.config.auto_solve = auto_solve;
    }

    /// Replace the sink that receives warning lines.
    pub fn set_diagnostic_sink(&mut self, sink: impl DiagnosticSink + 'static) {
        self.sink = Box::new(sink);
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn new_symbol(&mut self, kind: SymbolKind) -> Symbol {
        let id = self.next_id();
        Symbol::new(id, kind)
    }

    /// Create a new variable with value 0.
    pub fn new_variable(&mut self) -> Variable {
        self.create_variable(None, 0.0)
    }

    pub fn new_variable_with_value(&mut self, value: f64) -> Variable {
        self.create_variable(None, value)
    }

    pub fn new_named_variable(&mut self, name: impl Into<String>, value: f64) -> Variable {
        self.create_variable(Some(name.into()), value)
    }

    fn create_variable(&mut self, name: Option<String>, value: f64) -> Variable {
        let var = Variable::new(self.next_id());
        self.variables.insert(var, VariableData::new(name, value));
        var
    }

    /// Get the current value of a variable.
    pub fn value(&self, var: Variable) -> f64 {
        self.variables.get(&var).map(|data| data.value).unwrap_or(0.0)
    }

    pub fn name(&self, var: Variable) -> Option<&str> {
        self.variables.get(&var).and_then(|data| data.name.as_deref())
    }

    pub fn variables(&self) -> impl Iterator<Item = (Variable, &VariableData)> {
        self.variables.iter().map(|(&var, data)| (var, data))
    }

    pub(crate) fn change_value(&mut self, var: Variable, value: f64) {
        self.variables.entry(var).or_default().value = value;
    }

    /// True if the variable occurs anywhere in the tableau.
    pub fn contains_variable(&self, var: Variable) -> bool {
        let symbol = var.symbol();
        self.tableau.has_column(symbol) || self.tableau.is_basic(symbol)
    }

    /// Find a variable of the tableau by name.
    pub fn get_variable(&self, name: &str) -> Option<Variable> {
        self.tableau
            .columns()
            .map(|(symbol, _)| *symbol)
            .chain(self.tableau.rows().map(|(symbol, _)| *symbol))
            .filter_map(|symbol| symbol.variable())
            .find(|&var| self.name(var) == Some(name))
    }

    /// The constraints currently installed, in insertion order.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.marker_vars.keys()
    }

    pub fn constraint_count(&self) -> usize {
        self.marker_vars.len()
    }

    pub fn has_constraint(&self, cn: &Constraint) -> bool {
        self.marker_vars.contains_key(cn)
    }

    /// Add a constraint to the solver.
    ///
    /// A [`SolverError::RequiredFailure`] leaves the solver exactly as it was
    /// before the call.
    pub fn add_constraint(&mut self, cn: &Constraint) -> Result<(), SolverError> {
        if self.marker_vars.contains_key(cn) {
            return Err(SolverError::DuplicateConstraint);
        }
        if let ConstraintKind::Edit(var) = cn.kind() {
            if cn.is_required() {
                return Err(SolverError::RequiredEditVariable(var));
            }
            if self.edit_var_map.contains_key(&var) {
                return Err(SolverError::DuplicateEditVariable(var));
            }
        }
        log::debug!("add constraint: {}", cn);

        let Translation {
            mut expr,
            marker,
            errors,
            pair,
        } = self.new_expression(cn);

        // Nothing has touched the tableau yet, so a failure here needs no undo.
        let subject = match self.choose_subject(&mut expr) {
            Ok(subject) => subject,
            Err(err) => {
                log::debug!("required failure choosing a subject for {}", cn);
                return Err(err);
            }
        };
        // Restored if the artificial phase fails. One tableau clone per such add.
        let snapshot = subject.is_none().then(|| self.tableau.clone());

        if let Some(errors) = &errors {
            for &symbol in &errors.symbols {
                self.tableau.set_in_row(self.objective, symbol, errors.coefficient);
            }
        }

        let added = match subject {
            Some(subject) => self.add_directly(expr, subject),
            None => self.add_with_artificial_variable(expr),
        };
        if let Err(err) = added {
            if let Some(snapshot) = snapshot {
                self.tableau = snapshot;
            }
            log::debug!("could not add {}: {}", cn, err);
            return Err(err);
        }

        self.marker_vars.insert(cn.clone(), marker);
        if let Some(errors) = errors {
            self.error_vars.insert(cn.clone(), errors);
        }
        match (cn.kind(), pair) {
            (ConstraintKind::Stay(_), Some(pair)) => self.stay_error_vars.push(pair),
            (ConstraintKind::Edit(var), Some((plus, minus))) => {
                let index = self.edit_var_map.len();
                let info = EditInfo::new(cn.clone(), plus, minus, cn.expression().constant, index);
                self.edit_var_map.insert(var, info);
            }
            _ => {}
        }

        self.needs_solving = true;
        if self.config.auto_solve {
            self.optimize(self.objective)?;
            self.set_external_variables();
        }
        Ok(())
    }

    /// Add a constraint, reporting an unsatisfiable required constraint as
    /// `Ok(false)` instead of an error.
    pub fn try_add_constraint(&mut self, cn: &Constraint) -> Result<bool, SolverError> {
        match self.add_constraint(cn) {
            Ok(()) => Ok(true),
            Err(SolverError::RequiredFailure) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Add the required constraint `var >= lower`.
    pub fn add_lower_bound(&mut self, var: Variable, lower: f64) -> Result<Constraint, SolverError> {
        let cn = Constraint::greater_or_equal(var, lower, Strength::Required);
        self.add_constraint(&cn)?;
        Ok(cn)
    }

    /// Add the required constraint `var <= upper`.
    pub fn add_upper_bound(&mut self, var: Variable, upper: f64) -> Result<Constraint, SolverError> {
        let cn = Constraint::less_or_equal(var, upper, Strength::Required);
        self.add_constraint(&cn)?;
        Ok(cn)
    }

    /// Add required bounds `lower <= var <= upper`.
    pub fn add_bounds(
        &mut self,
        var: Variable,
        lower: f64,
        upper: f64,
    ) -> Result<(Constraint, Constraint), SolverError> {
        let lower = self.add_lower_bound(var, lower)?;
        let upper = self.add_upper_bound(var, upper)?;
        Ok((lower, upper))
    }

    /// Register a variable with a weak stay unless the tableau knows it.
    pub fn add_var(&mut self, var: Variable) -> Result<(), SolverError> {
        if self.contains_variable(var) {
            return Ok(());
        }
        match self.add_stay(var, Strength::Weak, 1.0) {
            Ok(_) => Ok(()),
            Err(SolverError::RequiredFailure) => Err(SolverError::Internal(
                "required failure while adding a weak stay",
            )),
            Err(err) => Err(err),
        }
    }

    /// Remove a constraint and every symbol it introduced.
    pub fn remove_constraint(&mut self, cn: &Constraint) -> Result<(), SolverError> {
        let marker = self
            .marker_vars
            .get(cn)
            .copied()
            .ok_or(SolverError::ConstraintNotFound)?;
        log::debug!("remove constraint: {}", cn);

        self.needs_solving = true;
        self.reset_stay_constants();

        let errors = self.error_vars.shift_remove(cn);
        if let Some(errors) = &errors {
            for &symbol in &errors.symbols {
                match self.tableau.row(symbol).cloned() {
                    Some(expr) => {
                        self.tableau
                            .add_expression_to_row(self.objective, &expr, -errors.coefficient)
                    }
                    None => self
                        .tableau
                        .add_to_row(self.objective, symbol, -errors.coefficient),
                }
            }
        }
        self.marker_vars.shift_remove(cn);

        if !self.tableau.is_basic(marker) {
            match self.choose_marker_exit(marker) {
                Some(exit) => self.tableau.pivot(marker, exit)?,
                None => self.tableau.remove_column(marker),
            }
        }
        if self.tableau.is_basic(marker) {
            self.tableau.remove_row(marker);
        }

        if let Some(errors) = &errors {
            for &symbol in errors.symbols.iter().filter(|&&symbol| symbol != marker) {
                self.tableau.remove_column(symbol);
            }
        }

        match cn.kind() {
            ConstraintKind::Stay(_) => {
                if let Some(errors) = &errors {
                    self.stay_error_vars.retain(|(plus, minus)| {
                        !errors.symbols.contains(plus) && !errors.symbols.contains(minus)
                    });
                }
            }
            ConstraintKind::Edit(var) => {
                let owned = self
                    .edit_var_map
                    .get(&var)
                    .is_some_and(|info| info.constraint() == cn);
                if owned {
                    if let Some(info) = self.edit_var_map.shift_remove(&var) {
                        self.tableau.remove_column(info.minus);
                    }
                }
            }
            ConstraintKind::Inequality | ConstraintKind::Equality => {}
        }

        if self.config.auto_solve {
            self.optimize(self.objective)?;
            self.set_external_variables();
        }
        Ok(())
    }

    /// Re-initialize from the original constraints. Not supported.
    pub fn reset(&mut self) -> Result<(), SolverError> {
        Err(SolverError::Internal("reset not implemented"))
    }

    /// Optimize and update variable values if anything changed since the
    /// last solve. Only needed when auto-solve is off.
    pub fn solve(&mut self) -> Result<(), SolverError> {
        if self.needs_solving {
            self.optimize(self.objective)?;
            self.set_external_variables();
        }
        Ok(())
    }

    /// Rewrite `cn` over the parametric symbols and attach its slack, error
    /// or dummy symbols. The tableau is not modified.
    fn new_expression(&mut self, cn: &Constraint) -> Translation {
        let cn_expr = cn.expression();
        let mut expr = Expression::from_constant(cn_expr.constant);
        for (&symbol, &coeff) in cn_expr.terms() {
            match self.tableau.row(symbol) {
                Some(row) => expr.add_expression(row, coeff),
                None => {
                    expr.add_term(symbol, coeff);
                }
            }
        }

        let coefficient = cn.strength().objective_coefficient(cn.weight());
        let (marker, errors, pair) = if cn.is_inequality() {
            // expr - slack = 0, slack >= 0
            let slack = self.new_symbol(SymbolKind::Slack);
            expr.set_term(slack, -1.0);
            if cn.is_required() {
                (slack, None, None)
            } else {
                let eminus = self.new_symbol(SymbolKind::Slack);
                expr.set_term(eminus, 1.0);
                let errors = ErrorVars {
                    symbols: smallvec![eminus],
                    coefficient,
                };
                (slack, Some(errors), None)
            }
        } else if cn.is_required() {
            let dummy = self.new_symbol(SymbolKind::Dummy);
            expr.set_term(dummy, 1.0);
            (dummy, None, None)
        } else {
            let eplus = self.new_symbol(SymbolKind::Slack);
            let eminus = self.new_symbol(SymbolKind::Slack);
            expr.set_term(eplus, -1.0);
            expr.set_term(eminus, 1.0);
            let errors = ErrorVars {
                symbols: smallvec![eminus, eplus],
                coefficient,
            };
            let pair = match cn.kind() {
                ConstraintKind::Edit(_) | ConstraintKind::Stay(_) => Some((eplus, eminus)),
                ConstraintKind::Inequality | ConstraintKind::Equality => None,
            };
            (eplus, Some(errors), pair)
        };

        if expr.constant < 0.0 {
            expr.multiply(-1.0);
        }

        Translation {
            expr,
            marker,
            errors,
            pair,
        }
    }

    /// Choose the symbol that becomes basic for the row `expr = 0`.
    ///
    /// Unrestricted symbols win, new ones first. Otherwise a new restricted
    /// symbol with a negative coefficient is taken. A row of dummies alone
    /// must have a zero constant, or the required set is infeasible. `None`
    /// means an artificial variable is needed.
    fn choose_subject(&self, expr: &mut Expression) -> Result<Option<Symbol>, SolverError> {
        let mut subject = None;
        let mut found_unrestricted = false;
        let mut found_new_restricted = false;

        for (&symbol, &coeff) in expr.terms() {
            if found_unrestricted {
                if !symbol.is_restricted() && !self.tableau.has_column(symbol) {
                    return Ok(Some(symbol));
                }
            } else if symbol.is_restricted() {
                if !found_new_restricted && !symbol.is_dummy() && coeff < 0.0 {
                    let trivial = match self.tableau.column(symbol) {
                        None => true,
                        Some(column) => column.len() == 1 && column.contains(&self.objective),
                    };
                    if trivial {
                        subject = Some(symbol);
                        found_new_restricted = true;
                    }
                }
            } else {
                subject = Some(symbol);
                found_unrestricted = true;
            }
        }

        if subject.is_some() {
            return Ok(subject);
        }

        let mut coeff = 0.0;
        for (&symbol, &c) in expr.terms() {
            if !symbol.is_dummy() {
                return Ok(None);
            }
            if !self.tableau.has_column(symbol) {
                subject = Some(symbol);
                coeff = c;
            }
        }

        if !approx(expr.constant, 0.0) {
            return Err(SolverError::RequiredFailure);
        }
        if coeff > 0.0 {
            expr.multiply(-1.0);
        }
        Ok(subject)
    }

    fn add_directly(&mut self, mut expr: Expression, subject: Symbol) -> Result<(), SolverError> {
        expr.new_subject(subject)
            .ok_or(SolverError::Internal("subject is not in the expression"))?;
        if self.tableau.has_column(subject) {
            self.tableau.substitute_out(subject, &expr);
        }
        self.tableau.add_row(subject, expr);
        Ok(())
    }

    /// Add `expr = 0` through an artificial variable `av = expr`, then drive
    /// `av` to zero by minimizing it.
    fn add_with_artificial_variable(&mut self, expr: Expression) -> Result<(), SolverError> {
        let av = self.new_symbol(SymbolKind::Artificial);
        let az = self.new_symbol(SymbolKind::Objective);
        log::trace!("adding {} = {} with artificial objective {}", av, expr, az);

        self.tableau.add_row(az, expr.clone());
        self.tableau.add_row(av, expr);

        self.optimize(az)?;

        let az_constant = self
            .tableau
            .row(az)
            .map(|row| row.constant)
            .ok_or(SolverError::Internal("artificial objective row is missing"))?;
        if !approx(az_constant, 0.0) {
            self.tableau.remove_row(az);
            self.tableau.remove_row(av);
            self.tableau.remove_column(av);
            return Err(SolverError::RequiredFailure);
        }

        if let Some(row) = self.tableau.row(av) {
            if row.is_constant() {
                self.tableau.remove_row(av);
                self.tableau.remove_row(az);
                return Ok(());
            }
            let entry = row.any_pivotable_symbol().ok_or(SolverError::Internal(
                "artificial row has no pivotable symbol",
            ))?;
            self.tableau.pivot(entry, av)?;
        }

        self.tableau.remove_column(av);
        self.tableau.remove_row(az);
        Ok(())
    }

    /// Pick the row to pivot a parametric marker into the basis with.
    fn choose_marker_exit(&self, marker: Symbol) -> Option<Symbol> {
        let column = self.tableau.column(marker)?;
        let restricted = || {
            column.iter().filter_map(move |&symbol| {
                let row = self.tableau.row(symbol)?;
                symbol
                    .is_restricted()
                    .then(|| (symbol, row.coefficient(marker), row.constant))
            })
        };

        let mut exit = None;
        let mut min_ratio = 0.0;
        for (symbol, coeff, constant) in restricted() {
            if coeff < 0.0 {
                let ratio = -constant / coeff;
                if exit.is_none() || ratio < min_ratio {
                    min_ratio = ratio;
                    exit = Some(symbol);
                }
            }
        }
        if exit.is_some() {
            return exit;
        }

        for (symbol, coeff, constant) in restricted() {
            let ratio = constant / coeff;
            if exit.is_none() || ratio < min_ratio {
                min_ratio = ratio;
                exit = Some(symbol);
            }
        }
        if exit.is_some() {
            return exit;
        }

        column
            .iter()
            .copied()
            .find(|symbol| symbol.kind() != SymbolKind::Objective)
    }

    /// Minimize the objective row `objective` with the primal simplex method.
    /// The tableau must already be feasible.
    pub(crate) fn optimize(&mut self, objective: Symbol) -> Result<(), SolverError> {
        loop {
            let row = self
                .tableau
                .row(objective)
                .ok_or(SolverError::Internal("objective row is missing"))?;

            // Find the entering symbol (most negative coefficient in objective)
            let mut objective_coeff = 0.0;
            let mut entry = None;
            for (&symbol, &coeff) in row.terms() {
                if symbol.is_pivotable() && coeff < objective_coeff {
                    objective_coeff = coeff;
                    entry = Some(symbol);
                }
            }
            let Some(entry) = entry else {
                return Ok(());
            };
            if objective_coeff >= -EPSILON {
                return Ok(());
            }

            // Find the leaving symbol (minimum ratio test)
            let mut min_ratio = f64::MAX;
            let mut exit = None;
            if let Some(column) = self.tableau.column(entry) {
                for &symbol in column {
                    if !symbol.is_pivotable() {
                        continue;
                    }
                    let Some(expr) = self.tableau.row(symbol) else {
                        continue;
                    };
                    let coeff = expr.coefficient(entry);
                    if coeff < 0.0 {
                        let ratio = -expr.constant / coeff;
                        if ratio < min_ratio {
                            min_ratio = ratio;
                            exit = Some(symbol);
                        }
                    }
                }
            }

            let Some(exit) = exit else {
                return Err(SolverError::Internal("objective function is unbounded in optimize"));
            };
            self.tableau.pivot(entry, exit)?;
        }
    }

    /// Copy solved values into the external variables. Parametric external
    /// variables are set to zero.
    pub(crate) fn set_external_variables(&mut self) {
        let Self {
            tableau,
            variables,
            sink,
            ..
        } = self;

        for &symbol in tableau.external_parametric() {
            let Some(var) = symbol.variable() else {
                continue;
            };
            if tableau.is_basic(symbol) {
                sink.write_line(&format!(
                    "Error: variable {} in the external parametric variables is basic",
                    var
                ));
                continue;
            }
            variables.entry(var).or_default().value = 0.0;
        }

        for &symbol in tableau.external_rows() {
            if let (Some(var), Some(row)) = (symbol.variable(), tableau.row(symbol)) {
                variables.entry(var).or_default().value = row.constant;
            }
        }

        self.needs_solving = false;
    }
}

impl fmt::Display for SimplexSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tableau)?;
        let stays: Vec<String> = self
            .stay_error_vars
            .iter()
            .map(|(plus, minus)| format!("({}, {})", plus, minus))
            .collect();
        writeln!(f, "Stay error variables: [{}]", stays.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 0.001, "expected {}, got {}", expected, actual);
    }

    #[test]
    fn test_create_variable() {
        let mut solver = SimplexSolver::new();
        let v1 = solver.new_variable();
        let v2 = solver.new_named_variable("width", 5.0);
        assert_ne!(v1, v2);
        assert_eq!(solver.name(v2), Some("width"));
        assert_near(solver.value(v2), 5.0);
    }

    #[test]
    fn test_simple_equality() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();

        // x == 100
        solver
            .add_constraint(&Constraint::equal(x, 100.0, Strength::Required))
            .unwrap();
        assert_near(solver.value(x), 100.0);
    }

    #[test]
    fn test_two_variables() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();
        let y = solver.new_variable();

        solver
            .add_constraint(&Constraint::equal(x, 100.0, Strength::Required))
            .unwrap();
        // y == x + 50
        solver
            .add_constraint(&Constraint::equal(y, x + 50.0, Strength::Required))
            .unwrap();

        assert_near(solver.value(x), 100.0);
        assert_near(solver.value(y), 150.0);
    }

    #[test]
    fn test_inequality() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();

        solver.add_lower_bound(x, 50.0).unwrap();
        solver
            .add_constraint(&Constraint::equal(x, 10.0, Strength::Weak))
            .unwrap();

        assert_near(solver.value(x), 50.0);
    }

    #[test]
    fn test_strength_ordering() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();

        solver
            .add_constraint(&Constraint::equal(x, 100.0, Strength::Weak))
            .unwrap();
        solver
            .add_constraint(&Constraint::equal(x, 50.0, Strength::Strong))
            .unwrap();
        assert_near(solver.value(x), 50.0);

        // A required bound beats both
        solver.add_upper_bound(x, 20.0).unwrap();
        assert_near(solver.value(x), 20.0);
    }

    #[test]
    fn test_conflicting_required_leaves_solver_unchanged() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();
        solver.add_stay(x, Strength::Weak, 1.0).unwrap();
        solver.add_lower_bound(x, 10.0).unwrap();
        assert_near(solver.value(x), 10.0);

        let before = solver.to_string();
        let upper = Constraint::less_or_equal(x, 5.0, Strength::Required);
        assert_eq!(solver.add_constraint(&upper), Err(SolverError::RequiredFailure));
        assert_eq!(solver.to_string(), before);
        assert!(!solver.has_constraint(&upper));
        assert_eq!(solver.constraint_count(), 2);
        assert_near(solver.value(x), 10.0);
    }

    #[test]
    fn test_conflicting_required_equalities() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();
        solver
            .add_constraint(&Constraint::equal(x, 10.0, Strength::Required))
            .unwrap();

        let clash = Constraint::equal(x, 20.0, Strength::Required);
        assert_eq!(solver.try_add_constraint(&clash), Ok(false));
        assert_near(solver.value(x), 10.0);

        let redundant = Constraint::equal(x * 2.0, 20.0, Strength::Required);
        assert_eq!(solver.try_add_constraint(&redundant), Ok(true));
        assert_near(solver.value(x), 10.0);
    }

    #[test]
    fn test_duplicate_constraint() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();
        let cn = Constraint::greater_or_equal(x, 1.0, Strength::Required);
        solver.add_constraint(&cn).unwrap();
        assert_eq!(solver.add_constraint(&cn), Err(SolverError::DuplicateConstraint));
    }

    #[test]
    fn test_remove_constraint() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();
        solver.add_stay(x, Strength::Weak, 1.0).unwrap();

        let lower = solver.add_lower_bound(x, 30.0).unwrap();
        assert_near(solver.value(x), 30.0);

        solver.remove_constraint(&lower).unwrap();
        assert_eq!(solver.constraint_count(), 1);
        assert_near(solver.value(x), 30.0);

        let strong = Constraint::equal(x, 5.0, Strength::Strong);
        solver.add_constraint(&strong).unwrap();
        assert_near(solver.value(x), 5.0);
        solver.remove_constraint(&strong).unwrap();
        assert_near(solver.value(x), 5.0);
    }

    #[test]
    fn test_remove_unknown_constraint() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();
        let cn = Constraint::equal(x, 1.0, Strength::Required);
        assert_eq!(solver.remove_constraint(&cn), Err(SolverError::ConstraintNotFound));

        solver.add_constraint(&cn).unwrap();
        solver.remove_constraint(&cn).unwrap();
        assert_eq!(solver.remove_constraint(&cn), Err(SolverError::ConstraintNotFound));
    }

    #[test]
    fn test_remove_required_equality_frees_variable() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();
        let y = solver.new_variable();
        solver.add_stay(x, Strength::Weak, 1.0).unwrap();
        solver.add_stay(y, Strength::Weak, 1.0).unwrap();

        solver
            .add_constraint(&Constraint::equal(x, 10.0, Strength::Required))
            .unwrap();
        let link = Constraint::equal(y, x + 5.0, Strength::Required);
        solver.add_constraint(&link).unwrap();
        assert_near(solver.value(y), 15.0);

        solver.remove_constraint(&link).unwrap();
        let pin = Constraint::equal(y, 0.0, Strength::Strong);
        solver.add_constraint(&pin).unwrap();
        assert_near(solver.value(x), 10.0);
        assert_near(solver.value(y), 0.0);
    }

    #[test]
    fn test_batched_solve() {
        let mut solver = SimplexSolver::with_config(SolverConfig::batched());
        let x = solver.new_variable();
        let y = solver.new_variable();

        solver
            .add_constraint(&Constraint::equal(x, 10.0, Strength::Required))
            .unwrap();
        solver
            .add_constraint(&Constraint::equal(y, x * 3.0, Strength::Required))
            .unwrap();
        assert_near(solver.value(y), 0.0);

        solver.solve().unwrap();
        assert_near(solver.value(x), 10.0);
        assert_near(solver.value(y), 30.0);
    }

    #[test]
    fn test_get_and_contains_variable() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_named_variable("x", 3.0);
        let y = solver.new_named_variable("y", 4.0);

        assert!(!solver.contains_variable(x));
        solver.add_var(x).unwrap();
        assert!(solver.contains_variable(x));
        assert_eq!(solver.get_variable("x"), Some(x));
        assert_eq!(solver.get_variable("y"), None);
        assert!(!solver.contains_variable(y));
        assert_near(solver.value(x), 3.0);
    }

    #[test]
    fn test_reset_is_unsupported() {
        let mut solver = SimplexSolver::new();
        assert!(solver.reset().unwrap_err().is_internal());
    }

    #[test]
    fn test_artificial_pivoted_out_of_basis() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();
        let y = solver.new_variable();
        let z = solver.new_variable();

        let constraints = [
            Constraint::equal(x + y, 0.0, Strength::Required),
            Constraint::greater_or_equal(x - y - z, 0.0, Strength::Required),
            Constraint::equal(x - y, 5.0, Strength::Required),
            Constraint::equal(z, 5.0, Strength::Required),
        ];
        for cn in &constraints {
            solver.add_constraint(cn).unwrap();
        }

        for cn in &constraints {
            assert!(cn.is_satisfied(|var| solver.value(var), 0.001), "{} violated", cn);
        }
        assert_near(solver.value(x), 2.5);
        assert_near(solver.value(y), -2.5);
        assert_near(solver.value(z), 5.0);
        assert!(solver.tableau.rows().all(|(symbol, _)| symbol.kind() != SymbolKind::Artificial));
        assert!(solver.tableau.columns().all(|(symbol, _)| symbol.kind() != SymbolKind::Artificial));
    }

    #[test]
    fn test_artificial_row_reduced_to_constant() {
        let mut solver = SimplexSolver::new();
        let before = solver.to_string();

        // A row with no symbols left is dropped along with its objective
        solver
            .add_with_artificial_variable(Expression::from_constant(0.0))
            .unwrap();
        assert_eq!(solver.to_string(), before);
        assert_eq!(solver.tableau.rows().count(), 1);

        let mut solver = SimplexSolver::new();
        assert_eq!(
            solver.add_with_artificial_variable(Expression::from_constant(3.0)),
            Err(SolverError::RequiredFailure)
        );
        assert_eq!(solver.tableau.rows().count(), 1);
    }

    #[test]
    fn test_marker_exit_choice() {
        let mut solver = SimplexSolver::new();
        let marker = Symbol::new(100, SymbolKind::Slack);
        let a = Symbol::new(101, SymbolKind::Slack);
        let b = Symbol::new(102, SymbolKind::Slack);
        let c = Symbol::new(103, SymbolKind::Slack);
        let d = Symbol::new(104, SymbolKind::Slack);

        // Positive coefficients only: smallest constant / coefficient
        solver.tableau.add_row(a, Expression::from_constant(4.0) + Expression::from_symbol(marker, 2.0));
        solver.tableau.add_row(b, Expression::from_constant(1.0) + Expression::from_symbol(marker, 1.0));
        assert_eq!(solver.choose_marker_exit(marker), Some(b));

        // A negative coefficient wins with the usual ratio test
        solver.tableau.add_row(c, Expression::from_constant(6.0) + Expression::from_symbol(marker, -3.0));
        solver.tableau.add_row(d, Expression::from_constant(3.0) + Expression::from_symbol(marker, -1.0));
        assert_eq!(solver.choose_marker_exit(marker), Some(c));
    }

    #[test]
    fn test_marker_exit_without_restricted_rows() {
        let mut solver = SimplexSolver::new();
        let marker = Symbol::new(100, SymbolKind::Slack);
        assert_eq!(solver.choose_marker_exit(marker), None);

        // The objective row is never picked
        solver.tableau.set_in_row(solver.objective, marker, 1.0);
        assert_eq!(solver.choose_marker_exit(marker), None);

        let x = Variable::new(50).symbol();
        solver.tableau.add_row(x, Expression::from_constant(1.0) + Expression::from_symbol(marker, 1.0));
        assert_eq!(solver.choose_marker_exit(marker), Some(x));
    }

    #[test]
    fn test_remove_marker_through_unrestricted_row() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();

        // x = 10 - d: the dummy marker only appears in x's row
        let pin = Constraint::equal(x, 10.0, Strength::Required);
        solver.add_constraint(&pin).unwrap();
        assert_near(solver.value(x), 10.0);

        solver.remove_constraint(&pin).unwrap();
        assert_eq!(solver.constraint_count(), 0);
        assert!(!solver.tableau.is_basic(x.symbol()));
        assert_eq!(solver.tableau.rows().count(), 1);
        assert_near(solver.value(x), 0.0);

        solver
            .add_constraint(&Constraint::equal(x, 3.0, Strength::Required))
            .unwrap();
        assert_near(solver.value(x), 3.0);
    }

    #[test]
    fn test_remove_marker_left_only_in_objective() {
        let mut solver = SimplexSolver::new();
        let x = solver.new_variable();
        let soft = Constraint::equal(x, 5.0, Strength::Weak);
        solver.add_constraint(&soft).unwrap();

        // Pin x's row to a constant so the error symbols survive only in
        // the objective.
        solver.tableau.remove_row(x.symbol());
        solver.tableau.add_row(x.symbol(), Expression::from_constant(5.0));

        solver.remove_constraint(&soft).unwrap();
        assert_eq!(solver.constraint_count(), 0);
        assert!(solver.tableau.columns().all(|(symbol, _)| !symbol.is_pivotable()));
        assert!(solver.tableau.row(solver.objective).unwrap().is_empty());
        assert_near(solver.value(x), 5.0);
    }

    #[test]
    fn test_constraint_and_variable_views() {
        let mut solver = SimplexSolver::new();
        assert!(solver.config().auto_solve);
        assert_eq!(solver.config().default_edit_strength, Strength::Strong);

        let x = solver.new_named_variable("x", 1.0);
        let y = solver.new_variable();
        let listed: Vec<_> = solver
            .variables()
            .map(|(var, data)| (var, data.name.clone()))
            .collect();
        assert_eq!(listed, vec![(x, Some("x".to_string())), (y, None)]);

        let a = Constraint::greater_or_equal(x, 0.0, Strength::Required);
        let b = Constraint::greater_or_equal(y, 0.0, Strength::Required);
        let c = Constraint::less_or_equal(x, 10.0, Strength::Required);
        for cn in [&a, &b, &c] {
            solver.add_constraint(cn).unwrap();
        }
        let installed: Vec<Constraint> = solver.constraints().cloned().collect();
        assert_eq!(installed, vec![a.clone(), b.clone(), c.clone()]);

        solver.remove_constraint(&b).unwrap();
        let installed: Vec<Constraint> = solver.constraints().cloned().collect();
        assert_eq!(installed, vec![a, c]);
        assert!(!solver.has_constraint(&b));
    }
}
