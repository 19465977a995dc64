//! Linear expressions: a constant plus a sparse map of symbol coefficients.
//!
//! Coefficients that come within [`EPSILON`] of zero are pruned on every
//! mutation. Expressions know nothing about the tableau; mutations that can
//! add or drop a symbol report a [`TermChange`] so the owner of a column
//! index can keep it consistent.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::variable::{Symbol, Variable};

/// Tolerance for floating-point comparisons.
pub const EPSILON: f64 = 1e-8;

/// Near-zero check for floating point values.
pub fn near_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

/// Approximate equality, relative to the magnitude of the operands.
pub fn approx(a: f64, b: f64) -> bool {
    if a == 0.0 {
        b.abs() < EPSILON
    } else if b == 0.0 {
        a.abs() < EPSILON
    } else {
        (a - b).abs() < a.abs() * EPSILON
    }
}

type Terms = IndexMap<Symbol, f64, FxBuildHasher>;

/// What happened to a single term during a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermChange {
    /// The symbol was not present and now is
    Inserted,
    /// The symbol stays present with a new coefficient
    Updated,
    /// The symbol was present and has been pruned
    Removed,
    /// Nothing changed
    Unchanged,
}

/// A linear expression in the form: constant + Σ(coefficient * symbol)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    pub constant: f64,
    terms: Terms,
}

impl Expression {
    /// Create a constant expression.
    pub fn from_constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: Terms::default(),
        }
    }

    /// Create an expression from a single variable.
    pub fn from_variable(var: Variable) -> Self {
        Self::from_term(var, 1.0)
    }

    /// Create `coefficient * var`.
    pub fn from_term(var: Variable, coefficient: f64) -> Self {
        Self::from_symbol(var.symbol(), coefficient)
    }

    /// Create `coefficient * symbol`.
    pub fn from_symbol(symbol: Symbol, coefficient: f64) -> Self {
        let mut expr = Self::default();
        expr.set_term(symbol, coefficient);
        expr
    }

    /// Get an iterator over the terms.
    pub fn terms(&self) -> impl Iterator<Item = (&Symbol, &f64)> {
        self.terms.iter()
    }

    /// Get an iterator over the symbols with a nonzero coefficient.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.terms.keys().copied()
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True when the expression has no terms, only a constant.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Get the coefficient for a symbol.
    pub fn coefficient(&self, symbol: Symbol) -> f64 {
        self.terms.get(&symbol).copied().unwrap_or(0.0)
    }

    /// Get the coefficient for a caller variable.
    pub fn coefficient_for(&self, var: Variable) -> f64 {
        self.coefficient(var.symbol())
    }

    /// Check if this expression contains the given symbol.
    pub fn contains(&self, symbol: Symbol) -> bool {
        self.terms.contains_key(&symbol)
    }

    /// Add `coefficient` to the coefficient of `symbol`.
    pub fn add_term(&mut self, symbol: Symbol, coefficient: f64) -> TermChange {
        match self.terms.get_mut(&symbol) {
            Some(existing) => {
                let updated = *existing + coefficient;
                if near_zero(updated) {
                    self.terms.swap_remove(&symbol);
                    TermChange::Removed
                } else {
                    *existing = updated;
                    TermChange::Updated
                }
            }
            None if near_zero(coefficient) => TermChange::Unchanged,
            None => {
                self.terms.insert(symbol, coefficient);
                TermChange::Inserted
            }
        }
    }

    /// Add `coefficient * var`.
    pub fn add_variable(&mut self, var: Variable, coefficient: f64) -> TermChange {
        self.add_term(var.symbol(), coefficient)
    }

    /// Replace the coefficient of `symbol`.
    pub fn set_term(&mut self, symbol: Symbol, coefficient: f64) -> TermChange {
        if near_zero(coefficient) {
            return match self.terms.swap_remove(&symbol) {
                Some(_) => TermChange::Removed,
                None => TermChange::Unchanged,
            };
        }
        match self.terms.insert(symbol, coefficient) {
            Some(_) => TermChange::Updated,
            None => TermChange::Inserted,
        }
    }

    /// Drop a term, returning its coefficient.
    pub fn remove_term(&mut self, symbol: Symbol) -> Option<f64> {
        self.terms.swap_remove(&symbol)
    }

    /// Multiply the expression by a scalar.
    pub fn multiply(&mut self, scalar: f64) {
        self.constant *= scalar;
        for coeff in self.terms.values_mut() {
            *coeff *= scalar;
        }
    }

    /// A scaled copy of the expression.
    pub fn times(mut self, scalar: f64) -> Self {
        self.multiply(scalar);
        self
    }

    pub fn increment_constant(&mut self, delta: f64) {
        self.constant += delta;
    }

    /// Add another expression to this one.
    pub fn add_expression(&mut self, other: &Expression, multiplier: f64) {
        self.add_expression_with(other, multiplier, |_, _| {});
    }

    /// Add `multiplier * other`, reporting every term that appears or vanishes.
    pub fn add_expression_with<F>(&mut self, other: &Expression, multiplier: f64, mut on_change: F)
    where
        F: FnMut(Symbol, TermChange),
    {
        self.constant += other.constant * multiplier;
        for (&symbol, &coeff) in &other.terms {
            match self.add_term(symbol, coeff * multiplier) {
                TermChange::Updated | TermChange::Unchanged => {}
                change => on_change(symbol, change),
            }
        }
    }

    /// Substitute a symbol with an expression.
    pub fn substitute(&mut self, symbol: Symbol, expr: &Expression) {
        self.substitute_with(symbol, expr, |_, _| {});
    }

    /// Replace `symbol` by `expr`, reporting term changes. Returns false if
    /// the symbol did not occur.
    pub fn substitute_with<F>(&mut self, symbol: Symbol, expr: &Expression, on_change: F) -> bool
    where
        F: FnMut(Symbol, TermChange),
    {
        match self.terms.swap_remove(&symbol) {
            Some(multiplier) => {
                self.add_expression_with(expr, multiplier, on_change);
                true
            }
            None => false,
        }
    }

    /// Treat the expression as `0 = self` and solve it for `subject`, which
    /// leaves `subject = self` afterwards with `subject` itself removed.
    ///
    /// Returns the reciprocal of the subject's old coefficient, or `None`
    /// when the subject does not occur.
    pub fn new_subject(&mut self, subject: Symbol) -> Option<f64> {
        let coeff = self.terms.swap_remove(&subject)?;
        let reciprocal = 1.0 / coeff;
        self.multiply(-reciprocal);
        Some(reciprocal)
    }

    /// Treat the expression as `old_subject = self` and rewrite it as
    /// `new_subject = ...`. This is the algebraic half of a pivot.
    pub fn change_subject(&mut self, old_subject: Symbol, new_subject: Symbol) -> bool {
        match self.new_subject(new_subject) {
            Some(reciprocal) => {
                self.set_term(old_subject, reciprocal);
                true
            }
            None => false,
        }
    }

    /// The first slack or artificial symbol of the expression.
    pub fn any_pivotable_symbol(&self) -> Option<Symbol> {
        self.terms.keys().copied().find(Symbol::is_pivotable)
    }

    /// Evaluate over caller variables; internal symbols count as zero.
    pub fn evaluate<F>(&self, value_of: F) -> f64
    where
        F: Fn(Variable) -> f64,
    {
        self.terms
            .iter()
            .filter_map(|(symbol, coeff)| symbol.variable().map(|var| coeff * value_of(var)))
            .sum::<f64>()
            + self.constant
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.constant)?;
        for (symbol, coeff) in &self.terms {
            write!(f, " + {}*{}", coeff, symbol)?;
        }
        Ok(())
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::from_constant(value)
    }
}

impl From<Variable> for Expression {
    fn from(var: Variable) -> Self {
        Self::from_variable(var)
    }
}

impl AddAssign<Expression> for Expression {
    fn add_assign(&mut self, rhs: Expression) {
        self.add_expression(&rhs, 1.0);
    }
}

impl SubAssign<Expression> for Expression {
    fn sub_assign(&mut self, rhs: Expression) {
        self.add_expression(&rhs, -1.0);
    }
}

impl<T: Into<Expression>> Add<T> for Expression {
    type Output = Expression;

    fn add(mut self, rhs: T) -> Expression {
        self += rhs.into();
        self
    }
}

impl<T: Into<Expression>> Sub<T> for Expression {
    type Output = Expression;

    fn sub(mut self, rhs: T) -> Expression {
        self -= rhs.into();
        self
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        self.times(rhs)
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        self.times(-1.0)
    }
}

impl<T: Into<Expression>> Add<T> for Variable {
    type Output = Expression;

    fn add(self, rhs: T) -> Expression {
        Expression::from_variable(self) + rhs
    }
}

impl<T: Into<Expression>> Sub<T> for Variable {
    type Output = Expression;

    fn sub(self, rhs: T) -> Expression {
        Expression::from_variable(self) - rhs
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        Expression::from_term(self, rhs)
    }
}

impl Mul<Variable> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Variable) -> Expression {
        Expression::from_term(rhs, self)
    }
}

impl Neg for Variable {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::from_term(self, -1.0)
    }
}
