//! Constraints: a normalized linear relation with a strength and a weight.
//!
//! A constraint is stored as `expression OP 0` where `OP` is either `=` or
//! `>=`. Constraints are shared handles compared by identity, so the same
//! constraint value can later be passed back to the solver for removal.

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::expression::Expression;
use crate::strength::Strength;
use crate::variable::Variable;

/// The relation of a constraint (equality or inequality).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relation {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

/// The variant of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `expression >= 0`
    Inequality,
    /// `expression = 0`
    Equality,
    /// Soft equality used by the edit protocol to move `Variable`
    Edit(Variable),
    /// Soft equality keeping `Variable` at its last solved value
    Stay(Variable),
}

#[derive(Debug)]
struct ConstraintData {
    expression: Expression,
    kind: ConstraintKind,
    strength: Cell<Strength>,
    weight: f64,
}

/// A constraint to be added to the solver.
#[derive(Debug, Clone)]
pub struct Constraint(Rc<ConstraintData>);

impl Constraint {
    /// Create a new constraint meaning `expression relation 0`.
    pub fn new(expression: Expression, relation: Relation, strength: Strength) -> Self {
        Self::with_weight(expression, relation, strength, 1.0)
    }

    /// Create a new weighted constraint meaning `expression relation 0`.
    pub fn with_weight(
        expression: Expression,
        relation: Relation,
        strength: Strength,
        weight: f64,
    ) -> Self {
        let (expression, kind) = match relation {
            Relation::Equal => (expression, ConstraintKind::Equality),
            Relation::GreaterOrEqual => (expression, ConstraintKind::Inequality),
            Relation::LessOrEqual => (-expression, ConstraintKind::Inequality),
        };
        Self::from_parts(expression, kind, strength, weight)
    }

    /// `lhs = rhs`
    pub fn equal(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: Strength) -> Self {
        Self::new(lhs.into() - rhs.into(), Relation::Equal, strength)
    }

    /// `lhs >= rhs`
    pub fn greater_or_equal(
        lhs: impl Into<Expression>,
        rhs: impl Into<Expression>,
        strength: Strength,
    ) -> Self {
        Self::new(lhs.into() - rhs.into(), Relation::GreaterOrEqual, strength)
    }

    /// `lhs <= rhs`
    pub fn less_or_equal(
        lhs: impl Into<Expression>,
        rhs: impl Into<Expression>,
        strength: Strength,
    ) -> Self {
        Self::new(rhs.into() - lhs.into(), Relation::GreaterOrEqual, strength)
    }

    /// An edit constraint holding `var` at `value` until a new value is
    /// suggested.
    pub fn edit(var: Variable, value: f64, strength: Strength) -> Self {
        Self::from_parts(
            Self::pin_expression(var, value),
            ConstraintKind::Edit(var),
            strength,
            1.0,
        )
    }

    /// A stay constraint preferring `var` to keep `value`.
    pub fn stay(var: Variable, value: f64, strength: Strength, weight: f64) -> Self {
        Self::from_parts(
            Self::pin_expression(var, value),
            ConstraintKind::Stay(var),
            strength,
            weight,
        )
    }

    fn pin_expression(var: Variable, value: f64) -> Expression {
        Expression::from_constant(value) - var
    }

    fn from_parts(expression: Expression, kind: ConstraintKind, strength: Strength, weight: f64) -> Self {
        Self(Rc::new(ConstraintData {
            expression,
            kind,
            strength: Cell::new(strength),
            weight,
        }))
    }

    /// The normalized expression.
    pub fn expression(&self) -> &Expression {
        &self.0.expression
    }

    pub fn kind(&self) -> ConstraintKind {
        self.0.kind
    }

    pub fn strength(&self) -> Strength {
        self.0.strength.get()
    }

    /// Change the strength. A solver that already holds this constraint is
    /// not updated; remove and re-add it instead.
    pub fn set_strength(&self, strength: Strength) {
        self.0.strength.set(strength);
    }

    pub fn weight(&self) -> f64 {
        self.0.weight
    }

    pub fn is_required(&self) -> bool {
        self.strength().is_required()
    }

    pub fn is_inequality(&self) -> bool {
        matches!(self.0.kind, ConstraintKind::Inequality)
    }

    pub fn is_edit_constraint(&self) -> bool {
        matches!(self.0.kind, ConstraintKind::Edit(_))
    }

    pub fn is_stay_constraint(&self) -> bool {
        matches!(self.0.kind, ConstraintKind::Stay(_))
    }

    /// The variable of an edit or stay constraint.
    pub fn variable(&self) -> Option<Variable> {
        match self.0.kind {
            ConstraintKind::Edit(var) | ConstraintKind::Stay(var) => Some(var),
            ConstraintKind::Inequality | ConstraintKind::Equality => None,
        }
    }

    /// Whether the constraint holds within `tolerance` for the given values.
    pub fn is_satisfied<F>(&self, value_of: F, tolerance: f64) -> bool
    where
        F: Fn(Variable) -> f64,
    {
        let value = self.0.expression.evaluate(value_of);
        if self.is_inequality() {
            value >= -tolerance
        } else {
            value.abs() <= tolerance
        }
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.is_inequality() { ">=" } else { "=" };
        write!(
            f,
            "{} {{{}}} ({} {} 0)",
            self.strength(),
            self.weight(),
            self.0.expression,
            op
        )
    }
}
