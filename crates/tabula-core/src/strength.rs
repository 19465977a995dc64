//! Constraint strengths and their symbolic weights.
//!
//! A symbolic weight is a 3-slot vector compared lexicographically, one slot
//! per non-required tier. The objective row needs a plain number, so the
//! vector is collapsed with a place value of 1000 per slot.

use std::cmp::Ordering;
use std::fmt;

/// Place value between adjacent slots when collapsing a symbolic weight.
const SLOT_MULTIPLIER: f64 = 1000.0;

/// A lexicographically ordered weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolicWeight(pub [f64; 3]);

impl SymbolicWeight {
    pub const ZERO: SymbolicWeight = SymbolicWeight([0.0, 0.0, 0.0]);

    pub const fn new(strong: f64, medium: f64, weak: f64) -> Self {
        Self([strong, medium, weak])
    }

    /// Scale every slot by `factor`.
    pub fn times(&self, factor: f64) -> Self {
        let [a, b, c] = self.0;
        Self([a * factor, b * factor, c * factor])
    }

    pub fn add(&self, other: &SymbolicWeight) -> Self {
        let [a, b, c] = self.0;
        let [x, y, z] = other.0;
        Self([a + x, b + y, c + z])
    }

    /// Collapse to a single objective coefficient.
    pub fn as_f64(&self) -> f64 {
        self.0
            .iter()
            .rev()
            .fold((0.0, 1.0), |(sum, factor), value| {
                (sum + value * factor, factor * SLOT_MULTIPLIER)
            })
            .0
    }

    pub fn is_negative(&self) -> bool {
        self.partial_cmp(&Self::ZERO) == Some(Ordering::Less)
    }
}

impl PartialOrd for SymbolicWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            match a.partial_cmp(b)? {
                Ordering::Equal => continue,
                ordering => return Some(ordering),
            }
        }
        Some(Ordering::Equal)
    }
}

impl fmt::Display for SymbolicWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "[{},{},{}]", a, b, c)
    }
}

/// Constraint strength levels, weakest first so that the derived ordering
/// ranks `Required` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strength {
    Weak,
    Medium,
    Strong,
    #[default]
    Required,
}

impl Strength {
    /// The symbolic weight of this tier.
    pub fn symbolic_weight(&self) -> SymbolicWeight {
        match self {
            Strength::Required => SymbolicWeight::new(1000.0, 1000.0, 1000.0),
            Strength::Strong => SymbolicWeight::new(1.0, 0.0, 0.0),
            Strength::Medium => SymbolicWeight::new(0.0, 1.0, 0.0),
            Strength::Weak => SymbolicWeight::new(0.0, 0.0, 1.0),
        }
    }

    /// Check if this is a required constraint.
    pub fn is_required(&self) -> bool {
        matches!(self, Strength::Required)
    }

    /// The objective-row coefficient for an error variable of a constraint
    /// with this strength and `weight`.
    pub fn objective_coefficient(&self, weight: f64) -> f64 {
        self.symbolic_weight().times(weight).as_f64()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strength::Required => "required",
            Strength::Strong => "strong",
            Strength::Medium => "medium",
            Strength::Weak => "weak",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_required() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}:{}", self.name(), self.symbolic_weight())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Strength::Required > Strength::Strong);
        assert!(Strength::Strong > Strength::Medium);
        assert!(Strength::Medium > Strength::Weak);
    }

    #[test]
    fn test_lexicographic_dominance() {
        let strong = Strength::Strong.symbolic_weight();
        let many_medium = Strength::Medium.symbolic_weight().times(1.0e9);
        assert!(strong > many_medium);
        assert!(many_medium > Strength::Weak.symbolic_weight().times(1.0e9));
    }

    #[test]
    fn test_collapsed_coefficients() {
        assert!((Strength::Strong.objective_coefficient(1.0) - 1.0e6).abs() < 0.001);
        assert!((Strength::Medium.objective_coefficient(2.0) - 2.0e3).abs() < 0.001);
        assert!((Strength::Weak.objective_coefficient(0.5) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_add_and_sign() {
        let sum = Strength::Weak
            .symbolic_weight()
            .add(&Strength::Strong.symbolic_weight().times(-1.0));
        assert!(sum.is_negative());
        assert!(!SymbolicWeight::ZERO.is_negative());
    }

    #[test]
    fn test_display() {
        assert_eq!(Strength::Required.to_string(), "required");
        assert_eq!(Strength::Weak.to_string(), "weak:[0,0,1]");
    }
}
