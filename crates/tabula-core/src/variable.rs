//! Variables and the internal symbols of the simplex tableau.
//!
//! A [`Variable`] is the caller-facing handle for an unknown. Inside the
//! tableau every column and row is keyed by a [`Symbol`], which pairs an id
//! with a [`SymbolKind`]. External variables map one-to-one onto symbols of
//! kind [`SymbolKind::External`]; the other kinds are created and destroyed
//! by the solver as constraints come and go.

use std::fmt;

/// Unique identifier for a caller-owned variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable(pub(crate) usize);

impl Variable {
    /// Create a variable handle with the given ID.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// The numeric id of this variable.
    pub fn id(&self) -> usize {
        self.0
    }

    /// The tableau symbol standing for this variable.
    pub fn symbol(&self) -> Symbol {
        Symbol::new(self.0, SymbolKind::External)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Name and last solved value of an external variable.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableData {
    pub name: Option<String>,
    pub value: f64,
}

impl VariableData {
    pub fn new(name: Option<String>, value: f64) -> Self {
        Self { name, value }
    }
}

/// The kind of a tableau symbol. Immutable once the symbol exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolKind {
    /// A caller variable
    External,
    /// Slack or error variable of an inequality or non-required constraint
    Slack,
    /// Marker of a required equality
    Dummy,
    /// Row key of an objective function
    Objective,
    /// Temporary variable used to find a feasible basis
    Artificial,
}

/// Capability flags derived from a [`SymbolKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub external: bool,
    pub pivotable: bool,
    pub restricted: bool,
    pub dummy: bool,
}

impl SymbolKind {
    /// The capability flags of this kind.
    pub const fn capabilities(self) -> Capabilities {
        match self {
            SymbolKind::External => Capabilities {
                external: true,
                pivotable: false,
                restricted: false,
                dummy: false,
            },
            SymbolKind::Slack | SymbolKind::Artificial => Capabilities {
                external: false,
                pivotable: true,
                restricted: true,
                dummy: false,
            },
            SymbolKind::Dummy => Capabilities {
                external: false,
                pivotable: false,
                restricted: true,
                dummy: true,
            },
            SymbolKind::Objective => Capabilities {
                external: false,
                pivotable: false,
                restricted: false,
                dummy: false,
            },
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            SymbolKind::External => "v",
            SymbolKind::Slack => "s",
            SymbolKind::Dummy => "d",
            SymbolKind::Objective => "z",
            SymbolKind::Artificial => "a",
        }
    }
}

/// A row or column key of the tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol {
    id: usize,
    kind: SymbolKind,
}

impl Symbol {
    pub fn new(id: usize, kind: SymbolKind) -> Self {
        Self { id, kind }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// The caller variable behind an external symbol.
    pub fn variable(&self) -> Option<Variable> {
        self.is_external().then_some(Variable(self.id))
    }

    /// True only for caller variables; the solver writes values back to these.
    pub fn is_external(&self) -> bool {
        self.kind.capabilities().external
    }

    /// True for slack and artificial symbols.
    pub fn is_pivotable(&self) -> bool {
        self.kind.capabilities().pivotable
    }

    /// True for symbols constrained to be non-negative.
    pub fn is_restricted(&self) -> bool {
        self.kind.capabilities().restricted
    }

    pub fn is_dummy(&self) -> bool {
        self.kind.capabilities().dummy
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.id)
    }
}

/// A pair of variables forming a 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: Variable,
    pub y: Variable,
}

impl Point {
    pub fn new(x: Variable, y: Variable) -> Self {
        Self { x, y }
    }
}
