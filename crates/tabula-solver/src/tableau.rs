//! The sparse simplex tableau.
//!
//! Rows map each basic symbol to the expression giving its value in terms of
//! parametric symbols. Columns map every parametric symbol to the set of row
//! keys whose expression mentions it. Every mutation here keeps the two in
//! step: `v` occurs in `rows[r]` exactly when `r` is in `columns[v]`.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;
use tabula_core::{Expression, SolverError, Symbol, TermChange};

pub(crate) type SymbolMap<V> = IndexMap<Symbol, V, FxBuildHasher>;
pub(crate) type SymbolSet = IndexSet<Symbol, FxBuildHasher>;

/// Row and column store of the simplex method.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tableau {
    /// Basic symbol -> its defining expression
    rows: SymbolMap<Expression>,
    /// Parametric symbol -> rows that reference it
    columns: SymbolMap<SymbolSet>,
    /// Restricted basic symbols whose constant went negative
    infeasible_rows: SymbolSet,
    /// External symbols that are basic
    external_rows: SymbolSet,
    /// External symbols that are parametric
    external_parametric: SymbolSet,
}

/// Keep `columns[symbol]` in step with a term change in row `row`.
fn note_change(
    columns: &mut SymbolMap<SymbolSet>,
    external_parametric: &mut SymbolSet,
    row: Symbol,
    symbol: Symbol,
    change: TermChange,
) {
    match change {
        TermChange::Inserted => {
            columns.entry(symbol).or_default().insert(row);
            if symbol.is_external() {
                external_parametric.insert(symbol);
            }
        }
        TermChange::Removed => {
            if let Some(column) = columns.get_mut(&symbol) {
                column.swap_remove(&row);
            }
        }
        TermChange::Updated | TermChange::Unchanged => {}
    }
}

impl Tableau {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn row(&self, symbol: Symbol) -> Option<&Expression> {
        self.rows.get(&symbol)
    }

    /// Mutable access to a row's constant. Terms must be changed through the
    /// tableau so the columns stay consistent.
    pub(crate) fn row_constant_mut(&mut self, symbol: Symbol) -> Option<&mut f64> {
        self.rows.get_mut(&symbol).map(|row| &mut row.constant)
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (&Symbol, &Expression)> {
        self.rows.iter()
    }

    pub(crate) fn column(&self, symbol: Symbol) -> Option<&SymbolSet> {
        self.columns.get(&symbol)
    }

    pub(crate) fn columns(&self) -> impl Iterator<Item = (&Symbol, &SymbolSet)> {
        self.columns.iter()
    }

    pub(crate) fn is_basic(&self, symbol: Symbol) -> bool {
        self.rows.contains_key(&symbol)
    }

    pub(crate) fn has_column(&self, symbol: Symbol) -> bool {
        self.columns.contains_key(&symbol)
    }

    #[cfg(test)]
    pub(crate) fn infeasible_rows(&self) -> &SymbolSet {
        &self.infeasible_rows
    }

    pub(crate) fn mark_infeasible(&mut self, symbol: Symbol) {
        self.infeasible_rows.insert(symbol);
    }

    pub(crate) fn take_infeasible_row(&mut self) -> Option<Symbol> {
        self.infeasible_rows.pop()
    }

    pub(crate) fn clear_infeasible_rows(&mut self) {
        self.infeasible_rows.clear();
    }

    pub(crate) fn external_rows(&self) -> &SymbolSet {
        &self.external_rows
    }

    pub(crate) fn external_parametric(&self) -> &SymbolSet {
        &self.external_parametric
    }

    /// Install `basic` as a basic symbol defined by `expr`.
    pub(crate) fn add_row(&mut self, basic: Symbol, expr: Expression) {
        for symbol in expr.symbols() {
            self.columns.entry(symbol).or_default().insert(basic);
            if symbol.is_external() {
                self.external_parametric.insert(symbol);
            }
        }
        if basic.is_external() {
            self.external_rows.insert(basic);
        }
        self.rows.insert(basic, expr);
    }

    /// Delete the row of `basic`, returning its expression.
    pub(crate) fn remove_row(&mut self, basic: Symbol) -> Option<Expression> {
        let expr = self.rows.swap_remove(&basic)?;
        for symbol in expr.symbols() {
            if let Some(column) = self.columns.get_mut(&symbol) {
                column.swap_remove(&basic);
            }
        }
        self.infeasible_rows.swap_remove(&basic);
        if basic.is_external() {
            self.external_rows.swap_remove(&basic);
        }
        Some(expr)
    }

    /// Delete a parametric symbol from every row that references it.
    pub(crate) fn remove_column(&mut self, symbol: Symbol) {
        if let Some(column) = self.columns.swap_remove(&symbol) {
            for basic in column {
                if let Some(row) = self.rows.get_mut(&basic) {
                    row.remove_term(symbol);
                }
            }
        }
        if symbol.is_external() {
            self.external_rows.swap_remove(&symbol);
            self.external_parametric.swap_remove(&symbol);
        }
    }

    /// Replace `old` by `expr` in every row that references it.
    pub(crate) fn substitute_out(&mut self, old: Symbol, expr: &Expression) {
        let Tableau {
            rows,
            columns,
            infeasible_rows,
            external_rows,
            external_parametric,
        } = self;

        if let Some(column) = columns.swap_remove(&old) {
            for basic in column {
                let Some(row) = rows.get_mut(&basic) else {
                    continue;
                };
                row.substitute_with(old, expr, |symbol, change| {
                    note_change(columns, external_parametric, basic, symbol, change)
                });
                if basic.is_restricted() && row.constant < 0.0 {
                    infeasible_rows.insert(basic);
                }
            }
        }

        if old.is_external() {
            external_rows.insert(old);
            external_parametric.swap_remove(&old);
        }
    }

    /// Add `coefficient * symbol` to the row of `basic`.
    pub(crate) fn add_to_row(&mut self, basic: Symbol, symbol: Symbol, coefficient: f64) {
        if let Some(row) = self.rows.get_mut(&basic) {
            let change = row.add_term(symbol, coefficient);
            note_change(&mut self.columns, &mut self.external_parametric, basic, symbol, change);
        }
    }

    /// Set the coefficient of `symbol` in the row of `basic`.
    pub(crate) fn set_in_row(&mut self, basic: Symbol, symbol: Symbol, coefficient: f64) {
        if let Some(row) = self.rows.get_mut(&basic) {
            let change = row.set_term(symbol, coefficient);
            note_change(&mut self.columns, &mut self.external_parametric, basic, symbol, change);
        }
    }

    /// Add `multiplier * expr` to the row of `basic`.
    pub(crate) fn add_expression_to_row(
        &mut self,
        basic: Symbol,
        expr: &Expression,
        multiplier: f64,
    ) {
        let Tableau {
            rows,
            columns,
            external_parametric,
            ..
        } = self;
        if let Some(row) = rows.get_mut(&basic) {
            row.add_expression_with(expr, multiplier, |symbol, change| {
                note_change(columns, external_parametric, basic, symbol, change)
            });
        }
    }

    /// Move `entry` into the basis and `exit` out of it.
    pub(crate) fn pivot(&mut self, entry: Symbol, exit: Symbol) -> Result<(), SolverError> {
        log::trace!("pivot: {} enters, {} leaves", entry, exit);

        let mut expr = self
            .remove_row(exit)
            .ok_or(SolverError::Internal("pivot: leaving symbol is not basic"))?;
        if !expr.change_subject(exit, entry) {
            return Err(SolverError::Internal("pivot: entering symbol is not in the leaving row"));
        }
        self.substitute_out(entry, &expr);
        self.add_row(entry, expr);
        Ok(())
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tableau:")?;
        for (basic, expr) in &self.rows {
            writeln!(f, "  {} = {}", basic, expr)?;
        }
        writeln!(f, "Columns:")?;
        for (symbol, column) in &self.columns {
            let keys: Vec<String> = column.iter().map(Symbol::to_string).collect();
            writeln!(f, "  {}: {{{}}}", symbol, keys.join(", "))?;
        }
        let infeasible: Vec<String> = self.infeasible_rows.iter().map(Symbol::to_string).collect();
        writeln!(f, "Infeasible rows: {{{}}}", infeasible.join(", "))
    }
}
