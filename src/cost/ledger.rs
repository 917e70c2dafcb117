//! Cost rows and the multiplier stack.
//!
//! Rows are recorded as [`PendingRow`]s into the innermost open buffer.
//! Branch bodies are visited into their own buffers so the selection policy
//! can inspect them before anything reaches the ledger. Constant labels
//! `C1, C2, ...` are minted only when a row reaches the final ledger, so
//! discarded branches never consume a label.

use crate::ast::Line;
use crate::core::RowKind;
use crate::expr::Expr;
use crate::summation::avoid_capture;
use serde::Serialize;

/// One line's contribution to the efficiency equation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRow {
    pub line: Line,
    pub kind: RowKind,
    pub constant_label: String,
    pub raw_count: Expr,
    pub reduced_count: Option<Expr>,
    pub note: String,
}

/// A row not yet committed to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRow {
    pub line: Line,
    pub kind: RowKind,
    pub raw_count: Expr,
    pub note: String,
}

impl PendingRow {
    pub fn scaled(mut self, factor: &Expr) -> Self {
        self.raw_count = factor.clone().multiply(self.raw_count);
        self
    }
}

/// Execution-count context contributed by one enclosing loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Multiplier {
    /// The body runs once per value of `var` in `lower..=upper`.
    Sum {
        var: String,
        lower: Expr,
        upper: Expr,
    },
    /// The body runs a fixed (possibly symbolic) number of times.
    Factor(Expr),
}

/// Active multipliers, outermost first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiplierStack {
    entries: Vec<Multiplier>,
}

impl MultiplierStack {
    pub fn push(&mut self, multiplier: Multiplier) {
        self.entries.push(multiplier);
    }

    pub fn pop(&mut self) -> Option<Multiplier> {
        self.entries.pop()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wrap `count` in every active multiplier, innermost first, so that the
    /// outermost loop ends up as the outermost sum.
    pub fn wrap(&self, count: Expr) -> Expr {
        self.entries
            .iter()
            .rev()
            .fold(count, |inner, multiplier| match multiplier {
                Multiplier::Sum { var, lower, upper } => Expr::finite_sum(
                    avoid_capture(&inner, var),
                    var.clone(),
                    lower.clone(),
                    upper.clone(),
                ),
                Multiplier::Factor(factor) => factor.clone().multiply(inner),
            })
    }
}

/// Ledger owned by a single analysis run.
#[derive(Debug, Default)]
pub struct CostLedger {
    rows: Vec<CostRow>,
    buffers: Vec<Vec<PendingRow>>,
    stack: MultiplierStack,
    next_label: usize,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multipliers(&self) -> &MultiplierStack {
        &self.stack
    }

    pub fn push_multiplier(&mut self, multiplier: Multiplier) {
        self.stack.push(multiplier);
    }

    pub fn pop_multiplier(&mut self) -> Option<Multiplier> {
        self.stack.pop()
    }

    /// Record a statement executed `count` times per activation of the
    /// innermost context.
    pub fn record(&mut self, line: Line, kind: RowKind, count: Expr, note: impl Into<String>) {
        let row = PendingRow {
            line,
            kind,
            raw_count: self.stack.wrap(count),
            note: note.into(),
        };
        self.commit(vec![row]);
    }

    /// Start collecting rows into a fresh buffer.
    pub fn begin_buffer(&mut self) {
        self.buffers.push(Vec::new());
    }

    /// Close the innermost buffer and hand its rows back.
    pub fn end_buffer(&mut self) -> Vec<PendingRow> {
        self.buffers.pop().unwrap_or_default()
    }

    /// Pass rows to the enclosing buffer, or to the ledger when none is open.
    pub fn commit(&mut self, rows: Vec<PendingRow>) {
        match self.buffers.last_mut() {
            Some(buffer) => buffer.extend(rows),
            None => {
                for row in rows {
                    self.next_label += 1;
                    self.rows.push(CostRow {
                        line: row.line,
                        kind: row.kind,
                        constant_label: format!("C{}", self.next_label),
                        raw_count: row.raw_count,
                        reduced_count: None,
                        note: row.note,
                    });
                }
            }
        }
    }

    pub fn rows(&self) -> &[CostRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<CostRow> {
        self.rows
    }
}
