//! Assembly of the efficiency equation from closed cost rows.

use super::ledger::CostRow;
use super::visitor::VisitOutcome;
use crate::core::{AnalysisOptions, CasePolicy, Note};
use crate::expr::{asymptotic_monomial, dominant_term, Expr};
use crate::observability::{set_phase, AnalysisPhase};
use crate::summation::{ClosureStep, SummationEngine};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything one iterative analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub procedure: String,
    pub case_policy: CasePolicy,
    pub size_variable: String,
    pub rows: Vec<CostRow>,
    /// `Σ Cₖ·countₖ` before summation closure.
    pub t_open: Expr,
    pub t_open_latex: String,
    /// Closed form with the constants `Cₖ` kept symbolic.
    pub t_closed: Expr,
    /// Closed form with every `Cₖ = 1`.
    pub t_polynomial: Expr,
    pub dominant_term: Expr,
    pub big_o: String,
    pub big_omega: String,
    /// Only emitted when every loop bound and sum was resolved.
    pub big_theta: Option<String>,
    /// Placeholder symbols introduced during the analysis.
    pub symbols: BTreeMap<String, String>,
    pub notes: Vec<Note>,
    pub closure_steps: Vec<ClosureStep>,
}

impl AnalysisResult {
    pub fn is_degraded(&self) -> bool {
        self.notes.iter().any(Note::is_degradation)
    }

    /// Cost row recorded for `line`, if any.
    pub fn row_for_line(&self, line: u32) -> Option<&CostRow> {
        self.rows.iter().find(|row| row.line == line)
    }
}

fn is_placeholder(name: &str) -> bool {
    name.starts_with("t_while_") || name.starts_with("t_repeat_")
}

/// The configured size variable if the cost depends on it, else the first
/// other free symbol that is not an iteration placeholder.
fn pick_size_variable(t_polynomial: &Expr, configured: &str) -> String {
    let free = t_polynomial.free_symbols();
    if free.contains(configured) {
        return configured.to_string();
    }
    free.into_iter()
        .find(|name| !is_placeholder(name))
        .unwrap_or_else(|| configured.to_string())
}

/// Close every row and build the efficiency equation.
pub fn assemble(
    procedure: &str,
    options: &AnalysisOptions,
    engine: &SummationEngine,
    outcome: VisitOutcome,
) -> AnalysisResult {
    let VisitOutcome {
        mut rows,
        mut notes,
        symbols,
    } = outcome;

    let closing = set_phase(AnalysisPhase::SummationClosure);
    let mut closure_steps = Vec::new();
    for row in &mut rows {
        let closure = engine.close(&row.raw_count);
        log::debug!(
            "line {} ({}): {} -> {}",
            row.line,
            row.constant_label,
            row.raw_count,
            closure.expr
        );
        closure_steps.extend(closure.steps);
        for note in closure.notes {
            notes.push(Note {
                kind: note.kind,
                message: format!("line {}: {}", row.line, note.message),
            });
        }
        row.reduced_count = Some(closure.expr);
    }
    drop(closing);

    let weighted = |count: &Expr, row: &CostRow| Expr::sym(&row.constant_label).multiply(count.clone());
    let t_open_raw = Expr::sum_of(rows.iter().map(|r| weighted(&r.raw_count, r)).collect());
    let t_open_latex = t_open_raw.to_latex();

    let reduced: Vec<Expr> = rows
        .iter()
        .map(|r| r.reduced_count.clone().unwrap_or_else(|| r.raw_count.clone()))
        .collect();
    let t_closed = Expr::sum_of(
        rows.iter()
            .zip(&reduced)
            .map(|(row, count)| weighted(count, row))
            .collect(),
    )
    .simplify_with_budget(options.simplify_budget);
    let t_polynomial = Expr::sum_of(reduced).simplify_with_budget(options.simplify_budget);

    let size_variable = pick_size_variable(&t_polynomial, &options.size_variable);
    let dominant = dominant_term(&t_polynomial, &size_variable);
    let monomial = asymptotic_monomial(&dominant).simplify();
    let bound = monomial.to_display_string();

    let degraded = notes.iter().any(Note::is_degradation);
    AnalysisResult {
        procedure: procedure.to_string(),
        case_policy: options.case_policy,
        size_variable,
        rows,
        t_open: t_open_raw,
        t_open_latex,
        t_closed,
        t_polynomial,
        dominant_term: dominant,
        big_o: format!("O({bound})"),
        big_omega: format!("Ω({bound})"),
        big_theta: (!degraded).then(|| format!("Θ({bound})")),
        symbols,
        notes,
        closure_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_never_the_size_variable() {
        let t = Expr::sym("t_while_4").multiply(Expr::sym("m"));
        assert_eq!(pick_size_variable(&t, "n"), "m");
        assert_eq!(pick_size_variable(&Expr::sym("t_while_4"), "n"), "n");
    }
}
