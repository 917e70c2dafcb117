//! The cost-model tree visitor.
//!
//! One `visit_*` method per statement kind. Counts are expressed per
//! activation of the innermost enclosing loop and wrapped by the ledger's
//! multiplier stack when recorded.

use super::branches::{self, compare_cost, Flow, VisitedBranch};
use super::ledger::{CostLedger, CostRow, Multiplier, PendingRow};
use super::loops::{infer_while_bound, negate_condition, LoopBound};
use super::probability::{is_valid_probability, Predicate, PredicateKind, ProbabilityContext};
use crate::ast::{to_expr, AstExpr, Line, Procedure, Stmt};
use crate::core::{AnalysisOptions, CasePolicy, Note, RowKind};
use crate::expr::Expr;
use crate::summation::SummationEngine;
use num_rational::Rational64;
use num_traits::One;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Rounds of substitution applied to loop bounds.
const BOUND_SUBSTITUTION_ROUNDS: usize = 3;

#[derive(Debug, Clone)]
struct Assignment {
    value: Expr,
    /// Recorded outside every loop, so safe to substitute into bounds.
    stable: bool,
}

#[derive(Debug, Clone, Default)]
struct LoopFrame {
    /// Applied to a success return so it runs once per activation.
    success_scale: Option<Expr>,
}

/// Everything the visitor produced, before summation closure.
#[derive(Debug)]
pub struct VisitOutcome {
    pub rows: Vec<CostRow>,
    pub notes: Vec<Note>,
    pub symbols: BTreeMap<String, String>,
}

pub struct CostVisitor<'a> {
    procedure: &'a Procedure,
    options: &'a AnalysisOptions,
    engine: SummationEngine,
    ledger: CostLedger,
    notes: Vec<Note>,
    symbols: BTreeMap<String, String>,
    assignments: HashMap<String, Assignment>,
    loops: Vec<LoopFrame>,
}

impl<'a> CostVisitor<'a> {
    pub fn new(procedure: &'a Procedure, options: &'a AnalysisOptions) -> Self {
        Self {
            procedure,
            options,
            engine: SummationEngine::new(options.closure_budget)
                .with_simplify_budget(options.simplify_budget),
            ledger: CostLedger::new(),
            notes: Vec::new(),
            symbols: BTreeMap::new(),
            assignments: HashMap::new(),
            loops: Vec::new(),
        }
    }

    pub fn run(mut self) -> VisitOutcome {
        let body = &self.procedure.body;
        self.visit_block(body);
        VisitOutcome {
            rows: self.ledger.into_rows(),
            notes: self.notes,
            symbols: self.symbols,
        }
    }

    fn policy(&self) -> CasePolicy {
        self.options.case_policy
    }

    fn size_variable(&self) -> &str {
        &self.options.size_variable
    }

    fn visit_block(&mut self, body: &[Stmt]) -> Flow {
        for stmt in body {
            let flow = self.visit(stmt);
            if flow.exits() {
                return flow;
            }
        }
        Flow::Normal
    }

    fn visit(&mut self, stmt: &Stmt) -> Flow {
        match stmt {
            Stmt::Decl { line, name, init } => {
                if let Some(init) = init {
                    self.track_assignment(name, init);
                }
                self.ledger.record(*line, RowKind::Decl, Expr::one(), "");
                Flow::Normal
            }
            Stmt::Assign {
                line,
                target,
                value,
            } => {
                if let Some(name) = target.as_ident() {
                    self.track_assignment(name, value);
                }
                self.ledger.record(*line, RowKind::Assign, Expr::one(), "");
                Flow::Normal
            }
            Stmt::Call { line, name, .. } => {
                let note = if self.procedure.is_named(name) {
                    "recursive call counted as one step"
                } else {
                    ""
                };
                self.ledger.record(*line, RowKind::Call, Expr::one(), note);
                Flow::Normal
            }
            Stmt::Return { line, .. } => {
                self.ledger.record(*line, RowKind::Return, Expr::one(), "");
                Flow::Return
            }
            Stmt::Break { line } => {
                self.ledger.record(*line, RowKind::Other, Expr::one(), "break");
                Flow::Break
            }
            Stmt::Other { line, text } => {
                let note = text.clone().unwrap_or_default();
                self.ledger.record(*line, RowKind::Other, Expr::one(), note);
                Flow::Normal
            }
            Stmt::For {
                line,
                var,
                start,
                end,
                step,
                downto,
                body,
            } => self.visit_for(*line, var, start, end, step.as_ref(), *downto, body),
            Stmt::While { line, cond, body } => self.visit_while(*line, cond, body),
            Stmt::Repeat { line, body, until } => self.visit_repeat(*line, body, until),
            Stmt::If {
                line,
                cond,
                then_branch,
                else_branch,
            } => self.visit_if(*line, cond, then_branch, else_branch.as_deref()),
        }
    }

    fn track_assignment(&mut self, name: &str, value: &AstExpr) {
        let lowered = to_expr(value, self.size_variable()).simplify();
        if lowered.contains_symbol(name) {
            self.assignments.remove(name);
            return;
        }
        let stable = self.loops.is_empty();
        self.assignments.insert(
            name.to_string(),
            Assignment {
                value: lowered,
                stable,
            },
        );
    }

    /// Lower a loop bound, resolving variables assigned before any loop.
    fn lower_bound(&self, expr: &AstExpr) -> Expr {
        let mut lowered = to_expr(expr, self.size_variable());
        for _ in 0..BOUND_SUBSTITUTION_ROUNDS {
            let mut changed = false;
            for name in lowered.free_symbols() {
                if let Some(assignment) = self.assignments.get(&name).filter(|a| a.stable) {
                    lowered = lowered.substitute(&name, &assignment.value);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        lowered.simplify()
    }

    /// Value of `name` on entry to a loop.
    fn initial_value(&self, name: &str) -> Expr {
        self.assignments
            .get(name)
            .map(|a| a.value.clone())
            .unwrap_or_else(|| Expr::sym(name))
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_for(
        &mut self,
        line: Line,
        var: &str,
        start: &AstExpr,
        end: &AstExpr,
        step: Option<&AstExpr>,
        downto: bool,
        body: &[Stmt],
    ) -> Flow {
        let first = self.lower_bound(start);
        let last = self.lower_bound(end);
        let (lower, upper) = if downto {
            (last, first.clone())
        } else {
            (first.clone(), last)
        };
        let stride = step
            .map(|s| self.lower_bound(s))
            .filter(|s| s.as_integer().map_or(true, |k| k.abs() != 1))
            .map(|s| match s.as_integer() {
                Some(k) if k < 0 => Expr::int(-k),
                _ => s,
            });
        let policy = self.policy();

        if branches::exits_on_first_iteration(body, policy) {
            self.ledger.record(
                line,
                RowKind::For,
                Expr::int(2),
                "body leaves the loop during the first iteration",
            );
            self.loops.push(LoopFrame::default());
            self.ledger.push_multiplier(Multiplier::Sum {
                var: var.to_string(),
                lower: first.clone(),
                upper: first,
            });
            let flow = self.visit_block(body);
            self.ledger.pop_multiplier();
            self.loops.pop();
            return if flow == Flow::Return {
                Flow::Return
            } else {
                Flow::Normal
            };
        }

        let count = match &stride {
            Some(k) => upper
                .clone()
                .sub(lower.clone())
                .divide(k.clone())
                .add(Expr::one()),
            None => upper.clone().sub(lower.clone()).add(Expr::one()),
        }
        .simplify();

        let success_in_body = policy == CasePolicy::Average
            && body.iter().any(|stmt| match stmt {
                Stmt::If {
                    then_branch,
                    else_branch,
                    ..
                } => branches::success_side(then_branch, else_branch.as_deref()).is_some(),
                _ => false,
            });

        if success_in_body {
            let expected = count.add(Expr::one()).divide(Expr::int(2)).simplify();
            self.ledger.record(
                line,
                RowKind::For,
                expected.clone().add(Expr::one()),
                "expected iterations until the search succeeds",
            );
            self.loops.push(LoopFrame {
                success_scale: Some(expected.clone().power(Expr::int(-1))),
            });
            self.ledger.push_multiplier(Multiplier::Factor(expected));
        } else {
            self.ledger
                .record(line, RowKind::For, count.clone().add(Expr::one()), "");
            self.loops.push(LoopFrame::default());
            let multiplier = match stride {
                Some(_) => Multiplier::Factor(count),
                None => Multiplier::Sum {
                    var: var.to_string(),
                    lower,
                    upper,
                },
            };
            self.ledger.push_multiplier(multiplier);
        }
        self.visit_block(body);
        self.ledger.pop_multiplier();
        self.loops.pop();
        Flow::Normal
    }

    fn visit_while(&mut self, line: Line, cond: &AstExpr, body: &[Stmt]) -> Flow {
        let bound = infer_while_bound(
            cond,
            body,
            &|name: &str| self.initial_value(name),
            self.size_variable(),
        );
        let (iterations, note) = match bound {
            Some(bound) => self.apply_case_to_bound(line, bound),
            None => self.unresolved_iterations("t_while", "while", line, cond),
        };
        let iterations = self.first_iteration_exit(body, iterations);

        self.ledger.record(
            line,
            RowKind::While,
            iterations.clone().add(Expr::one()),
            note,
        );
        self.loops.push(LoopFrame::default());
        self.ledger.push_multiplier(Multiplier::Factor(iterations));
        self.visit_block(body);
        self.ledger.pop_multiplier();
        self.loops.pop();
        Flow::Normal
    }

    fn visit_repeat(&mut self, line: Line, body: &[Stmt], until: &AstExpr) -> Flow {
        let cond = negate_condition(until);
        let bound = infer_while_bound(
            &cond,
            body,
            &|name: &str| self.initial_value(name),
            self.size_variable(),
        );
        let (iterations, note) = match bound {
            Some(bound) => self.apply_case_to_bound(line, bound),
            None => self.unresolved_iterations("t_repeat", "repeat", line, &cond),
        };
        let total = self.first_iteration_exit(body, Expr::one().add(iterations).simplify());

        self.ledger
            .record(line, RowKind::Repeat, total.clone(), note);
        self.loops.push(LoopFrame::default());
        self.ledger.push_multiplier(Multiplier::Factor(total));
        self.visit_block(body);
        self.ledger.pop_multiplier();
        self.loops.pop();
        Flow::Normal
    }

    /// In the best case a while or repeat loop that can leave during its
    /// first iteration runs once.
    fn first_iteration_exit(&self, body: &[Stmt], iterations: Expr) -> Expr {
        if self.policy() == CasePolicy::Best
            && !iterations.is_zero()
            && branches::exits_on_first_iteration(body, CasePolicy::Best)
        {
            Expr::one()
        } else {
            iterations
        }
    }

    fn apply_case_to_bound(&mut self, line: Line, bound: LoopBound) -> (Expr, String) {
        let note = format!("{} update of {}", bound.shape, bound.control);
        log::debug!("line {}: {} iterations = {}", line, note, bound.iterations);
        let Some(guard) = bound.data_dependent.first() else {
            return (bound.iterations, note);
        };
        match self.policy() {
            CasePolicy::Worst => (bound.iterations, note),
            CasePolicy::Best => (
                Expr::zero(),
                format!("{note}; {guard} is false on entry in the best case"),
            ),
            CasePolicy::Average => {
                let p = self.probability(PredicateKind::LoopGuard, line, guard);
                let iterations = Expr::constant(p).multiply(bound.iterations).simplify();
                (iterations, format!("{note}; {guard} holds with probability {p}"))
            }
        }
    }

    fn unresolved_iterations(
        &mut self,
        prefix: &str,
        kind: &str,
        line: Line,
        cond: &AstExpr,
    ) -> (Expr, String) {
        if self.policy() == CasePolicy::Average {
            if let Some(model) = self.options.probability_model.clone() {
                let predicate = Predicate {
                    kind: PredicateKind::LoopExit,
                    line,
                    condition: cond.clone(),
                };
                let p = model.probability_of(&predicate, &self.probability_context());
                if is_valid_probability(p) {
                    let expected = Expr::constant(p.recip());
                    return (
                        expected,
                        format!("geometric loop exit with probability {p}"),
                    );
                }
            }
        }

        let name = format!("{prefix}_{line}");
        log::warn!(
            "could not infer the iteration count of the {} loop at line {}",
            kind,
            line
        );
        self.symbols.insert(
            name.clone(),
            format!("iterations of the {kind} loop at line {line}"),
        );
        self.notes.push(Note::degradation(format!(
            "could not infer the iteration count of the {kind} loop at line {line} \
             ({cond}); using {name}"
        )));
        (Expr::sym(name), "unresolved iteration count".to_string())
    }

    fn probability_context(&self) -> ProbabilityContext<'a> {
        ProbabilityContext {
            procedure: &self.procedure.name,
            case_policy: self.options.case_policy,
            loop_depth: self.loops.len(),
        }
    }

    fn probability(&mut self, kind: PredicateKind, line: Line, cond: &AstExpr) -> Rational64 {
        let default = if is_valid_probability(self.options.branch_probability) {
            self.options.branch_probability
        } else {
            Rational64::new(1, 2)
        };
        let Some(model) = self.options.probability_model.clone() else {
            return default;
        };
        let predicate = Predicate {
            kind,
            line,
            condition: cond.clone(),
        };
        let p = model.probability_of(&predicate, &self.probability_context());
        if is_valid_probability(p) {
            p
        } else {
            self.notes.push(Note::info(format!(
                "ignored probability {p} for line {line}; using {default}"
            )));
            default
        }
    }

    fn visit_branch(&mut self, block: &[Stmt]) -> VisitedBranch {
        self.ledger.begin_buffer();
        let flow = self.visit_block(block);
        VisitedBranch {
            rows: self.ledger.end_buffer(),
            flow,
            present: true,
        }
    }

    fn visit_if(
        &mut self,
        line: Line,
        cond: &AstExpr,
        then_branch: &[Stmt],
        else_branch: Option<&[Stmt]>,
    ) -> Flow {
        self.ledger.record(line, RowKind::If, Expr::one(), "");
        let policy = self.policy();

        let success_scale = self.loops.last().and_then(|f| f.success_scale.clone());
        if let (CasePolicy::Average, Some(scale)) = (policy, success_scale) {
            if let Some(then_succeeds) = branches::success_side(then_branch, else_branch) {
                let (success, other) = if then_succeeds {
                    (then_branch, else_branch.unwrap_or_default())
                } else {
                    (else_branch.unwrap_or_default(), then_branch)
                };
                return self.visit_success_branch(line, scale, success, other);
            }
        }

        let then_visit = self.visit_branch(then_branch);
        let else_visit = match else_branch {
            Some(block) => self.visit_branch(block),
            None => VisitedBranch::absent(),
        };

        match policy {
            CasePolicy::Worst => {
                let chosen = match (then_visit.exits(), else_visit.exits()) {
                    (true, false) => else_visit,
                    (false, true) => then_visit,
                    _ => {
                        if self.compare(&then_visit, &else_visit) == Ordering::Less {
                            else_visit
                        } else {
                            then_visit
                        }
                    }
                };
                let flow = chosen.flow;
                self.ledger.commit(chosen.rows);
                flow
            }
            CasePolicy::Best => {
                let chosen = if then_visit.exits() {
                    then_visit
                } else if else_visit.exits() {
                    else_visit
                } else if !else_visit.present {
                    VisitedBranch::absent()
                } else if self.compare(&then_visit, &else_visit) == Ordering::Greater {
                    else_visit
                } else {
                    then_visit
                };
                let flow = chosen.flow;
                self.ledger.commit(chosen.rows);
                flow
            }
            CasePolicy::Average => {
                let p = self.probability(PredicateKind::Branch, line, cond);
                let q = Rational64::one() - p;
                let both_exit = then_visit.exits() && else_visit.exits();
                let scale = |rows: Vec<PendingRow>, weight: Rational64| -> Vec<PendingRow> {
                    let factor = Expr::constant(weight);
                    rows.into_iter().map(|row| row.scaled(&factor)).collect()
                };
                let then_rows = scale(then_visit.rows, p);
                let else_rows = scale(else_visit.rows, q);
                self.ledger.commit(then_rows);
                self.ledger.commit(else_rows);
                if both_exit {
                    Flow::Return
                } else {
                    Flow::Normal
                }
            }
        }
    }

    /// A guaranteed-success return inside a loop runs exactly once; the
    /// other arm runs on every iteration.
    fn visit_success_branch(
        &mut self,
        line: Line,
        scale: Expr,
        success: &[Stmt],
        other: &[Stmt],
    ) -> Flow {
        self.ledger.push_multiplier(Multiplier::Factor(scale));
        self.visit_block(success);
        self.ledger.pop_multiplier();
        self.visit_block(other);
        self.notes.push(Note::info(format!(
            "line {line}: the search is assumed to succeed; its return runs once"
        )));
        Flow::Normal
    }

    fn compare(&self, a: &VisitedBranch, b: &VisitedBranch) -> Ordering {
        compare_cost(
            a,
            b,
            self.options.branch_selection,
            self.size_variable(),
            &self.engine,
        )
    }
}
