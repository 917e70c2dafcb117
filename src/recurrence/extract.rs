//! Recurrence extraction from a self-recursive procedure.
//!
//! The pipeline: principal procedure, self-calls, one subproblem-size
//! transform per call, a single transform family, the effective number of
//! calls, the non-recursive work `f(n)` and the base-case size `n0`.

use super::model::{Recurrence, RecurrenceShape};
use crate::ast::walk::{self, CallSite};
use crate::ast::{to_expr, AstExpr, BinOp, Procedure, Program, Stmt};
use crate::core::{AnalysisOptions, CasePolicy, Note};
use crate::errors::{AnalysisError, Result};
use crate::expr::Expr;
use crate::observability::{set_phase, AnalysisPhase};
use num_rational::Rational64;
use std::collections::{BTreeMap, HashMap};

/// Calls that only ever cost constant time.
const CONSTANT_CALLS: &[&str] = &[
    "print", "write", "writeln", "output", "swap", "exchange", "min", "max", "abs", "floor",
    "ceil", "ceiling", "round", "sqrt", "log", "lg", "log2", "length", "len", "size", "count",
];

/// How one self-call shrinks the input.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Transform {
    Divide(Rational64),
    Subtract(i64),
    /// Split at a position returned by another procedure, e.g. a partition.
    Pivot,
}

/// A recurrence plus the remarks gathered while extracting it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub recurrence: Recurrence,
    pub notes: Vec<Note>,
    pub steps: Vec<String>,
}

struct Extractor<'a> {
    program: &'a Program,
    procedure: &'a Procedure,
    options: &'a AnalysisOptions,
    assignments: HashMap<&'a str, &'a AstExpr>,
}

/// Extract the recurrence of the program's principal procedure.
pub fn extract(program: &Program, options: &AnalysisOptions) -> Result<Extraction> {
    let _phase = set_phase(AnalysisPhase::RecurrenceExtraction);
    let procedure = program.require_principal()?;
    let extractor = Extractor::new(program, procedure, options);
    extractor.run()
}

impl<'a> Extractor<'a> {
    fn new(program: &'a Program, procedure: &'a Procedure, options: &'a AnalysisOptions) -> Self {
        let mut assignments = HashMap::new();
        for stmt in walk::flatten(&procedure.body) {
            match stmt {
                Stmt::Assign { target, value, .. } => {
                    if let Some(name) = target.as_ident() {
                        assignments.insert(name, value);
                    }
                }
                Stmt::Decl {
                    name,
                    init: Some(value),
                    ..
                } => {
                    assignments.insert(name.as_str(), value);
                }
                _ => {}
            }
        }
        Self {
            program,
            procedure,
            options,
            assignments,
        }
    }

    fn is_self_call(&self, site: &CallSite<'_>) -> bool {
        self.procedure.is_named(site.name)
    }

    fn run(self) -> Result<Extraction> {
        let name = &self.procedure.name;
        let sites: Vec<CallSite<'_>> = walk::calls_in_body(&self.procedure.body)
            .into_iter()
            .filter(|site| self.is_self_call(site))
            .collect();
        if sites.is_empty() {
            return Err(AnalysisError::NoRecursiveCalls {
                procedure: name.clone(),
            });
        }

        let mut notes = Vec::new();
        let mut steps = vec![format!(
            "{} calls itself at {} site(s)",
            name,
            sites.len()
        )];

        let transforms: Vec<Transform> = sites
            .iter()
            .map(|site| {
                self.transform_of(site).ok_or_else(|| {
                    AnalysisError::incompatible(format!(
                        "cannot tell how the call at line {} shrinks the input",
                        site.line
                    ))
                })
            })
            .collect::<Result<_>>()?;

        let has_pivot = transforms.contains(&Transform::Pivot);
        let worst_pivot = has_pivot && self.options.case_policy == CasePolicy::Worst;
        if has_pivot {
            let message = if worst_pivot {
                "pivot split: in the worst case one side holds n - 1 elements and the other none"
            } else {
                "pivot split: assumed balanced, halving the input"
            };
            notes.push(Note::info(message));
            steps.push(message.to_string());
        }

        let resolved: Vec<Transform> = transforms
            .iter()
            .map(|t| match t {
                Transform::Pivot if worst_pivot => Transform::Subtract(1),
                Transform::Pivot => Transform::Divide(Rational64::from_integer(2)),
                other => *other,
            })
            .collect();
        let ratio = self.check_family(&resolved)?;

        let tally = self.tally(&self.procedure.body, worst_pivot);
        let shape = match ratio {
            Some(b) => {
                let a = tally.values().sum::<i64>().max(1);
                RecurrenceShape::DivideAndConquer {
                    a: u32::try_from(a).unwrap_or(u32::MAX),
                    b,
                }
            }
            None if worst_pivot => RecurrenceShape::Linear {
                coefficients: BTreeMap::from([(1, 1)]),
            },
            None => RecurrenceShape::Linear {
                coefficients: tally,
            },
        };

        let (degree, work_source) = self.work_estimate();
        let n = Expr::sym(&self.options.size_variable);
        let f_n = match degree {
            0 => Expr::one(),
            1 => n,
            d => n.power(Expr::int(d as i64)),
        };
        steps.push(format!("f(n) = {f_n}: {work_source}"));

        let n0 = match self.base_case() {
            Some(n0) => {
                steps.push(format!("base case: T(n) = Θ(1) for n ≤ {n0}"));
                n0
            }
            None => {
                notes.push(Note::info("no base-case guard found; assuming T(1) = Θ(1)"));
                1
            }
        };

        let recurrence = Recurrence {
            procedure: name.clone(),
            size_variable: self.options.size_variable.clone(),
            shape,
            f_n,
            n0,
            applicable: true,
            method: self.options.method,
            call_sites: sites.len(),
            case_policy: self.options.case_policy,
            work_source,
        };
        log::debug!("extracted {}", recurrence.summary());
        Ok(Extraction {
            recurrence,
            notes,
            steps,
        })
    }

    /// The common divide ratio, or `None` for a purely subtractive family.
    fn check_family(&self, transforms: &[Transform]) -> Result<Option<Rational64>> {
        let mut ratios: Vec<Rational64> = transforms
            .iter()
            .filter_map(|t| match t {
                Transform::Divide(b) => Some(*b),
                _ => None,
            })
            .collect();
        let subtractive = transforms
            .iter()
            .any(|t| matches!(t, Transform::Subtract(_)));
        ratios.sort();
        ratios.dedup();
        match (ratios.as_slice(), subtractive) {
            ([], _) => Ok(None),
            ([b], false) => Ok(Some(*b)),
            ([_], true) => Err(AnalysisError::incompatible(
                "divide-and-conquer calls mixed with subtractive calls",
            )),
            (many, _) => Err(AnalysisError::incompatible(format!(
                "self-calls divide the input by different ratios: {}",
                many.iter()
                    .map(|b| Expr::constant(*b).to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    fn resolved_key(&self, site: &CallSite<'_>, worst_pivot: bool) -> u32 {
        match self.transform_of(site) {
            Some(Transform::Subtract(k)) => u32::try_from(k).unwrap_or(1),
            Some(Transform::Pivot) if worst_pivot => 1,
            _ => 0,
        }
    }

    /// Effective self-calls per activation, keyed by subtractive offset
    /// (`0` for divide-and-conquer calls). Calls in the two arms of one
    /// conditional are alternatives, not additive.
    fn tally(&self, block: &[Stmt], worst_pivot: bool) -> BTreeMap<u32, i64> {
        let mut total: BTreeMap<u32, i64> = BTreeMap::new();
        for stmt in block {
            for site in walk::calls_in_stmt(stmt) {
                if self.is_self_call(&site) {
                    *total
                        .entry(self.resolved_key(&site, worst_pivot))
                        .or_default() += 1;
                }
            }
            let nested = match stmt {
                Stmt::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    let then_tally = self.tally(then_branch, worst_pivot);
                    let else_tally = else_branch
                        .as_deref()
                        .map(|b| self.tally(b, worst_pivot))
                        .unwrap_or_default();
                    let mut merged = then_tally;
                    for (key, count) in else_tally {
                        let entry = merged.entry(key).or_default();
                        *entry = (*entry).max(count);
                    }
                    merged
                }
                other => {
                    let mut merged = BTreeMap::new();
                    for block in other.blocks() {
                        for (key, count) in self.tally(block, worst_pivot) {
                            *merged.entry(key).or_default() += count;
                        }
                    }
                    merged
                }
            };
            for (key, count) in nested {
                *total.entry(key).or_default() += count;
            }
        }
        total
    }

    fn transform_of(&self, site: &CallSite<'_>) -> Option<Transform> {
        let mut subtractive = None;
        for (index, arg) in site.args.iter().enumerate() {
            let param = self.procedure.params.get(index).map(String::as_str);
            match self.arg_transform(arg, param) {
                Some(t @ (Transform::Divide(_) | Transform::Pivot)) => return Some(t),
                Some(t) => subtractive = subtractive.or(Some(t)),
                None => {}
            }
        }
        subtractive
    }

    fn arg_transform(&self, arg: &AstExpr, param: Option<&str>) -> Option<Transform> {
        if let Some(t) = direct_transform(arg, param, &self.options.size_variable) {
            return Some(t);
        }
        // `mid`, `mid - 1`, `q + 1` where the variable was assigned earlier.
        let variable = match arg {
            AstExpr::Ident { name } => name.as_str(),
            AstExpr::Binary {
                op: BinOp::Add | BinOp::Sub,
                lhs,
                rhs,
            } if rhs.as_integer().is_some() => lhs.as_ident()?,
            _ => return None,
        };
        if Some(variable) == param {
            return None;
        }
        let value = self.assignments.get(variable)?;
        if let AstExpr::Call { name, .. } = value {
            let constant = CONSTANT_CALLS.contains(&name.to_ascii_lowercase().as_str());
            if !constant && !self.procedure.is_named(name) {
                return Some(Transform::Pivot);
            }
        }
        divisor(value).map(|k| Transform::Divide(Rational64::from_integer(k)))
    }

    fn is_input_bound(&self, stmt: &Stmt) -> bool {
        match stmt {
            Stmt::For { start, end, .. } => {
                let size = &self.options.size_variable;
                !to_expr(start, size)
                    .sub(to_expr(end, size))
                    .simplify()
                    .free_symbols()
                    .is_empty()
            }
            _ => true,
        }
    }

    fn contains_self_call(&self, stmt: &Stmt) -> bool {
        walk::calls_in_body(std::slice::from_ref(stmt))
            .iter()
            .any(|site| self.is_self_call(site))
    }

    /// Polynomial degree of the non-recursive work, with a description.
    fn work_estimate(&self) -> (usize, String) {
        let body = &self.procedure.body;
        let local = walk::loop_depth_with(body, &|stmt| {
            self.is_input_bound(stmt) && !self.contains_self_call(stmt)
        });

        let mut auxiliary: Option<(usize, String)> = None;
        for site in walk::calls_in_body(body) {
            if self.is_self_call(&site)
                || CONSTANT_CALLS.contains(&site.name.to_ascii_lowercase().as_str())
            {
                continue;
            }
            let callee = self.program.procedure(site.name);
            let (degree, description) = match callee {
                Some(callee) => {
                    let depth = walk::loop_depth(&callee.body);
                    (depth, format!("call to {} (loop depth {})", site.name, depth))
                }
                None => (
                    1,
                    format!("call to undefined {}, assumed linear", site.name),
                ),
            };
            if auxiliary.as_ref().map_or(true, |(d, _)| degree > *d) {
                auxiliary = Some((degree, description));
            }
        }

        match auxiliary {
            Some((degree, description)) if degree >= local => (degree, description),
            _ if local == 0 => (0, "no loops outside the recursive calls".to_string()),
            _ => (
                local,
                format!("loop nesting depth {local} outside the recursive calls"),
            ),
        }
    }

    fn is_size_name(&self, name: &str) -> bool {
        name == self.options.size_variable || self.procedure.params.iter().any(|p| p == name)
    }

    /// Largest input size handled without recursion.
    fn base_case(&self) -> Option<i64> {
        for stmt in walk::flatten(&self.procedure.body) {
            let Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } = stmt
            else {
                continue;
            };
            let then_recurses = then_branch.iter().any(|s| self.contains_self_call(s));
            let then_returns = then_branch
                .iter()
                .any(|s| matches!(s, Stmt::Return { .. }));
            if then_returns && !then_recurses {
                if let Some(k) = self.threshold(cond, false) {
                    return Some(k.max(0));
                }
            }
            let else_recurses = else_branch
                .as_deref()
                .is_some_and(|b| b.iter().any(|s| self.contains_self_call(s)));
            if then_recurses && !else_recurses {
                // `if p < r then ...recurse...`: the base case is the negation.
                if let Some(k) = self.threshold(cond, true) {
                    return Some(k.max(0));
                }
            }
        }
        None
    }

    fn threshold(&self, cond: &AstExpr, negate: bool) -> Option<i64> {
        let AstExpr::Binary { op, lhs, rhs } = cond else {
            return None;
        };
        match (op, negate) {
            (BinOp::Or, false) | (BinOp::And, true) => {
                return self.threshold(lhs, negate).max(self.threshold(rhs, negate));
            }
            (BinOp::And, false) | (BinOp::Or, true) => {
                return self
                    .threshold(lhs, negate)
                    .or_else(|| self.threshold(rhs, negate));
            }
            _ => {}
        }
        let mut op = if negate { op.negated()? } else { *op };
        let (mut lhs, mut rhs) = (lhs.as_ref(), rhs.as_ref());
        if lhs.as_integer().is_some() {
            std::mem::swap(&mut lhs, &mut rhs);
            op = op.flipped();
        }
        let mentions_size = |e: &AstExpr| e.as_ident().is_some_and(|n| self.is_size_name(n));

        if let Some(k) = rhs.as_integer() {
            if !mentions_size(lhs) && !is_range_length(lhs) {
                return None;
            }
            return match op {
                BinOp::Le | BinOp::Eq => Some(k),
                BinOp::Lt => Some(k - 1),
                _ => None,
            };
        }
        if mentions_size(lhs) && mentions_size(rhs) {
            // Range guards such as `lo > hi` or `p >= r`.
            return match op {
                BinOp::Gt | BinOp::Lt => Some(0),
                BinOp::Ge | BinOp::Le | BinOp::Eq => Some(1),
                _ => None,
            };
        }
        None
    }
}

/// `hi - lo` or `hi - lo + 1` style range lengths.
fn is_range_length(expr: &AstExpr) -> bool {
    match expr {
        AstExpr::Binary {
            op: BinOp::Sub,
            lhs,
            rhs,
        } => lhs.as_ident().is_some() && rhs.as_ident().is_some(),
        AstExpr::Binary {
            op: BinOp::Add,
            lhs,
            rhs,
        } => is_range_length(lhs) && rhs.as_integer().is_some(),
        _ => false,
    }
}

/// Transforms readable from the argument alone: `n - k`, `hi - 1`,
/// `lo + 1`, `n / k`, `floor(n / k)`.
fn direct_transform(arg: &AstExpr, param: Option<&str>, size_variable: &str) -> Option<Transform> {
    match arg {
        AstExpr::Binary { op, lhs, rhs } => {
            let on_param = param.is_some() && lhs.as_ident() == param;
            match op {
                BinOp::Sub if on_param => rhs
                    .as_integer()
                    .filter(|k| *k > 0)
                    .map(Transform::Subtract),
                BinOp::Add if on_param && param != Some(size_variable) => rhs
                    .as_integer()
                    .filter(|k| *k > 0)
                    .map(Transform::Subtract),
                BinOp::Div | BinOp::IntDiv
                    if param.is_some_and(|p| lhs.mentions(p)) || lhs.mentions(size_variable) =>
                {
                    rhs.as_integer()
                        .filter(|k| *k > 1)
                        .map(|k| Transform::Divide(Rational64::from_integer(k)))
                }
                _ => None,
            }
        }
        AstExpr::Call { name, args } if args.len() == 1 => {
            let lowered = name.to_ascii_lowercase();
            if matches!(lowered.as_str(), "floor" | "ceil" | "ceiling") {
                direct_transform(&args[0], param, size_variable)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Literal divisor of a midpoint expression such as `(lo + hi) / 2` or
/// `lo + (hi - lo) div 3`.
fn divisor(expr: &AstExpr) -> Option<i64> {
    match expr {
        AstExpr::Binary {
            op: BinOp::Div | BinOp::IntDiv,
            rhs,
            ..
        } => rhs.as_integer().filter(|k| *k > 1),
        AstExpr::Binary {
            op: BinOp::Add | BinOp::Sub,
            lhs,
            rhs,
        } => divisor(lhs).or_else(|| divisor(rhs)),
        AstExpr::Call { name, args } if args.len() == 1 => {
            let lowered = name.to_ascii_lowercase();
            if matches!(lowered.as_str(), "floor" | "ceil" | "ceiling") {
                divisor(&args[0])
            } else {
                None
            }
        }
        _ => None,
    }
}
