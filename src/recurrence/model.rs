//! Recurrence shapes and solved-recurrence payloads.

use crate::core::{CasePolicy, Note};
use crate::expr::{format_number, term_growth, Expr, Growth};
use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Strategy used to solve a recurrence.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SolveMethod {
    Master,
    Iteration,
    RecursionTree,
    CharacteristicEquation,
}

impl SolveMethod {
    pub fn all() -> &'static [SolveMethod] {
        &[
            SolveMethod::Master,
            SolveMethod::Iteration,
            SolveMethod::RecursionTree,
            SolveMethod::CharacteristicEquation,
        ]
    }
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveMethod::Master => "master",
            SolveMethod::Iteration => "iteration",
            SolveMethod::RecursionTree => "recursion-tree",
            SolveMethod::CharacteristicEquation => "characteristic-equation",
        };
        write!(f, "{name}")
    }
}

/// How the self-calls shrink the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RecurrenceShape {
    /// `T(n) = a·T(n/b) + f(n)`.
    DivideAndConquer {
        a: u32,
        #[serde(serialize_with = "serialize_rational")]
        b: Rational64,
    },
    /// `T(n) = Σ cᵢ·T(n − i) + f(n)`, keyed by offset `i`.
    Linear { coefficients: BTreeMap<u32, i64> },
}

fn serialize_rational<S: serde::Serializer>(
    value: &Rational64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&Expr::constant(*value).to_string())
}

/// An extracted recurrence for one procedure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recurrence {
    pub procedure: String,
    pub size_variable: String,
    pub shape: RecurrenceShape,
    /// Non-recursive work per activation.
    pub f_n: Expr,
    /// Largest input size handled by the base case.
    pub n0: i64,
    /// Whether at least one solving method accepts this shape.
    pub applicable: bool,
    /// Method requested by the caller, if any.
    pub method: Option<SolveMethod>,
    /// Number of syntactic self-call sites.
    pub call_sites: usize,
    pub case_policy: CasePolicy,
    /// Where `f_n` came from, for the derivation trail.
    pub work_source: String,
}

impl Recurrence {
    /// One-line rendering such as `T(n) = 2T(n/2) + n`.
    pub fn summary(&self) -> String {
        let n = &self.size_variable;
        let calls = match &self.shape {
            RecurrenceShape::DivideAndConquer { a, b } => {
                let b = Expr::constant(*b);
                format!("{}T({}/{})", coefficient(i64::from(*a)), n, b)
            }
            RecurrenceShape::Linear { coefficients } => coefficients
                .iter()
                .map(|(offset, c)| format!("{}T({} - {})", coefficient(*c), n, offset))
                .collect::<Vec<_>>()
                .join(" + "),
        };
        format!("T({}) = {} + {}", n, calls, self.f_n)
    }

    pub fn is_divide_and_conquer(&self) -> bool {
        matches!(self.shape, RecurrenceShape::DivideAndConquer { .. })
    }

    /// `(offset, coefficient)` for a linear recurrence with exactly one
    /// recursive term.
    pub fn single_offset(&self) -> Option<(u32, i64)> {
        match &self.shape {
            RecurrenceShape::Linear { coefficients } if coefficients.len() == 1 => {
                coefficients.iter().next().map(|(o, c)| (*o, *c))
            }
            _ => None,
        }
    }

    /// Growth of `f(n)` in the size variable.
    pub fn work_growth(&self) -> Option<Growth> {
        growth_of(&self.f_n, &self.size_variable)
    }

    pub fn size(&self) -> Expr {
        Expr::sym(&self.size_variable)
    }
}

fn coefficient(c: i64) -> String {
    if c == 1 {
        String::new()
    } else {
        c.to_string()
    }
}

/// Largest growth among the terms of `expr`, if every term is classified.
pub fn growth_of(expr: &Expr, var: &str) -> Option<Growth> {
    expr.simplify()
        .terms()
        .iter()
        .map(|t| term_growth(t, var))
        .try_fold(Growth::constant(), |best, g| {
            let g = g?;
            Some(if g.cmp_order(&best).is_gt() { g } else { best })
        })
}

/// `Θ(...)` for a growth class.
pub fn theta_of(growth: &Growth, var: &str) -> String {
    format!("Θ({})", growth.render(var))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MasterCase {
    /// `f(n) = O(n^(log_b a − ε))`: the leaves dominate.
    Case1,
    /// `f(n) = Θ(n^(log_b a) · log^k n)`: every level contributes equally.
    Case2,
    /// `f(n) = Ω(n^(log_b a + ε))` with regularity: the root dominates.
    Case3,
}

impl fmt::Display for MasterCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self {
            MasterCase::Case1 => 1,
            MasterCase::Case2 => 2,
            MasterCase::Case3 => 3,
        };
        write!(f, "Case {n}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterResult {
    pub a: u32,
    pub b: f64,
    /// `log_b(a)`.
    pub critical_exponent: f64,
    /// `log_b(a)` as written, e.g. `log_2 7`.
    pub critical_display: String,
    pub f_growth: Growth,
    pub case: MasterCase,
    /// `a / b^d` for Case 3; below one when the regularity condition holds.
    pub regularity_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLevel {
    /// `0`, `1`, `2`, ... or `leaves`.
    pub level: String,
    pub node_count: Expr,
    pub subproblem_size: Expr,
    pub per_node_cost: Expr,
    pub level_total: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DominatingLevel {
    Root,
    Leaves,
    AllEqual,
}

impl fmt::Display for DominatingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DominatingLevel::Root => "root",
            DominatingLevel::Leaves => "leaves",
            DominatingLevel::AllEqual => "all levels equal",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeResult {
    pub levels: Vec<TreeLevel>,
    pub depth: Expr,
    pub total: Expr,
    pub dominating: DominatingLevel,
}

/// A root of the characteristic polynomial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Root {
    pub re: f64,
    pub im: f64,
    pub multiplicity: usize,
}

impl Root {
    pub fn modulus(&self) -> f64 {
        self.re.hypot(self.im)
    }

    pub fn is_real(&self) -> bool {
        self.im.abs() < 1e-9
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_real() {
            write!(f, "{}", format_number(self.re))?;
        } else {
            let sign = if self.im < 0.0 { '-' } else { '+' };
            write!(
                f,
                "{} {} {}i",
                format_number(self.re),
                sign,
                format_number(self.im.abs())
            )?;
        }
        if self.multiplicity > 1 {
            write!(f, " (multiplicity {})", self.multiplicity)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacteristicResult {
    /// e.g. `x^2 - x - 1 = 0`.
    pub polynomial: String,
    pub roots: Vec<Root>,
    pub dominant_root: Root,
    /// Polynomial degree of the forcing term `f(n)`.
    pub forcing_degree: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationResult {
    /// The first few unrolled forms of `T(n)`.
    pub unrolled: Vec<String>,
    /// `T(n)` after `k` unrolling steps, as a finite sum.
    pub general_form: Expr,
    /// Number of steps needed to reach the base case.
    pub steps: Expr,
    pub closed: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", content = "result", rename_all = "kebab-case")]
pub enum SolutionPayload {
    Master(MasterResult),
    Iteration(IterationResult),
    RecursionTree(TreeResult),
    CharacteristicEquation(CharacteristicResult),
}

/// A solved recurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurrenceSolution {
    pub recurrence: Recurrence,
    pub method: SolveMethod,
    pub payload: SolutionPayload,
    pub theta: String,
    pub derivation_steps: Vec<String>,
    pub notes: Vec<Note>,
}

impl RecurrenceSolution {
    pub fn is_degraded(&self) -> bool {
        self.notes.iter().any(Note::is_degradation)
    }
}

/// Methods that accept an extracted recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodReport {
    pub methods: Vec<SolveMethod>,
    pub default: SolveMethod,
    pub recurrence_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recurrence(shape: RecurrenceShape, f_n: Expr) -> Recurrence {
        Recurrence {
            procedure: "F".into(),
            size_variable: "n".into(),
            shape,
            f_n,
            n0: 1,
            applicable: true,
            method: None,
            call_sites: 2,
            case_policy: CasePolicy::Worst,
            work_source: String::new(),
        }
    }

    #[test]
    fn summaries_read_like_textbook_recurrences() {
        let merge = recurrence(
            RecurrenceShape::DivideAndConquer {
                a: 2,
                b: Rational64::from_integer(2),
            },
            Expr::sym("n"),
        );
        assert_eq!(merge.summary(), "T(n) = 2T(n/2) + n");

        let fib = recurrence(
            RecurrenceShape::Linear {
                coefficients: BTreeMap::from([(1, 1), (2, 1)]),
            },
            Expr::one(),
        );
        assert_eq!(fib.summary(), "T(n) = T(n - 1) + T(n - 2) + 1");
        assert_eq!(fib.single_offset(), None);
    }

    #[test]
    fn complex_roots_render_with_sign() {
        let root = Root {
            re: 0.5,
            im: -0.866,
            multiplicity: 1,
        };
        assert_eq!(root.to_string(), "0.5 - 0.866i");
    }
}
