//! Pluggable probabilities for average-case analysis.
//!
//! The cost model asks a [`ProbabilityModel`] how likely a branch condition
//! is to hold, or how likely a loop is to exit on a given iteration. When no
//! model is injected, [`UniformProbability`] answers every question with the
//! configured default.

use crate::ast::{AstExpr, Line};
use crate::core::CasePolicy;
use num_rational::Rational64;
use num_traits::{One, Zero};
use serde::Serialize;

/// What the probability is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PredicateKind {
    /// Probability that an `if` condition holds.
    Branch,
    /// Probability that a data-dependent loop conjunct holds on an iteration.
    LoopGuard,
    /// Probability that a loop exits on any given iteration.
    LoopExit,
}

/// A condition from the program, with its location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub kind: PredicateKind,
    pub line: Line,
    pub condition: AstExpr,
}

/// Where in the analysis the question is asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbabilityContext<'a> {
    pub procedure: &'a str,
    pub case_policy: CasePolicy,
    pub loop_depth: usize,
}

pub trait ProbabilityModel: Send + Sync {
    /// Probability in `(0, 1]`. Values outside that range are ignored by the
    /// cost model, which then falls back to its default.
    fn probability_of(&self, predicate: &Predicate, context: &ProbabilityContext<'_>)
        -> Rational64;
}

/// Same probability for every predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformProbability {
    pub probability: Rational64,
}

impl UniformProbability {
    pub fn new(probability: Rational64) -> Self {
        Self { probability }
    }
}

impl Default for UniformProbability {
    fn default() -> Self {
        Self::new(Rational64::new(1, 2))
    }
}

impl ProbabilityModel for UniformProbability {
    fn probability_of(&self, _: &Predicate, _: &ProbabilityContext<'_>) -> Rational64 {
        self.probability
    }
}

pub fn is_valid_probability(p: Rational64) -> bool {
    p > Rational64::zero() && p <= Rational64::one()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Skewed;

    impl ProbabilityModel for Skewed {
        fn probability_of(&self, predicate: &Predicate, _: &ProbabilityContext<'_>) -> Rational64 {
            match predicate.kind {
                PredicateKind::LoopExit => Rational64::new(1, 10),
                _ => Rational64::new(3, 4),
            }
        }
    }

    #[test]
    fn models_are_object_safe() {
        let models: Vec<Box<dyn ProbabilityModel>> =
            vec![Box::new(UniformProbability::default()), Box::new(Skewed)];
        let predicate = Predicate {
            kind: PredicateKind::LoopExit,
            line: 3,
            condition: AstExpr::Bool { value: true },
        };
        let context = ProbabilityContext {
            procedure: "Search",
            case_policy: CasePolicy::Average,
            loop_depth: 1,
        };
        let answers: Vec<Rational64> = models
            .iter()
            .map(|m| m.probability_of(&predicate, &context))
            .collect();
        assert_eq!(answers, vec![Rational64::new(1, 2), Rational64::new(1, 10)]);
    }

    #[test]
    fn validates_range() {
        assert!(is_valid_probability(Rational64::one()));
        assert!(!is_valid_probability(Rational64::zero()));
        assert!(!is_valid_probability(Rational64::new(3, 2)));
    }
}
