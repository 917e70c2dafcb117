//! Iterative cost model.
//!
//! Walks a procedure body under a [`CasePolicy`](crate::core::CasePolicy),
//! records one [`CostRow`] per statement with its execution count wrapped in
//! the enclosing loops' multipliers, then closes every count with the
//! summation engine and extracts the dominant term.

pub mod branches;
pub mod ledger;
pub mod loops;
pub mod probability;
pub mod result;
pub mod visitor;

pub use branches::{BranchSelection, Flow};
pub use ledger::{CostLedger, CostRow, Multiplier, MultiplierStack};
pub use probability::{
    Predicate, PredicateKind, ProbabilityContext, ProbabilityModel, UniformProbability,
};
pub use result::AnalysisResult;
pub use visitor::CostVisitor;

use crate::ast::Procedure;
use crate::core::AnalysisOptions;
use crate::errors::{AnalysisError, Result};
use crate::summation::SummationEngine;

/// Run the cost model over one procedure.
pub fn analyze_procedure(
    procedure: &Procedure,
    options: &AnalysisOptions,
) -> Result<AnalysisResult> {
    if procedure.body.is_empty() {
        return Err(AnalysisError::structural(format!(
            "procedure '{}' has an empty body",
            procedure.name
        )));
    }
    log::debug!(
        "cost model for '{}' ({} case)",
        procedure.name,
        options.case_policy
    );
    let outcome = CostVisitor::new(procedure, options).run();
    let engine = SummationEngine::new(options.closure_budget)
        .with_simplify_budget(options.simplify_budget);
    Ok(result::assemble(&procedure.name, options, &engine, outcome))
}
