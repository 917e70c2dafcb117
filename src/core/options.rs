//! Per-run analysis options.

use crate::cost::{BranchSelection, ProbabilityModel};
use crate::core::CasePolicy;
use crate::expr::DEFAULT_SIMPLIFY_BUDGET;
use crate::recurrence::SolveMethod;
use crate::summation::DEFAULT_CLOSURE_BUDGET;
use num_rational::Rational64;
use std::fmt;
use std::sync::Arc;

/// Knobs for one analysis call. Each call builds its own context from these;
/// nothing is shared between calls except the optional probability model,
/// which must be stateless.
#[derive(Clone)]
pub struct AnalysisOptions {
    pub case_policy: CasePolicy,
    pub size_variable: String,
    pub closure_budget: usize,
    pub simplify_budget: usize,
    /// Probability used for branches when no model is injected.
    pub branch_probability: Rational64,
    pub branch_selection: BranchSelection,
    /// Requested recurrence solving method; `None` selects automatically.
    pub method: Option<SolveMethod>,
    pub probability_model: Option<Arc<dyn ProbabilityModel>>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            case_policy: CasePolicy::default(),
            size_variable: "n".to_string(),
            closure_budget: DEFAULT_CLOSURE_BUDGET,
            simplify_budget: DEFAULT_SIMPLIFY_BUDGET,
            branch_probability: Rational64::new(1, 2),
            branch_selection: BranchSelection::default(),
            method: None,
            probability_model: None,
        }
    }
}

impl AnalysisOptions {
    pub fn new(case_policy: CasePolicy) -> Self {
        Self {
            case_policy,
            ..Self::default()
        }
    }

    pub fn with_case(mut self, case_policy: CasePolicy) -> Self {
        self.case_policy = case_policy;
        self
    }

    pub fn with_method(mut self, method: Option<SolveMethod>) -> Self {
        self.method = method;
        self
    }

    pub fn with_size_variable(mut self, name: impl Into<String>) -> Self {
        self.size_variable = name.into();
        self
    }

    pub fn with_branch_selection(mut self, selection: BranchSelection) -> Self {
        self.branch_selection = selection;
        self
    }

    pub fn with_probability_model(mut self, model: Arc<dyn ProbabilityModel>) -> Self {
        self.probability_model = Some(model);
        self
    }
}

impl fmt::Debug for AnalysisOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisOptions")
            .field("case_policy", &self.case_policy)
            .field("size_variable", &self.size_variable)
            .field("closure_budget", &self.closure_budget)
            .field("simplify_budget", &self.simplify_budget)
            .field("branch_probability", &self.branch_probability)
            .field("branch_selection", &self.branch_selection)
            .field("method", &self.method)
            .field("probability_model", &self.probability_model.is_some())
            .finish()
    }
}
