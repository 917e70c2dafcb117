use crate::core::{AnalysisOptions, CasePolicy};
use crate::cost::{probability::is_valid_probability, BranchSelection};
use crate::io::output::OutputFormat;
use crate::recurrence::SolveMethod;
use num_rational::Rational64;
use serde::{Deserialize, Serialize};

/// Root configuration structure for costmap
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CostmapConfig {
    /// Analysis defaults
    #[serde(default)]
    pub analysis: Option<AnalysisSettings>,

    /// Output configuration
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

/// `[analysis]` section. Every key is optional; missing keys keep the
/// engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AnalysisSettings {
    #[serde(default)]
    pub case: Option<CasePolicy>,

    #[serde(default)]
    pub size_variable: Option<String>,

    /// Passes of the summation closure loop
    #[serde(default)]
    pub closure_budget: Option<usize>,

    /// Passes of the simplifier's fixed-point loop
    #[serde(default)]
    pub simplify_budget: Option<usize>,

    /// Default branch probability as a fraction, e.g. `"1/2"`
    #[serde(default)]
    pub branch_probability: Option<String>,

    #[serde(default)]
    pub branch_selection: Option<BranchSelection>,

    /// Preferred recurrence method; omitted means automatic selection
    #[serde(default)]
    pub method: Option<SolveMethod>,
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: Option<OutputFormat>,
}

impl CostmapConfig {
    /// Check value ranges, returning the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let Some(analysis) = &self.analysis else {
            return Ok(());
        };
        if analysis.closure_budget == Some(0) {
            return Err("analysis.closure_budget must be at least 1".to_string());
        }
        if analysis.simplify_budget == Some(0) {
            return Err("analysis.simplify_budget must be at least 1".to_string());
        }
        if let Some(name) = &analysis.size_variable {
            if name.trim().is_empty() {
                return Err("analysis.size_variable must not be empty".to_string());
            }
        }
        if let Some(p) = &analysis.branch_probability {
            parse_probability(p)?;
        }
        Ok(())
    }

    pub fn default_format(&self) -> Option<OutputFormat> {
        self.output.as_ref().and_then(|o| o.default_format)
    }

    /// Engine options with this configuration applied over the defaults.
    pub fn to_options(&self) -> AnalysisOptions {
        let mut options = AnalysisOptions::default();
        let Some(analysis) = &self.analysis else {
            return options;
        };
        if let Some(case) = analysis.case {
            options.case_policy = case;
        }
        if let Some(name) = &analysis.size_variable {
            options.size_variable = name.trim().to_string();
        }
        if let Some(budget) = analysis.closure_budget.filter(|b| *b > 0) {
            options.closure_budget = budget;
        }
        if let Some(budget) = analysis.simplify_budget.filter(|b| *b > 0) {
            options.simplify_budget = budget;
        }
        if let Some(p) = analysis
            .branch_probability
            .as_deref()
            .and_then(|p| parse_probability(p).ok())
        {
            options.branch_probability = p;
        }
        if let Some(selection) = analysis.branch_selection {
            options.branch_selection = selection;
        }
        options.method = analysis.method;
        options
    }
}

/// Parse `"1/3"` or `"1"` into a probability in `(0, 1]`.
pub fn parse_probability(text: &str) -> Result<Rational64, String> {
    let p: Rational64 = text
        .trim()
        .parse()
        .map_err(|_| format!("branch_probability '{text}' is not a fraction like 1/2"))?;
    if is_valid_probability(p) {
        Ok(p)
    } else {
        Err(format!("branch_probability {p} must lie in (0, 1]"))
    }
}
