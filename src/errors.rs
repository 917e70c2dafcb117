//! Error types for costmap analysis operations.
//!
//! Only two families of failure ever leave the engine:
//!
//! - **Structural** errors: the AST has a shape the engine cannot interpret
//!   (no procedure, empty body, undecodable input).
//! - **Applicability** errors: the recurrence exists but the requested
//!   solving method does not apply to its shape.
//!
//! Anything the engine can work around (an unresolved loop bound, a sum it
//! cannot close) is not an error. It is reported as a degradation
//! [`Note`](crate::core::Note) inside the successful result instead.
//!
//! # Example
//!
//! ```rust
//! use costmap::errors::{AnalysisError, ErrorCategory};
//!
//! let err = AnalysisError::NoRecursiveCalls {
//!     procedure: "Sum".into(),
//! };
//! assert_eq!(err.reason(), "no_recursive_calls");
//! assert_eq!(err.category(), ErrorCategory::Structural);
//! ```

use crate::recurrence::SolveMethod;
use serde::Serialize;
use thiserror::Error;

/// Structured error code for documentation and programmatic handling.
///
/// - E010-E019: input decoding errors
/// - E020-E029: structural errors
/// - E030-E039: applicability errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// Input error - the AST document could not be decoded
    pub const INPUT_INVALID_AST: ErrorCode = ErrorCode("E010");

    /// Structural error - no procedure could be chosen as the principal one
    pub const STRUCTURAL_NO_PROCEDURE: ErrorCode = ErrorCode("E020");
    /// Structural error - the principal procedure never calls itself
    pub const STRUCTURAL_NO_RECURSION: ErrorCode = ErrorCode("E021");
    /// Structural error - generic
    pub const STRUCTURAL_GENERIC: ErrorCode = ErrorCode("E029");

    /// Applicability error - self-calls disagree on how the input shrinks
    pub const APPLICABILITY_MIXED_SIZES: ErrorCode = ErrorCode("E030");
    /// Applicability error - requested method does not fit the recurrence
    pub const APPLICABILITY_METHOD: ErrorCode = ErrorCode("E031");

    /// Get the error code string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broad classification used by callers deciding how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Input,
    Structural,
    Applicability,
}

/// Error type returned by every engine entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The AST document could not be decoded
    #[error("invalid AST: {0}")]
    InvalidAst(String),

    /// AST shape the engine cannot interpret
    #[error("structural error: {0}")]
    Structural(String),

    /// No procedure could be chosen as the principal procedure
    #[error("no main procedure found")]
    NoMainProcedure,

    /// The principal procedure does not call itself
    #[error("procedure '{procedure}' contains no self-recursive calls")]
    NoRecursiveCalls { procedure: String },

    /// Self-calls shrink the input in incompatible ways
    #[error("incompatible subproblem sizes: {detail}")]
    IncompatibleSubproblemSizes { detail: String },

    /// The requested solving method does not fit the recurrence shape
    #[error("method '{method}' is not applicable: {reason}")]
    MethodNotApplicable { method: SolveMethod, reason: String },
}

impl AnalysisError {
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }

    pub fn not_applicable(method: SolveMethod, reason: impl Into<String>) -> Self {
        Self::MethodNotApplicable {
            method,
            reason: reason.into(),
        }
    }

    pub fn incompatible(detail: impl Into<String>) -> Self {
        Self::IncompatibleSubproblemSizes {
            detail: detail.into(),
        }
    }

    /// Machine-readable reason string.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidAst(_) => "invalid_ast",
            Self::Structural(_) => "structural_error",
            Self::NoMainProcedure => "no_main_procedure",
            Self::NoRecursiveCalls { .. } => "no_recursive_calls",
            Self::IncompatibleSubproblemSizes { .. } => "incompatible_subproblem_sizes",
            Self::MethodNotApplicable { .. } => "method_not_applicable",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidAst(_) => ErrorCategory::Input,
            Self::Structural(_) | Self::NoMainProcedure | Self::NoRecursiveCalls { .. } => {
                ErrorCategory::Structural
            }
            Self::IncompatibleSubproblemSizes { .. } | Self::MethodNotApplicable { .. } => {
                ErrorCategory::Applicability
            }
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidAst(_) => ErrorCode::INPUT_INVALID_AST,
            Self::Structural(_) => ErrorCode::STRUCTURAL_GENERIC,
            Self::NoMainProcedure => ErrorCode::STRUCTURAL_NO_PROCEDURE,
            Self::NoRecursiveCalls { .. } => ErrorCode::STRUCTURAL_NO_RECURSION,
            Self::IncompatibleSubproblemSizes { .. } => ErrorCode::APPLICABILITY_MIXED_SIZES,
            Self::MethodNotApplicable { .. } => ErrorCode::APPLICABILITY_METHOD,
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidAst(err.to_string())
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_are_snake_case_and_stable() {
        let cases = [
            (AnalysisError::NoMainProcedure, "no_main_procedure"),
            (
                AnalysisError::NoRecursiveCalls {
                    procedure: "F".into(),
                },
                "no_recursive_calls",
            ),
            (
                AnalysisError::incompatible("n/2 vs n-1"),
                "incompatible_subproblem_sizes",
            ),
            (
                AnalysisError::not_applicable(SolveMethod::Master, "linear"),
                "method_not_applicable",
            ),
        ];
        for (err, reason) in cases {
            assert_eq!(err.reason(), reason);
        }
    }

    #[test]
    fn method_errors_are_applicability_errors() {
        let err = AnalysisError::not_applicable(SolveMethod::CharacteristicEquation, "not linear");
        assert_eq!(err.category(), ErrorCategory::Applicability);
        assert_eq!(err.code(), ErrorCode::APPLICABILITY_METHOD);
        assert!(err.to_string().contains("not linear"));
    }

    #[test]
    fn json_errors_become_input_errors() {
        let err: AnalysisError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.code().as_str(), "E010");
    }
}
