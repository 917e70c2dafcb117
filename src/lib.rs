//! Step-by-step asymptotic cost analysis of pseudocode programs.
//!
//! Programs arrive as a structured AST ([`ast::Program`], usually decoded
//! from JSON). Iterative procedures get a line-by-line cost table and a
//! closed-form efficiency equation; recursive procedures get a recurrence
//! and a solution by the master theorem, iteration, a recursion tree or
//! the characteristic equation.

pub mod ast;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod cost;
pub mod engine;
pub mod errors;
pub mod expr;
pub mod io;
pub mod observability;
pub mod recurrence;
pub mod summation;

// Re-export commonly used types
pub use crate::ast::{Procedure, Program, Stmt};
pub use crate::core::{AlgorithmKind, AnalysisOptions, CasePolicy, Note, NoteKind};
pub use crate::cost::{AnalysisResult, BranchSelection, CostRow};
pub use crate::engine::{
    analyze, analyze_iterative, analyze_iterative_with, analyze_recursive, classify,
    detect_applicable_methods, Analysis, AnalysisMode,
};
pub use crate::errors::{AnalysisError, ErrorCategory};
pub use crate::expr::{Expr, Growth};
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::recurrence::{MethodReport, Recurrence, RecurrenceSolution, SolveMethod};
pub use crate::summation::{Closure, SummationEngine};
