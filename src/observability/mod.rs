//! Observability infrastructure for crash reports and debugging.
//!
//! - **Panic hook**: structured crash reports naming what was being analyzed
//! - **Context tracking**: thread-local phase, file and procedure
//! - **Progress**: atomic counters across a parallel batch
//!
//! ```ignore
//! use costmap::observability::{set_phase, AnalysisPhase};
//!
//! let _phase = set_phase(AnalysisPhase::CostModel);
//! // a panic here reports the cost_model phase
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{
    get_current_context, get_progress, increment_processed, reset_context, set_current_file,
    set_current_procedure, set_phase, set_progress, AnalysisContext, AnalysisPhase, ContextGuard,
};
pub use panic_hook::install_panic_hook;
