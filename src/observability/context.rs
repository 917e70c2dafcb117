//! Thread-local context tracking for crash reports.
//!
//! Records the analysis phase, the input file and the procedure being
//! analyzed. Uses thread-local storage (so each rayon worker keeps its
//! own context) and atomic counters for overall progress.
//!
//! Guards are RAII: dropping one restores the previous context.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static FILES_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static FILES_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<AnalysisContext> = const { RefCell::new(AnalysisContext::new()) };
}

/// Snapshot of what costmap was doing.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub phase: Option<AnalysisPhase>,
    pub current_file: Option<PathBuf>,
    pub current_procedure: Option<String>,
}

impl AnalysisContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_file: None,
            current_procedure: None,
        }
    }
}

/// Major stages of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    /// Reading and decoding AST documents
    Decoding,
    /// Labelling the algorithm kind
    Classification,
    /// Walking the procedure under a case policy
    CostModel,
    /// Closing finite sums
    SummationClosure,
    /// Building the recurrence from self-calls
    RecurrenceExtraction,
    /// Running a recurrence solver
    RecurrenceSolving,
    /// Rendering reports
    OutputGeneration,
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decoding => write!(f, "decoding"),
            Self::Classification => write!(f, "classification"),
            Self::CostModel => write!(f, "cost_model"),
            Self::SummationClosure => write!(f, "summation_closure"),
            Self::RecurrenceExtraction => write!(f, "recurrence_extraction"),
            Self::RecurrenceSolving => write!(f, "recurrence_solving"),
            Self::OutputGeneration => write!(f, "output_generation"),
        }
    }
}

/// Restores the previous context on drop.
pub struct ContextGuard {
    previous: AnalysisContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(change: impl FnOnce(&mut AnalysisContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        change(&mut ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Set the current analysis phase until the guard drops.
///
/// ```ignore
/// let _phase = set_phase(AnalysisPhase::CostModel);
/// // phase restored when _phase drops
/// ```
#[must_use]
pub fn set_phase(phase: AnalysisPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

#[must_use]
pub fn set_current_file(path: impl Into<PathBuf>) -> ContextGuard {
    let path = path.into();
    update(|ctx| ctx.current_file = Some(path))
}

#[must_use]
pub fn set_current_procedure(name: impl Into<String>) -> ContextGuard {
    let name = name.into();
    update(|ctx| ctx.current_procedure = Some(name))
}

/// Thread-safe; called once before a batch starts.
pub fn set_progress(processed: usize, total: usize) {
    FILES_PROCESSED.store(processed, Ordering::Relaxed);
    FILES_TOTAL.store(total, Ordering::Relaxed);
}

/// Thread-safe; called from parallel iterators.
pub fn increment_processed() {
    FILES_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn get_current_context() -> AnalysisContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// `(processed, total)` input files.
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        FILES_PROCESSED.load(Ordering::Relaxed),
        FILES_TOTAL.load(Ordering::Relaxed),
    )
}

pub fn reset_context() {
    CURRENT_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = AnalysisContext::new();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_phase_is_undone_on_drop() {
        reset_context();
        let _cost = set_phase(AnalysisPhase::CostModel);
        let closing = set_phase(AnalysisPhase::SummationClosure);
        assert_eq!(
            get_current_context().phase,
            Some(AnalysisPhase::SummationClosure)
        );
        drop(closing);
        assert_eq!(get_current_context().phase, Some(AnalysisPhase::CostModel));
    }

    #[test]
    fn file_and_procedure_stack_with_the_phase() {
        reset_context();
        let _file = set_current_file("/tmp/merge_sort.json");
        let _procedure = set_current_procedure("MergeSort");
        let _phase = set_phase(AnalysisPhase::RecurrenceSolving);

        let AnalysisContext {
            phase,
            current_file,
            current_procedure,
        } = get_current_context();
        assert_eq!(phase, Some(AnalysisPhase::RecurrenceSolving));
        assert_eq!(current_file, Some(PathBuf::from("/tmp/merge_sort.json")));
        assert_eq!(current_procedure.as_deref(), Some("MergeSort"));
    }

    #[test]
    fn progress_counts_finished_files() {
        set_progress(0, 4);
        increment_processed();
        increment_processed();
        let (done, total) = get_progress();
        assert!(done >= 2);
        assert_eq!(total, 4);
    }

    #[test]
    fn phases_render_in_snake_case() {
        let names: Vec<String> = [
            AnalysisPhase::CostModel,
            AnalysisPhase::RecurrenceExtraction,
            AnalysisPhase::OutputGeneration,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(
            names,
            ["cost_model", "recurrence_extraction", "output_generation"]
        );
    }
}
