//! Panic hook that prints a structured crash report.
//!
//! The report names the analysis phase, the input file and the procedure
//! that were active on the panicking thread, plus overall progress.

use super::context::{get_current_context, get_progress, AnalysisContext};
use std::panic::PanicHookInfo;
use tracing::Span;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str =
    "════════════════════════════════════════════════════════════════════════════════";

/// Install the crash-report hook. Call early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        print_crash_report(info);
    }));
}

fn print_crash_report(info: &PanicHookInfo<'_>) {
    let context = get_current_context();
    let (processed, total) = get_progress();

    eprintln!();
    eprintln!("{RULE}");
    eprintln!("COSTMAP CRASH REPORT (version {VERSION}, {})", std::env::consts::OS);
    eprintln!("{RULE}");
    eprintln!("panic: {}", truncate(&extract_panic_message(info), 200));
    if let Some(location) = info.location() {
        eprintln!(
            "location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }
    for line in context_lines(&context, processed, total) {
        eprintln!("{line}");
    }
    if std::env::var("RUST_BACKTRACE").is_ok() {
        eprintln!("{}", std::backtrace::Backtrace::capture());
    } else {
        eprintln!("run with RUST_BACKTRACE=1 for a stack trace");
    }
    eprintln!("{RULE}");
}

fn context_lines(context: &AnalysisContext, processed: usize, total: usize) -> Vec<String> {
    let mut lines = Vec::new();
    match &context.phase {
        Some(phase) => lines.push(format!("phase: {phase}")),
        None => lines.push("phase: (not set, crash before analysis started)".to_string()),
    }
    if let Some(metadata) = Span::current().metadata() {
        lines.push(format!("span: {}", metadata.name()));
    }
    if let Some(file) = &context.current_file {
        lines.push(format!("file: {}", file.display()));
    }
    if let Some(procedure) = &context.current_procedure {
        lines.push(format!("procedure: {procedure}"));
    }
    if total > 0 {
        let pct = (processed as f64 / total as f64 * 100.0) as usize;
        lines.push(format!("progress: {processed} / {total} files ({pct}%)"));
    }
    lines
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::context::AnalysisPhase;
    use std::path::PathBuf;

    #[test]
    fn long_messages_are_cut_with_an_ellipsis() {
        let result = truncate("this is a long string that needs truncation", 20);
        assert_eq!(result.chars().count(), 20);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate("Θ(n·log(n))", 50), "Θ(n·log(n))");
        assert_eq!(truncate("ΘΘΘΘΘΘ", 5), "ΘΘ...");
    }

    #[test]
    fn report_names_phase_procedure_and_progress() {
        let context = AnalysisContext {
            phase: Some(AnalysisPhase::RecurrenceSolving),
            current_file: Some(PathBuf::from("fib.json")),
            current_procedure: Some("Fib".to_string()),
        };
        let lines = context_lines(&context, 1, 2);
        assert!(lines.contains(&"phase: recurrence_solving".to_string()));
        assert!(lines.contains(&"procedure: Fib".to_string()));
        assert!(lines.contains(&"progress: 1 / 2 files (50%)".to_string()));
    }
}
