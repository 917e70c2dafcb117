use crate::ast::Program;
use crate::config::CostmapConfig;
use crate::core::{AnalysisOptions, CasePolicy};
use crate::cost::BranchSelection;
use crate::engine::{self, AnalysisMode};
use crate::io::{self, ErrorReport, FileOutcome, FileReport, OutputFormat};
use crate::observability::{
    increment_processed, set_current_file, set_phase, set_progress, AnalysisPhase,
};
use crate::recurrence::SolveMethod;
use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

pub struct AnalyzeConfig {
    pub files: Vec<PathBuf>,
    pub case: Option<CasePolicy>,
    pub method: Option<SolveMethod>,
    pub mode: AnalysisMode,
    pub branch_selection: Option<BranchSelection>,
    pub size_variable: Option<String>,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
}

impl AnalyzeConfig {
    /// Options from the file configuration, overridden by CLI flags.
    pub fn options(&self, file_config: &CostmapConfig) -> AnalysisOptions {
        let mut options = file_config.to_options();
        if let Some(case) = self.case {
            options.case_policy = case;
        }
        if self.method.is_some() {
            options.method = self.method;
        }
        if let Some(selection) = self.branch_selection {
            options.branch_selection = selection;
        }
        if let Some(name) = &self.size_variable {
            options.size_variable = name.clone();
        }
        options
    }
}

/// Analyze every file, in parallel, and write one report.
///
/// Returns `Ok(false)` when at least one file failed.
pub fn handle_analyze(config: AnalyzeConfig, file_config: &CostmapConfig) -> Result<bool> {
    let options = config.options(file_config);
    log::info!(
        "analyzing {} file(s), {} case, mode {:?}",
        config.files.len(),
        options.case_policy,
        config.mode
    );
    set_progress(0, config.files.len());

    let reports: Vec<FileReport> = config
        .files
        .par_iter()
        .map(|path| {
            let report = analyze_file(path, &options, config.mode);
            increment_processed();
            report
        })
        .collect();

    let _phase = set_phase(AnalysisPhase::OutputGeneration);
    let format = config
        .format
        .or_else(|| file_config.default_format())
        .unwrap_or_default();
    let mut writer = io::create_writer(format, config.output.as_deref())?;
    writer.write_reports(&reports)?;
    Ok(!reports.iter().any(FileReport::is_failure))
}

/// Decode and analyze one file. Each call builds its own engine context.
pub fn analyze_file(path: &Path, options: &AnalysisOptions, mode: AnalysisMode) -> FileReport {
    let _file = set_current_file(path);
    let outcome = match load_program(path) {
        Ok(program) => match engine::analyze(&program, options, mode) {
            Ok(analysis) => FileOutcome::Ok {
                analysis: Box::new(analysis),
            },
            Err(err) => {
                log::warn!("{}: {}", path.display(), err);
                FileOutcome::Failed {
                    error: ErrorReport::from(&err),
                }
            }
        },
        Err(err) => FileOutcome::Failed { error: err },
    };
    FileReport {
        path: path.display().to_string(),
        outcome,
    }
}

/// Read and decode an AST document.
pub fn load_program(path: &Path) -> std::result::Result<Program, ErrorReport> {
    let _phase = set_phase(AnalysisPhase::Decoding);
    let source = io::read_file(path).map_err(|e| ErrorReport::io(&e))?;
    Program::from_json(&source).map_err(|e| ErrorReport::from(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisSettings;

    fn config() -> AnalyzeConfig {
        AnalyzeConfig {
            files: vec![],
            case: None,
            method: None,
            mode: AnalysisMode::Auto,
            branch_selection: None,
            size_variable: None,
            format: None,
            output: None,
        }
    }

    #[test]
    fn cli_flags_override_the_config_file() {
        let file_config = CostmapConfig {
            analysis: Some(AnalysisSettings {
                case: Some(CasePolicy::Best),
                method: Some(SolveMethod::Iteration),
                ..Default::default()
            }),
            output: None,
        };
        let mut cli = config();
        assert_eq!(cli.options(&file_config).case_policy, CasePolicy::Best);
        cli.case = Some(CasePolicy::Average);
        let options = cli.options(&file_config);
        assert_eq!(options.case_policy, CasePolicy::Average);
        assert_eq!(options.method, Some(SolveMethod::Iteration));
    }

    #[test]
    fn missing_file_is_an_input_failure() {
        let report = analyze_file(
            Path::new("/nonexistent/costmap/input.json"),
            &AnalysisOptions::default(),
            AnalysisMode::Auto,
        );
        match report.outcome {
            FileOutcome::Failed { error } => assert_eq!(error.reason, "io_error"),
            other => panic!("expected a failure, got {other:?}"),
        }
    }
}
