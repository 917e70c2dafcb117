//! `classify` and `methods`: structural questions that stop short of a
//! full analysis.

use super::analyze::load_program;
use crate::classify::{classify_detailed, Classification};
use crate::config::CostmapConfig;
use crate::core::AlgorithmKind;
use crate::engine;
use crate::io::{self, ClassifiedFile, OutputFormat};
use crate::observability::{set_current_file, set_phase, AnalysisPhase};
use anyhow::{anyhow, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

pub fn handle_classify(
    files: &[PathBuf],
    format: Option<OutputFormat>,
    file_config: &CostmapConfig,
) -> Result<()> {
    let classified: Vec<ClassifiedFile> = files.par_iter().map(|path| classify_file(path)).collect();
    let format = format
        .or_else(|| file_config.default_format())
        .unwrap_or_default();
    let _phase = set_phase(AnalysisPhase::OutputGeneration);
    io::create_writer(format, None)?.write_classifications(&classified)
}

/// Unreadable or undecodable files classify as `Unknown`.
fn classify_file(path: &Path) -> ClassifiedFile {
    let _file = set_current_file(path);
    let _phase = set_phase(AnalysisPhase::Classification);
    let classification = match load_program(path) {
        Ok(program) => classify_detailed(&program),
        Err(err) => {
            log::warn!("{}: {}", path.display(), err.message);
            Classification {
                kind: AlgorithmKind::Unknown,
                procedure: None,
                has_loops: false,
                self_calls: 0,
            }
        }
    };
    ClassifiedFile {
        path: path.display().to_string(),
        classification,
    }
}

pub fn handle_methods(
    file: &Path,
    format: Option<OutputFormat>,
    file_config: &CostmapConfig,
) -> Result<()> {
    let _file = set_current_file(file);
    let program = load_program(file).map_err(|e| anyhow!("{}: {}", file.display(), e.message))?;
    let report = engine::detect_applicable_methods(&program, &file_config.to_options())
        .map_err(|e| anyhow!("{}: [{}] {}", file.display(), e.reason(), e))?;
    let format = format
        .or_else(|| file_config.default_format())
        .unwrap_or_default();
    io::create_writer(format, None)?.write_methods(&file.display().to_string(), &report)
}
