use crate::classify::Classification;
use crate::engine::Analysis;
use crate::errors::{AnalysisError, ErrorCategory};
use crate::io::writers::{JsonWriter, MarkdownWriter, TerminalWriter};
use crate::recurrence::MethodReport;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    Markdown,
}

/// A failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub reason: String,
    pub category: ErrorCategory,
    pub code: Option<String>,
    pub message: String,
}

impl From<&AnalysisError> for ErrorReport {
    fn from(err: &AnalysisError) -> Self {
        Self {
            reason: err.reason().to_string(),
            category: err.category(),
            code: Some(err.code().to_string()),
            message: err.to_string(),
        }
    }
}

impl ErrorReport {
    /// An I/O failure outside the engine, e.g. an unreadable file.
    pub fn io(err: &anyhow::Error) -> Self {
        Self {
            reason: "io_error".to_string(),
            category: ErrorCategory::Input,
            code: None,
            message: format!("{err:#}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    Ok { analysis: Box<Analysis> },
    Failed { error: ErrorReport },
}

/// Result of analysing one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed { .. })
    }
}

/// Classification of one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedFile {
    pub path: String,
    #[serde(flatten)]
    pub classification: Classification,
}

pub trait OutputWriter {
    fn write_reports(&mut self, reports: &[FileReport]) -> anyhow::Result<()>;
    fn write_classifications(&mut self, files: &[ClassifiedFile]) -> anyhow::Result<()>;
    fn write_methods(&mut self, path: &str, report: &MethodReport) -> anyhow::Result<()>;
}

/// Writer for `format`, sending output to `destination` or stdout.
pub fn create_writer(
    format: OutputFormat,
    destination: Option<&Path>,
) -> anyhow::Result<Box<dyn OutputWriter>> {
    let sink: Box<dyn Write> = match destination {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };
    Ok(match format {
        OutputFormat::Json => Box::new(JsonWriter::new(sink)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(sink)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(sink)),
    })
}
