pub mod output;
pub mod writers;

pub use output::{
    create_writer, ClassifiedFile, ErrorReport, FileOutcome, FileReport, OutputFormat,
    OutputWriter,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn file_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}
