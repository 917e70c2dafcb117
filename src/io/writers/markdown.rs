use crate::cost::AnalysisResult;
use crate::engine::Analysis;
use crate::io::output::{ClassifiedFile, FileOutcome, FileReport, OutputWriter};
use crate::recurrence::{MethodReport, RecurrenceSolution};
use std::io::Write;

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_iterative(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "Cost model, {}.",
            result.case_policy.display_name()
        )?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Line | Kind | Constant | Count | Closed |")?;
        writeln!(self.writer, "|------|------|----------|-------|--------|")?;
        for row in &result.rows {
            let closed = row
                .reduced_count
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string);
            writeln!(
                self.writer,
                "| {} | {} | {} | `{}` | `{}` |",
                row.line, row.kind, row.constant_label, row.raw_count, closed
            )?;
        }
        writeln!(self.writer)?;
        writeln!(self.writer, "$$T({}) = {}$$", result.size_variable, result.t_open_latex)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "- Closed: `T({}) = {}`", result.size_variable, result.t_closed)?;
        writeln!(self.writer, "- With all constants 1: `{}`", result.t_polynomial)?;
        writeln!(self.writer, "- Dominant term: `{}`", result.dominant_term)?;
        writeln!(
            self.writer,
            "- Bounds: {}, {}, {}",
            result.big_o,
            result.big_omega,
            result.big_theta.as_deref().unwrap_or("Θ not established")
        )?;
        if !result.symbols.is_empty() {
            writeln!(self.writer)?;
            writeln!(self.writer, "Symbols:")?;
            writeln!(self.writer)?;
            for (name, meaning) in &result.symbols {
                writeln!(self.writer, "- `{name}`: {meaning}")?;
            }
        }
        self.write_notes(result.notes.iter().map(ToString::to_string))
    }

    fn write_recursive(&mut self, solution: &RecurrenceSolution) -> anyhow::Result<()> {
        writeln!(self.writer, "Recurrence: `{}`", solution.recurrence.summary())?;
        writeln!(self.writer)?;
        writeln!(self.writer, "Method: **{}**", solution.method)?;
        writeln!(self.writer)?;
        for (i, step) in solution.derivation_steps.iter().enumerate() {
            writeln!(self.writer, "{}. {}", i + 1, step)?;
        }
        writeln!(self.writer)?;
        writeln!(self.writer, "**Result:** {}", solution.theta)?;
        self.write_notes(solution.notes.iter().map(ToString::to_string))
    }

    fn write_notes(&mut self, notes: impl Iterator<Item = String>) -> anyhow::Result<()> {
        let notes: Vec<String> = notes.collect();
        if notes.is_empty() {
            return Ok(());
        }
        writeln!(self.writer)?;
        writeln!(self.writer, "Notes:")?;
        writeln!(self.writer)?;
        for note in notes {
            writeln!(self.writer, "- {note}")?;
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_reports(&mut self, reports: &[FileReport]) -> anyhow::Result<()> {
        writeln!(self.writer, "# Costmap Analysis Report")?;
        for report in reports {
            writeln!(self.writer)?;
            match &report.outcome {
                FileOutcome::Ok { analysis } => {
                    writeln!(
                        self.writer,
                        "## {} (`{}`)",
                        analysis.procedure(),
                        report.path
                    )?;
                    writeln!(self.writer)?;
                    match &**analysis {
                        Analysis::Iterative(result) => self.write_iterative(result)?,
                        Analysis::Recursive(solution) => self.write_recursive(solution)?,
                    }
                }
                FileOutcome::Failed { error } => {
                    writeln!(self.writer, "## `{}`", report.path)?;
                    writeln!(self.writer)?;
                    writeln!(self.writer, "**Error** ({}): {}", error.reason, error.message)?;
                }
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_classifications(&mut self, files: &[ClassifiedFile]) -> anyhow::Result<()> {
        writeln!(self.writer, "| File | Procedure | Kind | Loops | Self-calls |")?;
        writeln!(self.writer, "|------|-----------|------|-------|------------|")?;
        for file in files {
            let c = &file.classification;
            writeln!(
                self.writer,
                "| {} | {} | {} | {} | {} |",
                file.path,
                c.procedure.as_deref().unwrap_or("-"),
                c.kind,
                if c.has_loops { "yes" } else { "no" },
                c.self_calls
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_methods(&mut self, path: &str, report: &MethodReport) -> anyhow::Result<()> {
        writeln!(self.writer, "## `{path}`")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "Recurrence: `{}`", report.recurrence_summary)?;
        writeln!(self.writer)?;
        for method in &report.methods {
            let marker = if *method == report.default {
                " (default)"
            } else {
                ""
            };
            writeln!(self.writer, "- {method}{marker}")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
