use crate::cost::AnalysisResult;
use crate::engine::Analysis;
use crate::io::output::{ClassifiedFile, FileOutcome, FileReport, OutputWriter};
use crate::recurrence::{MethodReport, RecurrenceSolution};
use colored::*;
use std::io::Write;

const RULE: &str = "═══════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────";

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn print_header(&mut self, title: &str) -> anyhow::Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", RULE.cyan())?;
        writeln!(self.writer, "  {}", title.bold().cyan())?;
        writeln!(self.writer, "{}", RULE.cyan())?;
        Ok(())
    }

    fn print_iterative(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "{} ({})",
            "Cost model".bold(),
            result.case_policy.display_name()
        )?;
        writeln!(self.writer, "{THIN_RULE}")?;
        writeln!(
            self.writer,
            "{:>5}  {:<7} {:<5} {}",
            "line", "kind", "cost", "count"
        )?;
        for row in &result.rows {
            let count = match &row.reduced_count {
                Some(closed) if closed != &row.raw_count => {
                    format!("{} = {}", row.raw_count, closed)
                }
                _ => row.raw_count.to_string(),
            };
            writeln!(
                self.writer,
                "{:>5}  {:<7} {:<5} {}",
                row.line,
                row.kind.to_string(),
                row.constant_label,
                count
            )?;
        }
        writeln!(self.writer, "{THIN_RULE}")?;
        let n = &result.size_variable;
        writeln!(self.writer, "T({n}) = {}", result.t_open)?;
        writeln!(self.writer, "T({n}) = {}", result.t_closed)?;
        writeln!(self.writer, "T({n}) ≈ {}", result.t_polynomial)?;
        writeln!(self.writer, "dominant term: {}", result.dominant_term)?;
        match &result.big_theta {
            Some(theta) => writeln!(self.writer, "{}", theta.green().bold())?,
            None => writeln!(
                self.writer,
                "{}  {}",
                result.big_o.yellow().bold(),
                result.big_omega.yellow().bold()
            )?,
        }
        for (name, meaning) in &result.symbols {
            writeln!(self.writer, "  {} {}", name.cyan(), meaning)?;
        }
        self.print_notes(result.notes.iter().map(|n| (n.is_degradation(), n.message.as_str())))
    }

    fn print_recursive(&mut self, solution: &RecurrenceSolution) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "{} via {}",
            solution.recurrence.summary().bold(),
            solution.method.to_string().cyan()
        )?;
        writeln!(self.writer, "{THIN_RULE}")?;
        for step in &solution.derivation_steps {
            writeln!(self.writer, "  {step}")?;
        }
        writeln!(self.writer, "{THIN_RULE}")?;
        writeln!(self.writer, "{}", solution.theta.green().bold())?;
        self.print_notes(
            solution
                .notes
                .iter()
                .map(|n| (n.is_degradation(), n.message.as_str())),
        )
    }

    fn print_notes<'a>(
        &mut self,
        notes: impl Iterator<Item = (bool, &'a str)>,
    ) -> anyhow::Result<()> {
        for (degraded, message) in notes {
            if degraded {
                writeln!(self.writer, "{} {}", "⚠".yellow(), message.yellow())?;
            } else {
                writeln!(self.writer, "{} {}", "ℹ".blue(), message)?;
            }
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_reports(&mut self, reports: &[FileReport]) -> anyhow::Result<()> {
        for report in reports {
            match &report.outcome {
                FileOutcome::Ok { analysis } => {
                    self.print_header(&format!("{}  ({})", analysis.procedure(), report.path))?;
                    match &**analysis {
                        Analysis::Iterative(result) => self.print_iterative(result)?,
                        Analysis::Recursive(solution) => self.print_recursive(solution)?,
                    }
                }
                FileOutcome::Failed { error } => {
                    self.print_header(&report.path)?;
                    writeln!(
                        self.writer,
                        "{} [{}] {}",
                        "✗".red(),
                        error.reason.red(),
                        error.message
                    )?;
                }
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_classifications(&mut self, files: &[ClassifiedFile]) -> anyhow::Result<()> {
        for file in files {
            let c = &file.classification;
            writeln!(
                self.writer,
                "{:<12} {} ({}, {} self-call(s)) {}",
                c.kind.to_string().bold(),
                c.procedure.as_deref().unwrap_or("-"),
                if c.has_loops { "loops" } else { "no loops" },
                c.self_calls,
                file.path.dimmed()
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_methods(&mut self, path: &str, report: &MethodReport) -> anyhow::Result<()> {
        writeln!(self.writer, "{} {}", report.recurrence_summary.bold(), path.dimmed())?;
        for method in &report.methods {
            if *method == report.default {
                writeln!(self.writer, "  {} {}", method.to_string().green(), "(default)".dimmed())?;
            } else {
                writeln!(self.writer, "  {method}")?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}
