use crate::io::output::{ClassifiedFile, FileReport, OutputWriter};
use crate::recurrence::MethodReport;
use serde::Serialize;
use std::io::Write;

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_reports(&mut self, reports: &[FileReport]) -> anyhow::Result<()> {
        self.write_json(reports)
    }

    fn write_classifications(&mut self, files: &[ClassifiedFile]) -> anyhow::Result<()> {
        self.write_json(files)
    }

    fn write_methods(&mut self, path: &str, report: &MethodReport) -> anyhow::Result<()> {
        #[derive(Serialize)]
        struct Methods<'a> {
            path: &'a str,
            #[serde(flatten)]
            report: &'a MethodReport,
        }
        self.write_json(&Methods { path, report })
    }
}
