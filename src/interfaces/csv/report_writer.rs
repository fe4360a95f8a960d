use crate::application::checkout::CheckoutReport;
use crate::error::Result;
use std::io::Write;

/// Writes checkout reports as CSV, header first.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_report(&mut self, report: &CheckoutReport) -> Result<()> {
        self.writer.serialize(report)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
