//! Markdown report: aggregation of worker results and persistence.

use crate::backends::{ChecksumError, StorageBackend};
use crate::pool::ResultRecord;
use crossbeam_channel::Receiver;
use std::path::Path;

pub const HEADER: &str = "| Filename | SHA256 |\n| --- | --- |\n";

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub name: String,
    pub digest: String,
}

/// Successful records in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    rows: Vec<Row>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain `results` until every sender is gone.
    /// Returns the report and how many failure records were seen.
    pub fn collect(results: &Receiver<ResultRecord>) -> (Self, usize) {
        let mut report = Report::new();
        let mut failed = 0;
        for record in results.iter() {
            if !report.push(record) {
                failed += 1;
            }
        }
        (report, failed)
    }

    /// Append a record. Failure records are dropped and `false` is returned.
    pub fn push(&mut self, record: ResultRecord) -> bool {
        match record.digest {
            Some(digest) => {
                self.rows.push(Row {
                    name: record.display_name,
                    digest,
                });
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sort_by_name(&mut self) {
        self.rows.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(HEADER.len() + self.rows.len() * 96);
        out.push_str(HEADER);
        for row in &self.rows {
            out.push_str("| ");
            out.push_str(&escape_cell(&row.name));
            out.push_str(" | ");
            out.push_str(&row.digest);
            out.push_str(" |\n");
        }
        out
    }
}

/// Keep a file name inside its table cell: pipes are escaped and line
/// breaks become spaces.
fn escape_cell(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '|' => out.push_str("\\|"),
            '\n' | '\r' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Create or truncate `destination` and write the rendered report.
pub fn write_report(
    backend: &dyn StorageBackend,
    destination: &Path,
    report: &Report,
) -> Result<(), ChecksumError> {
    backend
        .put(destination, report.render().as_bytes())
        .map_err(|e| ChecksumError::ReportWrite(destination.to_path_buf(), e))
}
