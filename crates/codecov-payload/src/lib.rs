//! Coverage payload in the sentinel-delimited wire format.
//!
//! The remote parser expects, in order:
//!
//! ```text
//! path/one
//! path/two
//! <<<<<< network
//! # path=./coverage.xml
//! <coverage .../>
//! <<<<<< EOF
//! ```
//!
//! where the report block may repeat. Segments are appended in call order
//! and never reordered.

use codecov_error::{CodecovError, ErrorKind, Result, report_generation_error};
use codecov_ports::CoverageData;
use log::debug;

pub const NETWORK_SENTINEL: &str = "<<<<<< network";
pub const EOF_SENTINEL: &str = "<<<<<< EOF";
pub const DEFAULT_COVERAGE_FILENAME: &str = "coverage.xml";

/// Append-only text buffer holding the coverage bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadBuffer {
    text: String,
}

impl PayloadBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the tracked file list followed by the network sentinel.
    ///
    /// Meant to be called once; every call adds another sentinel block.
    pub fn add_network_files<S: AsRef<str>>(&mut self, files: &[S]) {
        for (i, file) in files.iter().enumerate() {
            if i > 0 {
                self.text.push('\n');
            }
            self.text.push_str(file.as_ref());
        }
        if !files.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(NETWORK_SENTINEL);
    }

    /// Append an already rendered XML report under `filename`.
    pub fn add_report_fragment(&mut self, filename: &str, xml: &str) {
        self.text.push_str("\n# path=./");
        self.text.push_str(filename);
        self.text.push('\n');
        self.text.push_str(xml);
        self.text.push('\n');
        self.text.push_str(EOF_SENTINEL);
    }

    /// Export `cov` as XML and append it under `filename`.
    ///
    /// The report is rendered before anything is written, so on failure the
    /// buffer is left exactly as it was.
    pub fn add_coverage_report<C>(&mut self, cov: &C, filename: &str) -> Result<()>
    where
        C: CoverageData + ?Sized,
    {
        let xml = export_xml_report(cov)?;
        debug!("embedding {} bytes of XML report as ./{}", xml.len(), filename);
        self.add_report_fragment(filename, &xml);
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The only operation that ever truncates the buffer.
    pub fn reset(&mut self) {
        self.text.clear();
    }
}

/// Render `cov` through a temporary file and read the report back.
///
/// The temporary file is removed before this returns, whatever the outcome.
pub fn export_xml_report<C>(cov: &C) -> Result<String>
where
    C: CoverageData + ?Sized,
{
    let report = tempfile::Builder::new()
        .prefix("codecov-report-")
        .suffix(".xml")
        .tempfile()
        .map_err(|e| {
            CodecovError::with_source("Failed to create temporary report file", ErrorKind::Io, e)
        })?;

    cov.xml_report(report.path())
        .map_err(|e| report_generation_error("Failed to generate coverage report", e))?;

    std::fs::read_to_string(report.path())
        .map_err(|e| report_generation_error("Failed to read generated coverage report", e))
}
