//! Test-result artifacts queued for the second-phase upload.
//!
//! Each artifact is zlib-compressed, base64-encoded and stored as an entry.
//! The entries are PUT together as
//! `{"test_results_files": [{filename, format, data, labels}, ...]}`.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use codecov_compressor::{CompressionConfig, Compressor};
use codecov_error::{CodecovError, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_JUNIT_FILENAME: &str = "junit.xml";

/// Encoding tag of an entry's `data` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TestResultFormat {
    #[default]
    #[serde(rename = "base64+compressed")]
    Base64Compressed,
}

/// One packaged test-result artifact. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResultEntry {
    pub filename: String,
    pub format: TestResultFormat,
    pub data: String,
    /// Reserved by the service; always empty for now.
    pub labels: String,
}

impl TestResultEntry {
    pub fn from_bytes(filename: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let compressed = Compressor::new(CompressionConfig::test_results())
            .compress(bytes)
            .map_err(|e| {
                CodecovError::with_source("Failed to compress test results", ErrorKind::Io, e)
            })?;

        Ok(Self {
            filename: filename.into(),
            format: TestResultFormat::Base64Compressed,
            data: STANDARD.encode(compressed),
            labels: String::new(),
        })
    }

    pub fn from_file(path: &Path, filename: impl Into<String>) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            CodecovError::with_source("Failed to read test results file", ErrorKind::Io, e)
                .with_context("path", path.display().to_string())
        })?;
        Self::from_bytes(filename, &bytes)
    }

    /// Reverse the encoding and return the original file contents.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let compressed = STANDARD.decode(&self.data).map_err(|e| {
            CodecovError::with_source("Test results data is not valid base64", ErrorKind::Io, e)
                .with_context("filename", self.filename.clone())
        })?;
        Compressor::new(CompressionConfig::test_results())
            .decompress(&compressed)
            .map_err(|e| {
                CodecovError::with_source("Failed to decompress test results", ErrorKind::Io, e)
                    .with_context("filename", self.filename.clone())
            })
    }
}

#[derive(Serialize)]
struct TestResultsBody<'a> {
    test_results_files: &'a [TestResultEntry],
}

/// Render the second-phase PUT body as ASCII-only JSON.
pub fn test_results_body(entries: &[TestResultEntry]) -> Result<String> {
    let json = serde_json::to_string(&TestResultsBody {
        test_results_files: entries,
    })
    .map_err(|e| {
        CodecovError::with_source("Failed to serialize test results", ErrorKind::Io, e)
    })?;
    Ok(escape_non_ascii(&json))
}

/// Escape every non-ASCII character as `\uXXXX`, using surrogate pairs
/// outside the BMP.
///
/// Non-ASCII characters can only occur inside JSON strings, so the escaped
/// text is still the same JSON document.
fn escape_non_ascii(json: &str) -> String {
    if json.is_ascii() {
        return json.to_string();
    }
    let mut out = String::with_capacity(json.len() + 16);
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}
