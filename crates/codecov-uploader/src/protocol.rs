//! Request layout and response parsing for the upload API.

use codecov_error::{Result, protocol_error};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const UPLOAD_PATH: &str = "/upload/v4";
pub const TEST_RESULTS_PATH: &str = "/upload/test_results/v1";

/// Extract the coverage storage URL from a ping response.
///
/// The body must be exactly two lines, the second starting with
/// `storage_prefix`. Anything else is a protocol error carrying the raw body.
/// Lines break on `\r\n` and on every single-character Unicode line
/// boundary, bare `\r` included.
pub fn parse_ping_response(body: &str, storage_prefix: &str) -> Result<String> {
    let lines = split_lines(body);
    match lines.as_slice() {
        [_, url] if url.starts_with(storage_prefix) => Ok(url.to_string()),
        _ => Err(protocol_error(body)),
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split on line boundaries. A trailing terminator does not open a new line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(is_line_break) {
            Some(at) => {
                lines.push(&rest[..at]);
                let skip = if rest[at..].starts_with("\r\n") {
                    2
                } else {
                    rest[at..].chars().next().map_or(1, char::len_utf8)
                };
                rest = &rest[at + skip..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResultsRequest<'a> {
    pub slug: &'a str,
    pub branch: &'a str,
    pub commit: &'a str,
}

#[derive(Debug, Deserialize)]
struct TestResultsLocation {
    raw_upload_location: String,
}

/// Why a test-result negotiation response was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationRejected {
    /// Not JSON, or no string `raw_upload_location` field.
    Malformed(String),
    /// The location does not point at the configured storage.
    ForeignStorage(String),
}

impl fmt::Display for LocationRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationRejected::Malformed(reason) => {
                write!(f, "malformed test results response: {reason}")
            }
            LocationRejected::ForeignStorage(url) => {
                write!(f, "test results location outside storage endpoint: {url}")
            }
        }
    }
}

/// Extract the test-result storage URL from the negotiation response.
pub fn parse_test_results_location(
    body: &str,
    storage_prefix: &str,
) -> std::result::Result<String, LocationRejected> {
    let location: TestResultsLocation =
        serde_json::from_str(body).map_err(|e| LocationRejected::Malformed(e.to_string()))?;
    if location.raw_upload_location.starts_with(storage_prefix) {
        Ok(location.raw_upload_location)
    } else {
        Err(LocationRejected::ForeignStorage(location.raw_upload_location))
    }
}
