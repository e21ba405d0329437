//! Test doubles for the uploader's collaborators, shared by the payload,
//! uploader and engine tests.

pub mod proptest;

use anyhow::anyhow;
use codecov_ports::{CoverageData, HttpRequest, HttpResponse, Transport};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Storage prefix used by the fixtures below.
pub const STORAGE_PREFIX: &str = "https://storage.example/codecov/";

/// A well-formed two-line ping body pointing at `storage_url`.
pub fn ping_body(storage_url: &str) -> String {
    format!("https://codecov.io/github/org/repo/commit/deadbeef\n{storage_url}")
}

/// A well-formed test-result negotiation body.
pub fn test_results_body(storage_url: &str) -> String {
    format!(r#"{{"raw_upload_location": "{storage_url}"}}"#)
}

/// Coverage double that writes a fixed XML report.
#[derive(Debug)]
pub struct DummyCoverage {
    xml: String,
    last_outfile: RefCell<Option<PathBuf>>,
}

impl DummyCoverage {
    pub fn new() -> Self {
        Self::with_xml("<dummy_report/>")
    }

    pub fn with_xml(xml: impl Into<String>) -> Self {
        Self {
            xml: xml.into(),
            last_outfile: RefCell::new(None),
        }
    }

    /// Path of the most recent export target.
    pub fn last_outfile(&self) -> Option<PathBuf> {
        self.last_outfile.borrow().clone()
    }
}

impl Default for DummyCoverage {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverageData for DummyCoverage {
    fn xml_report(&self, outfile: &Path) -> anyhow::Result<()> {
        self.last_outfile.replace(Some(outfile.to_path_buf()));
        std::fs::write(outfile, &self.xml)?;
        Ok(())
    }
}

/// Coverage double with nothing measured.
#[derive(Debug, Default)]
pub struct FailingCoverage {
    last_outfile: RefCell<Option<PathBuf>>,
}

impl FailingCoverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_outfile(&self) -> Option<PathBuf> {
        self.last_outfile.borrow().clone()
    }
}

impl CoverageData for FailingCoverage {
    fn xml_report(&self, outfile: &Path) -> anyhow::Result<()> {
        self.last_outfile.replace(Some(outfile.to_path_buf()));
        Err(anyhow!("No data to report."))
    }
}

#[derive(Debug)]
struct StubState {
    calls: Vec<HttpRequest>,
    queued: VecDeque<HttpResponse>,
    fallback: HttpResponse,
    connection_error: bool,
    fail_after: Option<usize>,
}

/// Recording transport with canned responses.
///
/// Queued responses are served in order and the last one repeats
/// indefinitely. With connection errors switched on, requests fail without
/// being recorded.
#[derive(Debug)]
pub struct StubTransport {
    state: RefCell<StubState>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(StubState {
                calls: Vec::new(),
                queued: VecDeque::new(),
                fallback: HttpResponse::new(200, ""),
                connection_error: false,
                fail_after: None,
            }),
        }
    }

    pub fn set_response(&self, status: u16, body: impl Into<String>) {
        let mut state = self.state.borrow_mut();
        state.queued.clear();
        state.fallback = HttpResponse::new(status, body);
    }

    pub fn set_responses<I>(&self, responses: I)
    where
        I: IntoIterator<Item = HttpResponse>,
    {
        let mut state = self.state.borrow_mut();
        state.queued = responses.into_iter().collect();
        assert!(!state.queued.is_empty(), "set_responses needs at least one response");
    }

    pub fn fail_connections(&self, fail: bool) {
        self.state.borrow_mut().connection_error = fail;
    }

    /// Let the first `successes` requests through, then refuse every one after.
    pub fn fail_connections_after(&self, successes: usize) {
        self.state.borrow_mut().fail_after = Some(successes);
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    /// Take the recorded calls, leaving the log empty.
    pub fn pop(&self) -> Vec<HttpRequest> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for StubTransport {
    fn send(&self, request: &HttpRequest) -> anyhow::Result<HttpResponse> {
        let mut state = self.state.borrow_mut();
        let exhausted = state.fail_after.is_some_and(|n| state.calls.len() >= n);
        if state.connection_error || exhausted {
            return Err(anyhow!("connection refused: {}", request.url));
        }
        state.calls.push(request.clone());

        match state.queued.pop_front() {
            Some(response) => {
                if state.queued.is_empty() {
                    state.fallback = response.clone();
                }
                Ok(response)
            }
            None => Ok(state.fallback.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_queued_response_repeats() -> anyhow::Result<()> {
        let stub = StubTransport::new();
        stub.set_responses([HttpResponse::new(200, "a"), HttpResponse::new(500, "b")]);

        let req = HttpRequest::post("https://x");
        assert_eq!(stub.send(&req)?.body, "a");
        assert_eq!(stub.send(&req)?.body, "b");
        assert_eq!(stub.send(&req)?.body, "b");
        assert_eq!(stub.call_count(), 3);
        Ok(())
    }

    #[test]
    fn connection_errors_are_not_recorded() {
        let stub = StubTransport::new();
        stub.fail_connections(true);
        assert!(stub.send(&HttpRequest::put("https://x")).is_err());
        assert_eq!(stub.call_count(), 0);
    }

    #[test]
    fn fail_after_lets_first_requests_through() {
        let stub = StubTransport::new();
        stub.fail_connections_after(1);
        let req = HttpRequest::post("https://x");
        assert!(stub.send(&req).is_ok());
        assert!(stub.send(&req).is_err());
        assert_eq!(stub.call_count(), 1);
    }

    #[test]
    fn pop_drains_calls() -> anyhow::Result<()> {
        let stub = StubTransport::new();
        stub.send(&HttpRequest::put("https://x"))?;
        assert_eq!(stub.pop().len(), 1);
        assert!(stub.calls().is_empty());
        Ok(())
    }

    #[test]
    fn dummy_coverage_writes_report() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("coverage.xml");
        let cov = DummyCoverage::new();
        cov.xml_report(&path)?;
        assert_eq!(std::fs::read_to_string(&path)?, "<dummy_report/>");
        assert_eq!(cov.last_outfile(), Some(path));
        Ok(())
    }
}
