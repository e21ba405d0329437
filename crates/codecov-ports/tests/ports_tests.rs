//! Tests for codecov-ports crate.

use codecov_ports::{CoverageData, HttpRequest, HttpResponse, Method, Transport};
use std::cell::Cell;
use std::path::Path;
use std::sync::Arc;

/// Mock coverage that writes a fixed report.
struct MockCoverage;

impl CoverageData for MockCoverage {
    fn xml_report(&self, outfile: &Path) -> anyhow::Result<()> {
        std::fs::write(outfile, "<coverage/>")?;
        Ok(())
    }
}

/// Mock transport that echoes the method and counts calls.
struct EchoTransport {
    calls: Cell<usize>,
}

impl Transport for EchoTransport {
    fn send(&self, request: &HttpRequest) -> anyhow::Result<HttpResponse> {
        self.calls.set(self.calls.get() + 1);
        Ok(HttpResponse::new(200, request.method.as_str()))
    }
}

#[test]
fn request_builder_keeps_order() {
    let req = HttpRequest::post("https://codecov.io/upload/v4")
        .header("X-Reduced-Redundancy", "false")
        .query_param("package", "p")
        .query_param("token", "")
        .query_param("slug", "org/repo");

    assert_eq!(req.method, Method::Post);
    let names: Vec<&str> = req.query.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, vec!["package", "token", "slug"]);
    assert_eq!(req.query_value("slug"), Some("org/repo"));
    assert_eq!(req.query_value("missing"), None);
}

#[test]
fn header_lookup_is_case_insensitive() {
    let req = HttpRequest::put("https://storage.example/x")
        .header("Content-Encoding", "gzip");
    assert_eq!(req.header_value("content-encoding"), Some("gzip"));
    assert_eq!(req.header_value("CONTENT-ENCODING"), Some("gzip"));
    assert_eq!(req.header_value("content-type"), None);
}

#[test]
fn response_ok_boundary() {
    assert!(HttpResponse::new(200, "").is_ok());
    assert!(HttpResponse::new(302, "").is_ok());
    assert!(HttpResponse::new(399, "").is_ok());
    assert!(!HttpResponse::new(400, "").is_ok());
    assert!(!HttpResponse::new(503, "").is_ok());
}

#[test]
fn transport_by_reference_shares_state() -> anyhow::Result<()> {
    let transport = EchoTransport { calls: Cell::new(0) };
    let borrowed = &transport;

    let resp = borrowed.send(&HttpRequest::put("https://x"))?;
    assert_eq!(resp.body, "PUT");
    borrowed.send(&HttpRequest::post("https://x"))?;

    assert_eq!(transport.calls.get(), 2);
    Ok(())
}

#[test]
fn boxed_transport_works() -> anyhow::Result<()> {
    let transport: Box<dyn Transport> = Box::new(EchoTransport { calls: Cell::new(0) });
    let resp = transport.send(&HttpRequest::post("https://x"))?;
    assert_eq!(resp.body, "POST");
    Ok(())
}

#[test]
fn coverage_trait_objects_work_with_arc() -> anyhow::Result<()> {
    let cov: Arc<dyn CoverageData> = Arc::new(MockCoverage);
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("coverage.xml");

    cov.xml_report(&path)?;
    assert_eq!(std::fs::read_to_string(&path)?, "<coverage/>");
    Ok(())
}
