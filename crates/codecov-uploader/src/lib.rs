//! Two-phase upload to the codecov service.
//!
//! [`CodecovUploader::ping`] announces the upload and receives a signed
//! storage URL; [`CodecovUploader::upload`] PUTs the gzip-compressed payload
//! there. When test results are queued, the ping also negotiates a second
//! storage location and the upload follows up with a best-effort PUT of the
//! packaged artifacts.
//!
//! ```text
//! Idle --ping ok--> Pinged --upload ok--> Idle
//!                     |  ^
//!                     +--+ upload rejected (handle kept, retry allowed)
//! ```

pub mod protocol;

pub use protocol::{
    LocationRejected, TEST_RESULTS_PATH, UPLOAD_PATH, parse_ping_response,
    parse_test_results_location,
};

use codecov_compressor::{CompressionConfig, CompressionStats, Compressor};
use codecov_config::{RepoIdentity, UploaderConfig};
use codecov_error::{
    CodecovError, ErrorKind, Result, configuration_error, sequence_error, transport_error,
    upload_error,
};
use codecov_payload::{DEFAULT_COVERAGE_FILENAME, PayloadBuffer};
use codecov_ports::{CoverageData, HttpRequest, Transport};
use codecov_test_results::{DEFAULT_JUNIT_FILENAME, TestResultEntry, test_results_body};
use log::{debug, info, warn};
use protocol::TestResultsRequest;
use std::path::Path;

/// What happened to the queued test results during an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResultsUpload {
    /// No test-result location was negotiated, or nothing was queued.
    Skipped,
    Uploaded,
    /// The follow-up PUT failed; the coverage upload still counts.
    Failed,
}

/// Outcome of a successful [`CodecovUploader::upload`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadSummary {
    pub compression: CompressionStats,
    pub test_results: TestResultsUpload,
}

/// Client for one upload session.
///
/// All requests go through the injected [`Transport`]. Storage handles are
/// single-use: a successful upload clears them and another ping is needed.
pub struct CodecovUploader<T> {
    identity: RepoIdentity,
    config: UploaderConfig,
    transport: T,
    payload: PayloadBuffer,
    coverage_store_url: Option<String>,
    test_result_store_url: Option<String>,
    test_result_files: Vec<TestResultEntry>,
}

impl<T: Transport> CodecovUploader<T> {
    pub fn new(identity: RepoIdentity, config: &UploaderConfig, transport: T) -> Self {
        Self {
            identity,
            config: config.clone(),
            transport,
            payload: PayloadBuffer::new(),
            coverage_store_url: None,
            test_result_store_url: None,
            test_result_files: Vec::new(),
        }
    }

    /// Append the tracked file list and the network sentinel to the payload.
    pub fn add_network_files<S: AsRef<str>>(&mut self, files: &[S]) {
        self.payload.add_network_files(files);
    }

    /// Export `cov` as XML and append it as `coverage.xml`.
    pub fn add_coverage_report<C>(&mut self, cov: &C) -> Result<()>
    where
        C: CoverageData + ?Sized,
    {
        self.add_coverage_report_as(cov, DEFAULT_COVERAGE_FILENAME)
    }

    pub fn add_coverage_report_as<C>(&mut self, cov: &C, filename: &str) -> Result<()>
    where
        C: CoverageData + ?Sized,
    {
        self.payload.add_coverage_report(cov, filename)
    }

    /// Queue a JUnit XML file under the name `junit.xml`.
    pub fn add_junit_xml(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.add_junit_xml_as(path, DEFAULT_JUNIT_FILENAME)
    }

    pub fn add_junit_xml_as(&mut self, path: impl AsRef<Path>, filename: &str) -> Result<()> {
        let entry = TestResultEntry::from_file(path.as_ref(), filename)?;
        debug!(
            "queued test results {} ({} encoded bytes)",
            entry.filename,
            entry.data.len()
        );
        self.test_result_files.push(entry);
        Ok(())
    }

    /// The payload accumulated so far.
    pub fn payload(&self) -> &str {
        self.payload.as_str()
    }

    pub fn reset_payload(&mut self) {
        self.payload.reset();
    }

    pub fn identity(&self) -> &RepoIdentity {
        &self.identity
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn coverage_store_url(&self) -> Option<&str> {
        self.coverage_store_url.as_deref()
    }

    pub fn test_result_store_url(&self) -> Option<&str> {
        self.test_result_store_url.as_deref()
    }

    pub fn test_result_files(&self) -> &[TestResultEntry] {
        &self.test_result_files
    }

    /// Announce the upload and obtain storage URLs.
    ///
    /// Any handle left over from an earlier ping is dropped first. Without a
    /// slug nothing is sent. The test-result negotiation never fails the ping.
    pub fn ping(&mut self) -> Result<()> {
        self.coverage_store_url = None;
        self.test_result_store_url = None;

        let Some(slug) = self.identity.slug().map(str::to_owned) else {
            return Err(configuration_error(
                "Failed to determine git repository slug. Cannot ping without a valid slug.",
            ));
        };
        let branch = self.identity.branch().unwrap_or_default().to_owned();
        let commit = self.identity.commit().unwrap_or_default().to_owned();

        info!("pinging codecov API for {slug} (branch={branch:?}, commit={commit:?})");

        // the API expects every parameter, the unused CI ones empty
        let request = HttpRequest::post(self.config.api_url(UPLOAD_PATH))
            .header("X-Reduced-Redundancy", "false")
            .header("X-Content-Type", "application/x-gzip")
            .header("Content-Length", "0")
            .query_param("package", self.config.package.as_str())
            .query_param("token", self.identity.token().unwrap_or_default())
            .query_param("branch", branch.as_str())
            .query_param("commit", commit.as_str())
            .query_param("build", "")
            .query_param("build_url", "")
            .query_param("name", "")
            .query_param("tag", "")
            .query_param("slug", slug.as_str())
            .query_param("service", "")
            .query_param("flags", "")
            .query_param("pr", "")
            .query_param("job", "")
            .query_param("cmd_args", "");

        let response = self
            .transport
            .send(&request)
            .map_err(|e| transport_error("Failed to reach codecov API", e))?;
        let store_url = parse_ping_response(&response.body, &self.config.storage_endpoint)?;
        debug!("coverage storage URL: {store_url}");
        self.coverage_store_url = Some(store_url);

        if !self.test_result_files.is_empty() {
            self.negotiate_test_results(&slug, &branch, &commit);
        }
        Ok(())
    }

    fn negotiate_test_results(&mut self, slug: &str, branch: &str, commit: &str) {
        let body = match serde_json::to_vec(&TestResultsRequest {
            slug,
            branch,
            commit,
        }) {
            Ok(body) => body,
            Err(e) => {
                warn!("skipping test results upload: {e}");
                return;
            }
        };

        let mut request = HttpRequest::post(self.config.api_url(TEST_RESULTS_PATH))
            .header("Content-Type", "application/json")
            .body(body);
        if let Some(token) = self.identity.token() {
            request = request
                .header("Authorization", format!("token {token}"))
                .header("User-Agent", self.config.package.as_str());
        }

        match self.transport.send(&request) {
            Err(e) => warn!("test results negotiation failed: {e:#}"),
            Ok(response) if !response.is_ok() => warn!(
                "test results negotiation rejected with status {}",
                response.status
            ),
            Ok(response) => {
                match parse_test_results_location(&response.body, &self.config.storage_endpoint) {
                    Ok(url) => {
                        debug!("test results storage URL: {url}");
                        self.test_result_store_url = Some(url);
                    }
                    Err(rejected) => warn!("ignoring test results location: {rejected}"),
                }
            }
        }
    }

    /// PUT the compressed payload to the URL obtained by [`ping`](Self::ping).
    ///
    /// A rejected PUT keeps the handle so the upload can be retried.
    pub fn upload(&mut self) -> Result<UploadSummary> {
        let Some(store_url) = self.coverage_store_url.clone() else {
            return Err(sequence_error("Need to ping API before upload."));
        };

        let (compressed, compression) = Compressor::new(CompressionConfig::coverage_payload())
            .compress_with_stats(self.payload.as_str().as_bytes())
            .map_err(|e| CodecovError::with_source("Failed to compress payload", ErrorKind::Io, e))?;
        info!(
            "uploading {} bytes ({} before compression, {:.1}% saved)",
            compression.compressed_size,
            compression.original_size,
            compression.savings_percent()
        );

        let request = HttpRequest::put(store_url)
            .header("Content-Type", "application/x-gzip")
            .header("Content-Encoding", "gzip")
            .body(compressed);
        let response = self
            .transport
            .send(&request)
            .map_err(|e| transport_error("Failed to reach storage endpoint", e))?;
        if !response.is_ok() {
            return Err(upload_error("Failed to upload report to storage endpoint.")
                .with_context("status", response.status.to_string()));
        }
        self.coverage_store_url = None;

        let test_results = self.upload_test_results();
        Ok(UploadSummary {
            compression,
            test_results,
        })
    }

    fn upload_test_results(&mut self) -> TestResultsUpload {
        if self.test_result_files.is_empty() {
            return TestResultsUpload::Skipped;
        }
        let Some(store_url) = self.test_result_store_url.take() else {
            return TestResultsUpload::Skipped;
        };

        let body = match test_results_body(&self.test_result_files) {
            Ok(body) => body,
            Err(e) => {
                warn!("skipping test results upload: {e}");
                return TestResultsUpload::Failed;
            }
        };

        match self.transport.send(&HttpRequest::put(store_url).body(body)) {
            Ok(response) if response.is_ok() => {
                info!("uploaded {} test results file(s)", self.test_result_files.len());
                TestResultsUpload::Uploaded
            }
            Ok(response) => {
                warn!("test results upload rejected with status {}", response.status);
                TestResultsUpload::Failed
            }
            Err(e) => {
                warn!("test results upload failed: {e:#}");
                TestResultsUpload::Failed
            }
        }
    }
}

impl<T> std::fmt::Debug for CodecovUploader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecovUploader")
            .field("slug", &self.identity.slug())
            .field("payload_len", &self.payload.len())
            .field("coverage_store_url", &self.coverage_store_url)
            .field("test_result_store_url", &self.test_result_store_url)
            .field("test_result_files", &self.test_result_files.len())
            .finish_non_exhaustive()
    }
}
