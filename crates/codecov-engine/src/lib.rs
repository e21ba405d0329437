//! Orchestration for one coverage upload.
//!
//! Assembles the payload from the job's inputs, then either hands the payload
//! back (dump mode) or drives the ping/upload exchange against the service.

use codecov_config::{CodecovConfig, RepoIdentity, UploaderConfig};
use codecov_error::{CodecovError, ErrorKind, Result, configuration_error};
use codecov_http::ReqwestTransport;
use codecov_ports::{CoverageData, Transport};
use codecov_uploader::{CodecovUploader, UploadSummary};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Inputs for a single run.
pub struct UploadJob<'a> {
    pub coverage: &'a dyn CoverageData,
    /// Tracked files for the network section; `None` omits the section.
    pub network_files: Option<Vec<String>>,
    pub junit_xml: Option<PathBuf>,
    /// Return the assembled payload instead of uploading it.
    pub dump: bool,
}

impl<'a> UploadJob<'a> {
    pub fn new(coverage: &'a dyn CoverageData) -> Self {
        Self {
            coverage,
            network_files: None,
            junit_xml: None,
            dump: false,
        }
    }

    pub fn with_network_files(mut self, files: Vec<String>) -> Self {
        self.network_files = Some(files);
        self
    }

    /// Fill the network section by walking `root`.
    pub fn with_network_root(self, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let files = codecov_network::list_files(root).map_err(|e| {
            CodecovError::with_source("Failed to list network files", ErrorKind::Io, e)
                .with_context("root", root.display().to_string())
        })?;
        Ok(self.with_network_files(files))
    }

    pub fn with_junit_xml(mut self, path: impl Into<PathBuf>) -> Self {
        self.junit_xml = Some(path.into());
        self
    }

    pub fn dump(mut self, dump: bool) -> Self {
        self.dump = dump;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The payload, exactly as it would have been uploaded.
    Dumped(String),
    Uploaded(UploadSummary),
}

/// Assemble the payload for `job` and upload it through `transport`.
///
/// Nothing goes over the wire in dump mode or when the slug is missing.
pub fn run<T: Transport>(
    identity: RepoIdentity,
    config: &UploaderConfig,
    transport: T,
    job: UploadJob<'_>,
) -> Result<RunOutcome> {
    identity.validate()?;

    let mut uploader = CodecovUploader::new(identity, config, transport);
    if let Some(files) = &job.network_files {
        uploader.add_network_files(files.as_slice());
    }
    uploader.add_coverage_report(job.coverage)?;
    if let Some(junit) = &job.junit_xml {
        uploader.add_junit_xml(junit)?;
    }

    if job.dump {
        return Ok(RunOutcome::Dumped(uploader.payload().to_owned()));
    }

    let identity = uploader.identity();
    if identity.slug().is_none() {
        return Err(configuration_error(
            "Failed to determine git repository slug. Cannot upload without a valid slug.",
        ));
    }
    if identity.branch().is_none() {
        warn!("Failed to determine git repository branch.");
    }
    if identity.commit().is_none() {
        warn!("Failed to determine git repository commit.");
    }

    uploader.ping()?;
    let summary = uploader.upload()?;
    info!("coverage report uploaded");
    Ok(RunOutcome::Uploaded(summary))
}

/// [`run`] over a real HTTP client built from `config`.
pub fn run_over_http(
    identity: RepoIdentity,
    config: &UploaderConfig,
    job: UploadJob<'_>,
) -> Result<RunOutcome> {
    let transport = ReqwestTransport::new(config).map_err(|e| {
        CodecovError::with_source("Failed to build HTTP client", ErrorKind::Configuration, e)
    })?;
    run(identity, config, transport, job)
}

/// Install the configured logger, then [`run_over_http`].
///
/// An already installed logger is kept.
pub fn run_configured(
    config: &CodecovConfig,
    identity: RepoIdentity,
    job: UploadJob<'_>,
) -> Result<RunOutcome> {
    if let Err(e) = codecov_logging::init(&config.logging) {
        debug!("keeping existing logger: {e:#}");
    }
    run_over_http(identity, &config.upload, job)
}
