//! Error handling for codecov-upload.
//!
//! Every fallible operation of the uploader surfaces a [`CodecovError`] whose
//! [`ErrorKind`] tells the caller whether the problem is in the invocation,
//! the remote service, or the call sequence.

use std::fmt;

/// Error kind for upload failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or invalid slug/token. Fix the invocation.
    Configuration,
    /// The API answered with a body the protocol does not allow.
    Protocol,
    /// The storage endpoint rejected the coverage payload.
    Upload,
    /// `upload` was called without a successful `ping`.
    Sequence,
    /// The coverage data could not produce an XML report.
    ReportGeneration,
    /// Connect failure, timeout or any other transport-level failure.
    Transport,
    /// Reading a local artifact failed.
    Io,
}

impl ErrorKind {
    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transport | ErrorKind::Upload)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Protocol => write!(f, "protocol"),
            ErrorKind::Upload => write!(f, "upload"),
            ErrorKind::Sequence => write!(f, "sequence"),
            ErrorKind::ReportGeneration => write!(f, "report_generation"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Io => write!(f, "io"),
        }
    }
}

/// Upload error with kind and context
#[derive(Debug)]
pub struct CodecovError {
    message: String,
    kind: ErrorKind,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    context: Vec<(String, String)>,
}

impl CodecovError {
    pub fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            source: None,
            context: Vec::new(),
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        kind: ErrorKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            kind,
            source: Some(source.into()),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for CodecovError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;

        if !self.context.is_empty() {
            write!(f, " (")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, ")")?;
        }

        if let Some(source) = &self.source {
            write!(f, "\nCaused by: {}", source)?;
        }

        Ok(())
    }
}

impl std::error::Error for CodecovError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// Result type alias for upload errors
pub type Result<T> = std::result::Result<T, CodecovError>;

pub fn configuration_error(message: impl Into<String>) -> CodecovError {
    CodecovError::new(message, ErrorKind::Configuration)
}

/// The raw response body is kept in the message so it shows up in diagnostics.
pub fn protocol_error(response_body: &str) -> CodecovError {
    CodecovError::new(
        format!("Invalid response from codecov API:\n{response_body}"),
        ErrorKind::Protocol,
    )
}

pub fn upload_error(message: impl Into<String>) -> CodecovError {
    CodecovError::new(message, ErrorKind::Upload)
}

pub fn sequence_error(message: impl Into<String>) -> CodecovError {
    CodecovError::new(message, ErrorKind::Sequence)
}

pub fn report_generation_error(
    message: impl Into<String>,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> CodecovError {
    CodecovError::with_source(message, ErrorKind::ReportGeneration, source)
}

pub fn transport_error(
    message: impl Into<String>,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> CodecovError {
    CodecovError::with_source(message, ErrorKind::Transport, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn kind_display() {
        assert_eq!(format!("{}", ErrorKind::Configuration), "configuration");
        assert_eq!(format!("{}", ErrorKind::ReportGeneration), "report_generation");
        assert_eq!(format!("{}", ErrorKind::Sequence), "sequence");
    }

    #[test]
    fn retryable_kinds() {
        assert!(ErrorKind::Transport.is_retryable());
        assert!(ErrorKind::Upload.is_retryable());
        assert!(!ErrorKind::Configuration.is_retryable());
        assert!(!ErrorKind::Sequence.is_retryable());
        assert!(!ErrorKind::Protocol.is_retryable());
    }

    #[test]
    fn protocol_error_keeps_raw_body() {
        let err = protocol_error("line one\nline two\nline three");
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.message().ends_with("line one\nline two\nline three"));
    }

    #[test]
    fn display_with_context() {
        let err = upload_error("Failed to upload report to storage endpoint.")
            .with_context("status", "503");

        let display = format!("{}", err);
        assert!(display.starts_with("[upload] Failed to upload"));
        assert!(display.contains("(status=503)"));
    }

    #[test]
    fn source_is_exposed() {
        let err = transport_error("PUT storage", anyhow::anyhow!("connection reset"));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.source().is_some());
        assert!(format!("{}", err).contains("Caused by: connection reset"));
    }

    #[test]
    fn report_generation_keeps_source() {
        let err = report_generation_error(
            "Failed to generate coverage report",
            anyhow::anyhow!("No data to report."),
        );
        assert_eq!(err.kind(), ErrorKind::ReportGeneration);
        assert!(err.source().is_some());
    }
}
