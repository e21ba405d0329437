//! Configuration management and loading for codecov-upload.
//!
//! Repository identity is a plain value handed to the uploader. Discovering
//! it from version control is the caller's business.

use codecov_error::{Result, configuration_error};
use codecov_logging::LoggingConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

pub const DEFAULT_API_ENDPOINT: &str = "https://codecov.io";
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com/codecov-production/";

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z\-_]+/[0-9a-zA-Z\-_]+$").unwrap());
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

/// Configuration format types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    #[default]
    Yaml,
}

/// Remote endpoints and network limits for one uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploaderConfig {
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Storage URLs handed out by the API must start with this prefix.
    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Limit for a whole request: connect, send and read of the response.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Package identifier reported to the API.
    #[serde(default = "default_package")]
    pub package: String,
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_storage_endpoint() -> String {
    DEFAULT_STORAGE_ENDPOINT.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_package() -> String {
    format!("codecov-upload-{}", env!("CARGO_PKG_VERSION"))
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            storage_endpoint: default_storage_endpoint(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            package: default_package(),
        }
    }
}

impl UploaderConfig {
    pub fn with_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    pub fn with_storage_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.storage_endpoint = endpoint.into();
        self
    }

    /// Join the API endpoint with an absolute path.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Who is uploading: repository slug, commit, branch and token.
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoIdentity {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl RepoIdentity {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.into()),
            ..Self::default()
        }
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn slug(&self) -> Option<&str> {
        non_empty(&self.slug)
    }

    pub fn commit(&self) -> Option<&str> {
        non_empty(&self.commit)
    }

    pub fn branch(&self) -> Option<&str> {
        non_empty(&self.branch)
    }

    pub fn token(&self) -> Option<&str> {
        non_empty(&self.token)
    }

    /// Check the slug and token, where present.
    pub fn validate(&self) -> Result<()> {
        if let Some(slug) = self.slug() {
            validate_slug(slug)?;
        }
        if let Some(token) = self.token() {
            validate_token(token)?;
        }
        Ok(())
    }
}

/// `owner/repository`, alphanumerics, `-` and `_` only.
pub fn validate_slug(slug: &str) -> Result<()> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(configuration_error("Invalid repository slug supplied.").with_context("slug", slug))
    }
}

/// Repository upload tokens are lower-case UUIDs.
pub fn validate_token(token: &str) -> Result<()> {
    if TOKEN_RE.is_match(token) {
        Ok(())
    } else {
        Err(configuration_error("Invalid Codecov.io repository token supplied."))
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecovConfig {
    #[serde(default)]
    pub upload: UploaderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn format_for(path: &std::path::Path) -> ConfigFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => ConfigFormat::Json,
        Some("yaml") | Some("yml") => ConfigFormat::Yaml,
        _ => ConfigFormat::default(),
    }
}

/// Load configuration from a file
pub fn load_config<P: Into<PathBuf>>(path: P) -> anyhow::Result<CodecovConfig> {
    let path = path.into();
    let contents = std::fs::read_to_string(&path)?;

    match format_for(&path) {
        ConfigFormat::Json => serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse JSON config: {}", e)),
        ConfigFormat::Yaml => serde_yaml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse YAML config: {}", e)),
    }
}

/// Save configuration to a file
pub fn save_config<P: Into<PathBuf>>(config: &CodecovConfig, path: P) -> anyhow::Result<()> {
    let path = path.into();
    let contents = match format_for(&path) {
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| anyhow::anyhow!("Failed to serialize JSON config: {}", e))?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)
            .map_err(|e| anyhow::anyhow!("Failed to serialize YAML config: {}", e))?,
    };

    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codecov_error::ErrorKind;
    use codecov_logging::LogLevel;
    use tempfile::TempDir;

    #[test]
    fn config_default_values() {
        let config = UploaderConfig::default();
        assert_eq!(config.api_endpoint, "https://codecov.io");
        assert_eq!(
            config.storage_endpoint,
            "https://storage.googleapis.com/codecov-production/"
        );
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.package.starts_with("codecov-upload-"));
    }

    #[test]
    fn api_url_joins_without_double_slash() {
        let config = UploaderConfig::default().with_api_endpoint("https://codecov.example/");
        assert_eq!(
            config.api_url("/upload/v4"),
            "https://codecov.example/upload/v4"
        );
        assert_eq!(
            UploaderConfig::default().api_url("/upload/test_results/v1"),
            "https://codecov.io/upload/test_results/v1"
        );
    }

    #[test]
    fn empty_identity_fields_are_absent() {
        let identity = RepoIdentity {
            slug: Some(String::new()),
            commit: None,
            branch: Some("main".into()),
            token: Some(String::new()),
        };
        assert_eq!(identity.slug(), None);
        assert_eq!(identity.commit(), None);
        assert_eq!(identity.branch(), Some("main"));
        assert_eq!(identity.token(), None);
    }

    #[test]
    fn slug_validation() {
        assert!(validate_slug("seantis/pytest_codecov").is_ok());
        assert!(validate_slug("org-1/repo_2").is_ok());
        for bad in ["", "noslash", "a/b/c", "a b/c", "org/re.po"] {
            let err = validate_slug(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{bad}");
        }
    }

    #[test]
    fn token_validation() {
        assert!(validate_token("12345678-1234-1234-1234-1234567890ab").is_ok());
        assert!(validate_token("12345678-1234-1234-1234-1234567890AB").is_err());
        assert!(validate_token("not-a-token").is_err());
    }

    #[test]
    fn identity_validate_skips_absent_values() {
        assert!(RepoIdentity::default().validate().is_ok());
        assert!(RepoIdentity::new("org/repo").validate().is_ok());
        assert!(RepoIdentity::new("org/repo").with_token("bad").validate().is_err());
        assert!(RepoIdentity::new("bad slug").validate().is_err());
    }

    #[test]
    fn token_is_never_serialized() -> anyhow::Result<()> {
        let identity = RepoIdentity::new("org/repo").with_token("12345678-1234-1234-1234-1234567890ab");
        let json = serde_json::to_string(&identity)?;
        assert!(!json.contains("token"));
        Ok(())
    }

    #[test]
    fn load_save_yaml_config() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("codecov.yaml");

        let config = CodecovConfig {
            upload: UploaderConfig::default()
                .with_api_endpoint("https://codecov.example")
                .with_storage_endpoint("https://storage.example/bucket/"),
            logging: LoggingConfig::default().with_level(LogLevel::Debug),
        };

        save_config(&config, &config_path)?;
        let loaded = load_config(&config_path)?;

        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn load_save_json_config() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("codecov.json");

        let config = CodecovConfig::default();
        save_config(&config, &config_path)?;
        let loaded = load_config(&config_path)?;

        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn partial_yaml_uses_defaults() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("codecov.yml");
        std::fs::write(&config_path, "upload:\n  request_timeout_secs: 60\n")?;

        let loaded = load_config(&config_path)?;
        assert_eq!(loaded.upload.request_timeout_secs, 60);
        assert_eq!(loaded.upload.connect_timeout_secs, 5);
        assert_eq!(loaded.upload.api_endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(loaded.logging, LoggingConfig::default());
        Ok(())
    }

    #[test]
    fn malformed_config_is_an_error() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("codecov.json");
        std::fs::write(&config_path, "{ not json")?;
        assert!(load_config(&config_path).is_err());
        Ok(())
    }
}
