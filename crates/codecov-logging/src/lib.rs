//! Logging configuration for codecov-upload.
//!
//! Library crates log through the `log` facade. The host decides whether and
//! how those records are shown by calling [`init`] with a [`LoggingConfig`].

use anyhow::Context;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Log level for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    /// Level and message only.
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Enable colors (for terminal output)
    #[serde(default = "default_true")]
    pub colors: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Plain,
            timestamps: true,
            colors: true,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Debug` when verbose, `Info` otherwise.
    pub fn from_verbose(verbose: bool) -> Self {
        Self::default().with_level(if verbose { LogLevel::Debug } else { LogLevel::Info })
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    fn color_choice(&self) -> ColorChoice {
        if self.colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        }
    }

    fn logger_config(&self) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        if !self.timestamps {
            builder.set_time_level(LevelFilter::Off);
        }
        if self.format == LogFormat::Compact {
            builder.set_target_level(LevelFilter::Off);
            builder.set_thread_level(LevelFilter::Off);
            builder.set_location_level(LevelFilter::Off);
        }
        builder.build()
    }
}

/// Install a terminal logger for the whole process.
///
/// Fails if a logger is already installed.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    TermLogger::init(
        config.level.to_level_filter(),
        config.logger_config(),
        TerminalMode::Mixed,
        config.color_choice(),
    )
    .context("Failed to initialize logger")
}
