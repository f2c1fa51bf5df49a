//! Runtime mode and logger configuration

use std::env;
use std::fmt;

use tracing::info;

use crate::error::AccessLogResult;
use crate::format::FormatSpec;

/// Environment variable declaring the runtime mode
pub const MODE_ENV_VAR: &str = "APP_ENV";

/// Environment variable overriding the log format (preset name or format string)
pub const FORMAT_ENV_VAR: &str = "REQUEST_LOG_FORMAT";

/// Process-wide runtime mode, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    Production,
    Test,
    /// Any value other than `production` or `test`
    #[default]
    Development,
}

impl RuntimeMode {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "production" => RuntimeMode::Production,
            "test" => RuntimeMode::Test,
            _ => RuntimeMode::Development,
        }
    }

    /// Read the mode from `APP_ENV`; unset means development
    pub fn from_env() -> Self {
        env::var(MODE_ENV_VAR)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeMode::Production => "production",
            RuntimeMode::Test => "test",
            RuntimeMode::Development => "development",
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request logger configuration
///
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub mode: RuntimeMode,
    pub format: FormatSpec,
}

impl LoggerConfig {
    /// Combined format in production, the compact format otherwise
    pub fn for_mode(mode: RuntimeMode) -> Self {
        let format = match mode {
            RuntimeMode::Production => FormatSpec::combined(),
            RuntimeMode::Test | RuntimeMode::Development => FormatSpec::compact(),
        };
        Self { mode, format }
    }

    /// Create a new LoggerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `APP_ENV`: `production`, `test`, or anything else for development
    /// - `REQUEST_LOG_FORMAT`: optional preset name (`combined`, `common`,
    ///   `default`, `short`, `tiny`) or custom format string
    pub fn from_env() -> AccessLogResult<Self> {
        let mut config = Self::for_mode(RuntimeMode::from_env());

        if let Ok(format) = env::var(FORMAT_ENV_VAR) {
            if !format.trim().is_empty() {
                config.format = FormatSpec::resolve(&format)?;
            }
        }

        info!(
            "Request logging configured for {} mode with format: {}",
            config.mode, config.format
        );

        Ok(config)
    }

    pub fn with_format(mut self, format: FormatSpec) -> Self {
        self.format = format;
        self
    }

    /// Whether requests go unlogged
    pub fn skip(&self) -> bool {
        self.mode == RuntimeMode::Test
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::for_mode(RuntimeMode::default())
    }
}
