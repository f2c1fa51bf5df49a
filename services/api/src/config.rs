//! Server configuration

use access_log::{LoggerConfig, RequestLogger, WriterSink};
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Address the API service binds to
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load the server configuration
    ///
    /// # Environment Variables
    /// - `SERVER_HOST`: interface to bind (default: "0.0.0.0")
    /// - `SERVER_PORT`: port to listen on (default: 3001)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3001)?
            .add_source(Environment::with_prefix("SERVER"))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Destination of access log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Tracing,
    Stdout,
}

/// Access log output settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RequestLogConfig {
    pub sink: String,
}

impl RequestLogConfig {
    /// Load the access log output settings
    ///
    /// # Environment Variables
    /// - `REQUEST_LOG_SINK`: `stdout` writes lines straight to stdout, anything
    ///   else goes through tracing (default: "tracing")
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("sink", "tracing")?
            .add_source(Environment::with_prefix("REQUEST_LOG"))
            .build()?
            .try_deserialize()
    }

    pub fn output(&self) -> LogOutput {
        match self.sink.trim() {
            "stdout" => LogOutput::Stdout,
            _ => LogOutput::Tracing,
        }
    }

    /// Build the request logger writing to the configured output
    pub fn logger(&self, config: LoggerConfig) -> RequestLogger {
        let logger = RequestLogger::new(config);
        match self.output() {
            LogOutput::Stdout => logger.with_sink(WriterSink::stdout()),
            LogOutput::Tracing => logger,
        }
    }
}
