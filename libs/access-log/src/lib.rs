//! HTTP access logging for the Joy Kunga services
//!
//! The logger writes one line per request once the response is known. The
//! line format is picked from the runtime mode at startup: the Apache
//! combined format in production, a compact line everywhere else, and no
//! logging at all in test mode.
//!
//! ```rust,no_run
//! use access_log::{LoggerConfig, RequestLogger};
//! use axum::{Router, routing::get};
//!
//! # fn main() -> Result<(), access_log::AccessLogError> {
//! let logger = RequestLogger::new(LoggerConfig::from_env()?);
//! let app: Router = logger.wrap(Router::new().route("/health", get(|| async { "ok" })));
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod middleware;
pub mod sink;

pub use clock::{Clock, SteppingClock, SystemClock};
pub use config::{LoggerConfig, RuntimeMode};
pub use error::{AccessLogError, AccessLogResult};
pub use format::{FormatSpec, RequestInfo, ResponseInfo, format_line};
pub use middleware::{RequestLogger, request_logger};
pub use sink::{LogSink, MemorySink, TracingSink, WriterSink};
