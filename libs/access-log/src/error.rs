//! Custom error types for the access log
//!
//! Errors only arise while compiling a log format at startup. Once a logger is
//! running nothing it does can fail a request.

use thiserror::Error;

/// Error raised while compiling a log format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessLogError {
    /// Token name not known to the formatter
    #[error("Unknown log format token: :{0}")]
    UnknownToken(String),

    /// Token needs a `[argument]` and none was given
    #[error("Log format token :{0} requires an argument")]
    MissingArgument(String),

    /// Token argument could not be understood
    #[error("Invalid argument `{arg}` for log format token :{token}")]
    InvalidArgument { token: String, arg: String },

    /// Header token names an invalid header
    #[error("Invalid header name in log format: {0}")]
    InvalidHeaderName(String),

    /// Token argument opened with `[` but never closed
    #[error("Unterminated argument for log format token :{0}")]
    UnterminatedArgument(String),
}

/// Type alias for Result with AccessLogError
pub type AccessLogResult<T> = Result<T, AccessLogError>;
