//! HTTP request logging middleware
//!
//! Logs one line per request once its response is ready, so lines come out
//! in completion order rather than arrival order.

use std::fmt;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::{
    clock::{Clock, SystemClock},
    config::LoggerConfig,
    format::{RequestInfo, ResponseInfo, format_line},
    sink::{LogSink, TracingSink},
};

/// Request logger state: immutable configuration plus where lines go
#[derive(Clone)]
pub struct RequestLogger {
    config: Arc<LoggerConfig>,
    sink: Arc<dyn LogSink>,
    clock: Arc<dyn Clock>,
}

impl RequestLogger {
    /// Logger writing through `tracing` with the system clock
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config: Arc::new(config),
            sink: Arc::new(TracingSink),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Format one request/response pair and hand the trimmed line to the sink
    pub fn log(&self, request: &RequestInfo, response: &ResponseInfo) {
        let line = format_line(request, response, &self.config.format);
        self.sink.write(line.trim());
    }

    /// Attach the logging middleware to a router
    pub fn wrap<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self.clone(), request_logger))
    }
}

impl fmt::Debug for RequestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Request logging middleware
pub async fn request_logger(
    State(logger): State<RequestLogger>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if logger.config.skip() {
        return next.run(req).await;
    }

    let started = logger.clock.now();
    let request = RequestInfo::from_request(&req, &logger.config.format);

    let response = next.run(req).await;

    let elapsed = logger.clock.now().saturating_duration_since(started);
    let finished = ResponseInfo::from_response(
        &response,
        &logger.config.format,
        elapsed,
        logger.clock.wall_time(),
    );
    logger.log(&request, &finished);

    response
}
