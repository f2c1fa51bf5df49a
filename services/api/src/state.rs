//! Application state shared across handlers

use access_log::RuntimeMode;

/// Application state shared across handlers
#[derive(Debug, Clone, Copy)]
pub struct AppState {
    pub mode: RuntimeMode,
}
