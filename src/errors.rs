use thiserror::Error;

/// Engine-level error type.
///
/// Most anomalies inside a scan (an invalid regex key, an entry routed to a
/// position it cannot fill) are recovered locally and never surface here;
/// only failures of injected capabilities and malformed call input abort a
/// processing call.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    // --- Request/Input Errors ---
    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    // --- External Capability Errors ---
    #[error("Token counting failed: {0}")]
    TokenCounting(String),

    // --- General/Internal Errors ---
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Internal Error: {0}")]
    InternalError(String),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
