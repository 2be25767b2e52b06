//! Error types for the seatwatch service

/// Errors that can occur in the seatwatch service
#[derive(Debug, thiserror::Error)]
pub enum SeatwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Unexpected response shape: {0}")]
    UnexpectedResponseShape(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SeatwatchError {
    /// Whether this error is a per-target fetch failure that the poll loop
    /// recovers from by skipping the target until the next tick
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            SeatwatchError::Network(_)
                | SeatwatchError::SessionExpired(_)
                | SeatwatchError::UnexpectedResponseShape(_)
        )
    }
}

/// Result type alias for seatwatch operations
pub type Result<T> = std::result::Result<T, SeatwatchError>;
